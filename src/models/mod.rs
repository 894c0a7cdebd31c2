pub mod context;
pub mod form_state;
pub mod watchdog_exception;
pub mod watchdog_result;

pub use context::{Contact, SubmissionContext};
pub use form_state::FormState;
pub use watchdog_exception::{NewException, WatchdogException};
pub use watchdog_result::{
    CheckStatus, Resolution, ResolutionStatus, Resolutions, Severity, Violation, WatchdogResult,
};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
