use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::Value;

use crate::models::SubmissionContext;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

#[derive(Debug, Clone, PartialEq)]
pub enum TokenError {
    Missing,
    Malformed(String),
}

impl TokenError {
    pub fn user_message(&self) -> &'static str {
        match self {
            TokenError::Missing => "Invalid form link. Please use the link provided in Slack.",
            TokenError::Malformed(_) => "Invalid form data. Please contact support.",
        }
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Missing => write!(f, "missing token"),
            TokenError::Malformed(msg) => write!(f, "malformed token: {msg}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Query decoding turns `+` into a space, so spaces are put back first.
pub fn decode(raw: Option<&str>) -> Result<SubmissionContext, TokenError> {
    let raw = raw.filter(|s| !s.is_empty()).ok_or(TokenError::Missing)?;
    let restored = raw.replace(' ', "+");

    let bytes = STANDARD
        .decode(&restored)
        .or_else(|_| URL_SAFE.decode(&restored))
        .map_err(|e| TokenError::Malformed(format!("invalid base64: {e}")))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("invalid JSON: {e}")))?;

    SubmissionContext::from_value(value)
        .ok_or_else(|| TokenError::Malformed("expected a JSON object".to_string()))
}

pub fn encode(value: &Value) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.to_string())
}
