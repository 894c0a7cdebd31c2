use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Entries are kept as stored; see [`Resolution::read`].
pub type Resolutions = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogResult {
    #[serde(default, deserialize_with = "super::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "super::opt_string_or_number")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub run_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub run_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: CheckStatus,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub check_id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub violation_count: i64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub violations: Vec<Violation>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub resolutions: Resolutions,
}

/// RFC 3339, or a zone-less timestamp taken as UTC. Anything else is `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::String(raw)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok());
    Ok(naive.map(|n| n.and_utc()))
}

impl WatchdogResult {
    pub fn resolution(&self, record_id: &str) -> Option<Resolution> {
        self.resolutions.get(record_id).map(Resolution::read)
    }

    pub fn is_resolved(&self, record_id: &str) -> bool {
        self.resolutions.contains_key(record_id)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| !self.is_resolved(&v.record_id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Unknown => "Unknown",
        }
    }

    pub fn rank(severity: Option<Severity>) -> u8 {
        match severity {
            Some(Severity::Critical) => 0,
            Some(Severity::High) => 1,
            Some(Severity::Medium) => 2,
            Some(Severity::Unknown) | None => 99,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(default, deserialize_with = "super::string_or_number")]
    pub record_id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub record_name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub details: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub hubspot_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub status: Option<ResolutionStatus>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub exception_id: Option<String>,
}

impl Resolution {
    pub fn read(entry: &Value) -> Self {
        let text = |key: &str| match entry.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self {
            status: text("status").map(|s| ResolutionStatus::parse(&s)),
            resolved_by: text("resolved_by"),
            resolved_at: text("resolved_at"),
            exception_id: text("exception_id"),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut entry = Map::new();
        if let Some(status) = self.status {
            entry.insert("status".into(), Value::String(status.as_str().into()));
        }
        for (key, value) in [
            ("resolved_by", &self.resolved_by),
            ("resolved_at", &self.resolved_at),
            ("exception_id", &self.exception_id),
        ] {
            if let Some(v) = value {
                entry.insert(key.into(), Value::String(v.clone()));
            }
        }
        Value::Object(entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    Fixed,
    Exception,
    Other,
}

impl ResolutionStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "fixed" => ResolutionStatus::Fixed,
            "exception" => ResolutionStatus::Exception,
            _ => ResolutionStatus::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionStatus::Fixed => "fixed",
            ResolutionStatus::Exception => "exception",
            ResolutionStatus::Other => "other",
        }
    }
}
