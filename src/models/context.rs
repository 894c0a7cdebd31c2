use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The decoded link, kept whole so unknown fields reach the webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionContext(Map<String, Value>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, deserialize_with = "super::string_or_number")]
    pub contact_id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub contact_name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub contact_email: String,
}

impl SubmissionContext {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn meeting_id(&self) -> String {
        self.text("meetingId").unwrap_or_default()
    }

    pub fn ae_name(&self) -> Option<String> {
        self.text("aeName")
    }

    pub fn sdr_name(&self) -> Option<String> {
        self.text("sdrName")
    }

    pub fn meeting_date(&self) -> Option<String> {
        self.text("meetingDate")
    }

    pub fn company_name(&self) -> Option<String> {
        self.text("companyName")
    }

    pub fn source(&self) -> Option<String> {
        self.text("source")
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.0
            .get("contacts")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter(|c| c.is_object())
                    .filter_map(|c| serde_json::from_value(c.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contact_names(&self) -> Option<String> {
        let names = self
            .contacts()
            .into_iter()
            .map(|c| c.contact_name)
            .collect::<Vec<_>>()
            .join(", ");
        if names.is_empty() { None } else { Some(names) }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
