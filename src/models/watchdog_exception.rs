use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewException {
    pub check_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub reason: String,
    pub created_by: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogException {
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub check_id: String,
    #[serde(rename = "type", default, deserialize_with = "super::null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "super::string_or_number")]
    pub value: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub reason: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}
