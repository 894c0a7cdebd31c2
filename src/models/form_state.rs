use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    pub meeting_held: String,
    pub no_show_reason: String,
    pub reschedule_date: String,
    pub reschedule_notes: String,
    pub additional_attendees: String,
    pub identified_need: String,
    pub identified_need_comment: String,
    pub decision_maker: String,
    pub decision_maker_comment: String,
    pub next_step: String,
    pub next_step_comment: String,
    pub sal_decision: String,
    pub reject_reason: String,
    pub comments: String,
}
