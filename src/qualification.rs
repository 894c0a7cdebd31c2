use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::models::{FormState, SubmissionContext};

pub const NO_SHOW_REASONS: [&str; 5] = [
    "No-show (prospect didn't attend)",
    "Cancelled by prospect",
    "Cancelled by AE",
    "Technical issues",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingHeld {
    Yes,
    No,
    Rescheduled,
}

impl MeetingHeld {
    pub const ALL: [MeetingHeld; 3] = [MeetingHeld::Yes, MeetingHeld::No, MeetingHeld::Rescheduled];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Yes" => Some(MeetingHeld::Yes),
            "No" => Some(MeetingHeld::No),
            "Rescheduled" => Some(MeetingHeld::Rescheduled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeetingHeld::Yes => "Yes",
            MeetingHeld::No => "No",
            MeetingHeld::Rescheduled => "Rescheduled",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            MeetingHeld::Yes => "Submit Qualification",
            MeetingHeld::No => "Submit No-Show Report",
            MeetingHeld::Rescheduled => "Submit Reschedule",
        }
    }

    pub fn confirmation(self) -> &'static str {
        match self {
            MeetingHeld::Yes => "The qualification has been recorded in HubSpot.",
            MeetingHeld::No => "SDR has been notified that the meeting did not occur.",
            MeetingHeld::Rescheduled => "SDR has been notified that the meeting was rescheduled.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Yes" => Some(Answer::Yes),
            "No" => Some(Answer::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalDecision {
    Accept,
    Reject,
    Disqualify,
}

impl SalDecision {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Accept" => Some(SalDecision::Accept),
            "Reject" => Some(SalDecision::Reject),
            "Disqualify" => Some(SalDecision::Disqualify),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SalDecision::Accept => "Accept",
            SalDecision::Reject => "Reject",
            SalDecision::Disqualify => "Disqualify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualification {
    Held {
        identified_need: Answer,
        decision_maker: Answer,
        next_step: Answer,
        decision: SalDecision,
    },
    NotHeld {
        reason: String,
    },
    Rescheduled,
}

impl Qualification {
    pub fn meeting_held(&self) -> MeetingHeld {
        match self {
            Qualification::Held { .. } => MeetingHeld::Yes,
            Qualification::NotHeld { .. } => MeetingHeld::No,
            Qualification::Rescheduled => MeetingHeld::Rescheduled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MeetingHeldMissing,
    NoShowReasonMissing,
    QualificationIncomplete,
    DecisionMissing,
    RejectReasonMissing,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ValidationError::MeetingHeldMissing => "Please indicate if the meeting was held",
            ValidationError::NoShowReasonMissing => "Please select why the meeting didn't happen",
            ValidationError::QualificationIncomplete => "Please answer all qualification questions",
            ValidationError::DecisionMissing => "Please select a SAL decision",
            ValidationError::RejectReasonMissing => "Please provide details for rejection",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ValidationError {}

/// The first broken rule is reported.
pub fn validate(form: &FormState) -> Result<Qualification, ValidationError> {
    let held = MeetingHeld::parse(&form.meeting_held).ok_or(ValidationError::MeetingHeldMissing)?;

    match held {
        MeetingHeld::No => {
            if form.no_show_reason.is_empty() {
                return Err(ValidationError::NoShowReasonMissing);
            }
            Ok(Qualification::NotHeld {
                reason: form.no_show_reason.clone(),
            })
        }
        MeetingHeld::Rescheduled => Ok(Qualification::Rescheduled),
        MeetingHeld::Yes => {
            let answers = (
                Answer::parse(&form.identified_need),
                Answer::parse(&form.decision_maker),
                Answer::parse(&form.next_step),
            );
            let (Some(identified_need), Some(decision_maker), Some(next_step)) = answers else {
                return Err(ValidationError::QualificationIncomplete);
            };

            let decision =
                SalDecision::parse(&form.sal_decision).ok_or(ValidationError::DecisionMissing)?;
            if decision == SalDecision::Reject && form.reject_reason.is_empty() {
                return Err(ValidationError::RejectReasonMissing);
            }

            Ok(Qualification::Held {
                identified_need,
                decision_maker,
                next_step,
                decision,
            })
        }
    }
}

/// Advisory only; never written into `salDecision`.
pub fn suggested_decision(form: &FormState) -> SalDecision {
    if form.identified_need == "Yes" && form.decision_maker == "Yes" && form.next_step == "Yes" {
        SalDecision::Accept
    } else {
        SalDecision::Disqualify
    }
}

pub fn show_suggestion(form: &FormState) -> bool {
    !form.identified_need.is_empty() && !form.decision_maker.is_empty() && !form.next_step.is_empty()
}

pub fn payload(context: &SubmissionContext, form: &FormState, submitted_at: DateTime<Utc>) -> Value {
    let mut responses = serde_json::to_value(form).unwrap_or_else(|_| json!({}));
    if let Some(obj) = responses.as_object_mut() {
        obj.insert("autoSubmit".to_string(), Value::Bool(false));
        obj.insert("submittedAt".to_string(), Value::String(iso_timestamp(submitted_at)));
    }

    let mut body = context.fields().clone();
    body.insert("formResponses".to_string(), responses);
    Value::Object(body)
}

/// e.g. `2024-01-01T09:00:00.000Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
