use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::guard;
use crate::inflight::Action;
use crate::models::{FormState, SubmissionContext};
use crate::qualification::{self, MeetingHeld, NO_SHOW_REASONS};
use crate::state::SharedState;
use crate::token::{self, TokenError};

use super::render;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Deserialize)]
pub struct FormQuery {
    pub token: Option<String>,
}

#[derive(Template)]
#[template(path = "form/qualification.html")]
struct QualificationTemplate {
    meeting: MeetingInfo,
    state: FormState,
    meeting_held: Vec<RadioOption>,
    no_show_reasons: Vec<RadioOption>,
    identified_need: Vec<RadioOption>,
    decision_maker: Vec<RadioOption>,
    next_step: Vec<RadioOption>,
    sal_decision: Vec<RadioOption>,
    show_no: bool,
    show_rescheduled: bool,
    show_yes: bool,
    show_reject_reason: bool,
    suggestion: Option<&'static str>,
    submit_label: Option<&'static str>,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "form/message.html")]
struct MessageTemplate {
    title: &'static str,
    success: bool,
    message: String,
    detail: Option<String>,
}

struct MeetingInfo {
    ae_name: String,
    sdr_name: String,
    meeting_date: String,
    company_name: String,
    contacts: String,
    source: String,
}

struct RadioOption {
    value: &'static str,
    label: &'static str,
    checked: bool,
}

impl MeetingInfo {
    fn from_context(ctx: &SubmissionContext) -> Self {
        let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Self {
            ae_name: or_na(ctx.ae_name()),
            sdr_name: or_na(ctx.sdr_name()),
            meeting_date: or_na(ctx.meeting_date()),
            company_name: or_na(ctx.company_name()),
            contacts: or_na(ctx.contact_names()),
            source: or_na(ctx.source()),
        }
    }
}

fn radios(options: &[(&'static str, &'static str)], current: &str) -> Vec<RadioOption> {
    options
        .iter()
        .map(|&(value, label)| RadioOption {
            value,
            label,
            checked: value == current,
        })
        .collect()
}

fn yes_no(current: &str) -> Vec<RadioOption> {
    radios(&[("Yes", "Yes"), ("No", "No")], current)
}

fn form_page(
    ctx: &SubmissionContext,
    form: &FormState,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let held = MeetingHeld::parse(&form.meeting_held);
    let meeting_options: Vec<(&'static str, &'static str)> =
        MeetingHeld::ALL.iter().map(|m| (m.as_str(), m.as_str())).collect();
    let reason_options: Vec<(&'static str, &'static str)> =
        NO_SHOW_REASONS.iter().map(|r| (*r, *r)).collect();

    let template = QualificationTemplate {
        meeting: MeetingInfo::from_context(ctx),
        state: form.clone(),
        meeting_held: radios(&meeting_options, &form.meeting_held),
        no_show_reasons: radios(&reason_options, &form.no_show_reason),
        identified_need: yes_no(&form.identified_need),
        decision_maker: yes_no(&form.decision_maker),
        next_step: yes_no(&form.next_step),
        sal_decision: radios(
            &[
                ("Accept", "✅ Accept as SAL"),
                ("Reject", "🔄 Reject (return to SDR)"),
                ("Disqualify", "❌ Disqualify"),
            ],
            &form.sal_decision,
        ),
        show_no: held == Some(MeetingHeld::No),
        show_rescheduled: held == Some(MeetingHeld::Rescheduled),
        show_yes: held == Some(MeetingHeld::Yes),
        show_reject_reason: form.sal_decision == "Reject",
        suggestion: qualification::show_suggestion(form)
            .then(|| qualification::suggested_decision(form).as_str()),
        submit_label: held.map(MeetingHeld::submit_label),
        error,
    };
    Ok((status, render(&template)?).into_response())
}

fn message_page(
    title: &'static str,
    success: bool,
    message: impl Into<String>,
    detail: Option<String>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let template = MessageTemplate {
        title,
        success,
        message: message.into(),
        detail,
    };
    Ok((status, render(&template)?).into_response())
}

fn token_error_page(err: &TokenError) -> Result<Response, AppError> {
    tracing::debug!("Rejected form link: {err}");
    message_page("Error", false, err.user_message(), None, StatusCode::BAD_REQUEST)
}

fn already_submitted_page(ctx: &SubmissionContext) -> Result<Response, AppError> {
    let contacts = ctx
        .contact_names()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    message_page(
        "Already Submitted",
        true,
        "This form has already been completed.",
        Some(format!("Contacts: {contacts}")),
        StatusCode::OK,
    )
}

pub async fn show(
    Query(q): Query<FormQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let ctx = match token::decode(q.token.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => return token_error_page(&e),
    };

    if guard::submitted_at(&jar, &ctx.meeting_id()).is_some() {
        return already_submitted_page(&ctx);
    }

    form_page(&ctx, &FormState::default(), None, StatusCode::OK)
}

pub async fn submit(
    State(state): State<SharedState>,
    Query(q): Query<FormQuery>,
    jar: CookieJar,
    Form(form): Form<FormState>,
) -> Result<Response, AppError> {
    let ctx = match token::decode(q.token.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => return token_error_page(&e),
    };
    let meeting_id = ctx.meeting_id();

    if let Some(at) = guard::submitted_at(&jar, &meeting_id) {
        tracing::debug!("Meeting {meeting_id} already submitted from this browser at {at}");
        return already_submitted_page(&ctx);
    }

    let qualified = match qualification::validate(&form) {
        Ok(q) => q,
        Err(e) => {
            return form_page(&ctx, &form, Some(e.to_string()), StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    let Some(_busy) = state.inflight.try_begin(Action::Submit, meeting_id.clone()) else {
        return form_page(
            &ctx,
            &form,
            Some("This form is already being submitted. Please wait.".to_string()),
            StatusCode::CONFLICT,
        );
    };

    let now = Utc::now();
    let body = qualification::payload(&ctx, &form, now);
    if let Err(e) = state.webhook.post(&body).await {
        tracing::warn!("Submission for meeting {meeting_id} failed: {e}");
        return form_page(
            &ctx,
            &form,
            Some(e.user_message().to_string()),
            StatusCode::BAD_GATEWAY,
        );
    }

    let held = qualified.meeting_held();
    tracing::info!("Meeting {meeting_id} submitted ({})", held.as_str());

    let jar = guard::mark_submitted(
        jar,
        &meeting_id,
        &qualification::iso_timestamp(now),
        state.config.guard_max_age_days,
    );
    let page = message_page("Form Submitted", true, held.confirmation(), None, StatusCode::OK)?;
    Ok((jar, page).into_response())
}
