use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

pub const KEY_PREFIX: &str = "sal_form_";

pub fn key(meeting_id: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(meeting_id.as_bytes()).collect();
    format!("{KEY_PREFIX}{encoded}")
}

pub fn submitted_at(jar: &CookieJar, meeting_id: &str) -> Option<String> {
    jar.get(&key(meeting_id)).map(|c| c.value().to_string())
}

pub fn mark_submitted(jar: CookieJar, meeting_id: &str, at: &str, max_age_days: i64) -> CookieJar {
    let cookie = Cookie::build((key(meeting_id), at.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(max_age_days))
        .build();
    jar.add(cookie)
}
