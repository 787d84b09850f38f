use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::CookieJar;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

pub const SESSION_COOKIE: &str = "session";

/// Resolves the store owner from a bearer token, falling back to the
/// session cookie.
pub fn current_user_id(headers: &HeaderMap, jar: &CookieJar, app_state: &AppState) -> AppResult<Uuid> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let token = match bearer {
        Some(token) => token.to_string(),
        None => jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::InvalidCredentials)?,
    };

    let claims = jwt::verify(&token, &app_state.config.jwt_secret)?;
    claims.user_id()
}

/// Compares a shared-secret header against the configured value without
/// short-circuiting on the first differing byte.
pub fn header_secret_matches(headers: &HeaderMap, name: &str, expected: &SecretString) -> bool {
    let Some(provided) = headers.get(name).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let expected = expected.expose_secret().as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
