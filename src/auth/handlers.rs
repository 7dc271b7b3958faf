use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rusqlite::params;
use serde::Deserialize;
use serde_json::json;

use crate::auth::session;
use crate::error::AppResult;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_days: i64) -> String {
    let max_age_secs = max_age_days * 24 * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

// -- Handlers --

/// POST /auth/login — verify an external identity token, provision the
/// profile on first login, and set the session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let identity = state.verifier.verify(&req.token).await?;

    // First login creates the profile row; an existing row is left untouched.
    {
        let conn = state.db.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_profiles (user_id, user_name) VALUES (?1, ?2)",
            params![identity.subject, identity.name],
        )?;
    }

    let token = session::issue_session(
        &state.session_secret,
        &identity.subject,
        &identity.name,
        state.config.auth.session_days,
    )?;

    tracing::info!("User logged in: {}", identity.subject);

    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_days,
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "user": { "id": identity.subject, "name": identity.name }
        })),
    )
        .into_response())
}

/// POST /auth/logout — clear the session cookie. Nothing to revoke
/// server-side.
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie(&state.config.auth.cookie_name);
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_with_expiry() {
        let cookie = session_cookie("waypost_session", "tok123", 7);
        assert!(cookie.starts_with("waypost_session=tok123;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let cookie = clear_session_cookie("waypost_session");
        assert!(cookie.starts_with("waypost_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
