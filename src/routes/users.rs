use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use rusqlite::params;
use serde::Deserialize;
use serde_json::json;

use crate::db::models::UserProfile;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SaveUserRequest {
    pub user_id: String,
    pub user_name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/saveUser", post(save_user))
}

/// Save-or-fetch: an existing profile is returned untouched; a new identity
/// gets a fresh row with empty optional fields and zero points. This
/// endpoint never updates.
async fn save_user(
    State(state): State<AppState>,
    Json(req): Json<SaveUserRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id is required".into()));
    }

    let conn = state.db.get()?;

    let existing = conn
        .query_row(
            "SELECT user_id, user_name, user_country, user_bio, user_points
             FROM user_profiles WHERE user_id = ?1",
            params![req.user_id],
            |row| {
                Ok(UserProfile {
                    user_id: row.get(0)?,
                    user_name: row.get(1)?,
                    user_country: row.get(2)?,
                    user_bio: row.get(3)?,
                    user_points: row.get(4)?,
                })
            },
        )
        .ok();

    if let Some(profile) = existing {
        return Ok(Json(json!({
            "message": "User already exists",
            "user": profile,
        })));
    }

    conn.execute(
        "INSERT INTO user_profiles (user_id, user_name, user_country, user_bio, user_points)
         VALUES (?1, ?2, '', '', 0)",
        params![req.user_id, req.user_name],
    )?;

    Ok(Json(json!({ "message": "User saved" })))
}
