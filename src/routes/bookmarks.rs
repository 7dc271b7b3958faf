use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::params;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

// --- Request types ---

#[derive(Deserialize)]
pub struct BookmarkRequest {
    pub post_id: i64,
    pub itinerary_id: i64,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookmarks/add", post(add_bookmark))
        .route("/bookmarks/remove", post(remove_bookmark))
        .route("/bookmarks/post/{post_id}", get(fetch_bookmarks))
}

// --- Handlers ---

/// Idempotent insert on the (post, itinerary, owner) key; every mutation
/// responds with the recomputed list for this owner and post.
async fn add_bookmark(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<BookmarkRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO bookmark_posts_itineraries (post_id, itinerary_id, user_id)
         VALUES (?1, ?2, ?3)",
        params![req.post_id, req.itinerary_id, user.id],
    )?;

    let bookmarks = query_bookmarks(&conn, req.post_id, &user.id)?;
    Ok(Json(json!({ "success": true, "bookmarks": bookmarks })))
}

/// Removing an absent bookmark is not an error; the current list comes back
/// unchanged.
async fn remove_bookmark(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<BookmarkRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    conn.execute(
        "DELETE FROM bookmark_posts_itineraries
         WHERE post_id = ?1 AND itinerary_id = ?2 AND user_id = ?3",
        params![req.post_id, req.itinerary_id, user.id],
    )?;

    let bookmarks = query_bookmarks(&conn, req.post_id, &user.id)?;
    Ok(Json(json!({ "success": true, "bookmarks": bookmarks })))
}

async fn fetch_bookmarks(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let bookmarks = query_bookmarks(&conn, post_id, &user.id)?;
    Ok(Json(json!({ "bookmarks": bookmarks })))
}

// --- Query helpers ---

fn query_bookmarks(
    conn: &rusqlite::Connection,
    post_id: i64,
    user_id: &str,
) -> Result<Vec<i64>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT itinerary_id FROM bookmark_posts_itineraries
         WHERE post_id = ?1 AND user_id = ?2
         ORDER BY itinerary_id",
    )?;
    let ids = stmt
        .query_map(params![post_id, user_id], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    Ok(ids)
}
