use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use rusqlite::params;
use serde::Serialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_LOCATION_LEN: usize = 100;
const MAX_TAGS_LEN: usize = 255;

// --- View structs ---

#[derive(Serialize)]
pub struct PostView {
    pub id: i64,
    pub post_name: String,
    pub user_id: Option<String>,
    pub likes: i64,
    pub location: Option<String>,
    pub tags: Option<String>,
    pub bookmark_folder: Option<String>,
    pub itinerary: Option<String>,
    pub media: Vec<MediaView>,
}

#[derive(Serialize)]
pub struct MediaView {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: Option<String>,
    /// Base64-encoded payload.
    pub data: String,
    pub created_at: String,
    pub post_id: Option<i64>,
}

struct UploadedFile {
    filename: Option<String>,
    kind: String,
    bytes: Vec<u8>,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-post", post(create_post))
        .route("/posts", get(list_posts))
        .route("/media", get(list_media))
}

// --- Handlers ---

async fn create_post(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let mut post_name = String::new();
    let mut location: Option<String> = None;
    let mut tags: Option<String> = None;
    let mut user_id: Option<String> = None;
    let mut files: Vec<UploadedFile> = Vec::new();

    // Drain the whole form before touching the database so the insert
    // sequence below never spans an await point.
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "post_name" => {
                post_name = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .trim()
                    .to_string();
            }
            "location" => {
                location = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "tags" => {
                tags = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "user_id" => {
                user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "files" => {
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let kind = classify_media(content_type.as_deref(), filename.as_deref());
                files.push(UploadedFile {
                    filename,
                    kind,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    if post_name.is_empty() {
        return Err(AppError::BadRequest("post_name is required".into()));
    }
    if post_name.len() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "post_name must be {} characters or less",
            MAX_NAME_LEN
        )));
    }
    if location.as_deref().is_some_and(|l| l.len() > MAX_LOCATION_LEN) {
        return Err(AppError::BadRequest(format!(
            "location must be {} characters or less",
            MAX_LOCATION_LEN
        )));
    }
    if tags.as_deref().is_some_and(|t| t.len() > MAX_TAGS_LEN) {
        return Err(AppError::BadRequest(format!(
            "tags must be {} characters or less",
            MAX_TAGS_LEN
        )));
    }

    // One transaction for the post and all its media; a failed media insert
    // rolls the whole post back instead of stranding it.
    let post_id = {
        let mut conn = state.db.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO posts (post_name, user_id, location, tags) VALUES (?1, ?2, ?3, ?4)",
            params![post_name, user_id, location, tags],
        )?;
        let post_id = tx.last_insert_rowid();

        let created_at = Utc::now().to_rfc3339();
        for file in &files {
            tx.execute(
                "INSERT INTO media (type, filename, data, created_at, post_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![file.kind, file.filename, file.bytes, created_at, post_id],
            )?;
        }

        tx.commit()?;
        post_id
    };

    tracing::info!("Created post {} with {} media file(s)", post_id, files.len());

    Ok(Json(json!({
        "message": "Post created",
        "post_id": post_id,
        "post_name": post_name,
    })))
}

async fn list_posts(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    let mut posts: Vec<PostView> = {
        let mut stmt = conn.prepare(
            "SELECT id, post_name, user_id, likes, location, tags, bookmark_folder, itinerary
             FROM posts ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PostView {
                id: row.get(0)?,
                post_name: row.get(1)?,
                user_id: row.get(2)?,
                likes: row.get(3)?,
                location: row.get(4)?,
                tags: row.get(5)?,
                bookmark_folder: row.get(6)?,
                itinerary: row.get(7)?,
                media: Vec::new(),
            })
        })?;
        rows.collect::<Result<_, _>>()?
    };

    let media = query_media(&conn)?;
    for item in media {
        if let Some(post_id) = item.post_id {
            if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
                post.media.push(item);
            }
        }
    }

    Ok(Json(json!({ "posts": posts })))
}

async fn list_media(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let media = query_media(&conn)?;
    Ok(Json(json!({ "media": media })))
}

// --- Query helpers ---

fn query_media(conn: &rusqlite::Connection) -> Result<Vec<MediaView>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, type, filename, data, created_at, post_id FROM media ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        let bytes: Vec<u8> = row.get(3)?;
        Ok(MediaView {
            id: row.get(0)?,
            kind: row.get(1)?,
            filename: row.get(2)?,
            data: BASE64.encode(bytes),
            created_at: row.get(4)?,
            post_id: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Classify an upload as image or video from its MIME prefix, falling back
/// to a filename-based guess when the part carries no content type.
fn classify_media(content_type: Option<&str>, filename: Option<&str>) -> String {
    let mime = content_type
        .map(|s| s.to_string())
        .or_else(|| {
            filename.map(|f| mime_guess::from_path(f).first_or_octet_stream().to_string())
        })
        .unwrap_or_default();

    if mime.starts_with("video") {
        "video".to_string()
    } else {
        "image".to_string()
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_image_by_content_type() {
        assert_eq!(classify_media(Some("image/png"), None), "image");
        assert_eq!(classify_media(Some("image/jpeg"), Some("a.mp4")), "image");
    }

    #[test]
    fn classify_video_by_content_type() {
        assert_eq!(classify_media(Some("video/mp4"), None), "video");
        assert_eq!(classify_media(Some("video/webm"), Some("a.png")), "video");
    }

    #[test]
    fn classify_falls_back_to_filename() {
        assert_eq!(classify_media(None, Some("clip.mp4")), "video");
        assert_eq!(classify_media(None, Some("photo.jpg")), "image");
    }

    #[test]
    fn classify_defaults_to_image() {
        assert_eq!(classify_media(None, None), "image");
        assert_eq!(classify_media(Some("application/pdf"), None), "image");
    }

    #[test]
    fn post_name_validation_bounds() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(name.len() > MAX_NAME_LEN);
    }
}
