use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use rusqlite::params;
use serde::Deserialize;
use serde_json::json;

use crate::db::models::{Itinerary, ItineraryCard};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

const DEFAULT_TITLE: &str = "Untitled Itinerary";

// --- Request types ---

#[derive(Deserialize)]
pub struct SaveItineraryRequest {
    pub title: Option<String>,
    pub destination: Option<String>,
    #[serde(default)]
    pub collaborative: bool,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
}

#[derive(Deserialize)]
pub struct SaveCardRequest {
    pub itinerary_id: Option<i64>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub notes: Option<String>,
    pub order_index: Option<i64>,
    pub card_time: Option<String>,
    pub card_date: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCardRequest {
    pub card_id: Option<i64>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub notes: Option<String>,
    pub order_index: Option<i64>,
    pub card_time: Option<String>,
    pub card_date: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTitleRequest {
    pub itinerary_id: i64,
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateDestinationRequest {
    pub itinerary_id: i64,
    pub destination: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/itineraries/saveItinerary", post(save_itinerary))
        .route("/api/itineraries/myItineraries", get(my_itineraries))
        .route("/api/itineraries/saveItineraryCard", post(save_card))
        .route("/api/itineraries/updateItineraryCard", post(update_card))
        .route(
            "/api/itineraries/itineraryCards/{itinerary_id}",
            get(list_cards),
        )
        .route(
            "/api/itineraries/deleteItineraryCard/{card_id}",
            delete(delete_card),
        )
        .route("/api/itineraries/updateItineraryTitle", post(update_title))
        .route(
            "/api/itineraries/updateItineraryDestination",
            post(update_destination),
        )
        .route(
            "/api/itineraries/deleteItinerary/{itinerary_id}",
            delete(delete_itinerary),
        )
}

// --- Handlers ---

async fn save_itinerary(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<SaveItineraryRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let title = match req.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => DEFAULT_TITLE.to_string(),
    };
    let (date_start, date_end) =
        normalize_date_range(req.date_start.as_deref(), req.date_end.as_deref());

    let itinerary_id = {
        let conn = state.db.get()?;
        conn.execute(
            "INSERT INTO itineraries (user_id, title, destination, collaborative, date_start, date_end)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                title,
                req.destination,
                req.collaborative,
                date_start,
                date_end
            ],
        )?;
        conn.last_insert_rowid()
    };

    Ok(Json(json!({
        "message": "Itinerary saved",
        "itinerary_id": itinerary_id,
    })))
}

async fn my_itineraries(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, destination, collaborative, date_start, date_end
         FROM itineraries WHERE user_id = ?1 ORDER BY id DESC",
    )?;
    let itineraries: Vec<Itinerary> = stmt
        .query_map(params![user.id], |row| {
            Ok(Itinerary {
                id: row.get(0)?,
                user_id: row.get(1)?,
                title: row.get(2)?,
                destination: row.get(3)?,
                collaborative: row.get(4)?,
                date_start: row.get(5)?,
                date_end: row.get(6)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    Ok(Json(json!({ "itineraries": itineraries })))
}

async fn save_card(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(req): Json<SaveCardRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let itinerary_id = req
        .itinerary_id
        .ok_or_else(|| AppError::BadRequest("itinerary_id is required".into()))?;

    let card_id = {
        let conn = state.db.get()?;
        conn.execute(
            "INSERT INTO itinerary_cards
                 (itinerary_id, location_name, location_address, notes, order_index, created_at, card_time, card_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                itinerary_id,
                req.location_name,
                req.location_address,
                req.notes,
                req.order_index,
                Utc::now().to_rfc3339(),
                req.card_time,
                req.card_date
            ],
        )?;
        conn.last_insert_rowid()
    };

    Ok(Json(json!({
        "message": "Card saved",
        "card_id": card_id,
    })))
}

/// Full-field overwrite; there is no partial-patch merge.
async fn update_card(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(req): Json<UpdateCardRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let card_id = req
        .card_id
        .ok_or_else(|| AppError::BadRequest("card_id is required".into()))?;

    let conn = state.db.get()?;
    conn.execute(
        "UPDATE itinerary_cards
         SET location_name = ?1, location_address = ?2, notes = ?3,
             order_index = ?4, card_time = ?5, card_date = ?6
         WHERE id = ?7",
        params![
            req.location_name,
            req.location_address,
            req.notes,
            req.order_index,
            req.card_time,
            req.card_date,
            card_id
        ],
    )?;

    Ok(Json(json!({
        "message": "Card updated",
        "card_id": card_id,
    })))
}

async fn list_cards(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(itinerary_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, itinerary_id, location_name, location_address, notes, order_index,
                created_at, card_time, card_date
         FROM itinerary_cards WHERE itinerary_id = ?1
         ORDER BY card_time ASC",
    )?;
    let cards: Vec<ItineraryCard> = stmt
        .query_map(params![itinerary_id], |row| {
            Ok(ItineraryCard {
                id: row.get(0)?,
                itinerary_id: row.get(1)?,
                location_name: row.get(2)?,
                location_address: row.get(3)?,
                notes: row.get(4)?,
                order_index: row.get(5)?,
                created_at: row.get(6)?,
                card_time: row.get(7)?,
                card_date: row.get(8)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    Ok(Json(json!({ "cards": cards })))
}

/// Removes a card only when its parent itinerary belongs to the requester.
/// A non-matching id/owner pair is a silent no-op, like the other mutations.
async fn delete_card(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(card_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let affected = conn.execute(
        "DELETE FROM itinerary_cards
         WHERE id = ?1
           AND itinerary_id IN (SELECT id FROM itineraries WHERE user_id = ?2)",
        params![card_id, user.id],
    )?;

    if affected == 0 {
        tracing::debug!("Card delete matched no rows: card {} user {}", card_id, user.id);
    }

    Ok(Json(json!({
        "message": "Card deleted",
        "card_id": card_id,
    })))
}

async fn update_title(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateTitleRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    // Zero rows matched is still a 200; the client treats both as settled.
    conn.execute(
        "UPDATE itineraries SET title = ?1 WHERE id = ?2 AND user_id = ?3",
        params![req.title, req.itinerary_id, user.id],
    )?;

    Ok(Json(json!({
        "success": true,
        "message": "Title updated",
    })))
}

async fn update_destination(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateDestinationRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    conn.execute(
        "UPDATE itineraries SET destination = ?1 WHERE id = ?2 AND user_id = ?3",
        params![req.destination, req.itinerary_id, user.id],
    )?;

    Ok(Json(json!({
        "success": true,
        "message": "Destination updated",
    })))
}

/// Deletes the child cards and then the itinerary, owner-scoped, in one
/// transaction so a failure cannot strand orphaned cards.
async fn delete_itinerary(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(itinerary_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    tx.execute(
        "DELETE FROM itinerary_cards
         WHERE itinerary_id IN (SELECT id FROM itineraries WHERE id = ?1 AND user_id = ?2)",
        params![itinerary_id, user.id],
    )?;
    tx.execute(
        "DELETE FROM itineraries WHERE id = ?1 AND user_id = ?2",
        params![itinerary_id, user.id],
    )?;

    tx.commit()?;

    Ok(Json(json!({
        "success": true,
        "message": "Itinerary deleted",
    })))
}

// --- Date normalization ---

/// Normalize a start/end date pair: a reversed pair is swapped, a single
/// date fills both fields, and an absent pair becomes two empty strings.
fn normalize_date_range(start: Option<&str>, end: Option<&str>) -> (String, String) {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());

    match (start, end) {
        (Some(s), Some(e)) if s > e => (e.to_string(), s.to_string()),
        (Some(s), Some(e)) => (s.to_string(), e.to_string()),
        (Some(s), None) => (s.to_string(), s.to_string()),
        (None, Some(e)) => (e.to_string(), e.to_string()),
        (None, None) => (String::new(), String::new()),
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_dates_are_swapped() {
        let (start, end) = normalize_date_range(Some("2026-09-10"), Some("2026-09-01"));
        assert_eq!(start, "2026-09-01");
        assert_eq!(end, "2026-09-10");
    }

    #[test]
    fn ordered_dates_pass_through() {
        let (start, end) = normalize_date_range(Some("2026-09-01"), Some("2026-09-10"));
        assert_eq!(start, "2026-09-01");
        assert_eq!(end, "2026-09-10");
    }

    #[test]
    fn single_start_date_fills_both() {
        let (start, end) = normalize_date_range(Some("2026-09-01"), None);
        assert_eq!(start, "2026-09-01");
        assert_eq!(end, "2026-09-01");
    }

    #[test]
    fn single_end_date_fills_both() {
        let (start, end) = normalize_date_range(None, Some("2026-09-10"));
        assert_eq!(start, "2026-09-10");
        assert_eq!(end, "2026-09-10");
    }

    #[test]
    fn missing_dates_become_empty_strings() {
        let (start, end) = normalize_date_range(None, None);
        assert_eq!(start, "");
        assert_eq!(end, "");
    }

    #[test]
    fn blank_dates_are_treated_as_absent() {
        let (start, end) = normalize_date_range(Some("  "), Some(""));
        assert_eq!(start, "");
        assert_eq!(end, "");

        let (start, end) = normalize_date_range(Some(""), Some("2026-09-10"));
        assert_eq!(start, "2026-09-10");
        assert_eq!(end, "2026-09-10");
    }

    #[test]
    fn equal_dates_are_not_swapped() {
        let (start, end) = normalize_date_range(Some("2026-09-01"), Some("2026-09-01"));
        assert_eq!(start, end);
    }
}
