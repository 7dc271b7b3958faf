use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub post_name: String,
    pub user_id: Option<String>,
    pub likes: i64,
    pub location: Option<String>,
    pub tags: Option<String>,
    pub bookmark_folder: Option<String>,
    pub itinerary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    /// "image" or "video", derived from the MIME prefix at upload time.
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: Option<String>,
    /// Base64-encoded payload in responses.
    pub data: String,
    pub created_at: String,
    pub post_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_country: String,
    pub user_bio: String,
    pub user_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: i64,
    pub user_id: String,
    pub title: Option<String>,
    pub destination: Option<String>,
    pub collaborative: bool,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryCard {
    pub id: i64,
    pub itinerary_id: i64,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub notes: Option<String>,
    pub order_index: Option<i64>,
    pub created_at: String,
    pub card_time: Option<String>,
    pub card_date: Option<String>,
}
