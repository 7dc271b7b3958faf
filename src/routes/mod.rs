pub mod auth;
pub mod bookmarks;
pub mod itineraries;
pub mod posts;
pub mod users;
