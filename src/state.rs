use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::google::IdentityVerifier;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    /// HS256 key for session tokens, persisted under the data dir.
    pub session_secret: Arc<Vec<u8>>,
    pub verifier: Arc<dyn IdentityVerifier>,
}
