use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Claims carried in the session cookie. Signed locally with HS256; there is
/// no server-side session row, so expiry is the only revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a session token for a verified user, valid for `days`.
pub fn issue_session(secret: &[u8], user_id: &str, name: &str, days: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        name: name.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::days(days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
}

/// Verify a session token's signature and expiry. Any failure is treated as
/// an unauthenticated request.
pub fn verify_session(secret: &[u8], token: &str) -> AppResult<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Load the signing secret from the data dir, or generate and persist a new
/// one so sessions survive restarts.
pub fn load_or_create_secret(data_dir: &Path) -> anyhow::Result<Vec<u8>> {
    let path = data_dir.join("session.key");

    if path.exists() {
        let encoded = fs::read_to_string(&path)?;
        Ok(hex::decode(encoded.trim())?)
    } else {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        fs::write(&path, hex::encode(secret))?;
        tracing::info!("Generated new session signing key");
        Ok(secret.to_vec())
    }
}
