use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity extracted from a verified external token.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub name: String,
}

/// Seam between the login handler and the external identity provider.
/// Production uses [`GoogleVerifier`]; tests substitute a stub.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> AppResult<VerifiedIdentity>;
}

/// Verifies Google-issued ID tokens against Google's published JWKS.
pub struct GoogleVerifier {
    client_id: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Deserialize)]
struct GoogleClaims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl GoogleVerifier {
    pub fn new(client_id: String) -> Self {
        Self {
            client_id,
            http: reqwest::Client::new(),
        }
    }

    async fn fetch_jwks(&self) -> AppResult<Jwks> {
        self.http
            .get(GOOGLE_CERTS_URL)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch Google certs: {}", e)))?
            .json::<Jwks>()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse Google certs: {}", e)))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, token: &str) -> AppResult<VerifiedIdentity> {
        let header = decode_header(token).map_err(|_| AppError::Unauthorized)?;
        let kid = header.kid.ok_or(AppError::Unauthorized)?;

        // The key set rotates, so it is fetched per login rather than cached.
        let jwks = self.fetch_jwks().await?;
        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.kid == kid)
            .ok_or(AppError::Unauthorized)?;

        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AppError::Internal(format!("Invalid JWKS key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data =
            decode::<GoogleClaims>(token, &key, &validation).map_err(|_| AppError::Unauthorized)?;

        let name = data
            .claims
            .name
            .or(data.claims.email)
            .unwrap_or_else(|| "Traveler".to_string());

        Ok(VerifiedIdentity {
            subject: data.claims.sub,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_token_is_unauthorized() {
        let verifier = GoogleVerifier::new("client-id".to_string());
        let result = verifier.verify("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn token_without_kid_is_unauthorized() {
        // HS256 token signed locally has no kid header
        let token = crate::auth::session::issue_session(b"secret", "sub", "name", 1).unwrap();
        let verifier = GoogleVerifier::new("client-id".to_string());
        let result = verifier.verify(&token).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
