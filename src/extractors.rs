use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::auth::session;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
}

/// Extractor that requires authentication.
/// Returns 401 if the session cookie is missing, malformed, or expired.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(parts, &state.config.auth.cookie_name)
            .ok_or(AppError::Unauthorized)?;

        let claims = session::verify_session(&state.session_secret, token)?;

        Ok(CurrentUser {
            id: claims.sub,
            name: claims.name,
        })
    }
}

fn extract_session_token<'a>(parts: &'a Parts, cookie_name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == cookie_name {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn extracts_named_cookie() {
        let parts = parts_with_cookie("other=x; waypost_session=abc123");
        assert_eq!(
            extract_session_token(&parts, "waypost_session"),
            Some("abc123")
        );
    }

    #[test]
    fn missing_cookie_yields_none() {
        let parts = parts_with_cookie("other=x");
        assert_eq!(extract_session_token(&parts, "waypost_session"), None);
    }

    #[test]
    fn trims_whitespace_around_pairs() {
        let parts = parts_with_cookie("  waypost_session = abc123 ");
        assert_eq!(
            extract_session_token(&parts, "waypost_session"),
            Some("abc123")
        );
    }
}
