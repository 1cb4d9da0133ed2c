use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::{self, sessions};
use crate::error::AppError;
use crate::state::AppState;

pub const COOKIE_NAME: &str = "sid";

/// Sessions are stored by keyed digest, never by raw token.
pub fn token_digest(secret: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub async fn start(state: &AppState, user_id: i64, jar: CookieJar) -> Result<CookieJar, AppError> {
    let token = Uuid::new_v4().simple().to_string();
    let digest = token_digest(&state.config.session_secret, &token);
    let expires_at = db::timestamp(Utc::now() + Duration::hours(state.config.session_ttl_hours));

    sessions::insert_session(&state.db, &digest, user_id, &expires_at).await?;

    let cookie = Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok(jar.add(cookie))
}

pub async fn end(state: &AppState, jar: CookieJar) -> Result<CookieJar, AppError> {
    if let Some(cookie) = jar.get(COOKIE_NAME) {
        let digest = token_digest(&state.config.session_secret, cookie.value());
        sessions::delete_session(&state.db, &digest).await?;
    }
    Ok(jar.remove(Cookie::build(COOKIE_NAME).path("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_depends_on_secret() {
        let a = token_digest("one", "token");
        let b = token_digest("two", "token");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, token_digest("one", "token"));
    }
}
