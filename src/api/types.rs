//! Shared types for the HTTP layer: request context, session cookie
//! handling and token helpers.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

use crate::auth::Identity;
use crate::core_state::CoreState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "clinic_session";

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    /// Add the `Secure` attribute to session cookies.
    pub cookie_secure: bool,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>, cookie_secure: bool) -> Self {
        Self { core, cookie_secure }
    }

    /// `Set-Cookie` value for a fresh session.
    pub fn session_cookie(&self, token: &str) -> String {
        build_cookie(token, self.core.session_ttl(), self.cookie_secure)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn cleared_cookie(&self) -> String {
        build_cookie("", Duration::ZERO, self.cookie_secure)
    }
}

// ═══════════════════════════════════════════════════════════
// Session context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Signed-in user, injected into request extensions by
/// `require_session` after the token and identity both check out.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub identity: Identity,
    pub token_hash: [u8; 32],
}

// ═══════════════════════════════════════════════════════════
// Tokens and cookies
// ═══════════════════════════════════════════════════════════

/// Hash a session token using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random session token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Extract the session token from the `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn build_cookie(value: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_is_urlsafe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn session_token_found_among_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; clinic_session=tok123; lang=ru"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn session_token_across_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("clinic_session=xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_or_empty_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());
        headers.insert(COOKIE, HeaderValue::from_static("clinic_session="));
        assert!(session_token(&headers).is_none());
        headers.insert(COOKIE, HeaderValue::from_static("clinic_session_old=abc"));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let plain = build_cookie("t", Duration::from_secs(60), false);
        assert_eq!(plain, "clinic_session=t; Path=/; HttpOnly; SameSite=Lax; Max-Age=60");
        let secure = build_cookie("", Duration::ZERO, true);
        assert!(secure.contains("Max-Age=0"));
        assert!(secure.ends_with("; Secure"));
    }
}
