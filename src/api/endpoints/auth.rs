//! Sign-in, sign-out and the identity landing route.
//!
//! - `POST /login` (open): checks credentials, sets the session cookie
//! - `POST /logout` (open): drops the session if any, clears the cookie
//! - `GET /` (session): who am I and where is my dashboard

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{generate_token, hash_token, session_token, ApiContext, SessionContext};
use crate::auth::{self, Identity};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub identity: Identity,
    pub dashboard: &'static str,
}

impl SessionResponse {
    fn for_identity(identity: Identity) -> Self {
        Self {
            dashboard: identity.role.dashboard_path(),
            identity,
        }
    }
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// `POST /login`: authenticate and open a session.
pub async fn login(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    // Password verification is CPU-bound; keep it off the async workers
    let core = ctx.core.clone();
    let identity = tokio::task::spawn_blocking(move || -> Result<Option<Identity>, ApiError> {
        let conn = core.open_db()?;
        Ok(auth::authenticate(&conn, &request.login, &request.password)?)
    })
    .await??
    .ok_or(ApiError::InvalidCredentials)?;

    // A previous session on this client is replaced, never reused
    if let Some(old) = session_token(&headers) {
        ctx.core.remove_session(&hash_token(&old))?;
    }

    let token = generate_token();
    let token_hash = hash_token(&token);
    ctx.core.create_session(token_hash, &identity.key())?;

    let cookie = ctx.session_cookie(&token);
    let session = SessionContext {
        identity: identity.clone(),
        token_hash,
    };
    let mut response =
        ([(SET_COOKIE, cookie)], Json(SessionResponse::for_identity(identity))).into_response();
    // Lets the audit layer attribute the sign-in to the new identity
    response.extensions_mut().insert(session);
    Ok(response)
}

/// `POST /logout`: end the session.
pub async fn logout(State(ctx): State<ApiContext>, headers: HeaderMap) -> Result<Response, ApiError> {
    let logged_out = match session_token(&headers) {
        Some(token) => ctx.core.remove_session(&hash_token(&token))?,
        None => false,
    };
    let cookie = ctx.cleared_cookie();
    Ok(([(SET_COOKIE, cookie)], Json(LogoutResponse { logged_out })).into_response())
}

/// `GET /`: current identity and its dashboard path.
pub async fn index(Extension(session): Extension<SessionContext>) -> Json<SessionResponse> {
    Json(SessionResponse::for_identity(session.identity))
}
