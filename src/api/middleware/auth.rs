//! Session authentication and role gates.
//!
//! `require_session` reads the session cookie, resolves it to a live
//! identity and injects `SessionContext`. The role gates run inside it
//! and reject identities of the wrong role with 403.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{hash_token, session_token, ApiContext, SessionContext};
use crate::auth;
use crate::models::Role;

/// Require a valid session cookie.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = session_token(req.headers()).ok_or(ApiError::Unauthorized)?;
    let token_hash = hash_token(&token);

    let identity_key = ctx
        .core
        .resolve_session(&token_hash)?
        .ok_or(ApiError::Unauthorized)?;

    // Re-read the identity so a deleted account loses access at once
    let identity = {
        let conn = ctx.core.open_db()?;
        auth::load_identity(&conn, &identity_key)?
    };
    let Some(identity) = identity else {
        ctx.core.remove_session(&token_hash)?;
        tracing::info!(identity = %identity_key, "Session dropped: identity no longer exists");
        return Err(ApiError::Unauthorized);
    };

    req.extensions_mut().insert(SessionContext {
        identity,
        token_hash,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}

async fn require_role(role: Role, req: Request<axum::body::Body>, next: Next) -> Response {
    let allowed = req
        .extensions()
        .get::<SessionContext>()
        .map(|s| s.identity.role == role);

    match allowed {
        Some(true) => next.run(req).await,
        Some(false) => ApiError::Forbidden.into_response(),
        None => ApiError::Unauthorized.into_response(),
    }
}

pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Admin, req, next).await
}

pub async fn require_doctor(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Doctor, req, next).await
}

pub async fn require_patient(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Patient, req, next).await
}
