//! Audit logging middleware.
//!
//! Logs every request with the caller's identity key, method, path and
//! response status. On protected routes it runs inside `require_session`
//! so `SessionContext` is available; `POST /login` puts the new session
//! on the response instead.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::{ApiContext, SessionContext};
use crate::core_state::AccessSource;

/// Log API access for audit trail.
/// Accesses `ApiContext` from request extensions.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let ctx = req.extensions().get::<ApiContext>().cloned();

    let caller = req.extensions().get::<SessionContext>().map(|s| s.identity.key());

    let response = next.run(req).await;

    // A successful sign-in carries the new session on the response
    let source = caller
        .or_else(|| {
            response
                .extensions()
                .get::<SessionContext>()
                .map(|s| s.identity.key())
        })
        .map(|identity_key| AccessSource::User { identity_key })
        .unwrap_or(AccessSource::Anonymous);

    if let Some(ctx) = ctx {
        let status = response.status().as_u16();
        ctx.core
            .log_access(source, &format!("{method} {path}"), &format!("status:{status}"));
    }

    response
}
