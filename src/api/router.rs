//! Clinic HTTP router.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! 1. Session validator → 2. Audit logger → 3. Role gate

use std::sync::Arc;

use axum::http::header::ALLOW;
use axum::http::{StatusCode, Uri};
use axum::middleware::{from_fn, map_response};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn clinic_router(core: Arc<CoreState>, cookie_secure: bool) -> Router {
    build_router(ApiContext::new(core, cookie_secure))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let admin = Router::new()
        .route("/dashboard", get(endpoints::admin::dashboard))
        .route("/visits/:id", get(endpoints::visits::detail))
        .route(
            "/doctors",
            get(endpoints::admin::list_doctors).post(endpoints::admin::add_doctor),
        )
        .route("/doctors/:id/delete", post(endpoints::admin::delete_doctor))
        .route(
            "/patients",
            get(endpoints::admin::list_patients).post(endpoints::admin::add_patient),
        )
        .route("/patients/:id/delete", post(endpoints::admin::delete_patient))
        .route(
            "/medicines",
            get(endpoints::admin::list_medicines).post(endpoints::admin::add_medicine),
        )
        .route("/medicines/:id/delete", post(endpoints::admin::delete_medicine))
        .with_state(ctx.clone())
        .layer(from_fn(middleware::auth::require_admin));

    let doctor = Router::new()
        .route("/dashboard", get(endpoints::doctor::dashboard))
        .route("/visits/form", get(endpoints::doctor::visit_form))
        .route("/visits", post(endpoints::doctor::record_visit))
        .route("/visits/:id", get(endpoints::visits::detail))
        .with_state(ctx.clone())
        .layer(from_fn(middleware::auth::require_doctor));

    let patient = Router::new()
        .route("/dashboard", get(endpoints::patient::dashboard))
        .route("/visits/:id", get(endpoints::visits::detail))
        .with_state(ctx.clone())
        .layer(from_fn(middleware::auth::require_patient));

    // Layers are applied from bottom (innermost) to top (outermost).
    // Extension must be outermost so all middleware can access ApiContext.
    let protected = Router::new()
        .route("/", get(endpoints::auth::index))
        .nest("/admin", admin)
        .nest("/doctor", doctor)
        .nest("/patient", patient)
        .layer(from_fn(middleware::audit::log_access))
        .layer(from_fn(middleware::auth::require_session))
        .layer(Extension(ctx.clone()));

    let sign_in = Router::new()
        .route("/login", post(endpoints::auth::login))
        .route("/logout", post(endpoints::auth::logout))
        .with_state(ctx.clone())
        .layer(from_fn(middleware::audit::log_access))
        .layer(Extension(ctx.clone()));

    // Probes are not audited
    let health = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .merge(health)
        .merge(sign_in)
        .merge(protected)
        .fallback(not_found)
        .layer(map_response(json_method_not_allowed))
        .layer(TraceLayer::new_for_http())
}

/// Give axum's bare 405 the same JSON body as every other error,
/// keeping its `Allow` header.
async fn json_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow = response.headers().get(ALLOW).cloned();
    let mut json = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        json.headers_mut().insert(ALLOW, allow);
    }
    json
}

/// Unknown paths get a JSON 404 without touching the session layers.
async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
