//! Visit detail, shared by the admin, doctor and patient routes.
//!
//! The caller's identity decides the scope; a visit outside it is
//! reported exactly like a missing one.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::visits::{self, VisitDetail, VisitScope};

/// `GET /{role}/visits/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<VisitDetail>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    let scope = VisitScope::for_identity(&session.identity);
    visits::fetch_visit_detail(&conn, id, scope)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Visit {id} not found")))
}
