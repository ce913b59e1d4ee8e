//! Doctor endpoints.
//!
//! - `GET /doctor/dashboard`: own visits
//! - `GET /doctor/visits/form`: patients and medicines to choose from
//! - `POST /doctor/visits`: record a visit with prescribed medicines

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::dashboard::{self, DoctorDashboard};
use crate::visits::{self, RecordedVisit, VisitFormOptions, VisitRequest};

pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<DoctorDashboard>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(dashboard::doctor_dashboard(&conn, session.identity.id)?))
}

pub async fn visit_form(State(ctx): State<ApiContext>) -> Result<Json<VisitFormOptions>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(visits::fetch_visit_form_options(&conn)?))
}

/// The visit is always attributed to the signed-in doctor.
pub async fn record_visit(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<VisitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordedVisit>), ApiError> {
    let Json(request) = payload?;
    let mut conn = ctx.core.open_db()?;
    let recorded = visits::record_visit(&mut conn, session.identity.id, &request)?;
    Ok((StatusCode::CREATED, Json(recorded)))
}
