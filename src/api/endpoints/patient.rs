//! Patient endpoints.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionContext};
use crate::dashboard::{self, PatientDashboard};

/// `GET /patient/dashboard`: own visits, newest first.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<PatientDashboard>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(dashboard::patient_dashboard(&conn, session.identity.id)?))
}
