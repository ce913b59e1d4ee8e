//! Admin endpoints: clinic-wide dashboard and management of doctors,
//! patients and medicines.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::admin::{self, DoctorForm, MedicineForm, PatientForm};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{self, AdminDashboard};
use crate::models::{Doctor, Medicine, Patient};

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub id: i64,
    pub deleted: bool,
}

type Created = (StatusCode, Json<CreatedResponse>);

fn created(id: i64) -> Created {
    (StatusCode::CREATED, Json(CreatedResponse { id }))
}

fn deleted(id: i64) -> Json<DeletedResponse> {
    Json(DeletedResponse { id, deleted: true })
}

/// `GET /admin/dashboard`: every visit plus clinic totals.
pub async fn dashboard(State(ctx): State<ApiContext>) -> Result<Json<AdminDashboard>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(dashboard::admin_dashboard(&conn)?))
}

// ── Doctors ─────────────────────────────────────────────────

pub async fn list_doctors(State(ctx): State<ApiContext>) -> Result<Json<Vec<Doctor>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(admin::list_doctors(&conn)?))
}

pub async fn add_doctor(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DoctorForm>, JsonRejection>,
) -> Result<Created, ApiError> {
    let Json(form) = payload?;
    let core = ctx.core.clone();
    let id = tokio::task::spawn_blocking(move || -> Result<i64, ApiError> {
        let conn = core.open_db()?;
        Ok(admin::add_doctor(&conn, &form)?)
    })
    .await??;
    Ok(created(id))
}

pub async fn delete_doctor(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    admin::delete_doctor(&conn, id)?;
    Ok(deleted(id))
}

// ── Patients ────────────────────────────────────────────────

pub async fn list_patients(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(admin::list_patients(&conn)?))
}

pub async fn add_patient(
    State(ctx): State<ApiContext>,
    payload: Result<Json<PatientForm>, JsonRejection>,
) -> Result<Created, ApiError> {
    let Json(form) = payload?;
    let core = ctx.core.clone();
    let id = tokio::task::spawn_blocking(move || -> Result<i64, ApiError> {
        let conn = core.open_db()?;
        Ok(admin::add_patient(&conn, &form)?)
    })
    .await??;
    Ok(created(id))
}

pub async fn delete_patient(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    admin::delete_patient(&conn, id)?;
    Ok(deleted(id))
}

// ── Medicines ───────────────────────────────────────────────

pub async fn list_medicines(State(ctx): State<ApiContext>) -> Result<Json<Vec<Medicine>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(admin::list_medicines(&conn)?))
}

pub async fn add_medicine(
    State(ctx): State<ApiContext>,
    payload: Result<Json<MedicineForm>, JsonRejection>,
) -> Result<Created, ApiError> {
    let Json(form) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(created(admin::add_medicine(&conn, &form)?))
}

pub async fn delete_medicine(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    admin::delete_medicine(&conn, id)?;
    Ok(deleted(id))
}
