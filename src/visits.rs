//! Visit recording and visit detail.
//!
//! Recording writes one `visits` row plus one `visit_medicines` row per
//! non-empty medicine id inside a single transaction. Detail views are
//! scoped by role: admins see every visit, doctors and patients only
//! their own.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;

/// Accepted visit timestamp layouts; the first is what an HTML
/// `datetime-local` input submits.
const VISIT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

// ═══════════════════════════════════════════
// Request / view types
// ═══════════════════════════════════════════

/// A medicine id as submitted by a form: numeric, text, or blank.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MedicineField {
    Id(i64),
    Text(String),
}

impl MedicineField {
    /// `Ok(None)` for a blank entry, which is skipped.
    fn resolve(&self) -> Result<Option<i64>, VisitError> {
        match self {
            Self::Id(id) => Ok(Some(*id)),
            Self::Text(s) if s.trim().is_empty() => Ok(None),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| VisitError::Validation(format!("invalid medicine id: {s}"))),
        }
    }
}

/// Visit submitted by a doctor. `medicines` and `instructions` are
/// parallel arrays, paired by position.
#[derive(Debug, Clone, Deserialize)]
pub struct VisitRequest {
    pub patient_id: i64,
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub prescriptions: String,
    #[serde(default)]
    pub medicines: Vec<MedicineField>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedVisit {
    pub visit_id: i64,
    pub medicine_count: usize,
}

/// Medicine prescribed during a visit, joined with its catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescribedMedicine {
    pub medicine_id: i64,
    pub name: String,
    pub description: String,
    pub side_effects: String,
    pub usage_method: String,
    pub doctor_instructions: String,
}

/// Full visit view. Patient demographics are omitted from the
/// patient's own view.
#[derive(Debug, Clone, Serialize)]
pub struct VisitDetail {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDateTime,
    pub location: String,
    pub symptoms: String,
    pub diagnosis: String,
    pub prescriptions: String,
    pub patient_first_name: String,
    pub patient_last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub doctor_first_name: String,
    pub doctor_last_name: String,
    pub position: String,
    pub medicines: Vec<PrescribedMedicine>,
}

/// Which visits a caller may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitScope {
    All,
    Doctor(i64),
    Patient(i64),
}

impl VisitScope {
    pub fn for_identity(identity: &Identity) -> Self {
        match identity.role {
            Role::Admin => Self::All,
            Role::Doctor => Self::Doctor(identity.id),
            Role::Patient => Self::Patient(identity.id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientOption {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MedicineOption {
    pub id: i64,
    pub name: String,
}

/// Choices offered on the visit form.
#[derive(Debug, Clone, Serialize)]
pub struct VisitFormOptions {
    pub patients: Vec<PatientOption>,
    pub medicines: Vec<MedicineOption>,
}

#[derive(Debug, thiserror::Error)]
pub enum VisitError {
    #[error("Invalid visit: {0}")]
    Validation(String),
    #[error("Patient {0} not found")]
    PatientNotFound(i64),
    #[error("Medicine {0} not found")]
    MedicineNotFound(i64),
    #[error("Medicine {0} listed more than once")]
    DuplicateMedicine(i64),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for VisitError {
    fn from(err: rusqlite::Error) -> Self {
        VisitError::Database(DatabaseError::from(err))
    }
}

// ═══════════════════════════════════════════
// Recording
// ═══════════════════════════════════════════

pub fn parse_visit_date(raw: &str) -> Result<NaiveDateTime, VisitError> {
    let raw = raw.trim();
    VISIT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| VisitError::Validation(format!("unrecognised date: {raw}")))
}

/// Pair medicine ids with instructions, dropping blank ids.
///
/// Pairs stop at the shorter of the two arrays.
fn medicine_pairs(request: &VisitRequest) -> Result<Vec<(i64, String)>, VisitError> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for (field, instruction) in request.medicines.iter().zip(request.instructions.iter()) {
        let Some(medicine_id) = field.resolve()? else {
            continue;
        };
        if !seen.insert(medicine_id) {
            return Err(VisitError::DuplicateMedicine(medicine_id));
        }
        pairs.push((medicine_id, instruction.trim().to_string()));
    }
    Ok(pairs)
}

/// Record a visit for `doctor_id` with its prescribed medicines.
///
/// All rows are written in one transaction; any failure leaves the
/// database untouched.
pub fn record_visit(
    conn: &mut Connection,
    doctor_id: i64,
    request: &VisitRequest,
) -> Result<RecordedVisit, VisitError> {
    let date = parse_visit_date(&request.date)?;
    let pairs = medicine_pairs(request)?;

    let tx = conn.transaction()?;

    if !repository::patient_exists(&tx, request.patient_id)? {
        return Err(VisitError::PatientNotFound(request.patient_id));
    }

    let visit_id = repository::insert_visit(&tx, &NewVisit {
        patient_id: request.patient_id,
        doctor_id,
        date,
        location: request.location.trim().to_string(),
        symptoms: request.symptoms.trim().to_string(),
        diagnosis: request.diagnosis.trim().to_string(),
        prescriptions: request.prescriptions.trim().to_string(),
    })?;

    for (medicine_id, instruction) in &pairs {
        if repository::get_medicine(&tx, *medicine_id)?.is_none() {
            return Err(VisitError::MedicineNotFound(*medicine_id));
        }
        repository::insert_visit_medicine(&tx, visit_id, *medicine_id, instruction)?;
    }

    tx.commit()?;

    tracing::info!(
        visit_id,
        doctor_id,
        patient_id = request.patient_id,
        medicines = pairs.len(),
        "Visit recorded"
    );

    Ok(RecordedVisit {
        visit_id,
        medicine_count: pairs.len(),
    })
}

// ═══════════════════════════════════════════
// Reading
// ═══════════════════════════════════════════

/// Fetch one visit if it falls inside `scope`.
pub fn fetch_visit_detail(
    conn: &Connection,
    visit_id: i64,
    scope: VisitScope,
) -> Result<Option<VisitDetail>, DatabaseError> {
    let (doctor_filter, patient_filter) = match scope {
        VisitScope::All => (None, None),
        VisitScope::Doctor(id) => (Some(id), None),
        VisitScope::Patient(id) => (None, Some(id)),
    };

    let mut stmt = conn.prepare(
        "SELECT v.id, v.patient_id, v.doctor_id, v.date, v.location, v.symptoms,
                v.diagnosis, v.prescriptions,
                p.first_name, p.last_name, p.date_of_birth, p.gender, p.address,
                d.first_name, d.last_name, d.position
         FROM visits v
         JOIN patients p ON p.id = v.patient_id
         JOIN doctors d ON d.id = v.doctor_id
         WHERE v.id = ?1
           AND (?2 IS NULL OR v.doctor_id = ?2)
           AND (?3 IS NULL OR v.patient_id = ?3)",
    )?;

    let mut rows = stmt.query(params![visit_id, doctor_filter, patient_filter])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let gender: String = row.get(11)?;
    let mut detail = VisitDetail {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        location: row.get(4)?,
        symptoms: row.get(5)?,
        diagnosis: row.get(6)?,
        prescriptions: row.get(7)?,
        patient_first_name: row.get(8)?,
        patient_last_name: row.get(9)?,
        date_of_birth: Some(row.get(10)?),
        gender: Some(gender.parse::<Gender>()?),
        address: Some(row.get(12)?),
        doctor_first_name: row.get(13)?,
        doctor_last_name: row.get(14)?,
        position: row.get(15)?,
        medicines: Vec::new(),
    };

    if matches!(scope, VisitScope::Patient(_)) {
        detail.date_of_birth = None;
        detail.gender = None;
        detail.address = None;
    }

    detail.medicines = fetch_prescribed_medicines(conn, visit_id)?;
    Ok(Some(detail))
}

pub fn fetch_prescribed_medicines(
    conn: &Connection,
    visit_id: i64,
) -> Result<Vec<PrescribedMedicine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.name, m.description, m.side_effects, m.usage_method, vm.doctor_instructions
         FROM visit_medicines vm
         JOIN medicines m ON m.id = vm.medicine_id
         WHERE vm.visit_id = ?1
         ORDER BY vm.id",
    )?;
    let rows = stmt.query_map(params![visit_id], |row| {
        Ok(PrescribedMedicine {
            medicine_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            side_effects: row.get(3)?,
            usage_method: row.get(4)?,
            doctor_instructions: row.get(5)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn fetch_visit_form_options(conn: &Connection) -> Result<VisitFormOptions, DatabaseError> {
    let patients = repository::list_patients(conn)?
        .into_iter()
        .map(|p| PatientOption {
            id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
        })
        .collect();
    let medicines = repository::list_medicines(conn)?
        .into_iter()
        .map(|m| MedicineOption { id: m.id, name: m.name })
        .collect();
    Ok(VisitFormOptions { patients, medicines })
}
