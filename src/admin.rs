//! Administration of doctors, patients and medicines.
//!
//! Create operations validate and hash before writing; delete operations
//! refuse to remove rows that visits still reference.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;

use crate::crypto::{self, CryptoError};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Login '{login}' is already used by another {role}")]
    LoginTaken { role: Role, login: String },

    #[error("A medicine named '{0}' already exists")]
    NameTaken(String),

    #[error("{entity} {id} still has {count} visit(s)")]
    HasVisits { entity: &'static str, id: i64, count: i64 },

    #[error("Medicine {id} is prescribed in {count} visit(s)")]
    Prescribed { id: i64, count: i64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Password hashing failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorForm {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    #[serde(default)]
    pub email: Option<String>,
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub side_effects: String,
    #[serde(default)]
    pub usage_method: String,
}

fn required(field: &str, value: &str) -> Result<String, AdminError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdminError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn ensure_login_free(conn: &Connection, role: Role, login: &str) -> Result<(), AdminError> {
    if repository::login_exists(conn, role, login)? {
        return Err(AdminError::LoginTaken {
            role,
            login: login.to_string(),
        });
    }
    Ok(())
}

/// A UNIQUE violation that slipped past the pre-check is still a taken login.
fn login_conflict(err: DatabaseError, role: Role, login: &str) -> AdminError {
    if err.is_constraint_violation() {
        AdminError::LoginTaken {
            role,
            login: login.to_string(),
        }
    } else {
        AdminError::Database(err)
    }
}

// ═══════════════════════════════════════════
// Doctors
// ═══════════════════════════════════════════

pub fn add_doctor(conn: &Connection, form: &DoctorForm) -> Result<i64, AdminError> {
    let first_name = required("first_name", &form.first_name)?;
    let last_name = required("last_name", &form.last_name)?;
    let position = required("position", &form.position)?;
    let login = required("login", &form.login)?;
    if form.password.is_empty() {
        return Err(AdminError::Validation("password is required".into()));
    }
    let email = form
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string);
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(AdminError::Validation(format!("invalid email: {email}")));
        }
    }

    ensure_login_free(conn, Role::Doctor, &login)?;
    let password_hash = crypto::hash_password(&form.password)?;

    let id = repository::insert_doctor(conn, &NewDoctor {
        first_name,
        last_name,
        position,
        email,
        login: login.clone(),
        password_hash,
    })
    .map_err(|e| login_conflict(e, Role::Doctor, &login))?;

    tracing::info!(doctor_id = id, "Doctor added");
    Ok(id)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, AdminError> {
    Ok(repository::list_doctors(conn)?)
}

pub fn delete_doctor(conn: &Connection, id: i64) -> Result<(), AdminError> {
    let count = repository::count_visits_for_doctor(conn, id)?;
    if count > 0 {
        return Err(AdminError::HasVisits { entity: "Doctor", id, count });
    }
    match repository::delete_doctor(conn, id) {
        Ok(0) => Err(AdminError::NotFound { entity: "Doctor", id }),
        Ok(_) => {
            tracing::info!(doctor_id = id, "Doctor deleted");
            Ok(())
        }
        Err(e) if e.is_constraint_violation() => {
            let count = repository::count_visits_for_doctor(conn, id)?;
            Err(AdminError::HasVisits { entity: "Doctor", id, count })
        }
        Err(e) => Err(e.into()),
    }
}

// ═══════════════════════════════════════════
// Patients
// ═══════════════════════════════════════════

pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, AdminError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AdminError::Validation(format!("invalid date_of_birth: {raw}")))
}

pub fn add_patient(conn: &Connection, form: &PatientForm) -> Result<i64, AdminError> {
    let first_name = required("first_name", &form.first_name)?;
    let last_name = required("last_name", &form.last_name)?;
    let login = required("login", &form.login)?;
    if form.password.is_empty() {
        return Err(AdminError::Validation("password is required".into()));
    }
    let gender = Gender::from_str(form.gender.trim())
        .map_err(|_| AdminError::Validation(format!("gender must be M or F, got '{}'", form.gender)))?;
    let date_of_birth = parse_birth_date(&form.date_of_birth)?;

    ensure_login_free(conn, Role::Patient, &login)?;
    let password_hash = crypto::hash_password(&form.password)?;

    let id = repository::insert_patient(conn, &NewPatient {
        first_name,
        last_name,
        gender,
        date_of_birth,
        address: form.address.trim().to_string(),
        login: login.clone(),
        password_hash,
    })
    .map_err(|e| login_conflict(e, Role::Patient, &login))?;

    tracing::info!(patient_id = id, "Patient added");
    Ok(id)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, AdminError> {
    Ok(repository::list_patients(conn)?)
}

pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), AdminError> {
    let count = repository::count_visits_for_patient(conn, id)?;
    if count > 0 {
        return Err(AdminError::HasVisits { entity: "Patient", id, count });
    }
    match repository::delete_patient(conn, id) {
        Ok(0) => Err(AdminError::NotFound { entity: "Patient", id }),
        Ok(_) => {
            tracing::info!(patient_id = id, "Patient deleted");
            Ok(())
        }
        Err(e) if e.is_constraint_violation() => {
            let count = repository::count_visits_for_patient(conn, id)?;
            Err(AdminError::HasVisits { entity: "Patient", id, count })
        }
        Err(e) => Err(e.into()),
    }
}

// ═══════════════════════════════════════════
// Medicines
// ═══════════════════════════════════════════

pub fn add_medicine(conn: &Connection, form: &MedicineForm) -> Result<i64, AdminError> {
    let name = required("name", &form.name)?;
    if repository::medicine_name_exists(conn, &name)? {
        return Err(AdminError::NameTaken(name));
    }

    let id = repository::insert_medicine(conn, &NewMedicine {
        name: name.clone(),
        description: form.description.trim().to_string(),
        side_effects: form.side_effects.trim().to_string(),
        usage_method: form.usage_method.trim().to_string(),
    })
    .map_err(|e| {
        if e.is_constraint_violation() {
            AdminError::NameTaken(name.clone())
        } else {
            AdminError::Database(e)
        }
    })?;

    tracing::info!(medicine_id = id, "Medicine added");
    Ok(id)
}

pub fn list_medicines(conn: &Connection) -> Result<Vec<Medicine>, AdminError> {
    Ok(repository::list_medicines(conn)?)
}

pub fn delete_medicine(conn: &Connection, id: i64) -> Result<(), AdminError> {
    let count = repository::count_prescriptions_for_medicine(conn, id)?;
    if count > 0 {
        return Err(AdminError::Prescribed { id, count });
    }
    match repository::delete_medicine(conn, id)? {
        0 => Err(AdminError::NotFound { entity: "Medicine", id }),
        _ => {
            tracing::info!(medicine_id = id, "Medicine deleted");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use crate::db::sqlite::open_memory_database;

    fn doctor_form(login: &str) -> DoctorForm {
        DoctorForm {
            first_name: "Pavel".into(),
            last_name: "Belov".into(),
            position: "Therapist".into(),
            email: Some("belov@clinic.test".into()),
            login: login.into(),
            password: "doctor123".into(),
        }
    }

    fn patient_form(login: &str) -> PatientForm {
        PatientForm {
            first_name: "Ivan".into(),
            last_name: "Ivanov".into(),
            gender: "M".into(),
            date_of_birth: "1980-02-03".into(),
            address: "Lenina 1".into(),
            login: login.into(),
            password: "password123".into(),
        }
    }

    fn medicine_form(name: &str) -> MedicineForm {
        MedicineForm {
            name: name.into(),
            description: "Analgesic".into(),
            side_effects: "Rare".into(),
            usage_method: "Oral".into(),
        }
    }

    fn add_visit(conn: &Connection, patient_id: i64, doctor_id: i64) -> i64 {
        repository::insert_visit(conn, &NewVisit {
            patient_id,
            doctor_id,
            date: NaiveDateTime::parse_from_str("2025-01-01 10:00", "%Y-%m-%d %H:%M").unwrap(),
            location: "Room".into(),
            symptoms: String::new(),
            diagnosis: String::new(),
            prescriptions: String::new(),
        })
        .unwrap()
    }

    #[test]
    fn add_doctor_hashes_password() {
        let conn = open_memory_database().unwrap();
        let id = add_doctor(&conn, &doctor_form("belov")).unwrap();
        let doctor = repository::get_doctor(&conn, id).unwrap().unwrap();
        assert_ne!(doctor.password_hash, "doctor123");
        assert!(crypto::verify_password("doctor123", &doctor.password_hash).unwrap());
        assert_eq!(doctor.email.as_deref(), Some("belov@clinic.test"));
    }

    #[test]
    fn add_doctor_rejects_duplicate_login() {
        let conn = open_memory_database().unwrap();
        add_doctor(&conn, &doctor_form("belov")).unwrap();
        let err = add_doctor(&conn, &doctor_form("belov")).unwrap_err();
        assert!(matches!(err, AdminError::LoginTaken { role: Role::Doctor, .. }));
        assert_eq!(list_doctors(&conn).unwrap().len(), 1);
    }

    #[test]
    fn same_login_in_other_table_is_allowed() {
        let conn = open_memory_database().unwrap();
        add_doctor(&conn, &doctor_form("shared")).unwrap();
        assert!(add_patient(&conn, &patient_form("shared")).is_ok());
    }

    #[test]
    fn add_doctor_validates_fields() {
        let conn = open_memory_database().unwrap();
        let mut form = doctor_form("x");
        form.position = "   ".into();
        assert!(matches!(add_doctor(&conn, &form), Err(AdminError::Validation(_))));

        let mut form = doctor_form("x");
        form.email = Some("not-an-email".into());
        assert!(matches!(add_doctor(&conn, &form), Err(AdminError::Validation(_))));

        let mut form = doctor_form("x");
        form.email = Some("  ".into());
        let id = add_doctor(&conn, &form).unwrap();
        assert!(repository::get_doctor(&conn, id).unwrap().unwrap().email.is_none());
    }

    #[test]
    fn add_patient_parses_gender_and_birth_date() {
        let conn = open_memory_database().unwrap();
        let id = add_patient(&conn, &patient_form("ivanov")).unwrap();
        let patient = repository::get_patient(&conn, id).unwrap().unwrap();
        assert_eq!(patient.gender, Gender::Male);
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1980, 2, 3).unwrap());
    }

    #[test]
    fn add_patient_rejects_bad_input() {
        let conn = open_memory_database().unwrap();
        let mut form = patient_form("p");
        form.gender = "X".into();
        assert!(matches!(add_patient(&conn, &form), Err(AdminError::Validation(_))));

        let mut form = patient_form("p");
        form.date_of_birth = "03.02.1980".into();
        assert!(matches!(add_patient(&conn, &form), Err(AdminError::Validation(_))));

        let mut form = patient_form("p");
        form.password = String::new();
        assert!(matches!(add_patient(&conn, &form), Err(AdminError::Validation(_))));

        add_patient(&conn, &patient_form("p")).unwrap();
        assert!(matches!(
            add_patient(&conn, &patient_form("p")),
            Err(AdminError::LoginTaken { role: Role::Patient, .. })
        ));
    }

    #[test]
    fn delete_doctor_with_visits_rejected() {
        let conn = open_memory_database().unwrap();
        let doc = add_doctor(&conn, &doctor_form("belov")).unwrap();
        let pat = add_patient(&conn, &patient_form("ivanov")).unwrap();
        add_visit(&conn, pat, doc);

        let err = delete_doctor(&conn, doc).unwrap_err();
        assert!(matches!(err, AdminError::HasVisits { count: 1, .. }));
        let err = delete_patient(&conn, pat).unwrap_err();
        assert!(matches!(err, AdminError::HasVisits { entity: "Patient", .. }));
        assert!(repository::get_doctor(&conn, doc).unwrap().is_some());
    }

    #[test]
    fn delete_without_visits_succeeds() {
        let conn = open_memory_database().unwrap();
        let doc = add_doctor(&conn, &doctor_form("belov")).unwrap();
        let pat = add_patient(&conn, &patient_form("ivanov")).unwrap();
        delete_doctor(&conn, doc).unwrap();
        delete_patient(&conn, pat).unwrap();
        assert!(list_doctors(&conn).unwrap().is_empty());
        assert!(list_patients(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_ids_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(delete_doctor(&conn, 5), Err(AdminError::NotFound { entity: "Doctor", id: 5 })));
        assert!(matches!(delete_patient(&conn, 5), Err(AdminError::NotFound { .. })));
        assert!(matches!(delete_medicine(&conn, 5), Err(AdminError::NotFound { .. })));
    }

    #[test]
    fn medicine_names_unique() {
        let conn = open_memory_database().unwrap();
        add_medicine(&conn, &medicine_form("Paracetamol")).unwrap();
        assert!(matches!(
            add_medicine(&conn, &medicine_form(" Paracetamol ")),
            Err(AdminError::NameTaken(_))
        ));
        assert!(matches!(add_medicine(&conn, &medicine_form("")), Err(AdminError::Validation(_))));
    }

    #[test]
    fn prescribed_medicine_cannot_be_deleted() {
        let conn = open_memory_database().unwrap();
        let doc = add_doctor(&conn, &doctor_form("belov")).unwrap();
        let pat = add_patient(&conn, &patient_form("ivanov")).unwrap();
        let med = add_medicine(&conn, &medicine_form("Aspirin")).unwrap();
        let unused = add_medicine(&conn, &medicine_form("Ibuprofen")).unwrap();
        let visit = add_visit(&conn, pat, doc);
        repository::insert_visit_medicine(&conn, visit, med, "daily").unwrap();

        assert!(matches!(delete_medicine(&conn, med), Err(AdminError::Prescribed { count: 1, .. })));
        delete_medicine(&conn, unused).unwrap();
        let names: Vec<String> = list_medicines(&conn).unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Aspirin"]);
    }
}
