use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str =
    "id, first_name, last_name, gender, date_of_birth, address, login, password_hash";

/// Intermediate row so the gender string can be validated outside the
/// rusqlite closure.
struct PatientRow {
    id: i64,
    first_name: String,
    last_name: String,
    gender: String,
    date_of_birth: chrono::NaiveDate,
    address: String,
    login: String,
    password_hash: String,
}

fn patient_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        gender: row.get(3)?,
        date_of_birth: row.get(4)?,
        address: row.get(5)?,
        login: row.get(6)?,
        password_hash: row.get(7)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        gender: Gender::from_str(&row.gender)?,
        date_of_birth: row.date_of_birth,
        address: row.address,
        login: row.login,
        password_hash: row.password_hash,
    })
}

pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (first_name, last_name, gender, date_of_birth, address, login, password_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient.first_name,
            patient.last_name,
            patient.gender.as_str(),
            patient.date_of_birth,
            patient.address,
            patient.login,
            patient.password_hash,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    match conn.query_row(&sql, params![id], patient_row).optional()? {
        Some(row) => Ok(Some(patient_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name, first_name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], patient_row)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?)
}

pub fn patient_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?)
}

pub fn count_visits_for_patient(conn: &Connection, id: i64) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM visits WHERE patient_id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

/// Returns the number of rows removed (0 when the id is unknown).
pub fn delete_patient(conn: &Connection, id: i64) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?)
}
