use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    Ok(Visit {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        location: row.get(4)?,
        symptoms: row.get(5)?,
        diagnosis: row.get(6)?,
        prescriptions: row.get(7)?,
    })
}

pub fn insert_visit(conn: &Connection, visit: &NewVisit) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO visits (patient_id, doctor_id, date, location, symptoms, diagnosis, prescriptions)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            visit.patient_id,
            visit.doctor_id,
            visit.date,
            visit.location,
            visit.symptoms,
            visit.diagnosis,
            visit.prescriptions,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_visit(conn: &Connection, id: i64) -> Result<Option<Visit>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, patient_id, doctor_id, date, location, symptoms, diagnosis, prescriptions
             FROM visits WHERE id = ?1",
            params![id],
            visit_from_row,
        )
        .optional()?)
}

pub fn count_visits(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))?)
}

pub fn insert_visit_medicine(
    conn: &Connection,
    visit_id: i64,
    medicine_id: i64,
    doctor_instructions: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO visit_medicines (visit_id, medicine_id, doctor_instructions)
         VALUES (?1, ?2, ?3)",
        params![visit_id, medicine_id, doctor_instructions],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_visit_medicines(conn: &Connection, visit_id: i64) -> Result<Vec<VisitMedicine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, visit_id, medicine_id, doctor_instructions
         FROM visit_medicines WHERE visit_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![visit_id], |row| {
        Ok(VisitMedicine {
            id: row.get(0)?,
            visit_id: row.get(1)?,
            medicine_id: row.get(2)?,
            doctor_instructions: row.get(3)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
