use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str =
    "id, first_name, last_name, position, email, login, password_hash";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        position: row.get(3)?,
        email: row.get(4)?,
        login: row.get(5)?,
        password_hash: row.get(6)?,
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &NewDoctor) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (first_name, last_name, position, email, login, password_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            doctor.first_name,
            doctor.last_name,
            doctor.position,
            doctor.email,
            doctor.login,
            doctor.password_hash,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], doctor_from_row).optional()?)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY last_name, first_name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], doctor_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn count_doctors(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?)
}

pub fn count_visits_for_doctor(conn: &Connection, id: i64) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM visits WHERE doctor_id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

/// Returns the number of rows removed (0 when the id is unknown).
pub fn delete_doctor(conn: &Connection, id: i64) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM doctors WHERE id = ?1", params![id])?)
}
