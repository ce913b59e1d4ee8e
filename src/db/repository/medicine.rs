use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn medicine_from_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        side_effects: row.get(3)?,
        usage_method: row.get(4)?,
    })
}

pub fn insert_medicine(conn: &Connection, medicine: &NewMedicine) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (name, description, side_effects, usage_method)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            medicine.name,
            medicine.description,
            medicine.side_effects,
            medicine.usage_method,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medicine(conn: &Connection, id: i64) -> Result<Option<Medicine>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, name, description, side_effects, usage_method FROM medicines WHERE id = ?1",
            params![id],
            medicine_from_row,
        )
        .optional()?)
}

pub fn list_medicines(conn: &Connection) -> Result<Vec<Medicine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, side_effects, usage_method FROM medicines ORDER BY name",
    )?;
    let rows = stmt.query_map([], medicine_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn medicine_name_exists(conn: &Connection, name: &str) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM medicines WHERE name = ?1)",
        params![name],
        |row| row.get(0),
    )?)
}

pub fn count_prescriptions_for_medicine(conn: &Connection, id: i64) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM visit_medicines WHERE medicine_id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

/// Returns the number of rows removed (0 when the id is unknown).
pub fn delete_medicine(conn: &Connection, id: i64) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM medicines WHERE id = ?1", params![id])?)
}
