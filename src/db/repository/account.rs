use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

/// Stored credentials for one identity row.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
}

/// Look up a login in the identity table backing `role`.
pub fn find_credentials(
    conn: &Connection,
    role: Role,
    login: &str,
) -> Result<Option<StoredCredentials>, DatabaseError> {
    let sql = format!(
        "SELECT id, login, password_hash FROM {} WHERE login = ?1",
        role.table()
    );
    let found = conn
        .query_row(&sql, params![login], |row| {
            Ok(StoredCredentials {
                id: row.get(0)?,
                login: row.get(1)?,
                password_hash: row.get(2)?,
            })
        })
        .optional()?;
    Ok(found)
}

/// Fetch the login of identity `id` in the table backing `role`.
pub fn find_login_by_id(
    conn: &Connection,
    role: Role,
    id: i64,
) -> Result<Option<String>, DatabaseError> {
    let sql = format!("SELECT login FROM {} WHERE id = ?1", role.table());
    let login = conn
        .query_row(&sql, params![id], |row| row.get(0))
        .optional()?;
    Ok(login)
}

/// Whether `login` is already taken in the table backing `role`.
pub fn login_exists(conn: &Connection, role: Role, login: &str) -> Result<bool, DatabaseError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE login = ?1)", role.table());
    let exists: bool = conn.query_row(&sql, params![login], |row| row.get(0))?;
    Ok(exists)
}

pub fn insert_admin(conn: &Connection, login: &str, password_hash: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO admins (login, password_hash) VALUES (?1, ?2)",
        params![login, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_admins(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?)
}
