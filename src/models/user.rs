use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// Doctor and patient rows. `password_hash` never leaves the server: it
/// is skipped on serialisation. Admins are only ever read as credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: Option<String>,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Insert payloads carry an already-hashed password.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: Option<String>,
    pub login: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub login: String,
    pub password_hash: String,
}
