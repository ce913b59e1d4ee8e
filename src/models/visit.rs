use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single patient-doctor encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDateTime,
    pub location: String,
    pub symptoms: String,
    pub diagnosis: String,
    pub prescriptions: String,
}

#[derive(Debug, Clone)]
pub struct NewVisit {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDateTime,
    pub location: String,
    pub symptoms: String,
    pub diagnosis: String,
    pub prescriptions: String,
}

/// A medicine prescribed during a visit, with the doctor's instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitMedicine {
    pub id: i64,
    pub visit_id: i64,
    pub medicine_id: i64,
    pub doctor_instructions: String,
}
