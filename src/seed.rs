//! Demo data for a freshly created database.
//!
//! Seeding only runs against an empty clinic (no admins); an existing
//! database is never touched.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::crypto::{self, CryptoError};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Password hashing failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Invalid seed date: {0}")]
    Date(String),
}

impl From<rusqlite::Error> for SeedError {
    fn from(err: rusqlite::Error) -> Self {
        SeedError::Database(DatabaseError::from(err))
    }
}

const DOCTORS: &[(&str, &str, &str, &str, &str)] = &[
    // first, last, position, login, email
    ("Pavel", "Belov", "Therapist", "belov", "belov@clinic.local"),
    ("Olga", "Smirnova", "Cardiologist", "smirnova", "smirnova@clinic.local"),
    ("Sergey", "Kuznetsov", "Surgeon", "kuznetsov", "kuznetsov@clinic.local"),
];

const PATIENTS: &[(&str, &str, Gender, &str, &str, &str)] = &[
    // first, last, gender, date of birth, address, login
    ("Ivan", "Ivanov", Gender::Male, "1980-04-12", "Lenina 1, apt 5", "ivanov"),
    ("Anna", "Petrova", Gender::Female, "1992-09-30", "Mira 14", "petrova"),
    ("Dmitry", "Sidorov", Gender::Male, "1975-01-22", "Gagarina 3", "sidorov"),
    ("Elena", "Volkova", Gender::Female, "1988-06-05", "Pushkina 10", "volkova"),
    ("Nikolai", "Morozov", Gender::Male, "1969-11-17", "Sadovaya 8", "morozov"),
    ("Maria", "Popova", Gender::Female, "2001-03-09", "Tverskaya 21", "popova"),
    ("Alexei", "Sokolov", Gender::Male, "1995-12-01", "Nevsky 44", "sokolov"),
];

const MEDICINES: &[(&str, &str, &str, &str)] = &[
    (
        "Paracetamol",
        "Analgesic and antipyretic",
        "Rare skin rash, liver damage on overdose",
        "Oral, 500 mg up to four times a day",
    ),
    (
        "Ibuprofen",
        "Non-steroidal anti-inflammatory drug",
        "Heartburn, nausea",
        "Oral, 200-400 mg after meals",
    ),
    (
        "Amoxicillin",
        "Penicillin antibiotic",
        "Diarrhoea, allergic reactions",
        "Oral, 500 mg every 8 hours",
    ),
    (
        "Loratadine",
        "Antihistamine",
        "Headache, dry mouth",
        "Oral, 10 mg once a day",
    ),
];

pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_DOCTOR_PASSWORD: &str = "doctor123";
pub const DEMO_PATIENT_PASSWORD: &str = "password123";

fn date(raw: &str) -> Result<NaiveDate, SeedError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| SeedError::Date(raw.into()))
}

fn datetime(raw: &str) -> Result<NaiveDateTime, SeedError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").map_err(|_| SeedError::Date(raw.into()))
}

/// Whether the database has no identities yet.
pub fn is_empty(conn: &Connection) -> Result<bool, DatabaseError> {
    Ok(repository::count_admins(conn)? == 0
        && repository::count_doctors(conn)? == 0
        && repository::count_patients(conn)? == 0)
}

/// Populate an empty database with a demo clinic. Returns `false` when
/// data already exists and nothing was written.
pub fn populate_demo_data(conn: &mut Connection) -> Result<bool, SeedError> {
    if !is_empty(conn)? {
        tracing::debug!("Database already populated, skipping demo seed");
        return Ok(false);
    }

    let tx = conn.transaction()?;

    // Every account gets its own salt even where demo passwords repeat
    repository::insert_admin(&tx, "admin", &crypto::hash_password(DEMO_ADMIN_PASSWORD)?)?;

    let mut doctor_ids = Vec::with_capacity(DOCTORS.len());
    for (first, last, position, login, email) in DOCTORS {
        doctor_ids.push(repository::insert_doctor(&tx, &NewDoctor {
            first_name: (*first).into(),
            last_name: (*last).into(),
            position: (*position).into(),
            email: Some((*email).into()),
            login: (*login).into(),
            password_hash: crypto::hash_password(DEMO_DOCTOR_PASSWORD)?,
        })?);
    }

    let mut patient_ids = Vec::with_capacity(PATIENTS.len());
    for (first, last, gender, born, address, login) in PATIENTS {
        patient_ids.push(repository::insert_patient(&tx, &NewPatient {
            first_name: (*first).into(),
            last_name: (*last).into(),
            gender: *gender,
            date_of_birth: date(born)?,
            address: (*address).into(),
            login: (*login).into(),
            password_hash: crypto::hash_password(DEMO_PATIENT_PASSWORD)?,
        })?);
    }

    let mut medicine_ids = Vec::with_capacity(MEDICINES.len());
    for (name, description, side_effects, usage_method) in MEDICINES {
        medicine_ids.push(repository::insert_medicine(&tx, &NewMedicine {
            name: (*name).into(),
            description: (*description).into(),
            side_effects: (*side_effects).into(),
            usage_method: (*usage_method).into(),
        })?);
    }

    // (patient index, doctor index, date, location, symptoms, diagnosis, prescriptions, [(medicine index, instructions)])
    let visits: [(usize, usize, &str, &str, &str, &str, &str, &[(usize, &str)]); 3] = [
        (
            0, 0, "2025-01-15 10:30", "Room 101", "Fever, sore throat", "Acute pharyngitis",
            "Bed rest, warm drinks",
            &[(0, "1 tablet when temperature exceeds 38 C"), (2, "1 capsule every 8 hours for 7 days")],
        ),
        (
            1, 1, "2025-02-03 14:00", "Room 204", "Chest discomfort on exertion", "Stable angina",
            "ECG follow-up in two weeks",
            &[],
        ),
        (
            0, 2, "2025-02-20 09:15", "Room 310", "Knee pain after fall", "Knee contusion",
            "Cold compress, limited load",
            &[(1, "1 tablet after meals, at most 3 per day")],
        ),
    ];

    for (patient, doctor, when, location, symptoms, diagnosis, prescriptions, medicines) in visits {
        let visit_id = repository::insert_visit(&tx, &NewVisit {
            patient_id: patient_ids[patient],
            doctor_id: doctor_ids[doctor],
            date: datetime(when)?,
            location: location.into(),
            symptoms: symptoms.into(),
            diagnosis: diagnosis.into(),
            prescriptions: prescriptions.into(),
        })?;
        for (medicine, instructions) in medicines {
            repository::insert_visit_medicine(&tx, visit_id, medicine_ids[*medicine], instructions)?;
        }
    }

    tx.commit()?;

    tracing::info!(
        doctors = DOCTORS.len(),
        patients = PATIENTS.len(),
        medicines = MEDICINES.len(),
        "Demo data seeded"
    );
    Ok(true)
}
