//! Per-role dashboard views: visit lists joined with patient and doctor
//! names, newest first.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::db::repository;
use crate::db::DatabaseError;

/// One line of a dashboard visit table.
#[derive(Debug, Clone, Serialize)]
pub struct VisitSummary {
    pub id: i64,
    pub date: NaiveDateTime,
    pub location: String,
    pub diagnosis: String,
    pub patient_id: i64,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub doctor_id: i64,
    pub doctor_first_name: String,
    pub doctor_last_name: String,
    pub doctor_position: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClinicTotals {
    pub visits: i64,
    pub patients: i64,
    pub doctors: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub totals: ClinicTotals,
    pub visits: Vec<VisitSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub doctor_id: i64,
    pub visits: Vec<VisitSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientDashboard {
    pub patient_id: i64,
    pub visits: Vec<VisitSummary>,
}

const SUMMARY_SELECT: &str =
    "SELECT v.id, v.date, v.location, v.diagnosis,
            p.id, p.first_name, p.last_name,
            d.id, d.first_name, d.last_name, d.position
     FROM visits v
     JOIN patients p ON p.id = v.patient_id
     JOIN doctors d ON d.id = v.doctor_id";

fn summary_row(row: &Row<'_>) -> rusqlite::Result<VisitSummary> {
    Ok(VisitSummary {
        id: row.get(0)?,
        date: row.get(1)?,
        location: row.get(2)?,
        diagnosis: row.get(3)?,
        patient_id: row.get(4)?,
        patient_first_name: row.get(5)?,
        patient_last_name: row.get(6)?,
        doctor_id: row.get(7)?,
        doctor_first_name: row.get(8)?,
        doctor_last_name: row.get(9)?,
        doctor_position: row.get(10)?,
    })
}

fn query_summaries(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<VisitSummary>, DatabaseError> {
    let sql = format!("{SUMMARY_SELECT} {filter} ORDER BY v.date DESC, v.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, summary_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn admin_dashboard(conn: &Connection) -> Result<AdminDashboard, DatabaseError> {
    let visits = query_summaries(conn, "", [])?;
    let totals = ClinicTotals {
        visits: repository::count_visits(conn)?,
        patients: repository::count_patients(conn)?,
        doctors: repository::count_doctors(conn)?,
    };
    Ok(AdminDashboard { totals, visits })
}

pub fn doctor_dashboard(conn: &Connection, doctor_id: i64) -> Result<DoctorDashboard, DatabaseError> {
    let visits = query_summaries(conn, "WHERE v.doctor_id = ?1", params![doctor_id])?;
    Ok(DoctorDashboard { doctor_id, visits })
}

pub fn patient_dashboard(conn: &Connection, patient_id: i64) -> Result<PatientDashboard, DatabaseError> {
    let visits = query_summaries(conn, "WHERE v.patient_id = ?1", params![patient_id])?;
    Ok(PatientDashboard { patient_id, visits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::db::sqlite::open_memory_database;
    use crate::models::*;

    fn doctor(conn: &Connection, login: &str) -> i64 {
        repository::insert_doctor(conn, &NewDoctor {
            first_name: "Doc".into(),
            last_name: login.into(),
            position: "GP".into(),
            email: None,
            login: login.into(),
            password_hash: "x".into(),
        })
        .unwrap()
    }

    fn patient(conn: &Connection, login: &str) -> i64 {
        repository::insert_patient(conn, &NewPatient {
            first_name: "Pat".into(),
            last_name: login.into(),
            gender: Gender::Male,
            date_of_birth: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            address: "Street".into(),
            login: login.into(),
            password_hash: "x".into(),
        })
        .unwrap()
    }

    fn visit(conn: &Connection, patient_id: i64, doctor_id: i64, date: &str) -> i64 {
        repository::insert_visit(conn, &NewVisit {
            patient_id,
            doctor_id,
            date: NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").unwrap(),
            location: "Room".into(),
            symptoms: "s".into(),
            diagnosis: format!("diagnosis {date}"),
            prescriptions: "p".into(),
        })
        .unwrap()
    }

    struct Clinic {
        conn: Connection,
        d1: i64,
        d2: i64,
        p1: i64,
        p2: i64,
    }

    fn clinic() -> Clinic {
        let conn = open_memory_database().unwrap();
        let d1 = doctor(&conn, "belov");
        let d2 = doctor(&conn, "orlova");
        let p1 = patient(&conn, "ivanov");
        let p2 = patient(&conn, "petrov");
        visit(&conn, p1, d1, "2025-01-01 09:00");
        visit(&conn, p2, d1, "2025-03-01 09:00");
        visit(&conn, p1, d2, "2025-02-01 09:00");
        Clinic { conn, d1, d2, p1, p2 }
    }

    #[test]
    fn admin_sees_everything_newest_first() {
        let c = clinic();
        let dash = admin_dashboard(&c.conn).unwrap();
        assert_eq!(dash.visits.len(), 3);
        let dates: Vec<String> = dash.visits.iter().map(|v| v.date.format("%m").to_string()).collect();
        assert_eq!(dates, vec!["03", "02", "01"]);
        assert_eq!(dash.totals.visits, 3);
        assert_eq!(dash.totals.patients, 2);
        assert_eq!(dash.totals.doctors, 2);
    }

    #[test]
    fn doctor_sees_only_own_visits() {
        let c = clinic();
        let dash = doctor_dashboard(&c.conn, c.d1).unwrap();
        assert_eq!(dash.visits.len(), 2);
        assert!(dash.visits.iter().all(|v| v.doctor_id == c.d1));
        assert_eq!(dash.visits[0].patient_id, c.p2);
        assert_eq!(doctor_dashboard(&c.conn, c.d2).unwrap().visits.len(), 1);
    }

    #[test]
    fn patient_sees_only_own_visits() {
        let c = clinic();
        let dash = patient_dashboard(&c.conn, c.p1).unwrap();
        assert_eq!(dash.visits.len(), 2);
        assert!(dash.visits.iter().all(|v| v.patient_id == c.p1));
        assert_eq!(dash.visits[0].doctor_last_name, "orlova");
        assert_eq!(patient_dashboard(&c.conn, c.p2).unwrap().visits.len(), 1);
    }

    #[test]
    fn empty_clinic() {
        let conn = open_memory_database().unwrap();
        let dash = admin_dashboard(&conn).unwrap();
        assert!(dash.visits.is_empty());
        assert_eq!(dash.totals.visits, 0);
        assert!(doctor_dashboard(&conn, 1).unwrap().visits.is_empty());
    }
}
