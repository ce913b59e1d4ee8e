//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table family. All public functions are re-exported
//! here so callers use `crate::db::repository::*`.

mod account;
mod audit;
mod doctor;
mod medicine;
mod patient;
mod visit;

pub use account::*;
pub use audit::*;
pub use doctor::*;
pub use medicine::*;
pub use patient::*;
pub use visit::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::*;
    use rusqlite::Connection;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_doctor(conn: &Connection, login: &str, last_name: &str) -> i64 {
        insert_doctor(conn, &NewDoctor {
            first_name: "Test".into(),
            last_name: last_name.into(),
            position: "Therapist".into(),
            email: None,
            login: login.into(),
            password_hash: "hash".into(),
        })
        .unwrap()
    }

    fn make_patient(conn: &Connection, login: &str, last_name: &str) -> i64 {
        insert_patient(conn, &NewPatient {
            first_name: "Test".into(),
            last_name: last_name.into(),
            gender: Gender::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            address: "1 Main St".into(),
            login: login.into(),
            password_hash: "hash".into(),
        })
        .unwrap()
    }

    fn make_medicine(conn: &Connection, name: &str) -> i64 {
        insert_medicine(conn, &NewMedicine {
            name: name.into(),
            description: "desc".into(),
            side_effects: "none".into(),
            usage_method: "oral".into(),
        })
        .unwrap()
    }

    fn make_visit(conn: &Connection, patient_id: i64, doctor_id: i64, date: &str) -> i64 {
        insert_visit(conn, &NewVisit {
            patient_id,
            doctor_id,
            date: NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").unwrap(),
            location: "Room 1".into(),
            symptoms: "cough".into(),
            diagnosis: "cold".into(),
            prescriptions: "rest".into(),
        })
        .unwrap()
    }

    #[test]
    fn doctor_insert_and_get() {
        let conn = test_db();
        let id = make_doctor(&conn, "belov", "Belov");
        let doctor = get_doctor(&conn, id).unwrap().unwrap();
        assert_eq!(doctor.login, "belov");
        assert_eq!(doctor.last_name, "Belov");
        assert!(doctor.email.is_none());
    }

    #[test]
    fn doctors_listed_by_last_then_first_name() {
        let conn = test_db();
        make_doctor(&conn, "z", "Zaitsev");
        make_doctor(&conn, "a", "Antonov");
        let names: Vec<String> = list_doctors(&conn)
            .unwrap()
            .into_iter()
            .map(|d| d.last_name)
            .collect();
        assert_eq!(names, vec!["Antonov", "Zaitsev"]);
    }

    #[test]
    fn duplicate_doctor_login_is_constraint_violation() {
        let conn = test_db();
        make_doctor(&conn, "dup", "One");
        let err = insert_doctor(&conn, &NewDoctor {
            first_name: "B".into(),
            last_name: "Two".into(),
            position: "Surgeon".into(),
            email: None,
            login: "dup".into(),
            password_hash: "hash".into(),
        })
        .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn same_login_allowed_across_tables() {
        let conn = test_db();
        make_doctor(&conn, "shared", "Doc");
        make_patient(&conn, "shared", "Pat");
        assert!(login_exists(&conn, Role::Doctor, "shared").unwrap());
        assert!(login_exists(&conn, Role::Patient, "shared").unwrap());
        assert!(!login_exists(&conn, Role::Admin, "shared").unwrap());
    }

    #[test]
    fn patient_round_trips_gender_and_birth_date() {
        let conn = test_db();
        let id = make_patient(&conn, "ivanov", "Ivanov");
        let patient = get_patient(&conn, id).unwrap().unwrap();
        assert_eq!(patient.gender, Gender::Female);
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1990, 5, 17).unwrap());
    }

    #[test]
    fn patient_gender_check_constraint() {
        let conn = test_db();
        let result = conn.execute(
            "INSERT INTO patients (first_name, last_name, gender, date_of_birth, login, password_hash)
             VALUES ('A', 'B', 'Invalid', '2000-01-01', 'abc', '123')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn credentials_found_only_in_matching_table() {
        let conn = test_db();
        insert_admin(&conn, "root", "admin-hash").unwrap();
        let found = find_credentials(&conn, Role::Admin, "root").unwrap().unwrap();
        assert_eq!(found.password_hash, "admin-hash");
        assert!(find_credentials(&conn, Role::Doctor, "root").unwrap().is_none());
        assert_eq!(count_admins(&conn).unwrap(), 1);
    }

    #[test]
    fn login_by_id_for_each_role() {
        let conn = test_db();
        let doc = make_doctor(&conn, "belov", "Belov");
        assert_eq!(find_login_by_id(&conn, Role::Doctor, doc).unwrap().as_deref(), Some("belov"));
        assert!(find_login_by_id(&conn, Role::Patient, doc).unwrap().is_none());
    }

    #[test]
    fn medicine_name_unique() {
        let conn = test_db();
        make_medicine(&conn, "Paracetamol");
        assert!(medicine_name_exists(&conn, "Paracetamol").unwrap());
        let err = insert_medicine(&conn, &NewMedicine {
            name: "Paracetamol".into(),
            description: String::new(),
            side_effects: String::new(),
            usage_method: String::new(),
        })
        .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn visit_requires_existing_patient_and_doctor() {
        let conn = test_db();
        let doc = make_doctor(&conn, "d", "Doc");
        let err = insert_visit(&conn, &NewVisit {
            patient_id: 999,
            doctor_id: doc,
            date: NaiveDateTime::parse_from_str("2025-01-01 10:00", "%Y-%m-%d %H:%M").unwrap(),
            location: String::new(),
            symptoms: String::new(),
            diagnosis: String::new(),
            prescriptions: String::new(),
        })
        .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn visit_medicine_pair_is_unique() {
        let conn = test_db();
        let doc = make_doctor(&conn, "d", "Doc");
        let pat = make_patient(&conn, "p", "Pat");
        let med = make_medicine(&conn, "Ibuprofen");
        let visit = make_visit(&conn, pat, doc, "2025-01-01 10:00");
        insert_visit_medicine(&conn, visit, med, "twice daily").unwrap();
        let err = insert_visit_medicine(&conn, visit, med, "again").unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(get_visit_medicines(&conn, visit).unwrap().len(), 1);
    }

    #[test]
    fn visit_date_round_trips() {
        let conn = test_db();
        let doc = make_doctor(&conn, "d", "Doc");
        let pat = make_patient(&conn, "p", "Pat");
        let id = make_visit(&conn, pat, doc, "2025-03-04 09:30");
        let visit = get_visit(&conn, id).unwrap().unwrap();
        assert_eq!(visit.date.to_string(), "2025-03-04 09:30:00");
        assert_eq!(visit.patient_id, pat);
        assert_eq!(visit.doctor_id, doc);
    }

    #[test]
    fn visit_counts_per_doctor_and_patient() {
        let conn = test_db();
        let doc = make_doctor(&conn, "d", "Doc");
        let pat = make_patient(&conn, "p", "Pat");
        make_visit(&conn, pat, doc, "2025-01-01 10:00");
        make_visit(&conn, pat, doc, "2025-01-02 10:00");
        assert_eq!(count_visits_for_doctor(&conn, doc).unwrap(), 2);
        assert_eq!(count_visits_for_patient(&conn, pat).unwrap(), 2);
        assert_eq!(count_visits(&conn).unwrap(), 2);
    }

    #[test]
    fn restricted_delete_of_referenced_doctor_fails() {
        let conn = test_db();
        let doc = make_doctor(&conn, "d", "Doc");
        let pat = make_patient(&conn, "p", "Pat");
        make_visit(&conn, pat, doc, "2025-01-01 10:00");
        let err: DatabaseError = delete_doctor(&conn, doc).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn delete_unknown_rows_reports_zero() {
        let conn = test_db();
        assert_eq!(delete_doctor(&conn, 42).unwrap(), 0);
        assert_eq!(delete_patient(&conn, 42).unwrap(), 0);
        assert_eq!(delete_medicine(&conn, 42).unwrap(), 0);
    }

    #[test]
    fn audit_entries_insert_and_query() {
        let conn = test_db();
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        insert_audit_entries(&conn, &[
            (now.clone(), "admin_1".into(), "GET /admin/dashboard".into(), "status:200".into()),
            (now, "doctor_2".into(), "GET /doctor/dashboard".into(), "status:200".into()),
        ])
        .unwrap();
        let rows = query_audit_by_source(&conn, "admin_1", 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, "GET /admin/dashboard");
        assert_eq!(prune_audit_log(&conn, 90).unwrap(), 0);
    }
}
