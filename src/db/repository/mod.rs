//! Repository layer: entity-scoped database operations.
//!
//! Every query that touches tenant data takes the clinic id and scopes on it;
//! nothing here trusts an entity id alone to cross clinic boundaries.

mod clinic;
mod expense;
mod invoice;
mod ledger;
mod patient;
mod rule;
mod treatment;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use super::DatabaseError;

// Re-export all public items from sub-modules
pub use clinic::*;
pub use expense::*;
pub use invoice::*;
pub use ledger::*;
pub use patient::*;
pub use rule::*;
pub use treatment::*;

/// Canonical TEXT form for stored timestamps: RFC 3339 UTC, fixed-width
/// microseconds. Fixed width keeps lexicographic order equal to chronological
/// order, which `MAX(sent_at)` in the dispatch ledger relies on.
pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {s:?}: {e}")))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{NaiveDate, TimeZone, Utc};
    use rusqlite::Connection;
    use uuid::Uuid;

    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::*;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ts(s: &str) -> chrono::DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn make_clinic(conn: &Connection, name: &str, api_key: &str) -> Clinic {
        let clinic = Clinic {
            id: ClinicId::new(),
            name: name.into(),
            api_key: api_key.into(),
            reply_contact: Some("Call the front desk".into()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
        };
        insert_clinic(conn, &clinic).unwrap();
        clinic
    }

    fn make_patient(
        conn: &Connection,
        clinic_id: &ClinicId,
        full_name: &str,
        contact_handle: Option<&str>,
    ) -> Patient {
        let patient = Patient {
            id: PatientId::new(),
            clinic_id: *clinic_id,
            full_name: full_name.into(),
            contact_handle: contact_handle.map(|s| s.into()),
            born_on: Some(date("1988-04-12")),
            note: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
        };
        insert_patient(conn, &patient).unwrap();
        patient
    }

    fn make_treatment(
        conn: &Connection,
        clinic_id: &ClinicId,
        patient_id: &PatientId,
        category: TreatmentCategory,
        performed_on: &str,
    ) -> Treatment {
        let treatment = Treatment {
            id: Uuid::new_v4(),
            clinic_id: *clinic_id,
            patient_id: *patient_id,
            category,
            performed_on: date(performed_on),
            amount_cents: 25_000,
            created_at: Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap(),
        };
        insert_treatment(conn, &treatment).unwrap();
        treatment
    }

    fn make_rule(
        conn: &Connection,
        clinic_id: &ClinicId,
        category: TreatmentCategory,
        interval_days: i64,
    ) -> ReminderRule {
        let rule = ReminderRule {
            id: Uuid::new_v4(),
            clinic_id: *clinic_id,
            category,
            interval_days,
            active: true,
            template: "Hi {name}, time for your next {category}. It has been {days} days.".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        };
        insert_rule(conn, &rule).unwrap();
        rule
    }

    #[test]
    fn clinic_insert_and_fetch() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "Derma Nord", "key-derma-nord");

        let found = get_clinic(&conn, &clinic.id).unwrap().unwrap();
        assert_eq!(found.name, "Derma Nord");
        assert_eq!(found.api_key, "key-derma-nord");
        assert_eq!(found.reply_contact.as_deref(), Some("Call the front desk"));

        assert!(get_clinic(&conn, &ClinicId::new()).unwrap().is_none());

        let all = get_all_clinics(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, clinic.id);
    }

    #[test]
    fn clinic_api_key_must_be_unique() {
        let conn = test_db();
        make_clinic(&conn, "A", "same-key");
        let dup = Clinic {
            id: ClinicId::new(),
            name: "B".into(),
            api_key: "same-key".into(),
            reply_contact: None,
            created_at: Utc::now(),
        };
        assert!(insert_clinic(&conn, &dup).is_err());
    }

    #[test]
    fn clinic_profile_update() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "Old Name", "k1");

        update_clinic_profile(&conn, &clinic.id, "New Name", None).unwrap();
        let updated = get_clinic(&conn, &clinic.id).unwrap().unwrap();
        assert_eq!(updated.name, "New Name");
        assert!(updated.reply_contact.is_none());

        let missing = ClinicId::new();
        let result = update_clinic_profile(&conn, &missing, "X", None);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn patients_are_scoped_to_their_clinic() {
        let conn = test_db();
        let a = make_clinic(&conn, "A", "ka");
        let b = make_clinic(&conn, "B", "kb");
        let patient = make_patient(&conn, &a.id, "Mara Lindt", Some("744112233"));

        assert!(get_patient(&conn, &a.id, &patient.id).unwrap().is_some());
        assert!(get_patient(&conn, &b.id, &patient.id).unwrap().is_none());
        assert_eq!(get_clinic_patients(&conn, &b.id).unwrap().len(), 0);
    }

    #[test]
    fn patient_list_is_ordered_by_name() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        make_patient(&conn, &clinic.id, "Zoe Adler", None);
        make_patient(&conn, &clinic.id, "Ana Berg", Some("55011"));

        let patients = get_clinic_patients(&conn, &clinic.id).unwrap();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].full_name, "Ana Berg");
        assert_eq!(patients[1].full_name, "Zoe Adler");
    }

    #[test]
    fn patient_update_round_trip() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let mut patient = make_patient(&conn, &clinic.id, "Mara Lindt", None);

        patient.contact_handle = Some("99887766".into());
        patient.note = Some("prefers afternoon slots".into());
        update_patient(&conn, &patient).unwrap();

        let stored = get_patient(&conn, &clinic.id, &patient.id).unwrap().unwrap();
        assert_eq!(stored.contact_handle.as_deref(), Some("99887766"));
        assert_eq!(stored.note.as_deref(), Some("prefers afternoon slots"));
        assert_eq!(stored.born_on, Some(date("1988-04-12")));
    }

    #[test]
    fn corrupt_born_on_surfaces_as_error() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let patient = make_patient(&conn, &clinic.id, "Mara Lindt", None);

        // A row written by some older tool in a non-ISO format must not be
        // silently flattened to "no birth date" on read.
        conn.execute(
            "UPDATE patients SET born_on = '12.04.1988' WHERE id = ?1",
            rusqlite::params![patient.id.to_string()],
        )
        .unwrap();

        let result = get_patient(&conn, &clinic.id, &patient.id);
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn latest_treatments_pick_max_date_per_patient_and_category() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let p1 = make_patient(&conn, &clinic.id, "Mara Lindt", Some("111"));
        let p2 = make_patient(&conn, &clinic.id, "Ana Berg", None);

        make_treatment(&conn, &clinic.id, &p1.id, TreatmentCategory::Botox, "2024-01-10");
        make_treatment(&conn, &clinic.id, &p1.id, TreatmentCategory::Botox, "2024-03-05");
        make_treatment(&conn, &clinic.id, &p1.id, TreatmentCategory::Laser, "2024-02-01");
        make_treatment(&conn, &clinic.id, &p2.id, TreatmentCategory::Botox, "2024-02-20");

        let mut latest = get_latest_treatments(&conn, &clinic.id).unwrap();
        latest.sort_by(|a, b| {
            (a.patient_id, a.category.as_str()).cmp(&(b.patient_id, b.category.as_str()))
        });
        assert_eq!(latest.len(), 3);

        let p1_botox = latest
            .iter()
            .find(|t| t.patient_id == p1.id && t.category == TreatmentCategory::Botox)
            .unwrap();
        assert_eq!(p1_botox.performed_on, date("2024-03-05"));
        assert_eq!(p1_botox.patient_name, "Mara Lindt");
        assert_eq!(p1_botox.contact_handle.as_deref(), Some("111"));

        let p2_botox = latest
            .iter()
            .find(|t| t.patient_id == p2.id)
            .unwrap();
        assert_eq!(p2_botox.performed_on, date("2024-02-20"));
        assert!(p2_botox.contact_handle.is_none());
    }

    #[test]
    fn treatments_do_not_leak_across_clinics() {
        let conn = test_db();
        let a = make_clinic(&conn, "A", "ka");
        let b = make_clinic(&conn, "B", "kb");
        let pa = make_patient(&conn, &a.id, "Mara Lindt", None);
        make_treatment(&conn, &a.id, &pa.id, TreatmentCategory::Filler, "2024-04-01");

        assert_eq!(get_clinic_treatments(&conn, &a.id).unwrap().len(), 1);
        assert_eq!(get_clinic_treatments(&conn, &b.id).unwrap().len(), 0);
        assert_eq!(get_latest_treatments(&conn, &b.id).unwrap().len(), 0);
    }

    #[test]
    fn several_rules_may_share_a_category() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        make_rule(&conn, &clinic.id, TreatmentCategory::Botox, 90);
        make_rule(&conn, &clinic.id, TreatmentCategory::Botox, 180);

        let rules = get_clinic_rules(&conn, &clinic.id).unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.category == TreatmentCategory::Botox));
    }

    #[test]
    fn rule_update_and_active_filter() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let rule = make_rule(&conn, &clinic.id, TreatmentCategory::Laser, 60);
        make_rule(&conn, &clinic.id, TreatmentCategory::Botox, 120);

        update_rule(&conn, &clinic.id, &rule.id, 45, false, "See you soon, {name}").unwrap();

        let all = get_clinic_rules(&conn, &clinic.id).unwrap();
        assert_eq!(all.len(), 2);

        let active = get_active_rules(&conn, &clinic.id).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].category, TreatmentCategory::Botox);

        let stored = get_rule(&conn, &clinic.id, &rule.id).unwrap().unwrap();
        assert_eq!(stored.interval_days, 45);
        assert!(!stored.active);
        assert_eq!(stored.template, "See you soon, {name}");
    }

    #[test]
    fn ledger_upsert_keeps_latest_timestamp() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let patient = make_patient(&conn, &clinic.id, "Mara Lindt", Some("111"));

        let mut rec = DispatchRecord {
            clinic_id: clinic.id,
            patient_id: patient.id,
            category: TreatmentCategory::Botox,
            sent_at: ts("2024-05-02T10:00:00Z"),
        };
        record_dispatch(&conn, &rec).unwrap();

        // A stale write must not move the timestamp backwards.
        rec.sent_at = ts("2024-05-01T09:00:00Z");
        record_dispatch(&conn, &rec).unwrap();
        let stored = get_dispatch(&conn, &clinic.id, &patient.id, TreatmentCategory::Botox)
            .unwrap()
            .unwrap();
        assert_eq!(stored.sent_at, ts("2024-05-02T10:00:00Z"));

        // A newer write advances it.
        rec.sent_at = ts("2024-06-11T08:15:00Z");
        record_dispatch(&conn, &rec).unwrap();
        let stored = get_dispatch(&conn, &clinic.id, &patient.id, TreatmentCategory::Botox)
            .unwrap()
            .unwrap();
        assert_eq!(stored.sent_at, ts("2024-06-11T08:15:00Z"));
    }

    #[test]
    fn ledger_rows_are_keyed_per_category() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let patient = make_patient(&conn, &clinic.id, "Mara Lindt", Some("111"));

        for category in [TreatmentCategory::Botox, TreatmentCategory::Laser] {
            record_dispatch(
                &conn,
                &DispatchRecord {
                    clinic_id: clinic.id,
                    patient_id: patient.id,
                    category,
                    sent_at: ts("2024-05-02T10:00:00Z"),
                },
            )
            .unwrap();
        }

        assert_eq!(get_clinic_dispatches(&conn, &clinic.id).unwrap().len(), 2);
        assert!(get_dispatch(&conn, &clinic.id, &patient.id, TreatmentCategory::Filler)
            .unwrap()
            .is_none());
    }

    #[test]
    fn expense_round_trip() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");

        let expense = Expense {
            id: Uuid::new_v4(),
            clinic_id: clinic.id,
            label: "Laser maintenance".into(),
            amount_cents: 120_00,
            spent_on: date("2024-04-18"),
            created_at: Utc.with_ymd_and_hms(2024, 4, 18, 16, 0, 0).unwrap(),
        };
        insert_expense(&conn, &expense).unwrap();

        let listed = get_clinic_expenses(&conn, &clinic.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].label, "Laser maintenance");
        assert_eq!(listed[0].amount_cents, 120_00);

        delete_expense(&conn, &clinic.id, &expense.id).unwrap();
        assert!(get_clinic_expenses(&conn, &clinic.id).unwrap().is_empty());
    }

    #[test]
    fn invoice_status_transition() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let patient = make_patient(&conn, &clinic.id, "Mara Lindt", None);

        let invoice = Invoice {
            id: Uuid::new_v4(),
            clinic_id: clinic.id,
            patient_id: patient.id,
            total_cents: 450_00,
            status: InvoiceStatus::Open,
            issued_on: date("2024-04-20"),
            created_at: Utc.with_ymd_and_hms(2024, 4, 20, 11, 0, 0).unwrap(),
        };
        insert_invoice(&conn, &invoice).unwrap();

        set_invoice_status(&conn, &clinic.id, &invoice.id, InvoiceStatus::Paid).unwrap();
        let stored = get_invoice(&conn, &clinic.id, &invoice.id).unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);

        let missing = Uuid::new_v4();
        let result = set_invoice_status(&conn, &clinic.id, &missing, InvoiceStatus::Paid);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn stored_timestamps_round_trip_through_text() {
        let original = ts("2024-05-02T10:00:00.123456Z");
        let parsed = parse_ts(&fmt_ts(&original)).unwrap();
        assert_eq!(parsed, original);

        assert!(parse_ts("2024-05-02 10:00").is_err());
        assert!(parse_date("not-a-date").is_err());
        assert_eq!(parse_date("2024-05-02").unwrap(), date("2024-05-02"));
    }

    #[test]
    fn fixed_width_timestamps_sort_lexicographically() {
        let a = fmt_ts(&ts("2024-05-02T10:00:00.000001Z"));
        let b = fmt_ts(&ts("2024-05-02T10:00:00.100000Z"));
        let c = fmt_ts(&ts("2024-11-30T23:59:59.999999Z"));
        assert!(a < b && b < c);
        assert_eq!(a.len(), b.len());
        assert_eq!(b.len(), c.len());
    }

    #[test]
    fn ids_parse_back_from_storage() {
        let conn = test_db();
        let clinic = make_clinic(&conn, "A", "ka");
        let stored = get_clinic(&conn, &clinic.id).unwrap().unwrap();
        assert_eq!(ClinicId::from_str(&stored.id.to_string()).unwrap(), clinic.id);
    }
}
