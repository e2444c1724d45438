//! Due-set evaluation.
//!
//! `compute_due` is a pure function over data the caller already loaded;
//! `pending_for_clinic` is the thin loader that feeds it from the store.
//! Timing policy: "days since" counts UTC calendar days between the last
//! treatment date and `now`, clamped at zero. A ledger entry suppresses a
//! pair iff its send instant lies after UTC midnight at the start of the
//! last treatment day, so a newer treatment occurrence re-arms the pair.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_active_rules, get_clinic_dispatches, get_latest_treatments};
use crate::db::DatabaseError;
use crate::models::{
    ClinicId, DispatchRecord, LatestTreatment, PatientId, ReminderRule, TreatmentCategory,
};

/// A (patient, category) pair currently eligible for a reminder. Computed
/// fresh on every evaluation, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DuePair {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub contact_handle: Option<String>,
    pub category: TreatmentCategory,
    pub last_treatment_on: NaiveDate,
    pub days_since: i64,
    pub rule_id: Uuid,
    pub interval_days: i64,
    pub template: String,
}

/// Compute the ordered due set for one clinic.
///
/// Each (patient, active rule) combination is evaluated independently; a
/// patient with no treatment in the rule's category is never due for it.
/// When several rules cover the same category, the pair is emitted once,
/// under the rule with the longest interval that has already elapsed.
/// Due pairs are disjoint per (patient, category), so one tick never
/// sends twice to the same pair.
///
/// Output is ordered most overdue first; ties break by patient id, then
/// category, so repeated evaluations over unchanged data are identical.
pub fn compute_due(
    rules: &[ReminderRule],
    latest: &[LatestTreatment],
    ledger: &[DispatchRecord],
    now: DateTime<Utc>,
) -> Vec<DuePair> {
    let today = now.date_naive();

    let last_sent: HashMap<(PatientId, TreatmentCategory), DateTime<Utc>> = ledger
        .iter()
        .map(|r| ((r.patient_id, r.category), r.sent_at))
        .collect();

    let mut best: HashMap<(PatientId, TreatmentCategory), DuePair> = HashMap::new();

    for rule in rules.iter().filter(|r| r.active) {
        for treated in latest.iter().filter(|t| t.category == rule.category) {
            let days_since = (today - treated.performed_on).num_days().max(0);
            if days_since < rule.interval_days {
                continue;
            }

            let treatment_day_start =
                Utc.from_utc_datetime(&treated.performed_on.and_time(NaiveTime::MIN));
            let suppressed = last_sent
                .get(&(treated.patient_id, treated.category))
                .is_some_and(|sent_at| *sent_at > treatment_day_start);
            if suppressed {
                continue;
            }

            let candidate = DuePair {
                patient_id: treated.patient_id,
                patient_name: treated.patient_name.clone(),
                contact_handle: treated.contact_handle.clone(),
                category: treated.category,
                last_treatment_on: treated.performed_on,
                days_since,
                rule_id: rule.id,
                interval_days: rule.interval_days,
                template: rule.template.clone(),
            };

            match best.entry((treated.patient_id, treated.category)) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    if rule.interval_days > slot.get().interval_days {
                        slot.insert(candidate);
                    }
                }
            }
        }
    }

    let mut due: Vec<DuePair> = best.into_values().collect();
    due.sort_by(|a, b| {
        b.days_since
            .cmp(&a.days_since)
            .then_with(|| a.patient_id.cmp(&b.patient_id))
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    due
}

/// Load everything the evaluator needs for one clinic and compute its due
/// set. Read-only; never touches the ledger.
pub fn pending_for_clinic(
    conn: &Connection,
    clinic_id: &ClinicId,
    now: DateTime<Utc>,
) -> Result<Vec<DuePair>, DatabaseError> {
    let rules = get_active_rules(conn, clinic_id)?;
    if rules.is_empty() {
        return Ok(Vec::new());
    }
    let latest = get_latest_treatments(conn, clinic_id)?;
    let ledger = get_clinic_dispatches(conn, clinic_id)?;
    Ok(compute_due(&rules, &latest, &ledger, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-08-10T14:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rule(category: TreatmentCategory, interval_days: i64, active: bool) -> ReminderRule {
        ReminderRule {
            id: Uuid::new_v4(),
            clinic_id: ClinicId::new(),
            category,
            interval_days,
            active,
            template: "Hi {name}".into(),
            created_at: ts("2024-01-01T00:00:00Z"),
        }
    }

    fn treated(
        patient_id: PatientId,
        name: &str,
        category: TreatmentCategory,
        performed_on: &str,
    ) -> LatestTreatment {
        LatestTreatment {
            patient_id,
            patient_name: name.into(),
            contact_handle: Some("10001".into()),
            category,
            performed_on: date(performed_on),
        }
    }

    fn ledger_entry(
        patient_id: PatientId,
        category: TreatmentCategory,
        sent_at: &str,
    ) -> DispatchRecord {
        DispatchRecord {
            clinic_id: ClinicId::new(),
            patient_id,
            category,
            sent_at: ts(sent_at),
        }
    }

    #[test]
    fn patient_without_treatment_in_category_is_never_due() {
        let p = PatientId::new();
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 90, true)],
            &[treated(p, "Mara", TreatmentCategory::Laser, "2024-01-10")],
            &[],
            now(),
        );
        assert!(due.is_empty());
    }

    #[test]
    fn due_once_interval_has_elapsed() {
        let p = PatientId::new();
        // 2024-05-07 -> 2024-08-10 is 95 days.
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 90, true)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-05-07")],
            &[],
            now(),
        );
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].patient_id, p);
        assert_eq!(due[0].days_since, 95);
        assert_eq!(due[0].last_treatment_on, date("2024-05-07"));
        assert!(due[0].days_since >= due[0].interval_days);
    }

    #[test]
    fn not_due_before_interval() {
        let p = PatientId::new();
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 90, true)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-06-01")],
            &[],
            now(),
        );
        assert!(due.is_empty());
    }

    #[test]
    fn future_treatment_date_clamps_to_zero() {
        let p = PatientId::new();
        let zero_interval = compute_due(
            &[rule(TreatmentCategory::Botox, 0, true)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-08-12")],
            &[],
            now(),
        );
        assert_eq!(zero_interval.len(), 1);
        assert_eq!(zero_interval[0].days_since, 0);

        let one_day = compute_due(
            &[rule(TreatmentCategory::Botox, 1, true)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-08-12")],
            &[],
            now(),
        );
        assert!(one_day.is_empty());
    }

    #[test]
    fn ledger_entry_after_treatment_suppresses() {
        let p = PatientId::new();
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 90, true)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-03-01")],
            &[ledger_entry(p, TreatmentCategory::Botox, "2024-06-05T09:00:00Z")],
            now(),
        );
        assert!(due.is_empty());
    }

    #[test]
    fn new_treatment_re_arms_a_suppressed_pair() {
        let p = PatientId::new();
        // Reminder went out in April; the patient came back in May. The May
        // occurrence is older than 90 days now, and the April send must not
        // suppress it.
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 90, true)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-05-01")],
            &[ledger_entry(p, TreatmentCategory::Botox, "2024-04-15T11:00:00Z")],
            now(),
        );
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].days_since, 101);
    }

    #[test]
    fn stale_ledger_is_irrelevant_for_a_recent_treatment() {
        let p = PatientId::new();
        // Treated 2 days ago; ledger entry from four months back. Not due
        // because the interval has not elapsed; suppression never enters.
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 90, true)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-08-08")],
            &[ledger_entry(p, TreatmentCategory::Botox, "2024-04-12T10:00:00Z")],
            now(),
        );
        assert!(due.is_empty());
    }

    #[test]
    fn same_day_send_suppresses_zero_interval_rule() {
        let p = PatientId::new();
        // interval 0: treated this morning, reminded at noon. The pair must
        // not come back due this afternoon.
        let due = compute_due(
            &[rule(TreatmentCategory::Consultation, 0, true)],
            &[treated(p, "Mara", TreatmentCategory::Consultation, "2024-08-10")],
            &[ledger_entry(p, TreatmentCategory::Consultation, "2024-08-10T12:00:00Z")],
            now(),
        );
        assert!(due.is_empty());
    }

    #[test]
    fn suppression_boundary_is_the_treatment_day_start() {
        let p = PatientId::new();
        let rules = [rule(TreatmentCategory::Consultation, 0, true)];
        let latest = [treated(p, "Mara", TreatmentCategory::Consultation, "2024-08-10")];

        // Sent in the small hours of the treatment day: suppresses.
        let due = compute_due(
            &rules,
            &latest,
            &[ledger_entry(p, TreatmentCategory::Consultation, "2024-08-10T00:30:00Z")],
            now(),
        );
        assert!(due.is_empty());

        // Sent one minute before that day began: does not suppress.
        let due = compute_due(
            &rules,
            &latest,
            &[ledger_entry(p, TreatmentCategory::Consultation, "2024-08-09T23:59:00Z")],
            now(),
        );
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn inactive_rule_produces_no_pairs() {
        let p = PatientId::new();
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 90, false)],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-01-10")],
            &[],
            now(),
        );
        assert!(due.is_empty());
    }

    #[test]
    fn zero_interval_rule_is_due_immediately() {
        let p = PatientId::new();
        let due = compute_due(
            &[rule(TreatmentCategory::Facial, 0, true)],
            &[treated(p, "Mara", TreatmentCategory::Facial, "2024-08-10")],
            &[],
            now(),
        );
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].days_since, 0);
    }

    #[test]
    fn most_overdue_first_with_stable_ties() {
        let p1 = PatientId::new();
        let p2 = PatientId::new();
        let p3 = PatientId::new();
        let due = compute_due(
            &[rule(TreatmentCategory::Botox, 30, true)],
            &[
                treated(p1, "A", TreatmentCategory::Botox, "2024-06-01"), // 70 days
                treated(p2, "B", TreatmentCategory::Botox, "2024-05-01"), // 101 days
                treated(p3, "C", TreatmentCategory::Botox, "2024-06-01"), // 70 days
            ],
            &[],
            now(),
        );
        assert_eq!(due.len(), 3);
        assert_eq!(due[0].days_since, 101);
        assert_eq!(due[1].days_since, 70);
        assert_eq!(due[2].days_since, 70);
        // Equal days_since orders by patient id.
        assert!(due[1].patient_id < due[2].patient_id);
    }

    #[test]
    fn overlapping_rules_emit_one_pair_under_longest_elapsed_interval() {
        let p = PatientId::new();
        let short = rule(TreatmentCategory::Botox, 90, true);
        let long = rule(TreatmentCategory::Botox, 180, true);
        let history = [treated(p, "Mara", TreatmentCategory::Botox, "2024-01-10")]; // 213 days

        let due = compute_due(&[short.clone(), long.clone()], &history, &[], now());
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].rule_id, long.id);
        assert_eq!(due[0].interval_days, 180);

        // When only the short interval has elapsed, it wins by default.
        let recent = [treated(p, "Mara", TreatmentCategory::Botox, "2024-05-01")]; // 101 days
        let due = compute_due(&[short.clone(), long], &recent, &[], now());
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].rule_id, short.id);
    }

    #[test]
    fn evaluation_is_idempotent_over_unchanged_data() {
        let p1 = PatientId::new();
        let p2 = PatientId::new();
        let rules = [
            rule(TreatmentCategory::Botox, 90, true),
            rule(TreatmentCategory::Laser, 30, true),
        ];
        let history = [
            treated(p1, "Mara", TreatmentCategory::Botox, "2024-03-01"),
            treated(p2, "Ana", TreatmentCategory::Laser, "2024-06-15"),
        ];
        let ledger = [ledger_entry(p2, TreatmentCategory::Laser, "2024-06-01T08:00:00Z")];

        let first = compute_due(&rules, &history, &ledger, now());
        let second = compute_due(&rules, &history, &ledger, now());
        assert_eq!(first, second);
    }

    #[test]
    fn no_rules_means_empty_not_error() {
        let p = PatientId::new();
        let due = compute_due(
            &[],
            &[treated(p, "Mara", TreatmentCategory::Botox, "2024-01-10")],
            &[],
            now(),
        );
        assert!(due.is_empty());
    }
}
