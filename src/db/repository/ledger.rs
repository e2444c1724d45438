use std::str::FromStr;

use rusqlite::{params, Connection};

use super::{fmt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

/// Record a confirmed send. The upsert never moves `sent_at` backwards:
/// concurrent or replayed writes keep whichever timestamp is newest, so the
/// ledger stays monotonic per (clinic, patient, category). Timestamps are
/// fixed-width RFC 3339, which makes scalar MAX on the TEXT column
/// chronological.
pub fn record_dispatch(conn: &Connection, record: &DispatchRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO dispatch_ledger (clinic_id, patient_id, category, sent_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(clinic_id, patient_id, category)
         DO UPDATE SET sent_at = MAX(sent_at, excluded.sent_at)",
        params![
            record.clinic_id.to_string(),
            record.patient_id.to_string(),
            record.category.as_str(),
            fmt_ts(&record.sent_at),
        ],
    )?;
    Ok(())
}

pub fn get_dispatch(
    conn: &Connection,
    clinic_id: &ClinicId,
    patient_id: &PatientId,
    category: TreatmentCategory,
) -> Result<Option<DispatchRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT clinic_id, patient_id, category, sent_at
         FROM dispatch_ledger WHERE clinic_id = ?1 AND patient_id = ?2 AND category = ?3",
    )?;
    let result = stmt.query_row(
        params![
            clinic_id.to_string(),
            patient_id.to_string(),
            category.as_str()
        ],
        ledger_row_from_rusqlite,
    );

    match result {
        Ok(raw) => Ok(Some(ledger_from_row(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whole ledger for one clinic. The evaluator loads this once per pass and
/// joins in memory rather than probing row by row.
pub fn get_clinic_dispatches(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<DispatchRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT clinic_id, patient_id, category, sent_at
         FROM dispatch_ledger WHERE clinic_id = ?1",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], ledger_row_from_rusqlite)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(ledger_from_row(row?)?);
    }
    Ok(records)
}

type LedgerRow = (String, String, String, String);

fn ledger_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<LedgerRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn ledger_from_row(row: LedgerRow) -> Result<DispatchRecord, DatabaseError> {
    let (clinic_id, patient_id, category, sent_at) = row;
    Ok(DispatchRecord {
        clinic_id: ClinicId::from_str(&clinic_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: PatientId::from_str(&patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        category: TreatmentCategory::from_str(&category)?,
        sent_at: parse_ts(&sent_at)?,
    })
}
