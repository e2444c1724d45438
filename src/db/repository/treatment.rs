use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_ts, parse_date, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_treatment(conn: &Connection, treatment: &Treatment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatments (id, clinic_id, patient_id, category, performed_on, amount_cents, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            treatment.id.to_string(),
            treatment.clinic_id.to_string(),
            treatment.patient_id.to_string(),
            treatment.category.as_str(),
            treatment.performed_on.to_string(),
            treatment.amount_cents,
            fmt_ts(&treatment.created_at),
        ],
    )?;
    Ok(())
}

/// Newest first, across all patients of the clinic.
pub fn get_clinic_treatments(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, patient_id, category, performed_on, amount_cents, created_at
         FROM treatments WHERE clinic_id = ?1 ORDER BY performed_on DESC, created_at DESC",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], treatment_row_from_rusqlite)?;

    let mut treatments = Vec::new();
    for row in rows {
        treatments.push(treatment_from_row(row?)?);
    }
    Ok(treatments)
}

pub fn get_patient_treatments(
    conn: &Connection,
    clinic_id: &ClinicId,
    patient_id: &PatientId,
) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, patient_id, category, performed_on, amount_cents, created_at
         FROM treatments WHERE clinic_id = ?1 AND patient_id = ?2
         ORDER BY performed_on DESC, created_at DESC",
    )?;
    let rows = stmt.query_map(
        params![clinic_id.to_string(), patient_id.to_string()],
        treatment_row_from_rusqlite,
    )?;

    let mut treatments = Vec::new();
    for row in rows {
        treatments.push(treatment_from_row(row?)?);
    }
    Ok(treatments)
}

/// The recall engine's input: for every (patient, category) pair of the
/// clinic, the most recent treatment date plus the patient fields needed to
/// address a reminder. ISO dates compare as text, so MAX works directly.
pub fn get_latest_treatments(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<LatestTreatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT t.patient_id, p.full_name, p.contact_handle, t.category, MAX(t.performed_on)
         FROM treatments t
         JOIN patients p ON p.id = t.patient_id
         WHERE t.clinic_id = ?1
         GROUP BY t.patient_id, t.category",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut latest = Vec::new();
    for row in rows {
        let (patient_id, patient_name, contact_handle, category, performed_on) = row?;
        latest.push(LatestTreatment {
            patient_id: PatientId::from_str(&patient_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            patient_name,
            contact_handle,
            category: TreatmentCategory::from_str(&category)?,
            performed_on: parse_date(&performed_on)?,
        });
    }
    Ok(latest)
}

pub fn delete_treatment(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM treatments WHERE clinic_id = ?1 AND id = ?2",
        params![clinic_id.to_string(), id.to_string()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Treatment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type TreatmentRow = (String, String, String, String, String, i64, String);

fn treatment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<TreatmentRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn treatment_from_row(row: TreatmentRow) -> Result<Treatment, DatabaseError> {
    let (id, clinic_id, patient_id, category, performed_on, amount_cents, created_at) = row;
    Ok(Treatment {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        clinic_id: ClinicId::from_str(&clinic_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: PatientId::from_str(&patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        category: TreatmentCategory::from_str(&category)?,
        performed_on: parse_date(&performed_on)?,
        amount_cents,
        created_at: parse_ts(&created_at)?,
    })
}
