use std::str::FromStr;

use rusqlite::{params, Connection};

use super::{fmt_ts, parse_date, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, clinic_id, full_name, contact_handle, born_on, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient.id.to_string(),
            patient.clinic_id.to_string(),
            patient.full_name,
            patient.contact_handle,
            patient.born_on.map(|d| d.to_string()),
            patient.note,
            fmt_ts(&patient.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &PatientId,
) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, full_name, contact_handle, born_on, note, created_at
         FROM patients WHERE clinic_id = ?1 AND id = ?2",
    )?;
    let result = stmt.query_row(
        params![clinic_id.to_string(), id.to_string()],
        patient_row_from_rusqlite,
    );

    match result {
        Ok(raw) => Ok(Some(patient_from_row(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_clinic_patients(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, full_name, contact_handle, born_on, note, created_at
         FROM patients WHERE clinic_id = ?1 ORDER BY full_name",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE patients SET full_name = ?3, contact_handle = ?4, born_on = ?5, note = ?6
         WHERE clinic_id = ?1 AND id = ?2",
        params![
            patient.clinic_id.to_string(),
            patient.id.to_string(),
            patient.full_name,
            patient.contact_handle,
            patient.born_on.map(|d| d.to_string()),
            patient.note,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: patient.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_patient(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &PatientId,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM patients WHERE clinic_id = ?1 AND id = ?2",
        params![clinic_id.to_string(), id.to_string()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type PatientRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
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

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    let (id, clinic_id, full_name, contact_handle, born_on, note, created_at) = row;
    Ok(Patient {
        id: PatientId::from_str(&id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        clinic_id: ClinicId::from_str(&clinic_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        full_name,
        contact_handle,
        born_on: born_on.as_deref().map(parse_date).transpose()?,
        note,
        created_at: parse_ts(&created_at)?,
    })
}
