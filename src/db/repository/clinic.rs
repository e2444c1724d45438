use std::str::FromStr;

use rusqlite::{params, Connection};

use super::{fmt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_clinic(conn: &Connection, clinic: &Clinic) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinics (id, name, api_key, reply_contact, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            clinic.id.to_string(),
            clinic.name,
            clinic.api_key,
            clinic.reply_contact,
            fmt_ts(&clinic.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_clinic(conn: &Connection, id: &ClinicId) -> Result<Option<Clinic>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, api_key, reply_contact, created_at
         FROM clinics WHERE id = ?1",
    )?;
    let result = stmt.query_row(params![id.to_string()], clinic_row_from_rusqlite);

    match result {
        Ok(raw) => Ok(Some(clinic_from_row(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All clinics, oldest first. The dispatch coordinator walks this list on
/// every tick, and the API-key middleware scans it in constant time.
pub fn get_all_clinics(conn: &Connection) -> Result<Vec<Clinic>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, api_key, reply_contact, created_at
         FROM clinics ORDER BY created_at",
    )?;
    let rows = stmt.query_map([], clinic_row_from_rusqlite)?;

    let mut clinics = Vec::new();
    for row in rows {
        clinics.push(clinic_from_row(row?)?);
    }
    Ok(clinics)
}

pub fn update_clinic_profile(
    conn: &Connection,
    id: &ClinicId,
    name: &str,
    reply_contact: Option<&str>,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE clinics SET name = ?2, reply_contact = ?3 WHERE id = ?1",
        params![id.to_string(), name, reply_contact],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Clinic".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type ClinicRow = (String, String, String, Option<String>, String);

fn clinic_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ClinicRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn clinic_from_row(row: ClinicRow) -> Result<Clinic, DatabaseError> {
    let (id, name, api_key, reply_contact, created_at) = row;
    Ok(Clinic {
        id: ClinicId::from_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name,
        api_key,
        reply_contact,
        created_at: parse_ts(&created_at)?,
    })
}
