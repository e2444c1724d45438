use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_ts, parse_date, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_invoice(conn: &Connection, invoice: &Invoice) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO invoices (id, clinic_id, patient_id, total_cents, status, issued_on, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            invoice.id.to_string(),
            invoice.clinic_id.to_string(),
            invoice.patient_id.to_string(),
            invoice.total_cents,
            invoice.status.as_str(),
            invoice.issued_on.to_string(),
            fmt_ts(&invoice.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_invoice(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &Uuid,
) -> Result<Option<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, patient_id, total_cents, status, issued_on, created_at
         FROM invoices WHERE clinic_id = ?1 AND id = ?2",
    )?;
    let result = stmt.query_row(
        params![clinic_id.to_string(), id.to_string()],
        invoice_row_from_rusqlite,
    );

    match result {
        Ok(raw) => Ok(Some(invoice_from_row(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Newest first.
pub fn get_clinic_invoices(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, patient_id, total_cents, status, issued_on, created_at
         FROM invoices WHERE clinic_id = ?1 ORDER BY issued_on DESC, created_at DESC",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], invoice_row_from_rusqlite)?;

    let mut invoices = Vec::new();
    for row in rows {
        invoices.push(invoice_from_row(row?)?);
    }
    Ok(invoices)
}

pub fn set_invoice_status(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &Uuid,
    status: InvoiceStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE invoices SET status = ?3 WHERE clinic_id = ?1 AND id = ?2",
        params![clinic_id.to_string(), id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Invoice".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type InvoiceRow = (String, String, String, i64, String, String, String);

fn invoice_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<InvoiceRow, rusqlite::Error> {
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

fn invoice_from_row(row: InvoiceRow) -> Result<Invoice, DatabaseError> {
    let (id, clinic_id, patient_id, total_cents, status, issued_on, created_at) = row;
    Ok(Invoice {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        clinic_id: ClinicId::from_str(&clinic_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: PatientId::from_str(&patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        total_cents,
        status: InvoiceStatus::from_str(&status)?,
        issued_on: parse_date(&issued_on)?,
        created_at: parse_ts(&created_at)?,
    })
}
