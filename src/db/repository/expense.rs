use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_ts, parse_date, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_expense(conn: &Connection, expense: &Expense) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO expenses (id, clinic_id, label, amount_cents, spent_on, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            expense.id.to_string(),
            expense.clinic_id.to_string(),
            expense.label,
            expense.amount_cents,
            expense.spent_on.to_string(),
            fmt_ts(&expense.created_at),
        ],
    )?;
    Ok(())
}

/// Newest first.
pub fn get_clinic_expenses(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<Expense>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, label, amount_cents, spent_on, created_at
         FROM expenses WHERE clinic_id = ?1 ORDER BY spent_on DESC, created_at DESC",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut expenses = Vec::new();
    for row in rows {
        let (id, clinic_id, label, amount_cents, spent_on, created_at) = row?;
        expenses.push(Expense {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            clinic_id: ClinicId::from_str(&clinic_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            label,
            amount_cents,
            spent_on: parse_date(&spent_on)?,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(expenses)
}

pub fn delete_expense(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM expenses WHERE clinic_id = ?1 AND id = ?2",
        params![clinic_id.to_string(), id.to_string()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Expense".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
