use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_rule(conn: &Connection, rule: &ReminderRule) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminder_rules (id, clinic_id, category, interval_days, active, template, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            rule.id.to_string(),
            rule.clinic_id.to_string(),
            rule.category.as_str(),
            rule.interval_days,
            rule.active as i32,
            rule.template,
            fmt_ts(&rule.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_rule(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &Uuid,
) -> Result<Option<ReminderRule>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, category, interval_days, active, template, created_at
         FROM reminder_rules WHERE clinic_id = ?1 AND id = ?2",
    )?;
    let result = stmt.query_row(
        params![clinic_id.to_string(), id.to_string()],
        rule_row_from_rusqlite,
    );

    match result {
        Ok(raw) => Ok(Some(rule_from_row(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_clinic_rules(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<ReminderRule>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, category, interval_days, active, template, created_at
         FROM reminder_rules WHERE clinic_id = ?1 ORDER BY category",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], rule_row_from_rusqlite)?;

    let mut rules = Vec::new();
    for row in rows {
        rules.push(rule_from_row(row?)?);
    }
    Ok(rules)
}

/// Only rules the evaluator should apply. Inactive rules keep their
/// configuration but produce no due pairs.
pub fn get_active_rules(
    conn: &Connection,
    clinic_id: &ClinicId,
) -> Result<Vec<ReminderRule>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, category, interval_days, active, template, created_at
         FROM reminder_rules WHERE clinic_id = ?1 AND active = 1 ORDER BY category",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string()], rule_row_from_rusqlite)?;

    let mut rules = Vec::new();
    for row in rows {
        rules.push(rule_from_row(row?)?);
    }
    Ok(rules)
}

pub fn update_rule(
    conn: &Connection,
    clinic_id: &ClinicId,
    id: &Uuid,
    interval_days: i64,
    active: bool,
    template: &str,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE reminder_rules SET interval_days = ?3, active = ?4, template = ?5
         WHERE clinic_id = ?1 AND id = ?2",
        params![
            clinic_id.to_string(),
            id.to_string(),
            interval_days,
            active as i32,
            template,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ReminderRule".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_rule(conn: &Connection, clinic_id: &ClinicId, id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM reminder_rules WHERE clinic_id = ?1 AND id = ?2",
        params![clinic_id.to_string(), id.to_string()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ReminderRule".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type RuleRow = (String, String, String, i64, i64, String, String);

fn rule_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RuleRow, rusqlite::Error> {
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

fn rule_from_row(row: RuleRow) -> Result<ReminderRule, DatabaseError> {
    let (id, clinic_id, category, interval_days, active, template, created_at) = row;
    Ok(ReminderRule {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        clinic_id: ClinicId::from_str(&clinic_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        category: TreatmentCategory::from_str(&category)?,
        interval_days,
        active: active != 0,
        template,
        created_at: parse_ts(&created_at)?,
    })
}
