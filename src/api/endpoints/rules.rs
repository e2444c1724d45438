//! Reminder rule endpoints.
//!
//! Rules are read by the recall engine on every evaluation, so changes
//! here take effect on the next scheduler tick with no restart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClinicContext};
use crate::db;
use crate::models::{ReminderRule, TreatmentCategory};

#[derive(Serialize)]
pub struct RulesResponse {
    pub rules: Vec<ReminderRule>,
}

/// `GET /api/rules`: all rules of the clinic, active or not.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
) -> Result<Json<RulesResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let rules = db::get_clinic_rules(&conn, &clinic.clinic_id)?;
    Ok(Json(RulesResponse { rules }))
}

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub category: TreatmentCategory,
    pub interval_days: i64,
    pub template: String,
    /// Defaults to active.
    pub active: Option<bool>,
}

/// `POST /api/rules`: create a reminder rule.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Json(body): Json<CreateRuleRequest>,
) -> Result<Json<ReminderRule>, ApiError> {
    if body.interval_days < 0 {
        return Err(ApiError::BadRequest("Interval days must not be negative".into()));
    }
    if body.template.trim().is_empty() {
        return Err(ApiError::BadRequest("Template must not be empty".into()));
    }

    let rule = ReminderRule {
        id: Uuid::new_v4(),
        clinic_id: clinic.clinic_id,
        category: body.category,
        interval_days: body.interval_days,
        active: body.active.unwrap_or(true),
        template: body.template.trim().to_string(),
        created_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    db::insert_rule(&conn, &rule)?;

    Ok(Json(rule))
}

#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub interval_days: i64,
    pub active: bool,
    pub template: String,
}

/// `PUT /api/rules/:id`: reconfigure or (de)activate a rule.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRuleRequest>,
) -> Result<Json<ReminderRule>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest("Invalid rule id".into()))?;
    if body.interval_days < 0 {
        return Err(ApiError::BadRequest("Interval days must not be negative".into()));
    }
    if body.template.trim().is_empty() {
        return Err(ApiError::BadRequest("Template must not be empty".into()));
    }

    let conn = ctx.open_db()?;
    db::update_rule(
        &conn,
        &clinic.clinic_id,
        &id,
        body.interval_days,
        body.active,
        body.template.trim(),
    )?;
    let rule = db::get_rule(&conn, &clinic.clinic_id, &id)?
        .ok_or_else(|| ApiError::NotFound("Rule not found".into()))?;

    Ok(Json(rule))
}

/// `DELETE /api/rules/:id`: remove a rule. Ledger entries it produced
/// stay in place and keep suppressing until a newer treatment.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest("Invalid rule id".into()))?;

    let conn = ctx.open_db()?;
    db::delete_rule(&conn, &clinic.clinic_id, &id)?;

    Ok(StatusCode::NO_CONTENT)
}
