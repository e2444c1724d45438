//! Clinic settings endpoints.
//!
//! The profile is exposed through a DTO so the API key never appears in
//! a response body.

use axum::extract::State;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClinicContext};
use crate::db;
use crate::models::Clinic;

#[derive(Serialize)]
pub struct SettingsResponse {
    pub clinic_id: String,
    pub name: String,
    pub reply_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Clinic> for SettingsResponse {
    fn from(clinic: Clinic) -> Self {
        Self {
            clinic_id: clinic.id.to_string(),
            name: clinic.name,
            reply_contact: clinic.reply_contact,
            created_at: clinic.created_at,
        }
    }
}

/// `GET /api/settings`: the authenticated clinic's profile.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let clinic = db::get_clinic(&conn, &clinic.clinic_id)?
        .ok_or_else(|| ApiError::NotFound("Clinic not found".into()))?;

    Ok(Json(clinic.into()))
}

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub name: String,
    /// Appended to outgoing reminders so patients can reply somewhere a
    /// human reads. `null` clears it.
    pub reply_contact: Option<String>,
}

/// `PUT /api/settings`: update name and reminder reply contact.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Clinic name must not be empty".into()));
    }

    let conn = ctx.open_db()?;
    db::update_clinic_profile(
        &conn,
        &clinic.clinic_id,
        body.name.trim(),
        body.reply_contact.as_deref(),
    )?;
    let clinic = db::get_clinic(&conn, &clinic.clinic_id)?
        .ok_or_else(|| ApiError::NotFound("Clinic not found".into()))?;

    Ok(Json(clinic.into()))
}
