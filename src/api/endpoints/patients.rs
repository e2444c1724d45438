//! Patient CRUD endpoints.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClinicContext};
use crate::db;
use crate::models::{Patient, PatientId};

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<Patient>,
}

/// `GET /api/patients`: the clinic's patients, ordered by name.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let patients = db::get_clinic_patients(&conn, &clinic.clinic_id)?;
    Ok(Json(PatientsResponse { patients }))
}

#[derive(Deserialize)]
pub struct CreatePatientRequest {
    pub full_name: String,
    pub contact_handle: Option<String>,
    pub born_on: Option<NaiveDate>,
    pub note: Option<String>,
}

/// `POST /api/patients`: register a patient.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Json(body): Json<CreatePatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    if body.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Patient name must not be empty".into()));
    }

    let patient = Patient {
        id: PatientId::new(),
        clinic_id: clinic.clinic_id,
        full_name: body.full_name.trim().to_string(),
        contact_handle: body.contact_handle,
        born_on: body.born_on,
        note: body.note,
        created_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    db::insert_patient(&conn, &patient)?;

    Ok(Json(patient))
}

#[derive(Deserialize)]
pub struct UpdatePatientRequest {
    pub full_name: String,
    pub contact_handle: Option<String>,
    pub born_on: Option<NaiveDate>,
    pub note: Option<String>,
}

/// `PUT /api/patients/:id`: update a patient's profile.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    let id = PatientId::from_str(&id)
        .map_err(|_| ApiError::BadRequest("Invalid patient id".into()))?;
    if body.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Patient name must not be empty".into()));
    }

    let conn = ctx.open_db()?;
    let mut patient = db::get_patient(&conn, &clinic.clinic_id, &id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;

    patient.full_name = body.full_name.trim().to_string();
    patient.contact_handle = body.contact_handle;
    patient.born_on = body.born_on;
    patient.note = body.note;
    db::update_patient(&conn, &patient)?;

    Ok(Json(patient))
}

/// `DELETE /api/patients/:id`: remove a patient and, via foreign keys,
/// their treatments and ledger entries.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = PatientId::from_str(&id)
        .map_err(|_| ApiError::BadRequest("Invalid patient id".into()))?;

    let conn = ctx.open_db()?;
    db::delete_patient(&conn, &clinic.clinic_id, &id)?;

    Ok(StatusCode::NO_CONTENT)
}
