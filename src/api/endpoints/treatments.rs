//! Treatment endpoints.
//!
//! Treatments are the recall engine's raw material: recording one resets
//! the patient's clock for that category on the next evaluation.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClinicContext};
use crate::db;
use crate::models::{PatientId, Treatment, TreatmentCategory};

#[derive(Serialize)]
pub struct TreatmentsResponse {
    pub treatments: Vec<Treatment>,
}

/// `GET /api/treatments`: the clinic's treatments, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
) -> Result<Json<TreatmentsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let treatments = db::get_clinic_treatments(&conn, &clinic.clinic_id)?;
    Ok(Json(TreatmentsResponse { treatments }))
}

/// `GET /api/patients/:id/treatments`: one patient's history.
pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<TreatmentsResponse>, ApiError> {
    let patient_id = PatientId::from_str(&patient_id)
        .map_err(|_| ApiError::BadRequest("Invalid patient id".into()))?;

    let conn = ctx.open_db()?;
    db::get_patient(&conn, &clinic.clinic_id, &patient_id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
    let treatments = db::get_patient_treatments(&conn, &clinic.clinic_id, &patient_id)?;

    Ok(Json(TreatmentsResponse { treatments }))
}

#[derive(Deserialize)]
pub struct CreateTreatmentRequest {
    pub category: TreatmentCategory,
    pub performed_on: NaiveDate,
    pub amount_cents: i64,
}

/// `POST /api/patients/:id/treatments`: record a treatment.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(patient_id): Path<String>,
    Json(body): Json<CreateTreatmentRequest>,
) -> Result<Json<Treatment>, ApiError> {
    let patient_id = PatientId::from_str(&patient_id)
        .map_err(|_| ApiError::BadRequest("Invalid patient id".into()))?;
    if body.amount_cents < 0 {
        return Err(ApiError::BadRequest("Amount must not be negative".into()));
    }

    let conn = ctx.open_db()?;
    db::get_patient(&conn, &clinic.clinic_id, &patient_id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;

    let treatment = Treatment {
        id: Uuid::new_v4(),
        clinic_id: clinic.clinic_id,
        patient_id,
        category: body.category,
        performed_on: body.performed_on,
        amount_cents: body.amount_cents,
        created_at: Utc::now(),
    };
    db::insert_treatment(&conn, &treatment)?;

    Ok(Json(treatment))
}

/// `DELETE /api/treatments/:id`: drop a mis-entered treatment.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest("Invalid treatment id".into()))?;

    let conn = ctx.open_db()?;
    db::delete_treatment(&conn, &clinic.clinic_id, &id)?;

    Ok(StatusCode::NO_CONTENT)
}
