//! Invoice endpoints.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClinicContext};
use crate::db;
use crate::models::{Invoice, InvoiceStatus, PatientId};

#[derive(Serialize)]
pub struct InvoicesResponse {
    pub invoices: Vec<Invoice>,
}

/// `GET /api/invoices`: the clinic's invoices, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
) -> Result<Json<InvoicesResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let invoices = db::get_clinic_invoices(&conn, &clinic.clinic_id)?;
    Ok(Json(InvoicesResponse { invoices }))
}

#[derive(Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: String,
    pub total_cents: i64,
    pub issued_on: NaiveDate,
}

/// `POST /api/invoices`: issue an invoice for a patient. Starts open.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Json(body): Json<CreateInvoiceRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let patient_id = PatientId::from_str(&body.patient_id)
        .map_err(|_| ApiError::BadRequest("Invalid patient id".into()))?;
    if body.total_cents < 0 {
        return Err(ApiError::BadRequest("Total must not be negative".into()));
    }

    let conn = ctx.open_db()?;
    db::get_patient(&conn, &clinic.clinic_id, &patient_id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;

    let invoice = Invoice {
        id: Uuid::new_v4(),
        clinic_id: clinic.clinic_id,
        patient_id,
        total_cents: body.total_cents,
        status: InvoiceStatus::Open,
        issued_on: body.issued_on,
        created_at: Utc::now(),
    };
    db::insert_invoice(&conn, &invoice)?;

    Ok(Json(invoice))
}

/// `POST /api/invoices/:id/paid`: mark an invoice paid.
pub async fn mark_paid(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest("Invalid invoice id".into()))?;

    let conn = ctx.open_db()?;
    db::set_invoice_status(&conn, &clinic.clinic_id, &id, InvoiceStatus::Paid)?;
    let invoice = db::get_invoice(&conn, &clinic.clinic_id, &id)?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".into()))?;

    Ok(Json(invoice))
}
