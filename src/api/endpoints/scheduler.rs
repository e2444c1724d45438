//! Scheduler trigger endpoints.
//!
//! An external cron-style scheduler calls these on a fixed cadence:
//! - `GET  /api/scheduler/recall`: read-only pending summary
//! - `POST /api/scheduler/recall`: run one dispatch tick
//!
//! Both take no body; repeating either call is safe because the due set
//! is recomputed from rules, treatments and the dispatch ledger each time.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub clinics: Vec<ClinicPending>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicPending {
    pub clinic_id: String,
    pub clinic_name: String,
    pub pending_reminders: usize,
    pub patients: Vec<PendingPatient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPatient {
    pub patient_id: String,
    pub patient_name: String,
    pub category: String,
    pub last_treatment_on: String,
    pub days_since: i64,
}

/// `GET /api/scheduler/recall`: the due set every clinic currently has,
/// without dispatching anything.
pub async fn pending(
    State(ctx): State<ApiContext>,
) -> Result<Json<PendingResponse>, ApiError> {
    let now = Utc::now();
    let summaries = ctx.engine.pending_summary(now)?;

    let clinics = summaries
        .into_iter()
        .map(|summary| ClinicPending {
            clinic_id: summary.clinic_id.to_string(),
            clinic_name: summary.clinic_name,
            pending_reminders: summary.due.len(),
            patients: summary
                .due
                .iter()
                .map(|pair| PendingPatient {
                    patient_id: pair.patient_id.to_string(),
                    patient_name: pair.patient_name.clone(),
                    category: pair.category.as_str().to_string(),
                    last_treatment_on: pair.last_treatment_on.to_string(),
                    days_since: pair.days_since,
                })
                .collect(),
            error: summary.error,
        })
        .collect();

    Ok(Json(PendingResponse {
        status: "ok",
        timestamp: now.to_rfc3339(),
        clinics,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub total_sent: usize,
    pub total_failed: usize,
    pub clinics: Vec<ClinicDispatch>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicDispatch {
    pub clinic_id: String,
    pub clinic_name: String,
    pub sent: usize,
    pub failed: usize,
    pub cut_short: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/scheduler/recall`: evaluate and dispatch for every clinic.
pub async fn run(State(ctx): State<ApiContext>) -> Result<Json<DispatchResponse>, ApiError> {
    let now = Utc::now();
    let report = ctx.engine.process_all_clinics(now).await?;

    Ok(Json(DispatchResponse {
        status: "ok",
        timestamp: now.to_rfc3339(),
        total_sent: report.total_sent(),
        total_failed: report.total_failed(),
        clinics: report
            .clinics
            .into_iter()
            .map(|clinic| ClinicDispatch {
                clinic_id: clinic.clinic_id.to_string(),
                clinic_name: clinic.clinic_name,
                sent: clinic.sent,
                failed: clinic.failed,
                cut_short: clinic.cut_short,
                error: clinic.error,
            })
            .collect(),
    }))
}
