use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TreatmentCategory;
use super::ids::{ClinicId, PatientId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub category: TreatmentCategory,
    pub performed_on: NaiveDate,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Most recent treatment per (patient, category), joined with the patient
/// fields the recall engine needs to address a reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestTreatment {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub contact_handle: Option<String>,
    pub category: TreatmentCategory,
    pub performed_on: NaiveDate,
}
