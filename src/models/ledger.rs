use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::TreatmentCategory;
use super::ids::{ClinicId, PatientId};

/// One row per (clinic, patient, category): the latest confirmed reminder
/// send. Only the dispatch coordinator writes here, and only after the
/// channel acknowledged the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub category: TreatmentCategory,
    pub sent_at: DateTime<Utc>,
}
