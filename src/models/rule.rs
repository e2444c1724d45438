use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TreatmentCategory;
use super::ids::ClinicId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRule {
    pub id: Uuid,
    pub clinic_id: ClinicId,
    pub category: TreatmentCategory,
    /// Days after the last treatment at which the patient becomes due.
    pub interval_days: i64,
    pub active: bool,
    /// Message body with `{name}`, `{category}` and `{days}` placeholders.
    pub template: String,
    pub created_at: DateTime<Utc>,
}
