use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::ClinicId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub clinic_id: ClinicId,
    pub label: String,
    pub amount_cents: i64,
    pub spent_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}
