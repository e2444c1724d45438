use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::InvoiceStatus;
use super::ids::{ClinicId, PatientId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub issued_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}
