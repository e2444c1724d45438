use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ClinicId, PatientId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub clinic_id: ClinicId,
    pub full_name: String,
    /// Where reminders go, e.g. a Telegram chat id. Patients without one
    /// still show up in due sets but cannot be dispatched to.
    pub contact_handle: Option<String>,
    pub born_on: Option<NaiveDate>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
