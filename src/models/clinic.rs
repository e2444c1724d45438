use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ClinicId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: ClinicId,
    pub name: String,
    /// Shared secret presented in `X-Api-Key`. Endpoints expose clinics
    /// through DTOs, never this struct, so the key stays server-side.
    pub api_key: String,
    /// Contact line appended to outgoing reminders so patients can answer
    /// somewhere a human reads.
    pub reply_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}
