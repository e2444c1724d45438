//! Recall engine: decides which patients are due for a follow-up reminder
//! and drives the outbound sends.
//!
//! The split matters: [`evaluator`] is pure (rules + treatment history +
//! dispatch ledger in, due pairs out, no side effects), while
//! [`coordinator`] owns the effectful parts: rendering, channel sends,
//! ledger writes and per-clinic fan-out. The read-only summary endpoint
//! and the dispatch endpoint therefore see exactly the same due-set logic.

pub mod coordinator;
pub mod evaluator;
pub mod template;

use chrono::{DateTime, Utc};

use crate::models::{ClinicId, PatientId, TreatmentCategory};

pub use coordinator::RecallEngine;
pub use evaluator::{compute_due, DuePair};

/// What happened to one due pair during a dispatch pass.
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub category: TreatmentCategory,
    pub days_since: i64,
    pub result: PairResult,
}

#[derive(Debug, Clone)]
pub enum PairResult {
    Sent { provider_message_id: Option<String> },
    Failed { reason: String },
}

impl PairOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self.result, PairResult::Sent { .. })
    }
}

/// Per-clinic result of one dispatch pass.
#[derive(Debug)]
pub struct ClinicDispatchReport {
    pub clinic_id: ClinicId,
    pub clinic_name: String,
    pub sent: usize,
    pub failed: usize,
    pub outcomes: Vec<PairOutcome>,
    /// Set when the clinic could not be processed at all (store unreachable,
    /// unreadable rule set). `failed` is forced to at least 1 so the problem
    /// shows up in the aggregated counts.
    pub error: Option<String>,
    /// True when the tick deadline stopped this clinic before all due pairs
    /// were attempted. The remainder stays due for the next tick.
    pub cut_short: bool,
}

impl ClinicDispatchReport {
    fn empty(clinic_id: ClinicId, clinic_name: &str) -> Self {
        Self {
            clinic_id,
            clinic_name: clinic_name.to_string(),
            sent: 0,
            failed: 0,
            outcomes: Vec::new(),
            error: None,
            cut_short: false,
        }
    }

    fn broken(clinic_id: ClinicId, clinic_name: &str, reason: String) -> Self {
        let mut report = Self::empty(clinic_id, clinic_name);
        report.failed = 1;
        report.error = Some(reason);
        report
    }
}

/// Result of one full tick across all clinics.
#[derive(Debug)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub clinics: Vec<ClinicDispatchReport>,
}

impl TickReport {
    pub fn total_sent(&self) -> usize {
        self.clinics.iter().map(|c| c.sent).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.clinics.iter().map(|c| c.failed).sum()
    }
}

/// Read-only counterpart of [`ClinicDispatchReport`] for the summary view.
#[derive(Debug)]
pub struct ClinicPendingSummary {
    pub clinic_id: ClinicId,
    pub clinic_name: String,
    pub due: Vec<DuePair>,
    pub error: Option<String>,
}
