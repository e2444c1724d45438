//! Dispatch coordination: fan-out across clinics, sequential sends within
//! a clinic, ledger writes on confirmed sends only.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use super::evaluator;
use super::template;
use super::{ClinicDispatchReport, ClinicPendingSummary, PairOutcome, PairResult, TickReport};
use crate::config::DispatchConfig;
use crate::db::repository::{get_all_clinics, record_dispatch};
use crate::db::sqlite::open_database;
use crate::db::DatabaseError;
use crate::models::{Clinic, DispatchRecord};
use crate::notify::NotificationChannel;
use crate::recall::DuePair;

/// Drives reminder dispatch. One instance lives for the whole process; each
/// clinic task opens its own database connection, so ticks can fan out
/// without sharing a connection across await points.
pub struct RecallEngine {
    db_path: PathBuf,
    channel: Arc<dyn NotificationChannel>,
    config: DispatchConfig,
}

impl RecallEngine {
    pub fn new(
        db_path: PathBuf,
        channel: Arc<dyn NotificationChannel>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            db_path,
            channel,
            config,
        }
    }

    /// Read-only view: the due pairs every clinic currently has, without
    /// dispatching or touching the ledger. A clinic whose data cannot be
    /// read is reported with an error instead of aborting the rest.
    pub fn pending_summary(&self, now: DateTime<Utc>) -> Result<Vec<ClinicPendingSummary>, DatabaseError> {
        let conn = open_database(&self.db_path)?;
        let clinics = get_all_clinics(&conn)?;

        let mut summaries = Vec::with_capacity(clinics.len());
        for clinic in clinics {
            match evaluator::pending_for_clinic(&conn, &clinic.id, now) {
                Ok(due) => summaries.push(ClinicPendingSummary {
                    clinic_id: clinic.id,
                    clinic_name: clinic.name,
                    due,
                    error: None,
                }),
                Err(e) => {
                    tracing::warn!(clinic = %clinic.id, "pending summary failed: {e}");
                    summaries.push(ClinicPendingSummary {
                        clinic_id: clinic.id,
                        clinic_name: clinic.name,
                        due: Vec::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        Ok(summaries)
    }

    /// One scheduler tick: evaluate and dispatch for every clinic, bounded
    /// by the configured worker count. A clinic that fails wholesale is
    /// reported and the others continue.
    pub async fn process_all_clinics(&self, now: DateTime<Utc>) -> Result<TickReport, DatabaseError> {
        let clinics = {
            let conn = open_database(&self.db_path)?;
            get_all_clinics(&conn)?
        };

        let deadline = self.config.tick_deadline.map(|d| Instant::now() + d);
        let semaphore = Arc::new(Semaphore::new(self.config.workers));

        let reports = join_all(clinics.into_iter().map(|clinic| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                self.run_clinic(clinic, now, deadline).await
            }
        }))
        .await;

        let report = TickReport {
            started_at: now,
            clinics: reports,
        };
        tracing::info!(
            sent = report.total_sent(),
            failed = report.total_failed(),
            clinics = report.clinics.len(),
            "dispatch tick finished"
        );
        Ok(report)
    }

    /// Per-clinic boundary: any store error here becomes a broken-clinic
    /// report instead of propagating.
    ///
    /// The connection is scoped to the synchronous evaluation. It must not
    /// live across an await: `Connection` is not `Sync`, so a borrow held
    /// over a suspension point would make the whole tick future non-`Send`.
    async fn run_clinic(
        &self,
        clinic: Clinic,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> ClinicDispatchReport {
        let due = {
            let conn = match open_database(&self.db_path) {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(clinic = %clinic.id, "cannot open store: {e}");
                    return ClinicDispatchReport::broken(clinic.id, &clinic.name, e.to_string());
                }
            };
            match evaluator::pending_for_clinic(&conn, &clinic.id, now) {
                Ok(due) => due,
                Err(e) => {
                    tracing::error!(clinic = %clinic.id, "clinic evaluation failed: {e}");
                    return ClinicDispatchReport::broken(clinic.id, &clinic.name, e.to_string());
                }
            }
        };

        self.process_due(&clinic, due, deadline).await
    }

    /// Dispatch all due pairs of one clinic, most overdue first, one at a
    /// time. Failures are per-pair; the deadline stops new sends but never
    /// interrupts one in flight.
    async fn process_due(
        &self,
        clinic: &Clinic,
        due: Vec<DuePair>,
        deadline: Option<Instant>,
    ) -> ClinicDispatchReport {
        let mut report = ClinicDispatchReport::empty(clinic.id, &clinic.name);

        for pair in due {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(
                    clinic = %clinic.id,
                    dispatched = report.outcomes.len(),
                    "tick deadline reached, leaving remaining pairs for the next tick"
                );
                report.cut_short = true;
                break;
            }

            let outcome = self.dispatch_pair(clinic, pair).await;
            if outcome.is_sent() {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
            report.outcomes.push(outcome);
        }

        tracing::debug!(
            clinic = %clinic.id,
            sent = report.sent,
            failed = report.failed,
            "clinic dispatch pass done"
        );
        report
    }

    /// Send one reminder. The ledger is written only after the channel
    /// confirmed; every failure path leaves it untouched so the pair stays
    /// due for the next tick.
    async fn dispatch_pair(&self, clinic: &Clinic, pair: DuePair) -> PairOutcome {
        let Some(destination) = pair.contact_handle.clone() else {
            return failed(&pair, "patient has no contact handle".into());
        };

        let message = template::render(&pair, clinic.reply_contact.as_deref());

        let receipt = match timeout(
            self.config.send_timeout,
            self.channel.send(&destination, &message),
        )
        .await
        {
            Err(_) => {
                return failed(
                    &pair,
                    format!(
                        "send timed out after {}s",
                        self.config.send_timeout.as_secs()
                    ),
                );
            }
            Ok(Err(e)) => return failed(&pair, e.to_string()),
            Ok(Ok(receipt)) => receipt,
        };

        let record = DispatchRecord {
            clinic_id: clinic.id,
            patient_id: pair.patient_id,
            category: pair.category,
            sent_at: Utc::now(),
        };
        // Fresh short-lived connection; see run_clinic on why none is kept
        // across the send.
        let written =
            open_database(&self.db_path).and_then(|conn| record_dispatch(&conn, &record));
        if let Err(e) = written {
            // The message went out but nothing proves it next tick; count it
            // failed so the discrepancy is visible, and expect a duplicate.
            tracing::error!(
                clinic = %clinic.id,
                patient = %pair.patient_id,
                "sent but ledger write failed: {e}"
            );
            return failed(&pair, format!("sent but ledger write failed: {e}"));
        }

        tracing::debug!(
            clinic = %clinic.id,
            patient = %pair.patient_id,
            category = pair.category.as_str(),
            days_since = pair.days_since,
            "reminder sent"
        );
        PairOutcome {
            patient_id: pair.patient_id,
            patient_name: pair.patient_name,
            category: pair.category,
            days_since: pair.days_since,
            result: PairResult::Sent {
                provider_message_id: receipt.provider_message_id,
            },
        }
    }
}

fn failed(pair: &DuePair, reason: String) -> PairOutcome {
    PairOutcome {
        patient_id: pair.patient_id,
        patient_name: pair.patient_name.clone(),
        category: pair.category,
        days_since: pair.days_since,
        result: PairResult::Failed { reason },
    }
}
