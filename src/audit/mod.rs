//! Audit trail recording for privileged state-changing actions.
//!
//! Writes are decoupled from request handling: the [`middleware`] observes a
//! handler's response and, only on success, hands a structured job to the
//! [`AuditSink`], whose background worker appends the record. The response is
//! never delayed by the write; a failed append is logged and dropped, never
//! surfaced to the caller and never retried. Delivery during shutdown is
//! best-effort.

/// Response-observing middleware that enqueues audit jobs.
pub mod middleware;

use crate::db::Store;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// A pending audit append, attributed to the authenticated actor.
#[derive(Debug)]
pub struct AuditJob {
    pub action: &'static str,
    pub target_type: &'static str,
    pub target_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub actor_id: i64,
}

/// Handle to the background audit writer.
///
/// Cloning is cheap; all clones feed the same worker task.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::UnboundedSender<AuditJob>,
}

impl AuditSink {
    /// Spawns the writer task and returns a sink feeding it.
    pub fn spawn(store: Arc<Store>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditJob>();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let timestamp = chrono::Utc::now().timestamp();
                if let Err(err) = store
                    .append_audit(
                        job.action,
                        job.target_type,
                        job.target_id,
                        job.details.as_ref(),
                        job.actor_id,
                        timestamp,
                    )
                    .await
                {
                    error!(action = job.action, "failed to append audit record: {}", err);
                }
            }
        });

        Self { tx }
    }

    /// Enqueues a record without blocking. Fire-and-forget: if the worker is
    /// gone the job is dropped with a warning.
    pub fn record(&self, job: AuditJob) {
        if self.tx.send(job).is_err() {
            warn!("audit worker stopped; dropping audit record");
        }
    }
}
