//! Audit & tracking writer
//!
//! Single-writer queue decoupled from the response path: the caller gets
//! the decision as soon as aggregation completes, while one worker task
//! owns every store mutation (audit record, IP/device tracking rows,
//! session log). A transient store failure is retried with bounded
//! exponential backoff; a permanently failed write is logged and counted,
//! never silently dropped and never blocking the caller.

use crate::metrics::AUDIT_WRITE_TOTAL;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use risk_engine::{ActionType, EnforcementAction, FraudCheckRequest, FraudResult, RiskFactors};
use signal_store::{AuditRecord, SessionLogRow, SignalStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Audit writer settings
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Queue depth before dispatch starts shedding (and logging) jobs
    pub queue_depth: usize,

    /// Upper bound on total retry time per job (milliseconds)
    pub retry_max_elapsed_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_depth: 256,
            retry_max_elapsed_ms: 10_000,
        }
    }
}

/// Everything the writer persists for one finalized decision
#[derive(Debug, Clone)]
pub struct AuditJob {
    /// Session identifier (idempotency key)
    pub session_id: uuid::Uuid,

    /// Checked action type
    pub action_type: ActionType,

    /// User, when authenticated
    pub user_id: Option<String>,

    /// Client IP
    pub ip_address: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Device fingerprint, when collected
    pub device_fingerprint: Option<String>,

    /// Final risk score
    pub risk_score: u8,

    /// Enforcement action
    pub action: EnforcementAction,

    /// Sub-scores at decision time
    pub risk_factors: RiskFactors,

    /// Reasons as returned to the caller
    pub reasons: Vec<String>,

    /// Request metadata
    pub metadata: HashMap<String, serde_json::Value>,

    /// Decision time
    pub decided_at: DateTime<Utc>,
}

impl AuditJob {
    /// Build a job from the request and its finalized result
    pub fn from_decision(request: &FraudCheckRequest, result: &FraudResult) -> Self {
        Self {
            session_id: result.session_id,
            action_type: request.action_type,
            user_id: request.user_id.clone(),
            ip_address: request.ip_address.clone(),
            user_agent: request.user_agent.clone(),
            device_fingerprint: request.device_fingerprint.clone(),
            risk_score: result.risk_score,
            action: result.action,
            risk_factors: result.risk_factors,
            reasons: result.reasons.clone(),
            metadata: request.metadata.clone(),
            decided_at: result.checked_at,
        }
    }
}

/// Cheap handle for dispatching jobs to the writer task
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditJob>,
}

impl AuditHandle {
    /// Queue a job without waiting for the write.
    ///
    /// A full or closed queue is an operational error: the job is logged
    /// with its session id and counted, so the loss is visible.
    pub fn dispatch(&self, job: AuditJob) {
        let session_id = job.session_id;
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                AUDIT_WRITE_TOTAL.with_label_values(&["dropped"]).inc();
                error!("Audit queue full, lost audit for session {}", session_id);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                AUDIT_WRITE_TOTAL.with_label_values(&["dropped"]).inc();
                error!("Audit writer stopped, lost audit for session {}", session_id);
            }
        }
    }
}

/// The writer task; owns the store write path
pub struct AuditWriter {
    store: Arc<dyn SignalStore>,
    rx: mpsc::Receiver<AuditJob>,
    config: AuditConfig,
}

impl AuditWriter {
    /// Spawn the writer and return its dispatch handle plus join handle.
    ///
    /// The worker drains the queue and exits once every handle is dropped.
    pub fn spawn(
        store: Arc<dyn SignalStore>,
        config: AuditConfig,
    ) -> (AuditHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_depth);
        let writer = AuditWriter { store, rx, config };
        let worker = tokio::spawn(writer.run());
        (AuditHandle { tx }, worker)
    }

    async fn run(mut self) {
        info!("Audit writer started");
        while let Some(job) = self.rx.recv().await {
            self.process(job).await;
        }
        info!("Audit writer stopped");
    }

    async fn process(&self, job: AuditJob) {
        let retry_policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_millis(self.config.retry_max_elapsed_ms)),
            ..ExponentialBackoff::default()
        };

        let outcome = backoff::future::retry(retry_policy, || async {
            self.write(&job).await.map_err(backoff::Error::transient)
        })
        .await;

        match outcome {
            Ok(true) => {
                AUDIT_WRITE_TOTAL.with_label_values(&["written"]).inc();
                debug!("Audit record written for session {}", job.session_id);
            }
            Ok(false) => {
                AUDIT_WRITE_TOTAL.with_label_values(&["duplicate"]).inc();
                debug!("Audit record for session {} already present", job.session_id);
            }
            Err(e) => {
                AUDIT_WRITE_TOTAL.with_label_values(&["failed"]).inc();
                error!(
                    "Audit write failed permanently for session {}: {}",
                    job.session_id, e
                );
            }
        }
    }

    /// One full write pass. Safe to retry: the audit insert is idempotent
    /// on session id and the tracking writes are upserts.
    async fn write(&self, job: &AuditJob) -> signal_store::Result<bool> {
        let record = AuditRecord {
            session_id: job.session_id,
            action_type: job.action_type.as_str().to_string(),
            user_id: job.user_id.clone(),
            ip_address: job.ip_address.clone(),
            risk_score: job.risk_score,
            action: job.action.as_str().to_string(),
            risk_factors: serde_json::to_value(job.risk_factors)
                .map_err(|e| signal_store::Error::Serialization(e.to_string()))?,
            reasons: job.reasons.clone(),
            metadata: serde_json::to_value(&job.metadata)
                .map_err(|e| signal_store::Error::Serialization(e.to_string()))?,
            created_at: job.decided_at,
        };

        let inserted = self.store.insert_audit_record(&record).await?;

        if let Some(ip_address) = job.ip_address.as_deref() {
            self.store
                .upsert_ip_tracking(ip_address, job.user_id.as_deref(), job.decided_at)
                .await?;
        }

        if let Some(fingerprint) = job.device_fingerprint.as_deref() {
            self.store
                .upsert_device_tracking(fingerprint, job.user_id.as_deref(), job.decided_at)
                .await?;
        }

        self.store
            .append_session_log(&SessionLogRow {
                session_id: job.session_id,
                user_id: job.user_id.clone(),
                ip_address: job.ip_address.clone(),
                user_agent: job.user_agent.clone(),
                action_type: job.action_type.as_str().to_string(),
                created_at: job.decided_at,
            })
            .await?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_store::MemoryStore;
    use uuid::Uuid;

    fn job(session_id: Uuid) -> AuditJob {
        AuditJob {
            session_id,
            action_type: ActionType::Booking,
            user_id: Some("u1".to_string()),
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            device_fingerprint: Some("fp-1".to_string()),
            risk_score: 18,
            action: EnforcementAction::Allow,
            risk_factors: RiskFactors::default(),
            reasons: vec!["Account created less than a week ago".to_string()],
            metadata: HashMap::new(),
            decided_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_one_job_writes_everything() {
        let store = Arc::new(MemoryStore::new());
        let (handle, worker) = AuditWriter::spawn(store.clone(), AuditConfig::default());

        let session_id = Uuid::new_v4();
        handle.dispatch(job(session_id));
        drop(handle);
        worker.await.unwrap();

        let record = store.audit_record(session_id).await.unwrap().unwrap();
        assert_eq!(record.risk_score, 18);
        assert_eq!(record.action, "allow");

        let ip = store.ip_tracking("203.0.113.9").await.unwrap().unwrap();
        assert!(ip.user_ids.contains("u1"));

        let device = store.device_tracking("fp-1").await.unwrap().unwrap();
        assert!(device.user_ids.contains("u1"));

        assert_eq!(store.session_log_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_session_writes_one_record() {
        let store = Arc::new(MemoryStore::new());
        let (handle, worker) = AuditWriter::spawn(store.clone(), AuditConfig::default());

        let session_id = Uuid::new_v4();
        handle.dispatch(job(session_id));
        handle.dispatch(job(session_id));
        drop(handle);
        worker.await.unwrap();

        assert_eq!(store.audit_record_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_never_blocks_on_stopped_worker() {
        let store = Arc::new(MemoryStore::new());
        let (handle, worker) = AuditWriter::spawn(store, AuditConfig::default());

        // Stop the worker, then dispatch into the closed queue
        worker.abort();
        let _ = worker.await;
        handle.dispatch(job(Uuid::new_v4()));
    }
}
