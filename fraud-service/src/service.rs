//! Fraud check entry point
//!
//! Validates the incoming payload, assigns a session id, fans out the
//! analyzers, aggregates the decision and hands it to the audit writer.
//! A syntactically valid request always receives a result; degraded
//! signal availability only lowers confidence, never errors.

use crate::audit::{AuditConfig, AuditHandle, AuditJob, AuditWriter};
use crate::error::{Error, Result};
use crate::metrics::{CHECK_REJECTED_TOTAL, FRAUD_CHECK_DURATION, FRAUD_CHECK_TOTAL};
use chrono::Utc;
use risk_engine::{
    ActionType, FraudCheckRequest, FraudResult, Orchestrator, RiskAggregator, TrustConfig,
};
use serde::{Deserialize, Serialize};
use signal_store::SignalStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

/// Raw wire form of a fraud check request. `action_type` is validated into
/// the typed request before any analyzer runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckPayload {
    /// Requested action, one of: registration, booking, payment,
    /// messaging, login
    pub action_type: String,

    /// User, when authenticated
    pub user_id: Option<String>,

    /// Client IP
    pub ip_address: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Device fingerprint, when collected
    pub device_fingerprint: Option<String>,

    /// Open key/value payload (e.g. `amount`, `content`, `booking_id`)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CheckPayload {
    /// Payload with only an action type set
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            ..Self::default()
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// The fraud check pipeline behind one store handle
pub struct FraudCheckService {
    orchestrator: Orchestrator,
    aggregator: RiskAggregator,
    audit: AuditHandle,
    audit_worker: JoinHandle<()>,
}

impl FraudCheckService {
    /// Build the pipeline; the config is validated here, at startup
    pub fn new(store: Arc<dyn SignalStore>, config: TrustConfig) -> Result<Self> {
        Self::with_audit_config(store, config, AuditConfig::default())
    }

    /// Build the pipeline with explicit audit writer settings
    pub fn with_audit_config(
        store: Arc<dyn SignalStore>,
        config: TrustConfig,
        audit_config: AuditConfig,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let orchestrator = Orchestrator::new(Arc::clone(&store), Arc::clone(&config));
        let aggregator = RiskAggregator::new(config.weights.clone(), config.thresholds.clone());
        let (audit, audit_worker) = AuditWriter::spawn(store, audit_config);

        Ok(Self {
            orchestrator,
            aggregator,
            audit,
            audit_worker,
        })
    }

    /// Run one fraud check and return the decision.
    ///
    /// The audit write is dispatched asynchronously; the result is returned
    /// as soon as aggregation completes.
    pub async fn check(&self, payload: CheckPayload) -> Result<FraudResult> {
        let request = Arc::new(self.validate(payload)?);
        let session_id = Uuid::new_v4();
        let started = Instant::now();

        let reports = self.orchestrator.run(Arc::clone(&request)).await;
        let aggregation = self.aggregator.aggregate(&reports);

        let result = FraudResult {
            risk_score: aggregation.risk_score,
            action: aggregation.action,
            risk_factors: aggregation.risk_factors,
            reasons: aggregation.reasons,
            session_id,
            checked_at: Utc::now(),
        };

        self.audit
            .dispatch(AuditJob::from_decision(&request, &result));

        let action_type = request.action_type.as_str();
        FRAUD_CHECK_TOTAL
            .with_label_values(&[action_type, result.action.as_str()])
            .inc();
        FRAUD_CHECK_DURATION
            .with_label_values(&[action_type])
            .observe(started.elapsed().as_secs_f64());

        info!(
            "Fraud check {} for {}: score {} -> {}",
            session_id, action_type, result.risk_score, result.action
        );

        Ok(result)
    }

    /// Validate the raw payload into a typed request.
    ///
    /// An unknown action type is rejected here: no analyzer runs and no
    /// audit record is written.
    fn validate(&self, payload: CheckPayload) -> Result<FraudCheckRequest> {
        let action_type: ActionType = payload.action_type.parse().map_err(|_| {
            CHECK_REJECTED_TOTAL
                .with_label_values(&["unknown_action_type"])
                .inc();
            Error::UnknownActionType(payload.action_type.clone())
        })?;

        Ok(FraudCheckRequest {
            action_type,
            user_id: normalize(payload.user_id),
            ip_address: normalize(payload.ip_address),
            user_agent: normalize(payload.user_agent),
            device_fingerprint: normalize(payload.device_fingerprint),
            metadata: payload.metadata,
        })
    }

    /// Drain the audit queue and stop the writer. Used by tests and
    /// graceful shutdown; pending audit jobs are written before return.
    pub async fn shutdown(self) {
        let Self {
            audit, audit_worker, ..
        } = self;
        drop(audit);
        let _ = audit_worker.await;
    }
}
