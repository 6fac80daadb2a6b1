//! Signal analyzers
//!
//! Six independent, leaf-level policy units. Each consumes the request plus
//! read-only signal store queries and returns a bounded sub-score with
//! human-readable reasons. Store errors propagate to the orchestrator,
//! which recovers them into a fixed degraded penalty so an analyzer outage
//! never removes a risk signal.

mod content;
mod device;
mod ip;
mod payment;
mod user_behavior;
mod velocity;

pub use content::ContentAnalyzer;
pub use device::DeviceRiskAnalyzer;
pub use ip::IpRiskAnalyzer;
pub use payment::PaymentPatternAnalyzer;
pub use user_behavior::UserBehaviorAnalyzer;
pub use velocity::VelocityAnalyzer;

use crate::types::{AnalyzerReport, FactorKind, FraudCheckRequest};
use crate::Result;
use async_trait::async_trait;
use signal_store::SignalStore;
use std::sync::Arc;

/// Common analyzer contract
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// The factor this analyzer scores
    fn kind(&self) -> FactorKind;

    /// Whether the analyzer applies to the request at all. Inapplicable
    /// analyzers are not spawned; their factor stays 0.
    fn applies_to(&self, request: &FraudCheckRequest) -> bool;

    /// Score the request against historical signals
    async fn analyze(
        &self,
        request: Arc<FraudCheckRequest>,
        store: Arc<dyn SignalStore>,
    ) -> Result<AnalyzerReport>;
}

/// String content of a metadata key, if present and a string
pub(crate) fn metadata_str<'a>(request: &'a FraudCheckRequest, key: &str) -> Option<&'a str> {
    request.metadata.get(key).and_then(|v| v.as_str())
}
