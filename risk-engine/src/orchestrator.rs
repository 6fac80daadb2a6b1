//! Analyzer orchestration
//!
//! Fans the applicable analyzers out as concurrent tasks over a shared
//! read-only store handle, bounds latency with a per-analyzer timeout and
//! an overall deadline, and always produces a report for every factor:
//! error, timeout and panic all degrade to a fixed penalty instead of
//! failing the request.

use crate::analyzers::{
    Analyzer, ContentAnalyzer, DeviceRiskAnalyzer, IpRiskAnalyzer, PaymentPatternAnalyzer,
    UserBehaviorAnalyzer, VelocityAnalyzer,
};
use crate::config::TrustConfig;
use crate::types::{AnalyzerReport, FactorKind, FraudCheckRequest, RiskFactors};
use signal_store::SignalStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Per-factor reports with every factor present
#[derive(Debug, Clone)]
pub struct AnalyzerReports {
    reports: HashMap<FactorKind, AnalyzerReport>,
}

impl AnalyzerReports {
    /// All factors present as skipped (score 0)
    pub fn empty() -> Self {
        let reports = FactorKind::ORDERED
            .iter()
            .map(|kind| (*kind, AnalyzerReport::skipped()))
            .collect();
        Self { reports }
    }

    /// Replace the report for one factor
    pub fn insert(&mut self, kind: FactorKind, report: AnalyzerReport) {
        self.reports.insert(kind, report);
    }

    /// Report for one factor
    pub fn get(&self, kind: FactorKind) -> &AnalyzerReport {
        // empty() seeds every factor
        &self.reports[&kind]
    }

    /// Sub-scores as a `RiskFactors`
    pub fn factors(&self) -> RiskFactors {
        let mut factors = RiskFactors::default();
        for kind in FactorKind::ORDERED {
            factors.set(kind, self.get(kind).score);
        }
        factors
    }
}

/// How one spawned analyzer task ended
enum TaskOutcome {
    Done(AnalyzerReport),
    Failed,
    TimedOut,
}

/// Aborts the spawned task if the orchestration future is dropped, so
/// caller cancellation propagates to in-flight analyzer queries.
struct AbortOnDrop(JoinHandle<TaskOutcome>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs the applicable analyzer subset concurrently for one request
pub struct Orchestrator {
    store: Arc<dyn SignalStore>,
    config: Arc<TrustConfig>,
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl Orchestrator {
    /// Build the standard six-analyzer set from config
    pub fn new(store: Arc<dyn SignalStore>, config: Arc<TrustConfig>) -> Self {
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![
            Arc::new(UserBehaviorAnalyzer::new(config.user_behavior.clone())),
            Arc::new(DeviceRiskAnalyzer::new(config.device.clone())),
            Arc::new(IpRiskAnalyzer::new(config.ip.clone())),
            Arc::new(PaymentPatternAnalyzer::new(config.payment.clone())),
            Arc::new(ContentAnalyzer::new(config.content.clone())),
            Arc::new(VelocityAnalyzer::new(config.velocity.clone())),
        ];
        Self {
            store,
            config,
            analyzers,
        }
    }

    /// Factors the orchestrator would run for this request
    pub fn applicable(&self, request: &FraudCheckRequest) -> Vec<FactorKind> {
        self.analyzers
            .iter()
            .filter(|a| a.applies_to(request))
            .map(|a| a.kind())
            .collect()
    }

    /// Run the applicable analyzers and collect a report per factor.
    ///
    /// Never fails: each factor ends up with its analyzer's report, a
    /// skipped report (inapplicable), or the degraded penalty.
    pub async fn run(&self, request: Arc<FraudCheckRequest>) -> AnalyzerReports {
        let mut reports = AnalyzerReports::empty();

        let per_timeout = Duration::from_millis(self.config.orchestrator.analyzer_timeout_ms);
        let overall = Duration::from_millis(self.config.orchestrator.overall_deadline_ms);

        let mut tasks: Vec<(FactorKind, AbortOnDrop)> = Vec::new();
        for analyzer in &self.analyzers {
            if !analyzer.applies_to(&request) {
                debug!("{} not applicable, factor stays 0", analyzer.kind());
                continue;
            }
            let kind = analyzer.kind();
            let analyzer = Arc::clone(analyzer);
            let store = Arc::clone(&self.store);
            let request = Arc::clone(&request);

            let handle = tokio::spawn(async move {
                match tokio::time::timeout(per_timeout, analyzer.analyze(request, store)).await {
                    Ok(Ok(report)) => TaskOutcome::Done(report),
                    Ok(Err(e)) => {
                        warn!("{} analyzer failed: {}", kind, e);
                        TaskOutcome::Failed
                    }
                    Err(_) => {
                        warn!("{} analyzer timed out after {:?}", kind, per_timeout);
                        TaskOutcome::TimedOut
                    }
                }
            });
            tasks.push((kind, AbortOnDrop(handle)));
        }

        // Fan-in under the overall deadline. Tasks already run concurrently;
        // awaiting them in order still observes every completion, and once
        // the deadline passes the remaining tasks degrade and are aborted.
        let deadline = tokio::time::Instant::now() + overall;
        for (kind, mut task) in tasks {
            let outcome = match tokio::time::timeout_at(deadline, &mut task.0).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join_error)) => {
                    warn!("{} analyzer task panicked: {}", kind, join_error);
                    TaskOutcome::Failed
                }
                Err(_) => {
                    warn!("Overall deadline exceeded, degrading {}", kind);
                    TaskOutcome::TimedOut
                }
            };

            let report = match outcome {
                TaskOutcome::Done(report) => report,
                TaskOutcome::Failed => self.degraded(kind, "analysis degraded"),
                TaskOutcome::TimedOut => self.degraded(kind, "analysis timed out"),
            };
            reports.insert(kind, report);
        }

        reports
    }

    fn degraded(&self, kind: FactorKind, what: &str) -> AnalyzerReport {
        AnalyzerReport::new(
            self.config.orchestrator.degraded_penalty,
            vec![format!("{} {}", kind, what)],
        )
    }
}
