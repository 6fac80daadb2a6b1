//! Velocity analyzer
//!
//! Penalizes high action rates over trailing windows: per-user hourly rate,
//! rapid repeated actions within minutes, and per-IP hourly rate.

use crate::analyzers::Analyzer;
use crate::config::VelocityConfig;
use crate::types::{AnalyzerReport, FactorKind, FraudCheckRequest};
use crate::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use signal_store::SignalStore;
use std::sync::Arc;

/// Scores action rate by user and IP
pub struct VelocityAnalyzer {
    config: VelocityConfig,
}

impl VelocityAnalyzer {
    /// Create from config
    pub fn new(config: VelocityConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Analyzer for VelocityAnalyzer {
    fn kind(&self) -> FactorKind {
        FactorKind::VelocityRisk
    }

    fn applies_to(&self, request: &FraudCheckRequest) -> bool {
        request.user_id.is_some() || request.ip_address.is_some()
    }

    async fn analyze(
        &self,
        request: Arc<FraudCheckRequest>,
        store: Arc<dyn SignalStore>,
    ) -> Result<AnalyzerReport> {
        let mut score = 0u8;
        let mut reasons = Vec::new();
        let now = Utc::now();

        if let Some(user_id) = request.user_id.as_deref() {
            let hour_sessions = store
                .sessions_for_user_since(user_id, now - Duration::hours(1))
                .await?;

            if hour_sessions.len() > self.config.user_hourly_threshold {
                score = score.saturating_add(self.config.user_hourly_penalty);
                reasons.push("High action rate for this account in the last hour".to_string());
            }

            let burst_start = now - Duration::minutes(self.config.burst_window_mins);
            let burst = hour_sessions
                .iter()
                .filter(|s| s.created_at >= burst_start)
                .count();
            if burst > self.config.burst_threshold {
                score = score.saturating_add(self.config.burst_penalty);
                reasons.push("Rapid repeated actions within minutes".to_string());
            }
        }

        if let Some(ip_address) = request.ip_address.as_deref() {
            let ip_sessions = store
                .sessions_for_ip_since(ip_address, now - Duration::hours(1))
                .await?;
            if ip_sessions.len() > self.config.ip_hourly_threshold {
                score = score.saturating_add(self.config.ip_hourly_penalty);
                reasons.push("High action rate for this IP in the last hour".to_string());
            }
        }

        Ok(AnalyzerReport::new(score, reasons))
    }
}
