//! Device risk analyzer
//!
//! Penalizes fingerprints shared across many accounts, bot/automation user
//! agents, and users hopping between mobile and desktop agents.

use crate::analyzers::Analyzer;
use crate::config::DeviceRiskConfig;
use crate::types::{AnalyzerReport, FactorKind, FraudCheckRequest};
use crate::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use signal_store::SignalStore;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref BOT_AGENT_RE: Regex = Regex::new(
        r"(?i)\b(bot|crawler|spider|curl|wget|python-requests|headless|phantomjs|selenium|scrapy|httpclient)\b"
    )
    .unwrap();
    static ref MOBILE_AGENT_RE: Regex =
        Regex::new(r"(?i)\b(mobile|android|iphone|ipad|ipod)\b").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentClass {
    Mobile,
    Desktop,
}

fn classify_agent(user_agent: &str) -> AgentClass {
    if MOBILE_AGENT_RE.is_match(user_agent) {
        AgentClass::Mobile
    } else {
        AgentClass::Desktop
    }
}

/// Scores device fingerprint sharing and user-agent anomalies
pub struct DeviceRiskAnalyzer {
    config: DeviceRiskConfig,
}

impl DeviceRiskAnalyzer {
    /// Create from config
    pub fn new(config: DeviceRiskConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Analyzer for DeviceRiskAnalyzer {
    fn kind(&self) -> FactorKind {
        FactorKind::DeviceRisk
    }

    fn applies_to(&self, request: &FraudCheckRequest) -> bool {
        request.device_fingerprint.is_some() || request.user_agent.is_some()
    }

    async fn analyze(
        &self,
        request: Arc<FraudCheckRequest>,
        store: Arc<dyn SignalStore>,
    ) -> Result<AnalyzerReport> {
        let mut score = 0u8;
        let mut reasons = Vec::new();

        if let Some(fingerprint) = request.device_fingerprint.as_deref() {
            if let Some(row) = store.device_tracking(fingerprint).await? {
                if row.user_ids.len() > self.config.shared_device_user_threshold {
                    debug!("Device seen across {} accounts", row.user_ids.len());
                    score = score.saturating_add(self.config.shared_device_penalty);
                    reasons.push("Device fingerprint shared across multiple accounts".to_string());
                }
            }
        }

        if let Some(user_agent) = request.user_agent.as_deref() {
            if BOT_AGENT_RE.is_match(user_agent) {
                score = score.saturating_add(self.config.bot_agent_penalty);
                reasons.push("User agent matches automation patterns".to_string());
            } else if let Some(user_id) = request.user_id.as_deref() {
                let since = Utc::now() - Duration::days(self.config.agent_switch_window_days);
                let sessions = store.sessions_for_user_since(user_id, since).await?;
                let current = classify_agent(user_agent);
                let switched = sessions
                    .iter()
                    .filter_map(|s| s.user_agent.as_deref())
                    .any(|agent| classify_agent(agent) != current);
                if switched {
                    score = score.saturating_add(self.config.agent_switch_penalty);
                    reasons.push("Recent sessions switch between mobile and desktop".to_string());
                }
            }
        }

        Ok(AnalyzerReport::new(score, reasons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionType;
    use signal_store::{DeviceTrackingRow, MemoryStore, SessionLogRow};
    use std::collections::HashSet;
    use uuid::Uuid;

    const DESKTOP_UA: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0";
    const MOBILE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148 Safari/604.1";

    fn request(fingerprint: Option<&str>, agent: Option<&str>, user: Option<&str>) -> Arc<FraudCheckRequest> {
        let mut request = FraudCheckRequest::new(ActionType::Login);
        request.device_fingerprint = fingerprint.map(|s| s.to_string());
        request.user_agent = agent.map(|s| s.to_string());
        request.user_id = user.map(|s| s.to_string());
        Arc::new(request)
    }

    #[tokio::test]
    async fn test_shared_fingerprint_penalized() {
        let store = Arc::new(MemoryStore::new());
        store.seed_device_tracking(DeviceTrackingRow {
            device_fingerprint: "fp-1".to_string(),
            user_ids: (0..5).map(|i| format!("u{}", i)).collect::<HashSet<_>>(),
            last_seen: Utc::now(),
        });

        let analyzer = DeviceRiskAnalyzer::new(DeviceRiskConfig::default());
        let report = analyzer
            .analyze(request(Some("fp-1"), None, None), store)
            .await
            .unwrap();

        assert_eq!(report.score, 30);
    }

    #[tokio::test]
    async fn test_bot_agent_heavily_penalized() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = DeviceRiskAnalyzer::new(DeviceRiskConfig::default());

        let report = analyzer
            .analyze(request(None, Some("python-requests/2.31.0"), None), store)
            .await
            .unwrap();

        assert_eq!(report.score, 40);
        assert_eq!(
            report.reasons,
            vec!["User agent matches automation patterns".to_string()]
        );
    }

    #[tokio::test]
    async fn test_agent_switch_lightly_penalized() {
        let store = Arc::new(MemoryStore::new());
        store.seed_session(SessionLogRow {
            session_id: Uuid::new_v4(),
            user_id: Some("u1".to_string()),
            ip_address: None,
            user_agent: Some(MOBILE_UA.to_string()),
            action_type: "login".to_string(),
            created_at: Utc::now() - Duration::days(1),
        });

        let analyzer = DeviceRiskAnalyzer::new(DeviceRiskConfig::default());
        let report = analyzer
            .analyze(request(None, Some(DESKTOP_UA), Some("u1")), store)
            .await
            .unwrap();

        assert_eq!(report.score, 10);
    }

    #[tokio::test]
    async fn test_normal_browser_is_clean() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = DeviceRiskAnalyzer::new(DeviceRiskConfig::default());

        let report = analyzer
            .analyze(request(Some("fp-clean"), Some(DESKTOP_UA), Some("u1")), store)
            .await
            .unwrap();

        assert_eq!(report.score, 0);
        assert!(report.reasons.is_empty());
    }
}
