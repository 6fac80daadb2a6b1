//! IP risk analyzer
//!
//! Penalizes malformed or private addresses, IPs shared across many
//! accounts, and rapid IP churn by one user.

use crate::analyzers::Analyzer;
use crate::config::IpRiskConfig;
use crate::types::{AnalyzerReport, FactorKind, FraudCheckRequest};
use crate::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use signal_store::SignalStore;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

/// A client-supplied IP should be public; loopback, private and otherwise
/// reserved ranges suggest spoofed or proxied traffic.
fn is_private_or_reserved(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
        }
        IpAddr::V6(v6) => {
            // fc00::/7 unique-local
            v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00
        }
    }
}

/// Scores IP reputation, sharing and churn
pub struct IpRiskAnalyzer {
    config: IpRiskConfig,
}

impl IpRiskAnalyzer {
    /// Create from config
    pub fn new(config: IpRiskConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Analyzer for IpRiskAnalyzer {
    fn kind(&self) -> FactorKind {
        FactorKind::IpRisk
    }

    fn applies_to(&self, request: &FraudCheckRequest) -> bool {
        request.ip_address.is_some()
    }

    async fn analyze(
        &self,
        request: Arc<FraudCheckRequest>,
        store: Arc<dyn SignalStore>,
    ) -> Result<AnalyzerReport> {
        let ip_address = match request.ip_address.as_deref() {
            Some(ip) => ip,
            None => return Ok(AnalyzerReport::skipped()),
        };

        let mut score = 0u8;
        let mut reasons = Vec::new();

        match ip_address.parse::<IpAddr>() {
            Ok(addr) => {
                if is_private_or_reserved(addr) {
                    score = score.saturating_add(self.config.private_range_penalty);
                    reasons.push("IP address is in a private or reserved range".to_string());
                }
            }
            Err(_) => {
                score = score.saturating_add(self.config.invalid_ip_penalty);
                reasons.push("Malformed IP address".to_string());
            }
        }

        if let Some(row) = store.ip_tracking(ip_address).await? {
            if row.user_ids.len() > self.config.shared_ip_user_threshold {
                score = score.saturating_add(self.config.shared_ip_penalty);
                reasons.push("IP address shared across multiple accounts".to_string());
            }
        }

        if let Some(user_id) = request.user_id.as_deref() {
            let since = Utc::now() - Duration::hours(1);
            let sessions = store.sessions_for_user_since(user_id, since).await?;
            let mut distinct: HashSet<&str> =
                sessions.iter().filter_map(|s| s.ip_address.as_deref()).collect();
            distinct.insert(ip_address);
            if distinct.len() > self.config.churn_ip_threshold {
                score = score.saturating_add(self.config.churn_penalty);
                reasons.push("Multiple IP addresses used within the last hour".to_string());
            }
        }

        Ok(AnalyzerReport::new(score, reasons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionType;
    use signal_store::{IpTrackingRow, MemoryStore, SessionLogRow};
    use uuid::Uuid;

    fn request(ip: &str, user: Option<&str>) -> Arc<FraudCheckRequest> {
        let mut request = FraudCheckRequest::new(ActionType::Login);
        request.ip_address = Some(ip.to_string());
        request.user_id = user.map(|s| s.to_string());
        Arc::new(request)
    }

    #[tokio::test]
    async fn test_malformed_ip_penalized() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = IpRiskAnalyzer::new(IpRiskConfig::default());

        let report = analyzer
            .analyze(request("not-an-ip", None), store)
            .await
            .unwrap();

        assert_eq!(report.score, 20);
        assert_eq!(report.reasons, vec!["Malformed IP address".to_string()]);
    }

    #[tokio::test]
    async fn test_private_range_lightly_penalized() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = IpRiskAnalyzer::new(IpRiskConfig::default());

        let report = analyzer
            .analyze(request("192.168.1.10", None), store)
            .await
            .unwrap();
        assert_eq!(report.score, 10);

        let report = analyzer
            .analyze(request("127.0.0.1", None), Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        assert_eq!(report.score, 10);
    }

    #[tokio::test]
    async fn test_shared_ip_penalized() {
        let store = Arc::new(MemoryStore::new());
        store.seed_ip_tracking(IpTrackingRow {
            ip_address: "203.0.113.77".to_string(),
            user_ids: (0..8).map(|i| format!("u{}", i)).collect(),
            last_seen: Utc::now(),
        });

        let analyzer = IpRiskAnalyzer::new(IpRiskConfig::default());
        let report = analyzer
            .analyze(request("203.0.113.77", None), store)
            .await
            .unwrap();

        // 203.0.113.0/24 is the TEST-NET-3 documentation range
        assert_eq!(report.score, 35); // shared 25 + documentation range 10
        assert!(report
            .reasons
            .contains(&"IP address shared across multiple accounts".to_string()));
    }

    #[tokio::test]
    async fn test_ip_churn_penalized() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..3 {
            store.seed_session(SessionLogRow {
                session_id: Uuid::new_v4(),
                user_id: Some("u1".to_string()),
                ip_address: Some(format!("198.51.100.{}", i)),
                user_agent: None,
                action_type: "login".to_string(),
                created_at: Utc::now() - Duration::minutes(10 + i as i64),
            });
        }

        let analyzer = IpRiskAnalyzer::new(IpRiskConfig::default());
        // Fourth distinct IP inside the hour
        let report = analyzer
            .analyze(request("198.51.100.99", Some("u1")), store)
            .await
            .unwrap();

        assert!(report
            .reasons
            .contains(&"Multiple IP addresses used within the last hour".to_string()));
    }

    #[tokio::test]
    async fn test_clean_public_ip() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = IpRiskAnalyzer::new(IpRiskConfig::default());

        let report = analyzer
            .analyze(request("8.8.8.8", Some("u1")), store)
            .await
            .unwrap();

        assert_eq!(report.score, 0);
        assert!(report.reasons.is_empty());
    }
}
