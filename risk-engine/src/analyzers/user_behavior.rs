//! User behavior analyzer
//!
//! Penalizes very new accounts, missing verification, and for bookings a
//! burst of recent bookings or a high cancellation rate.

use crate::analyzers::Analyzer;
use crate::config::UserBehaviorConfig;
use crate::types::{ActionType, AnalyzerReport, FactorKind, FraudCheckRequest};
use crate::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use signal_store::{BookingStatus, SignalStore};
use std::sync::Arc;
use tracing::debug;

/// Scores account age, verification flags and booking behavior
pub struct UserBehaviorAnalyzer {
    config: UserBehaviorConfig,
}

impl UserBehaviorAnalyzer {
    /// Create from config
    pub fn new(config: UserBehaviorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Analyzer for UserBehaviorAnalyzer {
    fn kind(&self) -> FactorKind {
        FactorKind::UserBehavior
    }

    fn applies_to(&self, request: &FraudCheckRequest) -> bool {
        request.user_id.is_some()
    }

    async fn analyze(
        &self,
        request: Arc<FraudCheckRequest>,
        store: Arc<dyn SignalStore>,
    ) -> Result<AnalyzerReport> {
        let user_id = match request.user_id.as_deref() {
            Some(id) => id,
            None => return Ok(AnalyzerReport::skipped()),
        };

        let mut score = 0u8;
        let mut reasons = Vec::new();
        let now = Utc::now();

        match store.user_profile(user_id).await? {
            Some(profile) => {
                let age = now - profile.created_at;
                // Exclusive tiers: the day penalty replaces the week penalty
                if age < Duration::days(1) {
                    score = score.saturating_add(self.config.new_account_day_penalty);
                    reasons.push("Account created less than a day ago".to_string());
                } else if age < Duration::days(7) {
                    score = score.saturating_add(self.config.new_account_week_penalty);
                    reasons.push("Account created less than a week ago".to_string());
                }

                if !profile.email_verified {
                    score = score.saturating_add(self.config.unverified_email_penalty);
                    reasons.push("Email not verified".to_string());
                }

                if !profile.phone_verified {
                    score = score.saturating_add(self.config.unverified_phone_penalty);
                    reasons.push("Phone not verified".to_string());
                }
            }
            None => {
                debug!("No profile found for user on {}", request.action_type);
                score = score.saturating_add(self.config.unknown_user_penalty);
                reasons.push("User profile not found".to_string());
            }
        }

        if request.action_type == ActionType::Booking {
            let day_bookings = store
                .bookings_since(user_id, now - Duration::hours(24))
                .await?;
            if day_bookings.len() > self.config.max_bookings_per_day {
                score = score.saturating_add(self.config.booking_burst_penalty);
                reasons.push("Excessive bookings in the last 24 hours".to_string());
            }

            let week_bookings = store
                .bookings_since(user_id, now - Duration::days(7))
                .await?;
            if week_bookings.len() >= self.config.cancellation_min_bookings {
                let cancelled = week_bookings
                    .iter()
                    .filter(|b| b.status == BookingStatus::Cancelled)
                    .count();
                let rate = cancelled as f64 / week_bookings.len() as f64;
                if rate > self.config.cancellation_rate_threshold {
                    score = score.saturating_add(self.config.cancellation_penalty);
                    reasons.push("High cancellation rate over the last 7 days".to_string());
                }
            }
        }

        Ok(AnalyzerReport::new(score, reasons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_store::{BookingRecord, MemoryStore, UserProfile};

    fn booking_request(user_id: &str) -> Arc<FraudCheckRequest> {
        let mut request = FraudCheckRequest::new(ActionType::Booking);
        request.user_id = Some(user_id.to_string());
        Arc::new(request)
    }

    fn profile(user_id: &str, age: Duration, email: bool, phone: bool) -> UserProfile {
        UserProfile {
            user_id: user_id.to_string(),
            created_at: Utc::now() - age,
            email_verified: email,
            phone_verified: phone,
        }
    }

    #[tokio::test]
    async fn test_new_unverified_account_scores_sixty() {
        // Scenario: day-old account, nothing verified, no booking history
        let store = Arc::new(MemoryStore::new());
        store.seed_user(profile("u1", Duration::hours(6), false, false));

        let analyzer = UserBehaviorAnalyzer::new(UserBehaviorConfig::default());
        let report = analyzer
            .analyze(booking_request("u1"), store)
            .await
            .unwrap();

        assert_eq!(report.score, 60); // 30 + 20 + 10
        assert_eq!(report.reasons.len(), 3);
    }

    #[tokio::test]
    async fn test_week_old_account_gets_moderate_penalty() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(profile("u1", Duration::days(3), true, true));

        let analyzer = UserBehaviorAnalyzer::new(UserBehaviorConfig::default());
        let report = analyzer
            .analyze(booking_request("u1"), store)
            .await
            .unwrap();

        assert_eq!(report.score, 15);
    }

    #[tokio::test]
    async fn test_established_verified_account_is_clean() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(profile("u1", Duration::days(400), true, true));

        let analyzer = UserBehaviorAnalyzer::new(UserBehaviorConfig::default());
        let report = analyzer
            .analyze(booking_request("u1"), store)
            .await
            .unwrap();

        assert_eq!(report.score, 0);
        assert!(report.reasons.is_empty());
    }

    #[tokio::test]
    async fn test_booking_burst_and_cancellations_penalized() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(profile("u1", Duration::days(100), true, true));

        // 6 bookings in the last day, 4 of them cancelled
        for i in 0..6 {
            store.seed_booking(BookingRecord {
                user_id: "u1".to_string(),
                booking_id: format!("b{}", i),
                status: if i < 4 {
                    BookingStatus::Cancelled
                } else {
                    BookingStatus::Completed
                },
                created_at: Utc::now() - Duration::hours(i as i64),
            });
        }

        let analyzer = UserBehaviorAnalyzer::new(UserBehaviorConfig::default());
        let report = analyzer
            .analyze(booking_request("u1"), store)
            .await
            .unwrap();

        assert_eq!(report.score, 45); // burst 25 + cancellation 20
        assert_eq!(report.reasons.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_user_is_a_signal_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = UserBehaviorAnalyzer::new(UserBehaviorConfig::default());

        let mut request = FraudCheckRequest::new(ActionType::Login);
        request.user_id = Some("ghost".to_string());

        let report = analyzer.analyze(Arc::new(request), store).await.unwrap();
        assert_eq!(report.score, 20);
        assert!(!report.reasons.is_empty());
    }
}
