//! Payment pattern analyzer
//!
//! Runs only for payment actions. Penalizes repeated failures, unusually
//! high amounts, amounts far above the user's historical average, and high
//! payment frequency.

use crate::analyzers::Analyzer;
use crate::config::PaymentPatternConfig;
use crate::types::{ActionType, AnalyzerReport, FactorKind, FraudCheckRequest};
use crate::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use signal_store::{PaymentStatus, SignalStore};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// `metadata.amount` as a Decimal, accepting JSON numbers and numeric strings
fn metadata_amount(request: &FraudCheckRequest) -> Option<Decimal> {
    match request.metadata.get("amount")? {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(|f| Decimal::try_from(f).ok())
            }
        }
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

/// Scores payment failure history, amount anomalies and frequency
pub struct PaymentPatternAnalyzer {
    config: PaymentPatternConfig,
}

impl PaymentPatternAnalyzer {
    /// Create from config
    pub fn new(config: PaymentPatternConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Analyzer for PaymentPatternAnalyzer {
    fn kind(&self) -> FactorKind {
        FactorKind::PaymentRisk
    }

    fn applies_to(&self, request: &FraudCheckRequest) -> bool {
        request.action_type == ActionType::Payment && request.user_id.is_some()
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

        let week_payments = store
            .payments_since(user_id, now - Duration::days(7))
            .await?;

        let failed = week_payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Failed)
            .count();
        if failed > self.config.failed_payment_threshold {
            score = score.saturating_add(self.config.failed_payment_penalty);
            reasons.push("Repeated payment failures in the last 7 days".to_string());
        }

        match metadata_amount(&request) {
            Some(amount) => {
                if amount > self.config.high_amount_threshold {
                    score = score.saturating_add(self.config.high_amount_penalty);
                    reasons.push("Payment amount unusually high".to_string());
                }

                let succeeded: Vec<Decimal> = week_payments
                    .iter()
                    .filter(|p| p.status == PaymentStatus::Succeeded)
                    .map(|p| p.amount)
                    .collect();
                if succeeded.len() >= self.config.average_min_payments {
                    let average =
                        succeeded.iter().sum::<Decimal>() / Decimal::from(succeeded.len());
                    if average > Decimal::ZERO
                        && amount > average * self.config.average_multiple_threshold
                    {
                        score = score.saturating_add(self.config.average_multiple_penalty);
                        reasons
                            .push("Payment amount far above the historical average".to_string());
                    }
                }
            }
            None => {
                debug!("Payment request without a usable amount");
                reasons.push("Payment amount missing or malformed".to_string());
            }
        }

        let hour_payments = week_payments
            .iter()
            .filter(|p| p.created_at >= now - Duration::hours(1))
            .count();
        if hour_payments > self.config.hourly_payment_threshold {
            score = score.saturating_add(self.config.payment_frequency_penalty);
            reasons.push("High payment frequency in the last hour".to_string());
        }

        Ok(AnalyzerReport::new(score, reasons))
    }
}
