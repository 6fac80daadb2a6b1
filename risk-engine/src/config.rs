//! Configuration for the risk pipeline
//!
//! Weights, thresholds and heuristic sub-thresholds are deliberately
//! external configuration so the decision policy can be tuned without code
//! changes. `validate()` enforces the startup invariants: weights sum to
//! 1.0 and action thresholds are strictly increasing.

use crate::error::{Error, Result};
use crate::types::FactorKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tolerance for the weights sum check
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Per-factor aggregation weights
    pub weights: RiskWeights,

    /// Score thresholds for enforcement actions
    pub thresholds: ActionThresholds,

    /// Fan-out timing and degradation settings
    pub orchestrator: OrchestratorConfig,

    /// User behavior heuristics
    pub user_behavior: UserBehaviorConfig,

    /// Device risk heuristics
    pub device: DeviceRiskConfig,

    /// IP risk heuristics
    pub ip: IpRiskConfig,

    /// Payment pattern heuristics
    pub payment: PaymentPatternConfig,

    /// Content heuristics
    pub content: ContentConfig,

    /// Velocity heuristics
    pub velocity: VelocityConfig,
}

impl TrustConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("Failed to read config: {}", e)))?;
        let config: TrustConfig = toml::from_str(&content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> Result<Self> {
        let mut config = TrustConfig::default();

        if let Ok(ms) = std::env::var("TRUSTGATE_ANALYZER_TIMEOUT_MS") {
            config.orchestrator.analyzer_timeout_ms = ms
                .parse()
                .map_err(|e| Error::InvalidConfig(format!("Bad analyzer timeout: {}", e)))?;
        }

        if let Ok(ms) = std::env::var("TRUSTGATE_OVERALL_DEADLINE_MS") {
            config.orchestrator.overall_deadline_ms = ms
                .parse()
                .map_err(|e| Error::InvalidConfig(format!("Bad overall deadline: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the startup invariants
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.orchestrator.validate()?;
        Ok(())
    }
}

/// Per-factor aggregation weights, must sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeights {
    /// Weight for user behavior
    pub user_behavior: f64,
    /// Weight for device risk
    pub device_risk: f64,
    /// Weight for IP risk
    pub ip_risk: f64,
    /// Weight for payment risk
    pub payment_risk: f64,
    /// Weight for content risk
    pub content_risk: f64,
    /// Weight for velocity risk
    pub velocity_risk: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            user_behavior: 0.25,
            device_risk: 0.15,
            ip_risk: 0.15,
            payment_risk: 0.20,
            content_risk: 0.15,
            velocity_risk: 0.10,
        }
    }
}

impl RiskWeights {
    /// Weight for one factor
    pub fn get(&self, kind: FactorKind) -> f64 {
        match kind {
            FactorKind::UserBehavior => self.user_behavior,
            FactorKind::DeviceRisk => self.device_risk,
            FactorKind::IpRisk => self.ip_risk,
            FactorKind::PaymentRisk => self.payment_risk,
            FactorKind::ContentRisk => self.content_risk,
            FactorKind::VelocityRisk => self.velocity_risk,
        }
    }

    /// Check every weight is non-negative and the sum is 1.0
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.user_behavior,
            self.device_risk,
            self.ip_risk,
            self.payment_risk,
            self.content_risk,
            self.velocity_risk,
        ];

        if all.iter().any(|w| *w < 0.0) {
            return Err(Error::InvalidConfig("Weights must be non-negative".to_string()));
        }

        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(Error::InvalidConfig(format!(
                "Weights must sum to 1.0, got {}",
                sum
            )));
        }

        Ok(())
    }
}

/// Score thresholds for enforcement actions, evaluated highest-first.
///
/// Must be strictly increasing: review < require_verification < block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionThresholds {
    /// At or above: flag for manual review
    pub review: u8,

    /// At or above: require step-up verification
    pub require_verification: u8,

    /// At or above: block the action
    pub block: u8,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            review: 40,
            require_verification: 60,
            block: 80,
        }
    }
}

impl ActionThresholds {
    /// Check thresholds are strictly increasing and within 1-100
    pub fn validate(&self) -> Result<()> {
        if self.review == 0 || self.block > 100 {
            return Err(Error::InvalidConfig(
                "Thresholds must be within 1-100".to_string(),
            ));
        }
        if !(self.review < self.require_verification && self.require_verification < self.block) {
            return Err(Error::InvalidConfig(format!(
                "Thresholds must be strictly increasing: review {} < require_verification {} < block {}",
                self.review, self.require_verification, self.block
            )));
        }
        Ok(())
    }
}

/// Fan-out timing and degradation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-analyzer timeout (milliseconds)
    pub analyzer_timeout_ms: u64,

    /// Overall fan-out deadline (milliseconds)
    pub overall_deadline_ms: u64,

    /// Fixed sub-score applied when an analyzer fails or times out
    pub degraded_penalty: u8,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: 150,
            overall_deadline_ms: 400,
            degraded_penalty: 10,
        }
    }
}

impl OrchestratorConfig {
    /// Check the deadline covers the per-analyzer timeout
    pub fn validate(&self) -> Result<()> {
        if self.analyzer_timeout_ms == 0 || self.overall_deadline_ms == 0 {
            return Err(Error::InvalidConfig("Timeouts must be non-zero".to_string()));
        }
        if self.overall_deadline_ms < self.analyzer_timeout_ms {
            return Err(Error::InvalidConfig(format!(
                "Overall deadline {}ms is shorter than the analyzer timeout {}ms",
                self.overall_deadline_ms, self.analyzer_timeout_ms
            )));
        }
        Ok(())
    }
}

/// User behavior heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBehaviorConfig {
    /// Penalty for accounts younger than one day
    pub new_account_day_penalty: u8,

    /// Penalty for accounts younger than one week (when not younger than a day)
    pub new_account_week_penalty: u8,

    /// Penalty for an unverified email
    pub unverified_email_penalty: u8,

    /// Penalty for an unverified phone
    pub unverified_phone_penalty: u8,

    /// Penalty when the profile is missing entirely
    pub unknown_user_penalty: u8,

    /// Bookings in the trailing 24h above which the burst penalty applies
    pub max_bookings_per_day: usize,

    /// Penalty for the booking burst
    pub booking_burst_penalty: u8,

    /// Cancellation rate over the trailing 7d above which the penalty applies
    pub cancellation_rate_threshold: f64,

    /// Minimum bookings before the cancellation rate is considered
    pub cancellation_min_bookings: usize,

    /// Penalty for a high cancellation rate
    pub cancellation_penalty: u8,
}

impl Default for UserBehaviorConfig {
    fn default() -> Self {
        Self {
            new_account_day_penalty: 30,
            new_account_week_penalty: 15,
            unverified_email_penalty: 20,
            unverified_phone_penalty: 10,
            unknown_user_penalty: 20,
            max_bookings_per_day: 5,
            booking_burst_penalty: 25,
            cancellation_rate_threshold: 0.5,
            cancellation_min_bookings: 3,
            cancellation_penalty: 20,
        }
    }
}

/// Device risk heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRiskConfig {
    /// Distinct users behind one fingerprint above which the penalty applies
    pub shared_device_user_threshold: usize,

    /// Penalty for a widely shared device
    pub shared_device_penalty: u8,

    /// Penalty for a bot/automation user agent
    pub bot_agent_penalty: u8,

    /// Penalty for switching between mobile and desktop agents
    pub agent_switch_penalty: u8,

    /// Trailing window (days) for the agent-switch lookup
    pub agent_switch_window_days: i64,
}

impl Default for DeviceRiskConfig {
    fn default() -> Self {
        Self {
            shared_device_user_threshold: 3,
            shared_device_penalty: 30,
            bot_agent_penalty: 40,
            agent_switch_penalty: 10,
            agent_switch_window_days: 7,
        }
    }
}

/// IP risk heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpRiskConfig {
    /// Distinct users behind one IP above which the penalty applies
    pub shared_ip_user_threshold: usize,

    /// Penalty for a widely shared IP
    pub shared_ip_penalty: u8,

    /// Distinct IPs for one user in the trailing hour above which the
    /// churn penalty applies
    pub churn_ip_threshold: usize,

    /// Penalty for rapid IP churn
    pub churn_penalty: u8,

    /// Penalty for malformed IP syntax
    pub invalid_ip_penalty: u8,

    /// Penalty for private/reserved ranges where a public IP is expected
    pub private_range_penalty: u8,
}

impl Default for IpRiskConfig {
    fn default() -> Self {
        Self {
            shared_ip_user_threshold: 5,
            shared_ip_penalty: 25,
            churn_ip_threshold: 3,
            churn_penalty: 25,
            invalid_ip_penalty: 20,
            private_range_penalty: 10,
        }
    }
}

/// Payment pattern heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPatternConfig {
    /// Failed payments in the trailing 7d above which the penalty applies
    pub failed_payment_threshold: usize,

    /// Penalty for repeated failures
    pub failed_payment_penalty: u8,

    /// Absolute amount above which the high-amount penalty applies
    pub high_amount_threshold: Decimal,

    /// Penalty for an unusually high amount
    pub high_amount_penalty: u8,

    /// Multiple of the user's historical average above which the penalty applies
    pub average_multiple_threshold: Decimal,

    /// Minimum prior succeeded payments before the average is considered
    pub average_min_payments: usize,

    /// Penalty for a large multiple of the historical average
    pub average_multiple_penalty: u8,

    /// Payments in the trailing hour above which the frequency penalty applies
    pub hourly_payment_threshold: usize,

    /// Penalty for high payment frequency
    pub payment_frequency_penalty: u8,
}

impl Default for PaymentPatternConfig {
    fn default() -> Self {
        Self {
            failed_payment_threshold: 3,
            failed_payment_penalty: 30,
            high_amount_threshold: Decimal::from(1_000),
            high_amount_penalty: 25,
            average_multiple_threshold: Decimal::from(5),
            average_min_payments: 3,
            average_multiple_penalty: 20,
            hourly_payment_threshold: 3,
            payment_frequency_penalty: 25,
        }
    }
}

/// Content heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Spam keyword/phrase list, matched case-insensitively
    pub spam_keywords: Vec<String>,

    /// Spam hits at or above which the heavy penalty applies
    pub spam_heavy_threshold: usize,

    /// Penalty for heavy spam keyword density
    pub spam_heavy_penalty: u8,

    /// Penalty for one or two spam hits
    pub spam_light_penalty: u8,

    /// Penalty for off-platform contact patterns (phone/email/messenger)
    pub contact_pattern_penalty: u8,

    /// Penalty for profanity patterns
    pub profanity_penalty: u8,

    /// Characters above which the length penalty applies
    pub max_content_length: usize,

    /// Penalty for excessive length
    pub length_penalty: u8,

    /// Word repetition ratio above which the penalty applies
    pub repetition_ratio_threshold: f64,

    /// Minimum words before the repetition ratio is considered
    pub repetition_min_words: usize,

    /// Penalty for heavy word repetition
    pub repetition_penalty: u8,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            spam_keywords: [
                "free money",
                "guaranteed",
                "click here",
                "act now",
                "limited time",
                "winner",
                "congratulations",
                "no risk",
                "100% free",
                "make money fast",
                "work from home",
                "double your",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            spam_heavy_threshold: 3,
            spam_heavy_penalty: 40,
            spam_light_penalty: 15,
            contact_pattern_penalty: 25,
            profanity_penalty: 20,
            max_content_length: 2_000,
            length_penalty: 10,
            repetition_ratio_threshold: 0.5,
            repetition_min_words: 10,
            repetition_penalty: 15,
        }
    }
}

/// Velocity heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityConfig {
    /// User actions in the trailing hour above which the penalty applies
    pub user_hourly_threshold: usize,

    /// Penalty for high user action rate
    pub user_hourly_penalty: u8,

    /// Burst window (minutes) for rapid repeated actions
    pub burst_window_mins: i64,

    /// User actions within the burst window above which the penalty applies
    pub burst_threshold: usize,

    /// Penalty for rapid repeated actions
    pub burst_penalty: u8,

    /// IP actions in the trailing hour above which the penalty applies
    pub ip_hourly_threshold: usize,

    /// Penalty for high IP action rate
    pub ip_hourly_penalty: u8,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            user_hourly_threshold: 20,
            user_hourly_penalty: 30,
            burst_window_mins: 5,
            burst_threshold: 8,
            burst_penalty: 25,
            ip_hourly_threshold: 50,
            ip_hourly_penalty: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrustConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = RiskWeights::default();
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_bad_weight_sum_rejected() {
        let weights = RiskWeights {
            user_behavior: 0.5,
            ..RiskWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = RiskWeights {
            user_behavior: -0.1,
            device_risk: 0.5,
            ip_risk: 0.15,
            payment_risk: 0.20,
            content_risk: 0.15,
            velocity_risk: 0.10,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_non_monotonic_thresholds_rejected() {
        let thresholds = ActionThresholds {
            review: 60,
            require_verification: 40,
            block: 80,
        };
        assert!(thresholds.validate().is_err());

        let equal = ActionThresholds {
            review: 40,
            require_verification: 40,
            block: 80,
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn test_deadline_must_cover_analyzer_timeout() {
        let orchestrator = OrchestratorConfig {
            analyzer_timeout_ms: 500,
            overall_deadline_ms: 100,
            degraded_penalty: 10,
        };
        assert!(orchestrator.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = TrustConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: TrustConfig = toml::from_str(&serialized).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.thresholds.block, 80);
    }
}
