//! Core types for the risk engine

use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User-initiated action types covered by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// New account registration
    Registration,
    /// Creating a booking
    Booking,
    /// Charging a payment
    Payment,
    /// Sending a message
    Messaging,
    /// Logging in
    Login,
}

impl ActionType {
    /// String form used in logs and durable records
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Registration => "registration",
            ActionType::Booking => "booking",
            ActionType::Payment => "payment",
            ActionType::Messaging => "messaging",
            ActionType::Login => "login",
        }
    }
}

impl FromStr for ActionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(ActionType::Registration),
            "booking" => Ok(ActionType::Booking),
            "payment" => Ok(ActionType::Payment),
            "messaging" => Ok(ActionType::Messaging),
            "login" => Ok(ActionType::Login),
            other => Err(Error::UnknownActionType(other.to_string())),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated fraud-check request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudCheckRequest {
    /// The action being attempted
    pub action_type: ActionType,

    /// User, when authenticated
    pub user_id: Option<String>,

    /// Client IP
    pub ip_address: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Device fingerprint, when collected
    pub device_fingerprint: Option<String>,

    /// Open key/value payload; analyzers read their own optional keys
    /// (e.g. `amount`, `content`, `booking_id`)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl FraudCheckRequest {
    /// New request with empty optional fields
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            user_id: None,
            ip_address: None,
            user_agent: None,
            device_fingerprint: None,
            metadata: HashMap::new(),
        }
    }
}

/// The six risk factors, one per analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// Account age, verification and booking behavior
    UserBehavior,
    /// Shared devices and automation patterns
    DeviceRisk,
    /// IP reputation and churn
    IpRisk,
    /// Payment failures, amounts and frequency
    PaymentRisk,
    /// Message content signals
    ContentRisk,
    /// Action rate by user and IP
    VelocityRisk,
}

impl FactorKind {
    /// Fixed analyzer order, also the reason-concatenation order
    pub const ORDERED: [FactorKind; 6] = [
        FactorKind::UserBehavior,
        FactorKind::DeviceRisk,
        FactorKind::IpRisk,
        FactorKind::PaymentRisk,
        FactorKind::ContentRisk,
        FactorKind::VelocityRisk,
    ];

    /// Stable label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::UserBehavior => "user_behavior",
            FactorKind::DeviceRisk => "device_risk",
            FactorKind::IpRisk => "ip_risk",
            FactorKind::PaymentRisk => "payment_risk",
            FactorKind::ContentRisk => "content_risk",
            FactorKind::VelocityRisk => "velocity_risk",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sub-scores, each clamped to 0-100. Inapplicable factors are 0,
/// never omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// User behavior sub-score
    pub user_behavior: u8,
    /// Device risk sub-score
    pub device_risk: u8,
    /// IP risk sub-score
    pub ip_risk: u8,
    /// Payment risk sub-score
    pub payment_risk: u8,
    /// Content risk sub-score
    pub content_risk: u8,
    /// Velocity risk sub-score
    pub velocity_risk: u8,
}

impl RiskFactors {
    /// Sub-score for one factor
    pub fn get(&self, kind: FactorKind) -> u8 {
        match kind {
            FactorKind::UserBehavior => self.user_behavior,
            FactorKind::DeviceRisk => self.device_risk,
            FactorKind::IpRisk => self.ip_risk,
            FactorKind::PaymentRisk => self.payment_risk,
            FactorKind::ContentRisk => self.content_risk,
            FactorKind::VelocityRisk => self.velocity_risk,
        }
    }

    /// Set the sub-score for one factor, clamped to 100
    pub fn set(&mut self, kind: FactorKind, score: u8) {
        let score = score.min(100);
        match kind {
            FactorKind::UserBehavior => self.user_behavior = score,
            FactorKind::DeviceRisk => self.device_risk = score,
            FactorKind::IpRisk => self.ip_risk = score,
            FactorKind::PaymentRisk => self.payment_risk = score,
            FactorKind::ContentRisk => self.content_risk = score,
            FactorKind::VelocityRisk => self.velocity_risk = score,
        }
    }
}

/// One analyzer's outcome: a bounded sub-score plus human-readable reasons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerReport {
    /// Sub-score, clamped to 0-100
    pub score: u8,

    /// Short, PII-free reason strings suitable for audit display
    pub reasons: Vec<String>,
}

impl AnalyzerReport {
    /// Report with a clamped score
    pub fn new(score: u8, reasons: Vec<String>) -> Self {
        Self {
            score: score.min(100),
            reasons,
        }
    }

    /// Zero report for an inapplicable analyzer
    pub fn skipped() -> Self {
        Self::default()
    }
}

/// Enforcement outcome derived from the risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementAction {
    /// Let the action proceed
    Allow,
    /// Proceed, flag for manual review
    Review,
    /// Require step-up verification before proceeding
    RequireVerification,
    /// Block the action
    Block,
}

impl EnforcementAction {
    /// String form used in logs and durable records
    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementAction::Allow => "allow",
            EnforcementAction::Review => "review",
            EnforcementAction::RequireVerification => "require_verification",
            EnforcementAction::Block => "block",
        }
    }
}

impl fmt::Display for EnforcementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final trust decision for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudResult {
    /// Weighted risk score, 0-100
    pub risk_score: u8,

    /// Enforcement action derived from the score
    pub action: EnforcementAction,

    /// The sub-scores the decision was based on
    pub risk_factors: RiskFactors,

    /// Reasons in fixed analyzer order, at most 10
    pub reasons: Vec<String>,

    /// Unique per-request identifier, audit idempotency key
    pub session_id: Uuid,

    /// Decision timestamp
    pub checked_at: DateTime<Utc>,
}
