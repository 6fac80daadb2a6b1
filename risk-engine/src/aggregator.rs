//! Risk aggregation
//!
//! Combines the per-factor sub-scores into one weighted risk score and maps
//! it to an enforcement action via ordered thresholds. The sum is
//! commutative, so the completion order of concurrent analyzers never
//! changes the result; only the reason list has a fixed order.

use crate::config::{ActionThresholds, RiskWeights};
use crate::orchestrator::AnalyzerReports;
use crate::types::{EnforcementAction, FactorKind, RiskFactors};

/// Maximum reasons carried on a result
pub const MAX_REASONS: usize = 10;

/// Aggregated decision before session/audit wrapping
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Weighted risk score, 0-100
    pub risk_score: u8,

    /// Enforcement action derived from the score
    pub action: EnforcementAction,

    /// The sub-scores used
    pub risk_factors: RiskFactors,

    /// Reasons in fixed analyzer order, at most [`MAX_REASONS`]
    pub reasons: Vec<String>,
}

/// Combines sub-scores via fixed weights and ordered thresholds
pub struct RiskAggregator {
    weights: RiskWeights,
    thresholds: ActionThresholds,
}

impl RiskAggregator {
    /// Create from validated weights and thresholds
    pub fn new(weights: RiskWeights, thresholds: ActionThresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    /// Weighted score over the factors, rounded half away from zero and
    /// clamped to 0-100
    pub fn score(&self, factors: &RiskFactors) -> u8 {
        let weighted: f64 = FactorKind::ORDERED
            .iter()
            .map(|kind| self.weights.get(*kind) * f64::from(factors.get(*kind)))
            .sum();
        weighted.round().clamp(0.0, 100.0) as u8
    }

    /// Map a score to an action, highest threshold first
    pub fn action_for(&self, risk_score: u8) -> EnforcementAction {
        if risk_score >= self.thresholds.block {
            EnforcementAction::Block
        } else if risk_score >= self.thresholds.require_verification {
            EnforcementAction::RequireVerification
        } else if risk_score >= self.thresholds.review {
            EnforcementAction::Review
        } else {
            EnforcementAction::Allow
        }
    }

    /// Aggregate a full report set into a decision
    pub fn aggregate(&self, reports: &AnalyzerReports) -> Aggregation {
        let risk_factors = reports.factors();
        let risk_score = self.score(&risk_factors);
        let action = self.action_for(risk_score);

        let mut reasons = Vec::new();
        for kind in FactorKind::ORDERED {
            for reason in &reports.get(kind).reasons {
                if reasons.len() == MAX_REASONS {
                    break;
                }
                reasons.push(reason.clone());
            }
        }

        Aggregation {
            risk_score,
            action,
            risk_factors,
            reasons,
        }
    }
}
