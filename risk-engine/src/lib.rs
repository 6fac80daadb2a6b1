//! Risk Engine for TrustGate
//!
//! Real-time risk scoring for user-initiated actions: six independent
//! signal analyzers fanned out concurrently, combined into one weighted
//! score and an enforcement action.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod analyzers;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use aggregator::RiskAggregator;
pub use config::TrustConfig;
pub use error::{Error, Result};
pub use orchestrator::{AnalyzerReports, Orchestrator};
pub use types::*;
