//! Signal Store Adapter for TrustGate
//!
//! Read/write interface over the historical records the fraud pipeline
//! consumes: user profiles, booking/payment history, session logs and
//! IP/device tracking. Pure data access, no scoring policy.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use store::SignalStore;
pub use types::*;
