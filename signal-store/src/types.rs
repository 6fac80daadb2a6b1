//! Durable record types for the signal store
//!
//! These records are created/updated by the audit writer and read by the
//! analyzers. Retention and cleanup are an external concern.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// User profile with verification flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier
    pub user_id: String,

    /// Account creation time
    pub created_at: DateTime<Utc>,

    /// Email verified
    pub email_verified: bool,

    /// Phone verified
    pub phone_verified: bool,
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Booking created, not yet completed
    Pending,
    /// Booking completed
    Completed,
    /// Booking cancelled by the user
    Cancelled,
}

/// One booking made by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    /// User who made the booking
    pub user_id: String,

    /// Booking identifier
    pub booking_id: String,

    /// Lifecycle status
    pub status: BookingStatus,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Payment outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment succeeded
    Succeeded,
    /// Payment failed (declined, insufficient funds, ...)
    Failed,
}

/// One payment attempt by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// User who paid
    pub user_id: String,

    /// Amount charged
    pub amount: Decimal,

    /// Outcome
    pub status: PaymentStatus,

    /// Attempt time
    pub created_at: DateTime<Utc>,
}

/// Append-only log of fraud-check sessions, used for velocity and
/// device-history lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLogRow {
    /// Session identifier of the fraud check
    pub session_id: Uuid,

    /// User, when authenticated
    pub user_id: Option<String>,

    /// Client IP
    pub ip_address: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Action type in string form (e.g. "booking")
    pub action_type: String,

    /// Log time
    pub created_at: DateTime<Utc>,
}

/// Accounts observed behind one IP address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpTrackingRow {
    /// The IP address
    pub ip_address: String,

    /// Distinct user ids seen from this IP
    pub user_ids: HashSet<String>,

    /// Last sighting
    pub last_seen: DateTime<Utc>,
}

/// Accounts observed behind one device fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTrackingRow {
    /// The device fingerprint
    pub device_fingerprint: String,

    /// Distinct user ids seen from this device
    pub user_ids: HashSet<String>,

    /// Last sighting
    pub last_seen: DateTime<Utc>,
}

/// Persisted copy of one fraud decision, keyed by session id.
///
/// At most one record exists per session id; a retried write with the same
/// id must not create a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Session identifier (idempotency key)
    pub session_id: Uuid,

    /// Checked action type in string form
    pub action_type: String,

    /// User, when authenticated
    pub user_id: Option<String>,

    /// Client IP
    pub ip_address: Option<String>,

    /// Final risk score (0-100)
    pub risk_score: u8,

    /// Enforcement action in string form (e.g. "allow")
    pub action: String,

    /// Per-factor sub-scores as recorded at decision time
    pub risk_factors: serde_json::Value,

    /// Human-readable reasons
    pub reasons: Vec<String>,

    /// Request metadata as received
    pub metadata: serde_json::Value,

    /// Decision time
    pub created_at: DateTime<Utc>,
}
