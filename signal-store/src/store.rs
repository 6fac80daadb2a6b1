//! The `SignalStore` trait
//!
//! Analyzers consume the read side concurrently; all mutation goes through
//! the audit writer, which is the only caller of the write side.

use crate::types::{
    AuditRecord, BookingRecord, DeviceTrackingRow, IpTrackingRow, PaymentRecord, SessionLogRow,
    UserProfile,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Read/write interface over historical fraud signals.
///
/// Implementations must be safe for concurrent readers; the pipeline shares
/// one handle across all analyzer tasks.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Fetch a user profile
    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Bookings by a user at or after `since`
    async fn bookings_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>>;

    /// Payment attempts by a user at or after `since`
    async fn payments_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentRecord>>;

    /// Session log rows for a user at or after `since`
    async fn sessions_for_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SessionLogRow>>;

    /// Session log rows for an IP at or after `since`
    async fn sessions_for_ip_since(
        &self,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SessionLogRow>>;

    /// Tracking row for an IP, if any
    async fn ip_tracking(&self, ip_address: &str) -> Result<Option<IpTrackingRow>>;

    /// Tracking row for a device fingerprint, if any
    async fn device_tracking(&self, fingerprint: &str) -> Result<Option<DeviceTrackingRow>>;

    /// Audit record for a session, if any
    async fn audit_record(&self, session_id: Uuid) -> Result<Option<AuditRecord>>;

    /// Insert an audit record keyed by session id.
    ///
    /// Idempotent: returns `false` and leaves the existing record intact
    /// when the session id was already written.
    async fn insert_audit_record(&self, record: &AuditRecord) -> Result<bool>;

    /// Associate an IP with a user and refresh `last_seen`
    async fn upsert_ip_tracking(
        &self,
        ip_address: &str,
        user_id: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Associate a device fingerprint with a user and refresh `last_seen`
    async fn upsert_device_tracking(
        &self,
        fingerprint: &str,
        user_id: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Append one session log row
    async fn append_session_log(&self, row: &SessionLogRow) -> Result<()>;
}
