//! In-memory signal store
//!
//! DashMap-backed implementation of [`SignalStore`] used by tests and the
//! demo binary. Production deployments plug their own backend behind the
//! trait.

use crate::types::{
    AuditRecord, BookingRecord, DeviceTrackingRow, IpTrackingRow, PaymentRecord, SessionLogRow,
    UserProfile,
};
use crate::{Result, SignalStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// In-memory store over concurrent maps
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, UserProfile>,
    bookings: DashMap<String, Vec<BookingRecord>>,
    payments: DashMap<String, Vec<PaymentRecord>>,
    sessions: DashMap<Uuid, SessionLogRow>,
    ip_tracking: DashMap<String, IpTrackingRow>,
    device_tracking: DashMap<String, DeviceTrackingRow>,
    audit_records: DashMap<Uuid, AuditRecord>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user profile
    pub fn seed_user(&self, profile: UserProfile) {
        self.users.insert(profile.user_id.clone(), profile);
    }

    /// Seed a booking
    pub fn seed_booking(&self, booking: BookingRecord) {
        self.bookings
            .entry(booking.user_id.clone())
            .or_default()
            .push(booking);
    }

    /// Seed a payment
    pub fn seed_payment(&self, payment: PaymentRecord) {
        self.payments
            .entry(payment.user_id.clone())
            .or_default()
            .push(payment);
    }

    /// Seed a session log row
    pub fn seed_session(&self, row: SessionLogRow) {
        self.sessions.insert(row.session_id, row);
    }

    /// Seed an IP tracking row
    pub fn seed_ip_tracking(&self, row: IpTrackingRow) {
        self.ip_tracking.insert(row.ip_address.clone(), row);
    }

    /// Seed a device tracking row
    pub fn seed_device_tracking(&self, row: DeviceTrackingRow) {
        self.device_tracking
            .insert(row.device_fingerprint.clone(), row);
    }

    /// Number of audit records written
    pub fn audit_record_count(&self) -> usize {
        self.audit_records.len()
    }

    /// Number of session log rows
    pub fn session_log_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.users.get(user_id).map(|p| p.clone()))
    }

    async fn bookings_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>> {
        Ok(self
            .bookings
            .get(user_id)
            .map(|rows| {
                rows.iter()
                    .filter(|b| b.created_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn payments_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentRecord>> {
        Ok(self
            .payments
            .get(user_id)
            .map(|rows| {
                rows.iter()
                    .filter(|p| p.created_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn sessions_for_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SessionLogRow>> {
        Ok(self
            .sessions
            .iter()
            .filter(|entry| {
                entry.user_id.as_deref() == Some(user_id) && entry.created_at >= since
            })
            .map(|entry| entry.clone())
            .collect())
    }

    async fn sessions_for_ip_since(
        &self,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SessionLogRow>> {
        Ok(self
            .sessions
            .iter()
            .filter(|entry| {
                entry.ip_address.as_deref() == Some(ip_address) && entry.created_at >= since
            })
            .map(|entry| entry.clone())
            .collect())
    }

    async fn ip_tracking(&self, ip_address: &str) -> Result<Option<IpTrackingRow>> {
        Ok(self.ip_tracking.get(ip_address).map(|r| r.clone()))
    }

    async fn device_tracking(&self, fingerprint: &str) -> Result<Option<DeviceTrackingRow>> {
        Ok(self.device_tracking.get(fingerprint).map(|r| r.clone()))
    }

    async fn audit_record(&self, session_id: Uuid) -> Result<Option<AuditRecord>> {
        Ok(self.audit_records.get(&session_id).map(|r| r.clone()))
    }

    async fn insert_audit_record(&self, record: &AuditRecord) -> Result<bool> {
        match self.audit_records.entry(record.session_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                debug!("Audit record {} already exists, skipping", record.session_id);
                Ok(false)
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }

    async fn upsert_ip_tracking(
        &self,
        ip_address: &str,
        user_id: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut row = self
            .ip_tracking
            .entry(ip_address.to_string())
            .or_insert_with(|| IpTrackingRow {
                ip_address: ip_address.to_string(),
                user_ids: HashSet::new(),
                last_seen: seen_at,
            });
        if let Some(user_id) = user_id {
            row.user_ids.insert(user_id.to_string());
        }
        row.last_seen = seen_at;
        Ok(())
    }

    async fn upsert_device_tracking(
        &self,
        fingerprint: &str,
        user_id: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut row = self
            .device_tracking
            .entry(fingerprint.to_string())
            .or_insert_with(|| DeviceTrackingRow {
                device_fingerprint: fingerprint.to_string(),
                user_ids: HashSet::new(),
                last_seen: seen_at,
            });
        if let Some(user_id) = user_id {
            row.user_ids.insert(user_id.to_string());
        }
        row.last_seen = seen_at;
        Ok(())
    }

    async fn append_session_log(&self, row: &SessionLogRow) -> Result<()> {
        self.sessions.insert(row.session_id, row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_row(user: Option<&str>, ip: Option<&str>, at: DateTime<Utc>) -> SessionLogRow {
        SessionLogRow {
            session_id: Uuid::new_v4(),
            user_id: user.map(|s| s.to_string()),
            ip_address: ip.map(|s| s.to_string()),
            user_agent: None,
            action_type: "login".to_string(),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_session_window_queries() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store.seed_session(session_row(Some("u1"), Some("1.2.3.4"), now));
        store.seed_session(session_row(Some("u1"), Some("1.2.3.4"), now - Duration::hours(2)));
        store.seed_session(session_row(Some("u2"), Some("1.2.3.4"), now));

        let recent = store
            .sessions_for_user_since("u1", now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);

        let by_ip = store
            .sessions_for_ip_since("1.2.3.4", now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(by_ip.len(), 2);
    }

    #[tokio::test]
    async fn test_audit_insert_is_idempotent() {
        let store = MemoryStore::new();
        let record = AuditRecord {
            session_id: Uuid::new_v4(),
            action_type: "payment".to_string(),
            user_id: Some("u1".to_string()),
            ip_address: None,
            risk_score: 42,
            action: "review".to_string(),
            risk_factors: serde_json::json!({}),
            reasons: vec!["High payment frequency".to_string()],
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        };

        assert!(store.insert_audit_record(&record).await.unwrap());

        let mut retry = record.clone();
        retry.risk_score = 99;
        assert!(!store.insert_audit_record(&retry).await.unwrap());

        // First write wins
        let stored = store.audit_record(record.session_id).await.unwrap().unwrap();
        assert_eq!(stored.risk_score, 42);
        assert_eq!(store.audit_record_count(), 1);
    }

    #[tokio::test]
    async fn test_tracking_upsert_merges_users() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store.upsert_ip_tracking("5.6.7.8", Some("u1"), now).await.unwrap();
        store
            .upsert_ip_tracking("5.6.7.8", Some("u2"), now + Duration::seconds(5))
            .await
            .unwrap();
        store
            .upsert_ip_tracking("5.6.7.8", Some("u1"), now + Duration::seconds(9))
            .await
            .unwrap();

        let row = store.ip_tracking("5.6.7.8").await.unwrap().unwrap();
        assert_eq!(row.user_ids.len(), 2);
        assert_eq!(row.last_seen, now + Duration::seconds(9));

        store
            .upsert_device_tracking("fp-1", Some("u3"), now)
            .await
            .unwrap();
        let device = store.device_tracking("fp-1").await.unwrap().unwrap();
        assert!(device.user_ids.contains("u3"));
    }
}
