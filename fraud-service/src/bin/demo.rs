//! TrustGate demo
//!
//! Seeds an in-memory signal store with representative history and runs a
//! handful of fraud checks end to end, printing each decision as JSON.

use anyhow::Result;
use chrono::{Duration, Utc};
use fraud_service::{CheckPayload, FraudCheckService};
use risk_engine::TrustConfig;
use rust_decimal::Decimal;
use signal_store::{MemoryStore, PaymentRecord, PaymentStatus, UserProfile};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn seed(store: &MemoryStore) {
    store.seed_user(UserProfile {
        user_id: "alice".to_string(),
        created_at: Utc::now() - Duration::days(420),
        email_verified: true,
        phone_verified: true,
    });

    store.seed_user(UserProfile {
        user_id: "mallory".to_string(),
        created_at: Utc::now() - Duration::hours(4),
        email_verified: false,
        phone_verified: false,
    });

    for i in 0..5 {
        store.seed_payment(PaymentRecord {
            user_id: "mallory".to_string(),
            amount: Decimal::from(40),
            status: PaymentStatus::Failed,
            created_at: Utc::now() - Duration::hours(i + 1),
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = Arc::new(MemoryStore::new());
    seed(&store);

    let service = FraudCheckService::new(store, TrustConfig::default())?;

    let mut trusted_login = CheckPayload::new("login");
    trusted_login.user_id = Some("alice".to_string());
    trusted_login.ip_address = Some("93.184.216.34".to_string());
    trusted_login.user_agent =
        Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Safari/605.1.15".to_string());

    let mut risky_payment = CheckPayload::new("payment");
    risky_payment.user_id = Some("mallory".to_string());
    risky_payment.ip_address = Some("198.51.100.7".to_string());
    risky_payment
        .metadata
        .insert("amount".to_string(), serde_json::json!(4_999));

    let mut spam_message = CheckPayload::new("messaging");
    spam_message.ip_address = Some("198.51.100.7".to_string());
    spam_message.metadata.insert(
        "content".to_string(),
        serde_json::json!("guaranteed free money, click here now, call 555-123-4567"),
    );

    for (label, payload) in [
        ("trusted login", trusted_login),
        ("risky payment", risky_payment),
        ("spam message", spam_message),
    ] {
        let result = service.check(payload).await?;
        println!("--- {} ---", label);
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    // An action type the pipeline does not know is rejected up front
    if let Err(e) = service.check(CheckPayload::new("transfer")).await {
        println!("--- rejected request ---");
        println!("{}", e);
    }

    service.shutdown().await;
    Ok(())
}
