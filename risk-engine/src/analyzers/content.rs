//! Content analyzer
//!
//! Runs only for messaging actions with content present. Pure text
//! heuristics, no store access: spam keyword density, off-platform contact
//! patterns, profanity, excessive length and word repetition.

use crate::analyzers::{metadata_str, Analyzer};
use crate::config::ContentConfig;
use crate::types::{ActionType, AnalyzerReport, FactorKind, FraudCheckRequest};
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use signal_store::SignalStore;
use std::collections::HashSet;
use std::sync::Arc;

lazy_static! {
    static ref PHONE_RE: Regex =
        Regex::new(r"\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
    static ref MESSENGER_RE: Regex =
        Regex::new(r"(?i)\b(whatsapp|telegram|signal|wechat|viber|snapchat)\b").unwrap();
    static ref PROFANITY_RE: Regex =
        Regex::new(r"(?i)\b(fuck|shit|bitch|asshole|bastard|cunt)\b").unwrap();
}

/// Scores message content heuristics
pub struct ContentAnalyzer {
    config: ContentConfig,
}

impl ContentAnalyzer {
    /// Create from config
    pub fn new(config: ContentConfig) -> Self {
        Self { config }
    }

    fn spam_hits(&self, lowered: &str) -> usize {
        self.config
            .spam_keywords
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .count()
    }
}

#[async_trait]
impl Analyzer for ContentAnalyzer {
    fn kind(&self) -> FactorKind {
        FactorKind::ContentRisk
    }

    fn applies_to(&self, request: &FraudCheckRequest) -> bool {
        request.action_type == ActionType::Messaging && metadata_str(request, "content").is_some()
    }

    async fn analyze(
        &self,
        request: Arc<FraudCheckRequest>,
        _store: Arc<dyn SignalStore>,
    ) -> Result<AnalyzerReport> {
        let content = match metadata_str(&request, "content") {
            Some(content) => content,
            None => return Ok(AnalyzerReport::skipped()),
        };

        let mut score = 0u8;
        let mut reasons = Vec::new();
        let lowered = content.to_lowercase();

        let hits = self.spam_hits(&lowered);
        if hits >= self.config.spam_heavy_threshold {
            score = score.saturating_add(self.config.spam_heavy_penalty);
            reasons.push(format!("Message matches {} spam indicators", hits));
        } else if hits > 0 {
            score = score.saturating_add(self.config.spam_light_penalty);
            reasons.push("Message matches spam indicators".to_string());
        }

        if PHONE_RE.is_match(content)
            || EMAIL_RE.is_match(content)
            || MESSENGER_RE.is_match(content)
        {
            score = score.saturating_add(self.config.contact_pattern_penalty);
            reasons.push("Off-platform contact details detected".to_string());
        }

        if PROFANITY_RE.is_match(content) {
            score = score.saturating_add(self.config.profanity_penalty);
            reasons.push("Inappropriate language detected".to_string());
        }

        if content.chars().count() > self.config.max_content_length {
            score = score.saturating_add(self.config.length_penalty);
            reasons.push("Message exceeds the expected length".to_string());
        }

        let words: Vec<&str> = lowered.split_whitespace().collect();
        if words.len() >= self.config.repetition_min_words {
            let distinct: HashSet<&str> = words.iter().copied().collect();
            let repetition = 1.0 - distinct.len() as f64 / words.len() as f64;
            if repetition > self.config.repetition_ratio_threshold {
                score = score.saturating_add(self.config.repetition_penalty);
                reasons.push("Message repeats the same words heavily".to_string());
            }
        }

        Ok(AnalyzerReport::new(score, reasons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_store::MemoryStore;

    fn message_request(content: &str) -> Arc<FraudCheckRequest> {
        let mut request = FraudCheckRequest::new(ActionType::Messaging);
        request
            .metadata
            .insert("content".to_string(), serde_json::json!(content));
        Arc::new(request)
    }

    async fn analyze(content: &str) -> AnalyzerReport {
        let analyzer = ContentAnalyzer::new(ContentConfig::default());
        let store = Arc::new(MemoryStore::new());
        analyzer
            .analyze(message_request(content), store)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_spam_and_phone_number_flagged() {
        // Three spam indicators plus a phone pattern
        let report =
            analyze("guaranteed free money, click here now, call 555-123-4567").await;

        assert!(report.score >= 65); // 40 + 25
        assert!(report.reasons.len() >= 2);
    }

    #[tokio::test]
    async fn test_light_spam_gets_light_penalty() {
        let report = analyze("this deal is guaranteed to please").await;
        assert_eq!(report.score, 15);
    }

    #[tokio::test]
    async fn test_email_and_messenger_handles_flagged() {
        let report = analyze("reach me at foo@example.com or on telegram").await;
        assert_eq!(report.score, 25);
        assert_eq!(
            report.reasons,
            vec!["Off-platform contact details detected".to_string()]
        );
    }

    #[tokio::test]
    async fn test_profanity_flagged() {
        let report = analyze("what the fuck is this").await;
        assert_eq!(report.score, 20);
    }

    #[tokio::test]
    async fn test_word_repetition_flagged() {
        let report = analyze("buy buy buy buy buy buy buy buy buy now now now").await;
        assert_eq!(report.score, 15);
    }

    #[tokio::test]
    async fn test_excessive_length_flagged() {
        let long = "a".repeat(2_500);
        let report = analyze(&long).await;
        assert_eq!(report.score, 10);
    }

    #[tokio::test]
    async fn test_clean_message() {
        let report = analyze("see you at the pickup point tomorrow morning").await;
        assert_eq!(report.score, 0);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn test_applicability_requires_messaging_with_content() {
        let analyzer = ContentAnalyzer::new(ContentConfig::default());

        let mut message = FraudCheckRequest::new(ActionType::Messaging);
        assert!(!analyzer.applies_to(&message));

        message
            .metadata
            .insert("content".to_string(), serde_json::json!("hello"));
        assert!(analyzer.applies_to(&message));

        let mut login = FraudCheckRequest::new(ActionType::Login);
        login
            .metadata
            .insert("content".to_string(), serde_json::json!("hello"));
        assert!(!analyzer.applies_to(&login));
    }
}
