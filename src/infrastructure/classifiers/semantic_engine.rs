use crate::domain::entities::{Category, ServiceType};
use crate::domain::ports::semantic_provider::SemanticProvider;
use crate::domain::value_objects::TaggingResult;
use crate::infrastructure::classifiers::metrics::{EngineMetrics, MetricsSnapshot};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::sync::Arc;
use std::time::Duration;

/// Fallback confidence tiers, calibrated independently from the keyword
/// layer's 0.3 multiplier.
const FALLBACK_BOTH_AXES: f64 = 0.7;
const FALLBACK_ONE_AXIS: f64 = 0.5;
const FALLBACK_NO_AXIS: f64 = 0.3;

/// Confidence assumed when a provider response carries no usable
/// confidence token.
const DEFAULT_PROVIDER_CONFIDENCE: f64 = 0.7;

/// Structured verdict the provider is asked to return. Heuristic substring
/// parsing remains as a last resort for providers that answer in prose.
#[derive(Debug, Deserialize)]
struct ProviderVerdict {
    service_type: Option<String>,
    category: Option<String>,
    confidence: f64,
    reasoning: Option<String>,
    #[serde(default)]
    key_phrases: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticExplanation {
    pub mode: &'static str,
    pub message_count: usize,
    pub combined_text_length: usize,
    pub result: Option<ResultSummary>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub service_type: Option<ServiceType>,
    pub category: Option<Category>,
    pub confidence: f64,
    pub method: String,
    pub key_phrases: Vec<String>,
}

/// Layer 2: semantic classifier over an external analysis provider, with a
/// deterministic local fallback when no provider is configured.
///
/// Never returns an error to the caller: every path terminates in a
/// well-formed TaggingResult, distinguished by its method tag.
pub struct SemanticEngine {
    provider: Option<Arc<dyn SemanticProvider>>,
    timeout: Duration,
    metrics: Arc<EngineMetrics>,
    confidence_token: Regex,
}

impl SemanticEngine {
    /// `provider` is `None` when the startup credential check failed; the
    /// engine then always answers from its local fallback pass.
    pub fn new(
        provider: Option<Arc<dyn SemanticProvider>>,
        timeout: Duration,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            provider,
            timeout,
            metrics,
            confidence_token: Regex::new(r"confidence[:\s]*(\d*\.?\d+)")
                .expect("confidence token pattern is a fixed literal"),
        }
    }

    pub fn provider_backed(&self) -> bool {
        self.provider.is_some()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Classify a whole conversation from its ordered user message texts.
    pub async fn classify_conversation(&self, messages: &[String]) -> TaggingResult {
        let combined = messages.join(" ").trim().to_string();
        if combined.is_empty() {
            self.metrics.record_error();
            return error_result("empty_input");
        }

        let result = match &self.provider {
            None => self.fallback_analysis(&combined, Map::new()),
            Some(provider) => {
                match tokio::time::timeout(self.timeout, provider.analyze(&combined)).await {
                    Ok(Ok(payload)) => self.parse_provider_response(&payload, &combined, provider),
                    Ok(Err(err)) => {
                        tracing::warn!(
                            provider = provider.provider_name(),
                            "semantic provider failed, using local fallback: {err}"
                        );
                        let mut metadata = Map::new();
                        metadata.insert("provider_error".to_string(), json!(err.to_string()));
                        self.fallback_analysis(&combined, metadata)
                    }
                    Err(_) => {
                        tracing::warn!(
                            provider = provider.provider_name(),
                            timeout_secs = self.timeout.as_secs(),
                            "semantic provider timed out, using local fallback"
                        );
                        let mut metadata = Map::new();
                        metadata.insert("provider_timeout".to_string(), json!(true));
                        self.fallback_analysis(&combined, metadata)
                    }
                }
            }
        };

        if result.method == "agentic_error" {
            self.metrics.record_error();
        } else {
            self.metrics.record(result.confidence());
        }
        result
    }

    /// Structured JSON verdict first; prose heuristic as last resort; a
    /// response with nothing extractable is a parse error.
    fn parse_provider_response(
        &self,
        payload: &str,
        combined: &str,
        provider: &Arc<dyn SemanticProvider>,
    ) -> TaggingResult {
        if let Some(verdict) = parse_structured(payload) {
            let confidence = verdict.confidence.clamp(0.0, 1.0);
            let key_phrases = if verdict.key_phrases.is_empty() {
                extract_key_phrases(combined)
            } else {
                verdict.key_phrases
            };
            let mut metadata = Map::new();
            metadata.insert("provider".to_string(), json!(provider.provider_name()));

            return TaggingResult::new(
                verdict.service_type.as_deref().and_then(parse_service_label),
                verdict.category.as_deref().and_then(parse_category_label),
                confidence,
                "agentic_structured",
                verdict
                    .reasoning
                    .unwrap_or_else(|| "Structured provider verdict".to_string()),
                key_phrases,
                metadata,
            )
            .expect("provider confidence is clamped into [0, 1]");
        }

        self.heuristic_parse(payload, combined, provider)
    }

    /// Substring search over the provider's prose: first axis keyword found
    /// wins, regardless of position or negation. Fragile by design and only
    /// reached when the structured parse fails.
    fn heuristic_parse(
        &self,
        payload: &str,
        combined: &str,
        provider: &Arc<dyn SemanticProvider>,
    ) -> TaggingResult {
        let text = payload.to_lowercase();

        let service = HEURISTIC_SERVICE_LABELS
            .iter()
            .find(|(needle, _)| text.contains(needle))
            .map(|(_, label)| *label);
        let category = HEURISTIC_CATEGORY_LABELS
            .iter()
            .find(|(needle, _)| text.contains(needle))
            .map(|(_, label)| *label);

        let confidence_token = self
            .confidence_token
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|value| value.clamp(0.0, 1.0));

        if service.is_none() && category.is_none() && confidence_token.is_none() {
            return error_result("parsing_error");
        }

        let mut metadata = Map::new();
        metadata.insert("provider".to_string(), json!(provider.provider_name()));
        metadata.insert("heuristic_parse".to_string(), json!(true));

        TaggingResult::new(
            service,
            category,
            confidence_token.unwrap_or(DEFAULT_PROVIDER_CONFIDENCE),
            "agentic_heuristic",
            payload,
            extract_key_phrases(combined),
            metadata,
        )
        .expect("heuristic confidence is clamped into [0, 1]")
    }

    /// Local pass used when the provider is unconfigured, unreachable or
    /// slow. A second, coarser trigger set than Layer 1, first hit wins.
    fn fallback_analysis(&self, combined: &str, mut metadata: Map<String, serde_json::Value>) -> TaggingResult {
        let text = combined.to_lowercase();

        let mut service = FALLBACK_SERVICE_TRIGGERS
            .iter()
            .find(|(triggers, _)| triggers.iter().any(|t| text.contains(t)))
            .map(|(_, label)| *label);
        let mut category = FALLBACK_CATEGORY_TRIGGERS
            .iter()
            .find(|(triggers, _)| triggers.iter().any(|t| text.contains(t)))
            .map(|(_, label)| *label);

        let confidence = match (service.is_some(), category.is_some()) {
            (true, true) => FALLBACK_BOTH_AXES,
            (true, false) | (false, true) => FALLBACK_ONE_AXIS,
            (false, false) => {
                service = Some(ServiceType::Other);
                category = Some(Category::Others);
                FALLBACK_NO_AXIS
            }
        };

        metadata.insert("fallback_mode".to_string(), json!(true));

        TaggingResult::new(
            service,
            category,
            confidence,
            "agentic_fallback",
            "Fallback analysis without semantic provider - basic keyword matching used",
            extract_key_phrases(combined),
            metadata,
        )
        .expect("fallback confidence tiers are within [0, 1]")
    }

    /// Explain the semantic layer's behavior on this conversation by
    /// actually running it (updates metrics like any other invocation).
    pub async fn explain(&self, messages: &[String]) -> SemanticExplanation {
        let combined = messages.join(" ");
        let result = self.classify_conversation(messages).await;

        SemanticExplanation {
            mode: if self.provider_backed() {
                "provider"
            } else {
                "fallback"
            },
            message_count: messages.len(),
            combined_text_length: combined.len(),
            result: Some(ResultSummary {
                service_type: result.service_type,
                category: result.category,
                confidence: result.confidence(),
                method: result.method.clone(),
                key_phrases: result.key_phrases.clone(),
            }),
            metrics: self.metrics.snapshot(),
        }
    }
}

fn error_result(reason: &str) -> TaggingResult {
    TaggingResult::unclassified("agentic_error", format!("Semantic analysis failed: {reason}"))
        .with_metadata("error", json!(reason))
}

/// Accept the payload as JSON directly, or fenced/embedded JSON inside
/// surrounding prose.
fn parse_structured(payload: &str) -> Option<ProviderVerdict> {
    let trimmed = payload.trim();
    if let Ok(verdict) = serde_json::from_str::<ProviderVerdict>(trimmed) {
        return Some(verdict);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<ProviderVerdict>(&trimmed[start..=end]).ok()
}

fn parse_service_label(raw: &str) -> Option<ServiceType> {
    match raw.trim().to_lowercase().as_str() {
        "flight" => Some(ServiceType::Flight),
        "hotel" => Some(ServiceType::Hotel),
        "visa" => Some(ServiceType::Visa),
        "esim" | "e-sim" => Some(ServiceType::ESim),
        "wallet" => Some(ServiceType::Wallet),
        "other" => Some(ServiceType::Other),
        _ => None,
    }
}

fn parse_category_label(raw: &str) -> Option<Category> {
    match raw.trim().to_lowercase().as_str() {
        "cancellation" | "cancel" => Some(Category::Cancellation),
        "modify" | "change" => Some(Category::Modify),
        "top_up" | "top up" => Some(Category::TopUp),
        "withdraw" | "cash out" => Some(Category::Withdraw),
        "order_recheck" | "order re-check" => Some(Category::OrderRecheck),
        "pre_purchase" | "pre-purchase" => Some(Category::PrePurchase),
        "others" | "other" => Some(Category::Others),
        _ => None,
    }
}

const HEURISTIC_SERVICE_LABELS: &[(&str, ServiceType)] = &[
    ("flight", ServiceType::Flight),
    ("hotel", ServiceType::Hotel),
    ("visa", ServiceType::Visa),
    ("esim", ServiceType::ESim),
    ("e-sim", ServiceType::ESim),
    ("wallet", ServiceType::Wallet),
    ("other", ServiceType::Other),
];

const HEURISTIC_CATEGORY_LABELS: &[(&str, Category)] = &[
    ("cancellation", Category::Cancellation),
    ("cancel", Category::Cancellation),
    ("modify", Category::Modify),
    ("change", Category::Modify),
    ("top_up", Category::TopUp),
    ("top up", Category::TopUp),
    ("withdraw", Category::Withdraw),
    ("cash out", Category::Withdraw),
    ("order_recheck", Category::OrderRecheck),
    ("order re-check", Category::OrderRecheck),
    ("check", Category::OrderRecheck),
    ("status", Category::OrderRecheck),
    ("pre_purchase", Category::PrePurchase),
    ("pre-purchase", Category::PrePurchase),
    ("information", Category::PrePurchase),
    ("help", Category::PrePurchase),
    ("others", Category::Others),
];

const FALLBACK_SERVICE_TRIGGERS: &[(&[&str], ServiceType)] = &[
    (&["flight", "plane", "airline", "booking reference"], ServiceType::Flight),
    (&["hotel", "room", "reservation", "check-in"], ServiceType::Hotel),
    (&["visa", "passport", "embassy"], ServiceType::Visa),
    (&["esim", "sim", "data", "roaming"], ServiceType::ESim),
    (&["wallet", "balance", "payment", "money"], ServiceType::Wallet),
];

const FALLBACK_CATEGORY_TRIGGERS: &[(&[&str], Category)] = &[
    (&["cancel", "refund", "terminate"], Category::Cancellation),
    (&["change", "modify", "update", "reschedule"], Category::Modify),
    (&["top up", "recharge", "add money"], Category::TopUp),
    (&["withdraw", "cash out", "take out"], Category::Withdraw),
    (&["check", "status", "verify", "confirm"], Category::OrderRecheck),
    (&["how to", "can i", "information", "help"], Category::PrePurchase),
];

const KEY_PHRASE_TRIGGERS: &[&str] = &[
    "cancel", "change", "book", "reserve", "check", "help",
    "flight", "hotel", "visa", "esim", "wallet", "payment",
    "booking", "reservation", "refund", "modify", "top up",
    "withdraw", "recharge", "status", "verify", "confirm",
];

/// Coarse supporting-phrase extraction from the conversation text itself.
fn extract_key_phrases(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    KEY_PHRASE_TRIGGERS
        .iter()
        .filter(|trigger| {
            if trigger.contains(' ') {
                lowered.contains(*trigger)
            } else {
                words.contains(trigger)
            }
        })
        .map(|trigger| trigger.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::semantic_provider::ProviderError;
    use async_trait::async_trait;

    struct StaticProvider {
        payload: String,
    }

    #[async_trait]
    impl SemanticProvider for StaticProvider {
        async fn analyze(&self, _conversation: &str) -> Result<String, ProviderError> {
            Ok(self.payload.clone())
        }

        fn provider_name(&self) -> &'static str {
            "static"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SemanticProvider for FailingProvider {
        async fn analyze(&self, _conversation: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Http("connection refused".to_string()))
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl SemanticProvider for HangingProvider {
        async fn analyze(&self, _conversation: &str) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn provider_name(&self) -> &'static str {
            "hanging"
        }
    }

    fn fallback_engine() -> SemanticEngine {
        SemanticEngine::new(None, Duration::from_secs(5), Arc::new(EngineMetrics::new()))
    }

    fn provider_engine(provider: impl SemanticProvider + 'static) -> SemanticEngine {
        SemanticEngine::new(
            Some(Arc::new(provider)),
            Duration::from_millis(50),
            Arc::new(EngineMetrics::new()),
        )
    }

    #[tokio::test]
    async fn fallback_resolves_both_axes_at_high_tier() {
        let engine = fallback_engine();
        let result = engine
            .classify_conversation(&[
                "I booked a hotel".to_string(),
                "please change my reservation".to_string(),
            ])
            .await;

        assert_eq!(result.service_type, Some(ServiceType::Hotel));
        assert_eq!(result.category, Some(Category::Modify));
        assert_eq!(result.confidence(), 0.7);
        assert_eq!(result.method, "agentic_fallback");
    }

    #[tokio::test]
    async fn fallback_single_axis_is_medium_tier() {
        let engine = fallback_engine();
        let result = engine
            .classify_conversation(&["my visa please".to_string()])
            .await;

        assert_eq!(result.service_type, Some(ServiceType::Visa));
        assert_eq!(result.category, None);
        assert_eq!(result.confidence(), 0.5);
    }

    #[tokio::test]
    async fn fallback_no_signal_forces_the_default_pair() {
        let engine = fallback_engine();
        let result = engine
            .classify_conversation(&["good morning".to_string()])
            .await;

        assert_eq!(result.service_type, Some(ServiceType::Other));
        assert_eq!(result.category, Some(Category::Others));
        assert_eq!(result.confidence(), 0.3);
        assert_eq!(result.method, "agentic_fallback");
    }

    #[tokio::test]
    async fn empty_input_is_an_error_result() {
        let engine = fallback_engine();
        let result = engine.classify_conversation(&["   ".to_string()]).await;

        assert_eq!(result.method, "agentic_error");
        assert_eq!(result.confidence(), 0.0);
        assert_eq!(engine.metrics().snapshot().error_count, 1);
    }

    #[tokio::test]
    async fn structured_verdict_is_preferred() {
        let engine = provider_engine(StaticProvider {
            payload: r#"{"service_type": "Flight", "category": "Cancellation", "confidence": 0.92, "reasoning": "explicit cancellation request", "key_phrases": ["cancel", "flight"]}"#.to_string(),
        });
        let result = engine
            .classify_conversation(&["cancel my flight".to_string()])
            .await;

        assert_eq!(result.method, "agentic_structured");
        assert_eq!(result.service_type, Some(ServiceType::Flight));
        assert_eq!(result.category, Some(Category::Cancellation));
        assert_eq!(result.confidence(), 0.92);
    }

    #[tokio::test]
    async fn structured_verdict_clamps_out_of_range_confidence() {
        let engine = provider_engine(StaticProvider {
            payload: r#"{"service_type": "Hotel", "category": "Modify", "confidence": 1.8}"#
                .to_string(),
        });
        let result = engine
            .classify_conversation(&["change my hotel room".to_string()])
            .await;

        assert_eq!(result.confidence(), 1.0);
    }

    #[tokio::test]
    async fn prose_answer_falls_back_to_heuristic_parse() {
        let engine = provider_engine(StaticProvider {
            payload: "The customer is asking about a hotel modification. Confidence: 0.8"
                .to_string(),
        });
        let result = engine
            .classify_conversation(&["change my hotel room".to_string()])
            .await;

        assert_eq!(result.method, "agentic_heuristic");
        assert_eq!(result.service_type, Some(ServiceType::Hotel));
        assert_eq!(result.confidence(), 0.8);
    }

    #[tokio::test]
    async fn heuristic_without_confidence_token_defaults() {
        let engine = provider_engine(StaticProvider {
            payload: "This looks like a flight cancellation to me.".to_string(),
        });
        let result = engine
            .classify_conversation(&["cancel my flight".to_string()])
            .await;

        assert_eq!(result.method, "agentic_heuristic");
        assert_eq!(result.confidence(), DEFAULT_PROVIDER_CONFIDENCE);
    }

    #[tokio::test]
    async fn unparseable_answer_is_a_parse_error() {
        let engine = provider_engine(StaticProvider {
            payload: "42".to_string(),
        });
        let result = engine
            .classify_conversation(&["cancel my flight".to_string()])
            .await;

        assert_eq!(result.method, "agentic_error");
        assert_eq!(result.confidence(), 0.0);
        assert!(result.to_tag().is_default_tag());
    }

    #[tokio::test]
    async fn provider_failure_falls_back_locally() {
        let engine = provider_engine(FailingProvider);
        let result = engine
            .classify_conversation(&["cancel my flight".to_string()])
            .await;

        assert_eq!(result.method, "agentic_fallback");
        assert_eq!(result.service_type, Some(ServiceType::Flight));
        assert_eq!(result.category, Some(Category::Cancellation));
    }

    #[tokio::test]
    async fn provider_timeout_falls_back_locally() {
        let engine = provider_engine(HangingProvider);
        let result = engine
            .classify_conversation(&["cancel my flight".to_string()])
            .await;

        assert_eq!(result.method, "agentic_fallback");
        assert!(result.metadata.contains_key("provider_timeout"));
    }

    #[tokio::test]
    async fn metrics_track_every_invocation() {
        let engine = fallback_engine();
        engine
            .classify_conversation(&["cancel my flight booking".to_string()])
            .await;
        engine.classify_conversation(&["hello".to_string()]).await;

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.total_taggings, 2);
        assert_eq!(snapshot.successful_taggings, 1);
    }
}
