use crate::domain::entities::Ticket;
use crate::domain::services::{escalation, merge_policy};
use crate::domain::services::escalation::Selection;
use crate::domain::value_objects::TaggingResult;
use crate::infrastructure::classifiers::keyword_engine::{KeywordEngine, KeywordExplanation};
use crate::infrastructure::classifiers::semantic_engine::{SemanticEngine, SemanticExplanation};
use serde::Serialize;
use std::sync::Arc;

/// Full decision trace for one ticket, exposed on the explanation
/// endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TagExplanation {
    pub ticket_id: String,
    pub conversation_id: String,
    pub user_message_count: usize,
    pub escalated: bool,
    pub keyword: KeywordExplanation,
    pub semantic: SemanticExplanation,
    pub current_tag: crate::domain::entities::Tag,
}

/// Two-layer classification pipeline: keyword layer first, semantic layer
/// only when the conversation is multi-turn or the keyword layer is
/// unsure.
pub struct TaggingService {
    keyword_engine: Arc<KeywordEngine>,
    semantic_engine: Arc<SemanticEngine>,
}

impl TaggingService {
    pub fn new(keyword_engine: Arc<KeywordEngine>, semantic_engine: Arc<SemanticEngine>) -> Self {
        Self {
            keyword_engine,
            semantic_engine,
        }
    }

    /// Run the pipeline over a ticket's user messages and return the
    /// chosen result. Does not touch the ticket.
    pub async fn tag_ticket(&self, ticket: &Ticket) -> TaggingResult {
        let user_texts: Vec<String> = ticket
            .user_messages()
            .iter()
            .map(|m| m.text.clone())
            .collect();

        if user_texts.is_empty() {
            return TaggingResult::unclassified("default", "No user messages to classify");
        }

        let combined = ticket.combined_user_text();
        let keyword_result = self.keyword_engine.classify(&combined);
        let user_message_count = user_texts.len();

        // Acceptance is checked before the multi-turn escalation trigger: a
        // keyword result at or above the acceptance bar is final even when
        // the conversation has grown past one user message.
        if escalation::should_accept(&keyword_result) {
            tracing::debug!(
                conversation_id = %ticket.conversation_id,
                confidence = keyword_result.confidence(),
                "Keyword layer accepted without escalation"
            );
            return keyword_result;
        }

        if !escalation::should_escalate(&keyword_result, user_message_count) {
            return keyword_result;
        }

        let semantic_result = self.semantic_engine.classify_conversation(&user_texts).await;

        match escalation::select_result(&keyword_result, &semantic_result) {
            Selection::Semantic => {
                tracing::debug!(
                    conversation_id = %ticket.conversation_id,
                    method = %semantic_result.method,
                    confidence = semantic_result.confidence(),
                    "Semantic result selected"
                );
                semantic_result
            }
            Selection::Keyword => {
                tracing::debug!(
                    conversation_id = %ticket.conversation_id,
                    confidence = keyword_result.confidence(),
                    "Keyword result kept after escalation"
                );
                keyword_result
            }
        }
    }

    /// Classify and, if the merge policy allows, replace the ticket's
    /// current tag. Returns the computed result and whether the tag
    /// changed.
    pub async fn update_ticket_tags(&self, ticket: &mut Ticket) -> (TaggingResult, bool) {
        if !ticket.should_process_for_tagging() {
            return (
                TaggingResult::unclassified("default", "Ticket not eligible for tagging"),
                false,
            );
        }
        let result = self.tag_ticket(ticket).await;
        let updated = merge_policy::should_update(&ticket.current_tag, &result);
        if updated {
            ticket.update_tag(result.to_tag());
        } else {
            tracing::debug!(
                conversation_id = %ticket.conversation_id,
                new_confidence = result.confidence(),
                current_confidence = ticket.current_tag.confidence,
                "Merge policy kept the existing tag"
            );
        }
        (result, updated)
    }

    /// Decision trace for both layers without changing anything.
    pub async fn explain(&self, ticket: &Ticket) -> TagExplanation {
        let user_texts: Vec<String> = ticket
            .user_messages()
            .iter()
            .map(|m| m.text.clone())
            .collect();
        let combined = ticket.combined_user_text();
        let keyword_result = self.keyword_engine.classify(&combined);

        TagExplanation {
            ticket_id: ticket.id.clone(),
            conversation_id: ticket.conversation_id.clone(),
            user_message_count: user_texts.len(),
            escalated: !user_texts.is_empty()
                && escalation::should_escalate(&keyword_result, user_texts.len()),
            keyword: self.keyword_engine.explain(&combined),
            semantic: self.semantic_engine.explain(&user_texts).await,
            current_tag: ticket.current_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Category, Message, Sender, ServiceType};
    use crate::domain::ports::semantic_provider::{ProviderError, SemanticProvider};
    use crate::infrastructure::classifiers::metrics::EngineMetrics;
    use std::time::Duration;

    struct StaticProvider {
        response: String,
    }

    #[async_trait::async_trait]
    impl SemanticProvider for StaticProvider {
        async fn analyze(&self, _conversation: &str) -> Result<String, ProviderError> {
            Ok(self.response.clone())
        }

        fn provider_name(&self) -> &'static str {
            "static"
        }
    }

    struct CountingProvider {
        calls: std::sync::atomic::AtomicUsize,
        response: String,
    }

    #[async_trait::async_trait]
    impl SemanticProvider for CountingProvider {
        async fn analyze(&self, _conversation: &str) -> Result<String, ProviderError> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.response.clone())
        }

        fn provider_name(&self) -> &'static str {
            "counting"
        }
    }

    fn service_without_provider() -> TaggingService {
        TaggingService::new(
            Arc::new(KeywordEngine::new()),
            Arc::new(SemanticEngine::new(
                None,
                Duration::from_secs(1),
                Arc::new(EngineMetrics::new()),
            )),
        )
    }

    fn ticket_with(messages: &[(&str, Sender)]) -> Ticket {
        let mut ticket = Ticket::new("conv-test");
        for (text, sender) in messages {
            ticket.add_message(Message::new(*text, *sender));
        }
        ticket
    }

    #[tokio::test]
    async fn empty_conversation_gets_the_default_result() {
        let service = service_without_provider();
        let ticket = ticket_with(&[("Welcome!", Sender::Bot)]);
        let result = service.tag_ticket(&ticket).await;
        assert_eq!(result.method, "default");
        assert_eq!(result.service_type, Some(ServiceType::Other));
        assert_eq!(result.confidence(), 0.0);
    }

    #[tokio::test]
    async fn confident_single_message_skips_the_semantic_layer() {
        let service = service_without_provider();
        let ticket = ticket_with(&[(
            "I need to cancel my flight booking, PNR ABC123",
            Sender::User,
        )]);
        let result = service.tag_ticket(&ticket).await;
        assert_eq!(result.method, "keywords");
        assert_eq!(result.service_type, Some(ServiceType::Flight));
        assert_eq!(result.category, Some(Category::Cancellation));
        assert!(result.confidence() >= 0.7);
    }

    #[tokio::test]
    async fn confident_multi_turn_keyword_result_skips_the_semantic_layer() {
        let provider = Arc::new(CountingProvider {
            calls: std::sync::atomic::AtomicUsize::new(0),
            response: r#"{"service_type": "Visa", "category": "Others", "confidence": 0.99}"#
                .to_string(),
        });
        let service = TaggingService::new(
            Arc::new(KeywordEngine::new()),
            Arc::new(SemanticEngine::new(
                Some(provider.clone()),
                Duration::from_secs(1),
                Arc::new(EngineMetrics::new()),
            )),
        );
        let ticket = ticket_with(&[
            ("I need to cancel my flight booking", Sender::User),
            ("the PNR is ABC123", Sender::User),
        ]);

        let result = service.tag_ticket(&ticket).await;

        assert_eq!(
            provider.calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
        assert_eq!(result.method, "keywords");
        assert_eq!(result.service_type, Some(ServiceType::Flight));
        assert_eq!(result.category, Some(Category::Cancellation));
        assert!(result.confidence() >= 0.7);
    }

    #[tokio::test]
    async fn multi_turn_conversation_escalates() {
        let service = service_without_provider();
        let ticket = ticket_with(&[
            ("I need help with my flight", Sender::User),
            ("I want to cancel it", Sender::User),
        ]);
        let result = service.tag_ticket(&ticket).await;
        // Fallback pass resolves both axes from the combined text.
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn structured_provider_verdict_wins_over_weak_keywords() {
        let provider = Arc::new(StaticProvider {
            response: r#"{"service_type": "Visa", "category": "Order Re-Check", "confidence": 0.9, "reasoning": "status inquiry"}"#.to_string(),
        });
        let service = TaggingService::new(
            Arc::new(KeywordEngine::new()),
            Arc::new(SemanticEngine::new(
                Some(provider),
                Duration::from_secs(1),
                Arc::new(EngineMetrics::new()),
            )),
        );
        let ticket = ticket_with(&[("any news on this?", Sender::User)]);
        let result = service.tag_ticket(&ticket).await;
        assert_eq!(result.method, "agentic_structured");
        assert_eq!(result.service_type, Some(ServiceType::Visa));
        assert_eq!(result.category, Some(Category::OrderRecheck));
    }

    #[tokio::test]
    async fn update_replaces_an_empty_tag() {
        let service = service_without_provider();
        let mut ticket = ticket_with(&[(
            "cancel my hotel reservation please",
            Sender::User,
        )]);
        let (result, updated) = service.update_ticket_tags(&mut ticket).await;
        assert!(updated);
        assert!(result.is_successful());
        assert_eq!(ticket.current_tag.service_type, Some(ServiceType::Hotel));
    }

    #[tokio::test]
    async fn update_keeps_a_stronger_existing_tag() {
        let service = service_without_provider();
        let mut ticket = ticket_with(&[("hmm", Sender::User)]);
        ticket.update_tag(crate::domain::entities::Tag {
            service_type: Some(ServiceType::Wallet),
            category: Some(Category::TopUp),
            confidence: 0.95,
            method: "agentic_structured".to_string(),
            timestamp: chrono::Utc::now(),
        });
        let (_, updated) = service.update_ticket_tags(&mut ticket).await;
        assert!(!updated);
        assert_eq!(ticket.current_tag.service_type, Some(ServiceType::Wallet));
    }
}
