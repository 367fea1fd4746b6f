use crate::application::services::{CornerCaseService, TaggingService, TicketService};
use crate::config::Config;
use crate::domain::ports::semantic_provider::SemanticProvider;
use crate::infrastructure::classifiers::{EngineMetrics, KeywordEngine, SemanticEngine};
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::providers::OpenAiProvider;
use crate::shared::ConversationLocks;
use std::sync::Arc;

/// Wire engines and services into the shared handler state. Everything is
/// constructed here exactly once; nothing lives in globals.
pub fn build_app_state(db: Database, config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let provider: Option<Arc<dyn SemanticProvider>> = if config.semantic_provider_available() {
        let api_key = config
            .semantic_api_key
            .clone()
            .unwrap_or_default();
        let provider = OpenAiProvider::new(
            config.semantic_api_base.clone(),
            api_key,
            config.semantic_model.clone(),
            config.semantic_timeout,
        )?;
        tracing::info!(model = %config.semantic_model, "Semantic provider configured");
        Some(Arc::new(provider))
    } else {
        tracing::warn!("No usable semantic API key, running in fallback mode");
        None
    };

    let keyword_engine = Arc::new(KeywordEngine::new());
    let semantic_engine = Arc::new(SemanticEngine::new(
        provider,
        config.semantic_timeout,
        Arc::new(EngineMetrics::new()),
    ));

    let tagging_service = Arc::new(TaggingService::new(keyword_engine, semantic_engine.clone()));

    let repository = Arc::new(db);
    let ticket_service = Arc::new(TicketService::new(
        repository.clone(),
        tagging_service,
        ConversationLocks::new(),
    ));
    let corner_case_service = Arc::new(CornerCaseService::new(repository));

    Ok(AppState {
        ticket_service,
        corner_case_service,
        semantic_engine,
        service_name: config.service_name.clone(),
    })
}
