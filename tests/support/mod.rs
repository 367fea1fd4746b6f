use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tagdesk::application::services::{CornerCaseService, TaggingService, TicketService};
use tagdesk::domain::entities::{Ticket, TicketStatus};
use tagdesk::domain::ports::ticket_repository::TicketRepository;
use tagdesk::infrastructure::classifiers::{EngineMetrics, KeywordEngine, SemanticEngine};
use tagdesk::infrastructure::http::middleware::error::ApiResult;
use tagdesk::shared::ConversationLocks;

/// Repository backed by a plain map, standing in for the database.
#[derive(Default)]
pub struct InMemoryRepository {
    tickets: Mutex<HashMap<String, Ticket>>,
}

#[async_trait::async_trait]
impl TicketRepository for InMemoryRepository {
    async fn save(&self, ticket: &Ticket) -> ApiResult<()> {
        self.tickets
            .lock()
            .unwrap()
            .insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    async fn get_by_id(&self, ticket_id: &str) -> ApiResult<Option<Ticket>> {
        Ok(self.tickets.lock().unwrap().get(ticket_id).cloned())
    }

    async fn get_by_conversation_id(&self, conversation_id: &str) -> ApiResult<Option<Ticket>> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .values()
            .find(|t| t.conversation_id == conversation_id)
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> ApiResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self.tickets.lock().unwrap().values().cloned().collect();
        tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tickets
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, status: Option<TicketStatus>) -> ApiResult<i64> {
        let tickets = self.tickets.lock().unwrap();
        Ok(match status {
            Some(status) => tickets.values().filter(|t| t.status == status).count() as i64,
            None => tickets.len() as i64,
        })
    }

    async fn list_all(&self) -> ApiResult<Vec<Ticket>> {
        Ok(self.tickets.lock().unwrap().values().cloned().collect())
    }
}

/// Full service stack over the in-memory repository, semantic layer in
/// fallback mode.
pub fn build_stack() -> (Arc<InMemoryRepository>, TicketService, CornerCaseService) {
    let repository = Arc::new(InMemoryRepository::default());
    let tagging = Arc::new(TaggingService::new(
        Arc::new(KeywordEngine::new()),
        Arc::new(SemanticEngine::new(
            None,
            Duration::from_secs(1),
            Arc::new(EngineMetrics::new()),
        )),
    ));
    let ticket_service = TicketService::new(
        repository.clone(),
        tagging,
        ConversationLocks::new(),
    );
    let corner_case_service = CornerCaseService::new(repository.clone());
    (repository, ticket_service, corner_case_service)
}
