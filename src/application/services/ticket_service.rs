use crate::application::services::tagging_service::{TagExplanation, TaggingService};
use crate::domain::entities::{
    Category, Message, PaginationMetadata, Sender, ServiceType, Ticket, TicketStatus,
};
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::shared::ConversationLocks;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One inbound message as delivered by the webhook, before it becomes a
/// domain Message.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub text: String,
    pub sender: Sender,
}

/// Aggregate counters over the whole ticket population.
#[derive(Debug, Clone, Serialize)]
pub struct TicketStats {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub pending_tickets: i64,
    pub closed_tickets: i64,
    pub average_confidence: f64,
    pub by_service_type: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_method: BTreeMap<String, usize>,
}

/// Ticket lifecycle orchestration: webhook ingestion, retagging, reads and
/// status transitions.
///
/// Ingestion for one conversation is serialized through ConversationLocks
/// so the read-classify-merge-write sequence never interleaves.
pub struct TicketService {
    repository: Arc<dyn TicketRepository>,
    tagging: Arc<TaggingService>,
    locks: ConversationLocks,
}

impl TicketService {
    pub fn new(
        repository: Arc<dyn TicketRepository>,
        tagging: Arc<TaggingService>,
        locks: ConversationLocks,
    ) -> Self {
        Self {
            repository,
            tagging,
            locks,
        }
    }

    /// Webhook entry point: append messages to the conversation's ticket
    /// (creating it on first contact), re-run the tagging pipeline, and
    /// persist. Returns the ticket as stored.
    pub async fn process_messages(
        &self,
        conversation_id: &str,
        messages: Vec<IncomingMessage>,
    ) -> ApiResult<Ticket> {
        if conversation_id.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "conversation_id must not be empty".to_string(),
            ));
        }
        if messages.is_empty() {
            return Err(ApiError::BadRequest(
                "at least one message is required".to_string(),
            ));
        }

        let lock = self.locks.lock_for(conversation_id);
        let _guard = lock.lock().await;

        let mut ticket = match self
            .repository
            .get_by_conversation_id(conversation_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                tracing::info!(conversation_id, "Creating ticket for new conversation");
                Ticket::new(conversation_id)
            }
        };

        for incoming in messages {
            ticket.add_message(Message::new(incoming.text, incoming.sender));
        }

        if ticket.should_process_for_tagging() {
            let (result, updated) = self.tagging.update_ticket_tags(&mut ticket).await;
            tracing::info!(
                conversation_id,
                method = %result.method,
                confidence = result.confidence(),
                tag_updated = updated,
                "Conversation classified"
            );
        }

        self.repository.save(&ticket).await?;
        Ok(ticket)
    }

    pub async fn get_ticket(&self, ticket_id: &str) -> ApiResult<Ticket> {
        self.repository
            .get_by_id(ticket_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Ticket {ticket_id} not found")))
    }

    pub async fn get_by_conversation(&self, conversation_id: &str) -> ApiResult<Ticket> {
        self.repository
            .get_by_conversation_id(conversation_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "No ticket for conversation {conversation_id}"
                ))
            })
    }

    pub async fn list_tickets(
        &self,
        limit: i64,
        offset: i64,
    ) -> ApiResult<(Vec<Ticket>, PaginationMetadata)> {
        if limit <= 0 || limit > 100 {
            return Err(ApiError::BadRequest(
                "limit must be between 1 and 100".to_string(),
            ));
        }
        if offset < 0 {
            return Err(ApiError::BadRequest("offset must not be negative".to_string()));
        }

        let tickets = self.repository.list(limit, offset).await?;
        let total = self.repository.count(None).await?;
        Ok((tickets, PaginationMetadata { total, limit, offset }))
    }

    pub async fn update_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
    ) -> ApiResult<Ticket> {
        let mut ticket = self.get_ticket(ticket_id).await?;
        ticket.status = status;
        ticket.updated_at = chrono::Utc::now();
        self.repository.save(&ticket).await?;
        tracing::info!(ticket_id, status = %status, "Ticket status updated");
        Ok(ticket)
    }

    /// Decision trace for a ticket's current classification.
    pub async fn explain_tags(&self, ticket_id: &str) -> ApiResult<TagExplanation> {
        let ticket = self.get_ticket(ticket_id).await?;
        Ok(self.tagging.explain(&ticket).await)
    }

    /// Population-wide counters, computed over a full scan.
    pub async fn ticket_stats(&self) -> ApiResult<TicketStats> {
        let tickets = self.repository.list_all().await?;

        let mut by_service_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_method: BTreeMap<String, usize> = BTreeMap::new();
        let mut open = 0i64;
        let mut pending = 0i64;
        let mut closed = 0i64;
        let mut confidence_sum = 0.0;

        for ticket in &tickets {
            match ticket.status {
                TicketStatus::Open => open += 1,
                TicketStatus::Pending => pending += 1,
                TicketStatus::Closed => closed += 1,
            }
            let service: Option<ServiceType> = ticket.current_tag.service_type;
            let category: Option<Category> = ticket.current_tag.category;
            if let Some(service) = service {
                *by_service_type.entry(service.to_string()).or_default() += 1;
            }
            if let Some(category) = category {
                *by_category.entry(category.to_string()).or_default() += 1;
            }
            if !ticket.current_tag.method.is_empty() {
                *by_method.entry(ticket.current_tag.method.clone()).or_default() += 1;
            }
            confidence_sum += ticket.current_tag.confidence;
        }

        let total = tickets.len() as i64;
        let average_confidence = if tickets.is_empty() {
            0.0
        } else {
            confidence_sum / tickets.len() as f64
        };

        Ok(TicketStats {
            total_tickets: total,
            open_tickets: open,
            pending_tickets: pending,
            closed_tickets: closed,
            average_confidence,
            by_service_type,
            by_category,
            by_method,
        })
    }
}
