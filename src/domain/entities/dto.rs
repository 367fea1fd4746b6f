use crate::domain::entities::{Message, PaginationMetadata, Sender, Tag, Ticket, TicketStatus};
use crate::domain::services::corner_case::{CornerCaseReport, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound webhook payload: one or more messages for a conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    pub conversation_id: String,
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    pub text: String,
    pub sender: Sender,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub ticket_id: String,
    pub conversation_id: String,
    pub status: TicketStatus,
    pub current_tag: Tag,
    pub message_count: usize,
}

impl From<&Ticket> for WebhookResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            conversation_id: ticket.conversation_id.clone(),
            status: ticket.status,
            current_tag: ticket.current_tag.clone(),
            message_count: ticket.messages.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketSummaryResponse {
    pub id: String,
    pub conversation_id: String,
    pub status: TicketStatus,
    pub current_tag: Tag,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketSummaryResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            conversation_id: ticket.conversation_id.clone(),
            status: ticket.status,
            current_tag: ticket.current_tag.clone(),
            message_count: ticket.messages.len(),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<TicketSummaryResponse>,
    pub pagination: PaginationMetadata,
}

/// Full ticket view: messages plus the detector's verdict.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetailResponse {
    pub id: String,
    pub conversation_id: String,
    pub status: TicketStatus,
    pub current_tag: Tag,
    pub messages: Vec<Message>,
    pub corner_case: CornerCaseReport,
    pub severity: Option<Severity>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
