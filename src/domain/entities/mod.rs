mod dto;
mod ticket;

pub use dto::{
    ListTicketsResponse, TicketDetailResponse, TicketSummaryResponse, UpdateStatusRequest,
    WebhookMessage, WebhookRequest, WebhookResponse,
};
pub use ticket::{Category, Message, Sender, ServiceType, Tag, Ticket, TicketStatus};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
