use crate::domain::entities::{Ticket, TicketStatus};
use crate::infrastructure::http::middleware::error::ApiResult;

#[async_trait::async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist the whole aggregate (ticket row plus any new messages).
    /// Durable before the call returns.
    async fn save(&self, ticket: &Ticket) -> ApiResult<()>;

    async fn get_by_id(&self, ticket_id: &str) -> ApiResult<Option<Ticket>>;

    async fn get_by_conversation_id(&self, conversation_id: &str) -> ApiResult<Option<Ticket>>;

    async fn list(&self, limit: i64, offset: i64) -> ApiResult<Vec<Ticket>>;

    async fn count(&self, status: Option<TicketStatus>) -> ApiResult<i64>;

    /// Full scan for reporting. The corner-case detector runs over these
    /// in the application layer rather than in SQL.
    async fn list_all(&self) -> ApiResult<Vec<Ticket>>;
}
