use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::application::services::tagging_service::TagExplanation;
use crate::application::services::ticket_service::{IncomingMessage, TicketStats};
use crate::domain::entities::*;
use crate::domain::services::corner_case;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/webhooks/messages - Ingest conversation messages and (re)tag
pub async fn process_webhook(
    State(state): State<AppState>,
    Json(req): Json<WebhookRequest>,
) -> ApiResult<Json<WebhookResponse>> {
    let incoming: Vec<IncomingMessage> = req
        .messages
        .into_iter()
        .map(|m| IncomingMessage {
            text: m.text,
            sender: m.sender,
        })
        .collect();

    let ticket = state
        .ticket_service
        .process_messages(&req.conversation_id, incoming)
        .await?;

    Ok(Json(WebhookResponse::from(&ticket)))
}

/// GET /api/tickets - List tickets with pagination
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> ApiResult<Json<ListTicketsResponse>> {
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let (tickets, pagination) = state.ticket_service.list_tickets(limit, offset).await?;

    Ok(Json(ListTicketsResponse {
        tickets: tickets.iter().map(TicketSummaryResponse::from).collect(),
        pagination,
    }))
}

/// GET /api/tickets/:id - Ticket details with messages and detector verdict
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> ApiResult<Json<TicketDetailResponse>> {
    let ticket = state.ticket_service.get_ticket(&ticket_id).await?;

    Ok(Json(TicketDetailResponse {
        id: ticket.id.clone(),
        conversation_id: ticket.conversation_id.clone(),
        status: ticket.status,
        current_tag: ticket.current_tag.clone(),
        corner_case: corner_case::report(&ticket),
        severity: corner_case::severity(&ticket),
        messages: ticket.messages,
        created_at: ticket.created_at,
        updated_at: ticket.updated_at,
    }))
}

/// GET /api/conversations/:id/ticket - Ticket lookup by conversation
pub async fn get_ticket_by_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<TicketSummaryResponse>> {
    let ticket = state
        .ticket_service
        .get_by_conversation(&conversation_id)
        .await?;
    Ok(Json(TicketSummaryResponse::from(&ticket)))
}

/// PUT /api/tickets/:id/status - Status transition
pub async fn update_ticket_status(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<TicketSummaryResponse>> {
    let status = match req.status.to_lowercase().as_str() {
        "open" => TicketStatus::Open,
        "pending" => TicketStatus::Pending,
        "closed" => TicketStatus::Closed,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown status '{other}', expected open, pending or closed"
            )))
        }
    };

    let ticket = state.ticket_service.update_status(&ticket_id, status).await?;
    Ok(Json(TicketSummaryResponse::from(&ticket)))
}

/// GET /api/tickets/:id/tags/explain - Two-layer classification trace
pub async fn explain_ticket_tags(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> ApiResult<Json<TagExplanation>> {
    let explanation = state.ticket_service.explain_tags(&ticket_id).await?;
    Ok(Json(explanation))
}

/// GET /api/stats - Population-wide ticket stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<TicketStats>> {
    let stats = state.ticket_service.ticket_stats().await?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub semantic_provider: &'static str,
    pub engine_metrics: Value,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.semantic_engine.metrics().snapshot();
    Json(HealthResponse {
        status: "ok",
        service: state.service_name.clone(),
        semantic_provider: if state.semantic_engine.provider_backed() {
            "configured"
        } else {
            "fallback"
        },
        engine_metrics: json!(snapshot),
    })
}
