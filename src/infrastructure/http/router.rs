use crate::infrastructure::http::controllers::{corner_cases, tickets};
use crate::infrastructure::http::middleware::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/webhooks/messages", post(tickets::process_webhook))
        .route("/api/tickets", get(tickets::list_tickets))
        .route("/api/tickets/:id", get(tickets::get_ticket))
        .route(
            "/api/conversations/:id/ticket",
            get(tickets::get_ticket_by_conversation),
        )
        .route(
            "/api/tickets/:id/status",
            put(tickets::update_ticket_status),
        )
        .route(
            "/api/tickets/:id/tags/explain",
            get(tickets::explain_ticket_tags),
        )
        .route("/api/stats", get(tickets::get_stats))
        .route(
            "/api/corner-cases/stats",
            get(corner_cases::get_corner_case_stats),
        )
        .route(
            "/api/corner-cases/tickets",
            get(corner_cases::list_corner_case_tickets),
        )
        .route("/api/health", get(tickets::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
