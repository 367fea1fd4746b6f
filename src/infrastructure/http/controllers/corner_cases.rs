use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::application::services::corner_case_service::{CornerCaseStats, ProblematicTicket};
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CornerCaseQuery {
    pub limit: Option<usize>,
}

/// GET /api/corner-cases/stats - Detector aggregates
pub async fn get_corner_case_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<CornerCaseStats>> {
    let stats = state.corner_case_service.stats().await?;
    Ok(Json(stats))
}

/// GET /api/corner-cases/tickets - Triage queue, most problematic first
pub async fn list_corner_case_tickets(
    State(state): State<AppState>,
    Query(query): Query<CornerCaseQuery>,
) -> ApiResult<Json<Vec<ProblematicTicket>>> {
    let limit = query.limit.unwrap_or(20);
    if limit == 0 || limit > 100 {
        return Err(ApiError::BadRequest(
            "limit must be between 1 and 100".to_string(),
        ));
    }

    let tickets = state.corner_case_service.problematic_tickets(limit).await?;
    Ok(Json(tickets))
}
