pub mod error;

pub use error::{ApiError, ApiResult};

use crate::application::services::{CornerCaseService, TicketService};
use crate::infrastructure::classifiers::SemanticEngine;
use std::sync::Arc;

/// Shared handler state, built once in bootstrap and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub ticket_service: Arc<TicketService>,
    pub corner_case_service: Arc<CornerCaseService>,
    pub semantic_engine: Arc<SemanticEngine>,
    pub service_name: String,
}
