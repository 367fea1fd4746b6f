pub mod corner_case_service;
pub mod tagging_service;
pub mod ticket_service;

pub use corner_case_service::CornerCaseService;
pub use tagging_service::TaggingService;
pub use ticket_service::{IncomingMessage, TicketService};
