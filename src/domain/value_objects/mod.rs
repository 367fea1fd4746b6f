pub mod confidence;
pub mod tagging_result;

pub use confidence::{ConfidenceLevel, ConfidenceScore};
pub use tagging_result::TaggingResult;
