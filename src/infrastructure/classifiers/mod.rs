pub mod keyword_engine;
pub mod metrics;
pub mod semantic_engine;

pub use keyword_engine::KeywordEngine;
pub use metrics::EngineMetrics;
pub use semantic_engine::SemanticEngine;
