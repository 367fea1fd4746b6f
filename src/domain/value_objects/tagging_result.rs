use crate::domain::entities::{Category, ServiceType, Tag};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::confidence::{ConfidenceLevel, ConfidenceScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Immutable output of a single classification attempt.
///
/// `method` identifies which classifier path produced the result
/// (`keywords`, `keywords_default`, `agentic_structured`,
/// `agentic_heuristic`, `agentic_fallback`, `agentic_error`, `default`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingResult {
    pub service_type: Option<ServiceType>,
    pub category: Option<Category>,
    confidence: ConfidenceScore,
    pub method: String,
    pub reasoning: String,
    pub key_phrases: Vec<String>,
    pub metadata: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl TaggingResult {
    pub fn new(
        service_type: Option<ServiceType>,
        category: Option<Category>,
        confidence: f64,
        method: impl Into<String>,
        reasoning: impl Into<String>,
        key_phrases: Vec<String>,
        metadata: Map<String, Value>,
    ) -> DomainResult<Self> {
        Ok(Self {
            service_type,
            category,
            confidence: ConfidenceScore::new(confidence)?,
            method: method.into(),
            reasoning: reasoning.into(),
            key_phrases,
            metadata,
            timestamp: Utc::now(),
        })
    }

    /// The (Other, Others) safety-net result with confidence 0.
    ///
    /// Every error and no-signal path ends here, distinguished only by the
    /// method tag and reasoning.
    pub fn unclassified(method: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            service_type: Some(ServiceType::Other),
            category: Some(Category::Others),
            confidence: ConfidenceScore::new(0.0).expect("zero is a valid confidence"),
            method: method.into(),
            reasoning: reasoning.into(),
            key_phrases: Vec::new(),
            metadata: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence.value()
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence.level()
    }

    /// At least one axis resolved.
    pub fn is_successful(&self) -> bool {
        self.service_type.is_some() || self.category.is_some()
    }

    /// Both axes resolved.
    pub fn is_complete(&self) -> bool {
        self.service_type.is_some() && self.category.is_some()
    }

    pub fn to_tag(&self) -> Tag {
        Tag {
            service_type: self.service_type,
            category: self.category,
            confidence: self.confidence.value(),
            method: self.method.clone(),
            timestamp: self.timestamp,
        }
    }
}
