use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Validated confidence score. Out-of-range values are rejected at
/// construction, never clamped here; upstream parsing clamps before it
/// constructs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore(f64);

impl ConfidenceScore {
    pub fn new(value: f64) -> DomainResult<Self> {
        if !(0.0..=1.0).contains(&value) || value.is_nan() {
            return Err(DomainError::Validation(format!(
                "Confidence score must be between 0.0 and 1.0, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn level(&self) -> ConfidenceLevel {
        if self.0 >= 0.8 {
            ConfidenceLevel::High
        } else if self.0 >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
