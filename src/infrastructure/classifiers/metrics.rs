use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// A tagging counts as successful when its confidence clears this bar.
const SUCCESS_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone)]
struct MetricsState {
    total_taggings: u64,
    successful_taggings: u64,
    average_confidence: f64,
    error_count: u64,
    last_reset: DateTime<Utc>,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            total_taggings: 0,
            successful_taggings: 0,
            average_confidence: 0.0,
            error_count: 0,
            last_reset: Utc::now(),
        }
    }
}

/// Point-in-time view of the semantic engine's performance counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_taggings: u64,
    pub successful_taggings: u64,
    pub average_confidence: f64,
    pub error_count: u64,
    pub success_rate: f64,
    pub error_rate: f64,
    pub uptime_seconds: i64,
}

/// Running-average performance counters for the semantic engine.
///
/// Observability state, not part of the classification contract. Explicitly
/// owned by the engine and updated under a lock so concurrent taggings
/// cannot tear the running average.
#[derive(Debug)]
pub struct EngineMetrics {
    state: Mutex<MetricsState>,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MetricsState::new()),
        }
    }

    /// Record one completed tagging and fold its confidence into the
    /// running average.
    pub fn record(&self, confidence: f64) {
        let mut state = self.state.lock().expect("metrics lock poisoned");
        state.total_taggings += 1;
        if confidence > SUCCESS_CONFIDENCE {
            state.successful_taggings += 1;
        }
        let total = state.total_taggings as f64;
        state.average_confidence = (state.average_confidence * (total - 1.0) + confidence) / total;
    }

    /// Record one failed tagging. An error is still a tagging at
    /// confidence zero, so it folds into the totals and the running
    /// average as well as the error counter.
    pub fn record_error(&self) {
        let mut state = self.state.lock().expect("metrics lock poisoned");
        state.total_taggings += 1;
        state.error_count += 1;
        let total = state.total_taggings as f64;
        state.average_confidence = state.average_confidence * (total - 1.0) / total;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock().expect("metrics lock poisoned");
        let total = state.total_taggings;
        MetricsSnapshot {
            total_taggings: total,
            successful_taggings: state.successful_taggings,
            average_confidence: state.average_confidence,
            error_count: state.error_count,
            success_rate: if total > 0 {
                state.successful_taggings as f64 / total as f64
            } else {
                0.0
            },
            error_rate: if total > 0 {
                state.error_count as f64 / total as f64
            } else {
                0.0
            },
            uptime_seconds: (Utc::now() - state.last_reset).num_seconds(),
        }
    }

    pub fn reset(&self) {
        let mut state = self.state.lock().expect("metrics lock poisoned");
        *state = MetricsState::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_average_and_success_rate() {
        let metrics = EngineMetrics::new();
        metrics.record(0.9);
        metrics.record(0.3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_taggings, 2);
        assert_eq!(snapshot.successful_taggings, 1);
        assert!((snapshot.average_confidence - 0.6).abs() < 1e-9);
        assert!((snapshot.success_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn exactly_half_confidence_is_not_a_success() {
        let metrics = EngineMetrics::new();
        metrics.record(0.5);
        assert_eq!(metrics.snapshot().successful_taggings, 0);
    }

    #[test]
    fn error_results_fold_into_the_totals() {
        let metrics = EngineMetrics::new();
        metrics.record(0.8);
        metrics.record_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.error_count, 1);
        assert_eq!(snapshot.total_taggings, 2);
        assert!((snapshot.error_rate - 0.5).abs() < 1e-9);
        assert!((snapshot.success_rate - 0.5).abs() < 1e-9);
        // The error contributes confidence zero to the running average.
        assert!((snapshot.average_confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_everything() {
        let metrics = EngineMetrics::new();
        metrics.record(0.8);
        metrics.record_error();
        metrics.reset();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_taggings, 0);
        assert_eq!(snapshot.error_count, 0);
        assert_eq!(snapshot.average_confidence, 0.0);
    }
}
