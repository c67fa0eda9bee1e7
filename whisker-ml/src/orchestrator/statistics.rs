//! Recognition statistics tracking
//!
//! Running counters across all recognition calls, for display and health
//! checks. Concurrent calls update the shared container through a lock.

use crate::models::RecognitionTier;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bounded window used for the recent-confidence average
const RECENT_WINDOW: usize = 100;

/// Point-in-time view of the recognition counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// All recognition attempts, including failures and cancellations
    pub total_recognitions: u64,
    pub native_results: u64,
    pub heuristic_results: u64,
    /// Successful results that went through the enhancement pass
    pub enhanced_results: u64,
    pub failed_recognitions: u64,
    pub cancelled_recognitions: u64,
    /// Mean confidence over all successful results
    pub average_confidence: f64,
    /// Mean confidence over the last 100 successful results
    pub recent_average_confidence: f64,
    /// Mean wall-clock processing time over all successful results
    pub average_processing_ms: f64,
}

impl StatsSnapshot {
    pub fn display_string(&self) -> String {
        format!(
            "{} recognitions ({} native, {} heuristic), {} failed, {} cancelled, avg confidence {:.3}",
            self.total_recognitions,
            self.native_results,
            self.heuristic_results,
            self.failed_recognitions,
            self.cancelled_recognitions,
            self.average_confidence
        )
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    native: u64,
    heuristic: u64,
    enhanced: u64,
    failed: u64,
    cancelled: u64,
    confidence_sum: f64,
    processing_ms_sum: u64,
    recent_confidences: VecDeque<f64>,
}

/// Thread-safe recognition counters
///
/// Cloning shares the underlying container.
#[derive(Debug, Clone, Default)]
pub struct RecognitionStatistics {
    inner: Arc<Mutex<StatsInner>>,
}

impl RecognitionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful recognition
    pub fn record_success(
        &self,
        tier: RecognitionTier,
        confidence: f64,
        processing_ms: u64,
        enhanced: bool,
    ) {
        let mut stats = self.inner.lock().unwrap();
        match tier {
            RecognitionTier::Native => stats.native += 1,
            RecognitionTier::Heuristic => stats.heuristic += 1,
        }
        if enhanced {
            stats.enhanced += 1;
        }
        stats.confidence_sum += confidence;
        stats.processing_ms_sum += processing_ms;
        stats.recent_confidences.push_back(confidence);
        if stats.recent_confidences.len() > RECENT_WINDOW {
            stats.recent_confidences.pop_front();
        }
    }

    /// Record a call that produced no result
    pub fn record_failure(&self) {
        let mut stats = self.inner.lock().unwrap();
        stats.failed += 1;
    }

    /// Record a call aborted by its cancellation token
    pub fn record_cancellation(&self) {
        let mut stats = self.inner.lock().unwrap();
        stats.cancelled += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let stats = self.inner.lock().unwrap();
        let successes = stats.native + stats.heuristic;
        let average_confidence = if successes > 0 {
            stats.confidence_sum / successes as f64
        } else {
            0.0
        };
        let average_processing_ms = if successes > 0 {
            stats.processing_ms_sum as f64 / successes as f64
        } else {
            0.0
        };
        let recent_average_confidence = if stats.recent_confidences.is_empty() {
            0.0
        } else {
            stats.recent_confidences.iter().sum::<f64>() / stats.recent_confidences.len() as f64
        };
        StatsSnapshot {
            total_recognitions: successes + stats.failed + stats.cancelled,
            native_results: stats.native,
            heuristic_results: stats.heuristic,
            enhanced_results: stats.enhanced,
            failed_recognitions: stats.failed,
            cancelled_recognitions: stats.cancelled,
            average_confidence,
            recent_average_confidence,
            average_processing_ms,
        }
    }
}
