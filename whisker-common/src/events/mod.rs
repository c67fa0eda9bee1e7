//! Event types for the whisker event system
//!
//! Provides shared event definitions and EventBus for the recognition crates.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Whisker event types
///
/// Events are broadcast via EventBus and can be serialized for transmission to
/// surrounding application layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WhiskerEvent {
    /// Native model bridge initialized successfully
    ///
    /// Triggers:
    /// - UI: Enable "on-device model" indicator
    /// - Diagnostics: Record model version in session info
    ModelBridgeInitialized {
        /// Labels reported by the native side
        num_labels: usize,
        /// Model input dimension (square)
        input_size: u32,
        /// Model version tag stamped on results
        model_version: String,
        /// When initialization completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Native inference unavailable; session degraded to heuristic tier
    ///
    /// Triggers:
    /// - UI: Show degraded-mode indicator
    FallbackModeEntered {
        /// Why the bridge could not be initialized
        reason: String,
        /// When fallback mode was entered
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition call started
    RecognitionStarted {
        /// Recognition call UUID
        recognition_id: Uuid,
        /// Source image path
        image_path: String,
        /// When the call started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition call produced a result
    ///
    /// Triggers:
    /// - UI: Display breed card
    /// - Statistics: Update rolling confidence displays
    RecognitionCompleted {
        /// Recognition call UUID
        recognition_id: Uuid,
        /// Top breed display name
        breed_name: String,
        /// Which tier produced the result ("native" or "heuristic")
        tier: String,
        /// Final confidence after any enhancement
        confidence: f64,
        /// Wall-clock processing time in milliseconds
        processing_ms: u64,
        /// When the call completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition call failed with no result
    RecognitionFailed {
        /// Recognition call UUID
        recognition_id: Uuid,
        /// Failure description
        reason: String,
        /// When the call failed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition call cancelled by the caller
    RecognitionCancelled {
        /// Recognition call UUID
        recognition_id: Uuid,
        /// When the cancellation was observed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl WhiskerEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            WhiskerEvent::ModelBridgeInitialized { .. } => "ModelBridgeInitialized",
            WhiskerEvent::FallbackModeEntered { .. } => "FallbackModeEntered",
            WhiskerEvent::RecognitionStarted { .. } => "RecognitionStarted",
            WhiskerEvent::RecognitionCompleted { .. } => "RecognitionCompleted",
            WhiskerEvent::RecognitionFailed { .. } => "RecognitionFailed",
            WhiskerEvent::RecognitionCancelled { .. } => "RecognitionCancelled",
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
///
/// # Examples
///
/// ```
/// use whisker_common::events::EventBus;
/// use std::sync::Arc;
///
/// let event_bus = Arc::new(EventBus::new(1000));
/// let mut rx = event_bus.subscribe();
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WhiskerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///   (desktop default 1000; tests typically 10-100)
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<WhiskerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: WhiskerEvent,
    ) -> Result<usize, broadcast::error::SendError<WhiskerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Used for progress-style events where it is acceptable if no component
    /// is currently listening.
    pub fn emit_lossy(&self, event: WhiskerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
