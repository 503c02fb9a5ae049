//! Event types for the EchoCrypt client
//!
//! The workflow emits a [`WorkflowEvent`] for every state change so a view
//! layer can re-render without polling.

mod workflow_types;

pub use workflow_types::{AssetSlot, FailureKind, RequestPhase, WorkflowMode};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Workflow event types
///
/// Serializable so a front end can forward them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// A new source file was selected
    FileSelected {
        file_name: String,
        size_bytes: u64,
        /// Selection generation the file belongs to
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// Active mode changed (Embed ↔ Extract)
    ModeChanged {
        old_mode: WorkflowMode,
        new_mode: WorkflowMode,
        timestamp: DateTime<Utc>,
    },

    /// Submit accepted, request sequence starting
    SubmitStarted {
        mode: WorkflowMode,
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// Upload phase finished, process phase follows
    UploadCompleted {
        file_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Submit finished with an outcome
    SubmitResolved {
        mode: WorkflowMode,
        timestamp: DateTime<Utc>,
    },

    /// Submit finished with a user-visible error
    SubmitFailed {
        kind: FailureKind,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Service recommended a bit depth for the current file
    SuggestionReceived {
        recommended_bits: u8,
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// An asset slot was filled, replaced or cleared
    AssetChanged {
        slot: AssetSlot,
        /// New playable locator, `None` when the slot was cleared
        locator: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A response arrived for a superseded request and was dropped
    StaleResultDiscarded {
        /// "suggestion" or the submit mode
        request: String,
        generation: u64,
        current_generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// Workflow released all its resources
    TornDown { timestamp: DateTime<Utc> },
}

/// Broadcast channel for workflow events
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow receivers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: WorkflowEvent,
    ) -> Result<usize, broadcast::error::SendError<WorkflowEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = WorkflowEvent::ModeChanged {
            old_mode: WorkflowMode::Embed,
            new_mode: WorkflowMode::Extract,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ModeChanged");
        assert_eq!(json["old_mode"], "embed");
        assert_eq!(json["new_mode"], "extract");
    }

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(8);
        let result = bus.emit(WorkflowEvent::TornDown { timestamp: Utc::now() });
        assert!(result.is_err());

        // Lossy emission never panics
        bus.emit_lossy(WorkflowEvent::TornDown { timestamp: Utc::now() });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(WorkflowEvent::SuggestionReceived {
            recommended_bits: 3,
            generation: 1,
            timestamp: Utc::now(),
        });

        match rx.recv().await.unwrap() {
            WorkflowEvent::SuggestionReceived {
                recommended_bits, ..
            } => assert_eq!(recommended_bits, 3),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_asset_slot_labels() {
        assert_eq!(AssetSlot::Original.label(), "Original Audio");
        assert_eq!(AssetSlot::Processed.label(), "Watermarked Audio");
        assert_eq!(AssetSlot::Processed.to_string(), "processed");
    }
}
