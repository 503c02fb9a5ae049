//! Workflow vocabulary shared between the client library and its events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which operation the workflow submits: hide a message or recover one
///
/// Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowMode {
    #[default]
    Embed,
    Extract,
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowMode::Embed => write!(f, "embed"),
            WorkflowMode::Extract => write!(f, "extract"),
        }
    }
}

/// The two audio asset slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSlot {
    /// The file the user selected
    Original,
    /// The watermarked file hosted by the service after an embed
    Processed,
}

impl AssetSlot {
    pub const ALL: [AssetSlot; 2] = [AssetSlot::Original, AssetSlot::Processed];

    /// Display label for the asset in this slot
    pub fn label(&self) -> &'static str {
        match self {
            AssetSlot::Original => "Original Audio",
            AssetSlot::Processed => "Watermarked Audio",
        }
    }
}

impl fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSlot::Original => write!(f, "original"),
            AssetSlot::Processed => write!(f, "processed"),
        }
    }
}

/// Request stage in which a submit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Upload,
    Embed,
    Extract,
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPhase::Upload => write!(f, "upload"),
            RequestPhase::Embed => write!(f, "embed"),
            RequestPhase::Extract => write!(f, "extract"),
        }
    }
}

/// Category of a user-visible failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or malformed input, no request was sent
    Validation,
    /// No response received
    Transport,
    /// Non-success HTTP status (or unreadable success body)
    Service,
    /// Success status whose payload reports `success: false`
    LogicalFailure,
}
