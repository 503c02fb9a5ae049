//! User-facing workflow errors

use crate::api::ApiError;
use echocrypt_common::{FailureKind, RequestPhase};
use thiserror::Error;

/// Every failure a submit can surface
///
/// `Display` is the message shown in the workflow's single error slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// Missing or malformed input; no request was sent
    #[error("{0}")]
    Validation(String),

    /// No response received
    #[error("{message}")]
    Transport { phase: RequestPhase, message: String },

    /// Non-success status, or a success body that could not be read
    #[error("{message}")]
    Service {
        phase: RequestPhase,
        status: Option<u16>,
        message: String,
    },

    /// Extract succeeded at the HTTP level but reported `success: false`
    #[error("{0}")]
    LogicalFailure(String),
}

impl WorkflowError {
    /// Classify an API error raised during `phase`
    pub fn from_api(phase: RequestPhase, err: ApiError) -> Self {
        let message = err.user_message();
        match err {
            ApiError::Network(_) => WorkflowError::Transport { phase, message },
            ApiError::Status { status, .. } => WorkflowError::Service {
                phase,
                status: Some(status),
                message,
            },
            ApiError::Parse(_) => WorkflowError::Service {
                phase,
                status: None,
                message,
            },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            WorkflowError::Validation(_) => FailureKind::Validation,
            WorkflowError::Transport { .. } => FailureKind::Transport,
            WorkflowError::Service { .. } => FailureKind::Service,
            WorkflowError::LogicalFailure(_) => FailureKind::LogicalFailure,
        }
    }

    /// Request stage that failed, if a request was made
    pub fn phase(&self) -> Option<RequestPhase> {
        match self {
            WorkflowError::Transport { phase, .. } | WorkflowError::Service { phase, .. } => {
                Some(*phase)
            }
            WorkflowError::LogicalFailure(_) => Some(RequestPhase::Extract),
            WorkflowError::Validation(_) => None,
        }
    }
}
