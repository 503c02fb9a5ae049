//! Workflow state, parameters and outcomes

use super::WorkflowError;
use crate::api::EmbedResponse;
use crate::assets::{AudioAsset, AudioAssetManager, AudioFile, BlobStore};
use echocrypt_common::{AssetSlot, FailureKind, WorkflowMode};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_TRANSPOSITION_DEPTH: i64 = 2;
pub const DEFAULT_BIT_DEPTH: u8 = 1;
pub const MIN_TRANSPOSITION_DEPTH: i64 = 2;
pub const MAX_BIT_DEPTH: u8 = 8;

/// Form parameters shared by both modes (the message is Embed only)
#[derive(Debug, Clone)]
pub struct WatermarkParameters {
    pub source_file: Option<AudioFile>,
    pub secret_message: String,
    /// Keyword for the substitution cipher
    pub cipher_keyword: String,
    /// Rail count for the transposition cipher
    pub transposition_depth: i64,
    /// Least-significant bits per sample used for the payload
    pub bit_depth: u8,
}

impl Default for WatermarkParameters {
    fn default() -> Self {
        Self {
            source_file: None,
            secret_message: String::new(),
            cipher_keyword: String::new(),
            transposition_depth: DEFAULT_TRANSPOSITION_DEPTH,
            bit_depth: DEFAULT_BIT_DEPTH,
        }
    }
}

/// Editable form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterField {
    SecretMessage,
    CipherKeyword,
    TranspositionDepth,
    BitDepth,
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterField::SecretMessage => "secret message",
            ParameterField::CipherKeyword => "cipher keyword",
            ParameterField::TranspositionDepth => "transposition depth",
            ParameterField::BitDepth => "bit depth",
        };
        f.write_str(name)
    }
}

/// Result of a successful embed, exactly as reported by the service
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOutcome {
    pub signal_to_noise_ratio_db: f64,
    pub bits_embedded: u64,
    pub cipher_text: String,
    /// Server-side name of the watermarked file
    pub output_asset_id: String,
}

impl From<EmbedResponse> for EmbedOutcome {
    fn from(response: EmbedResponse) -> Self {
        Self {
            signal_to_noise_ratio_db: response.snr,
            bits_embedded: response.bits_embedded,
            cipher_text: response.encrypted_message,
            output_asset_id: response.output_file,
        }
    }
}

/// Result of a successful extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutcome {
    pub success: bool,
    pub decrypted_message: String,
    /// Raw ciphertext recovered from the audio, when the service returns it
    pub extracted_ciphertext: Option<String>,
}

/// Content of the single user-visible error slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&WorkflowError> for RequestError {
    fn from(err: &WorkflowError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// What the last request cycle produced; at most one of these is held
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Embedded(EmbedOutcome),
    Extracted(ExtractOutcome),
    Failed(RequestError),
}

/// Externally visible workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    /// No file chosen yet
    Idle,
    Ready,
    Loading,
    Resolved,
    Failed,
}

/// What a `submit` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Requests ran and the outcome was stored
    Completed,
    /// Another submit was in flight; nothing happened
    AlreadyInFlight,
    /// File or mode changed while in flight; the result was dropped
    Superseded,
}

/// Point-in-time copy of the workflow for rendering and assertions
#[derive(Debug, Clone)]
pub struct WorkflowSnapshot {
    pub phase: WorkflowPhase,
    pub mode: WorkflowMode,
    pub parameters: WatermarkParameters,
    pub suggested_bit_depth: Option<u8>,
    pub resolution: Option<Resolution>,
    pub loading: bool,
    pub generation: u64,
    pub original: Option<AudioAsset>,
    pub processed: Option<AudioAsset>,
}

impl WorkflowSnapshot {
    pub fn embed_outcome(&self) -> Option<&EmbedOutcome> {
        match &self.resolution {
            Some(Resolution::Embedded(outcome)) => Some(outcome),
            _ => None,
        }
    }

    pub fn extract_outcome(&self) -> Option<&ExtractOutcome> {
        match &self.resolution {
            Some(Resolution::Extracted(outcome)) => Some(outcome),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match &self.resolution {
            Some(Resolution::Failed(err)) => Some(err),
            _ => None,
        }
    }
}

/// Everything a submit needs, captured under the lock
#[derive(Debug, Clone)]
pub(crate) struct PendingSubmit {
    pub generation: u64,
    pub mode: WorkflowMode,
    pub file: AudioFile,
    pub secret_message: String,
    pub cipher_keyword: String,
    pub transposition_depth: i64,
    pub bit_depth: u8,
}

pub(crate) struct WorkflowState {
    pub mode: WorkflowMode,
    pub params: WatermarkParameters,
    pub suggested_bit_depth: Option<u8>,
    pub resolution: Option<Resolution>,
    pub loading: bool,
    /// Bumped on every file selection; async results carry the value they
    /// started with and are dropped when it no longer matches
    pub generation: u64,
    pub assets: AudioAssetManager,
    pub torn_down: bool,
}

impl WorkflowState {
    pub fn new(store: Arc<BlobStore>) -> Self {
        Self {
            mode: WorkflowMode::default(),
            params: WatermarkParameters::default(),
            suggested_bit_depth: None,
            resolution: None,
            loading: false,
            generation: 0,
            assets: AudioAssetManager::new(store),
            torn_down: false,
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        if self.params.source_file.is_none() {
            WorkflowPhase::Idle
        } else if self.loading {
            WorkflowPhase::Loading
        } else {
            match self.resolution {
                Some(Resolution::Failed(_)) => WorkflowPhase::Failed,
                Some(_) => WorkflowPhase::Resolved,
                None => WorkflowPhase::Ready,
            }
        }
    }

    /// Check the form before any request is sent
    pub fn validate(&self) -> Result<PendingSubmit, WorkflowError> {
        if self.torn_down {
            return Err(WorkflowError::Validation(
                "Workflow is no longer active".to_string(),
            ));
        }

        let Some(file) = self.params.source_file.clone() else {
            return Err(WorkflowError::Validation(
                "Please select a WAV file".to_string(),
            ));
        };

        if self.mode == WorkflowMode::Embed && self.params.secret_message.is_empty() {
            return Err(WorkflowError::Validation(
                "Secret message is required".to_string(),
            ));
        }

        if self.params.cipher_keyword.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "Cipher keyword is required".to_string(),
            ));
        }

        if self.params.transposition_depth < MIN_TRANSPOSITION_DEPTH {
            return Err(WorkflowError::Validation(format!(
                "Transposition depth must be at least {}",
                MIN_TRANSPOSITION_DEPTH
            )));
        }

        if !(1..=MAX_BIT_DEPTH).contains(&self.params.bit_depth) {
            return Err(WorkflowError::Validation(format!(
                "Bit depth must be between 1 and {}",
                MAX_BIT_DEPTH
            )));
        }

        Ok(PendingSubmit {
            generation: self.generation,
            mode: self.mode,
            file,
            secret_message: self.params.secret_message.clone(),
            cipher_keyword: self.params.cipher_keyword.clone(),
            transposition_depth: self.params.transposition_depth,
            bit_depth: self.params.bit_depth,
        })
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            phase: self.phase(),
            mode: self.mode,
            parameters: self.params.clone(),
            suggested_bit_depth: self.suggested_bit_depth,
            resolution: self.resolution.clone(),
            loading: self.loading,
            generation: self.generation,
            original: self.assets.asset(AssetSlot::Original).cloned(),
            processed: self.assets.asset(AssetSlot::Processed).cloned(),
        }
    }
}
