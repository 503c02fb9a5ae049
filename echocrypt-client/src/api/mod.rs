//! Watermarking service API
//!
//! [`WatermarkApi`] is the seam between the workflow and the HTTP service.
//! [`HttpWatermarkApi`] is the production implementation; tests substitute
//! scripted doubles.
//!
//! | Endpoint | Request | Response |
//! |---|---|---|
//! | `GET /suggest?size=N` | | `{ recommended_bits }` |
//! | `POST /upload` | multipart `file` | `{ file_id }` |
//! | `POST /embed` | multipart `file_id, message, playfair_key, railfence_key, bits_per_sample` | `{ snr, bits_embedded, encrypted_message, output_file }` |
//! | `POST /extract` | multipart `file, playfair_key, railfence_key, bits_per_sample` | `{ success, decrypted_message?, error? }` |
//! | `GET /download/{id}` | | WAV bytes |

mod http;

pub use http::HttpWatermarkApi;

use crate::assets::AudioFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service client errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response received (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("API error {status}: {message}")]
    Status {
        status: u16,
        /// `detail` field of the error body, if there was one
        detail: Option<String>,
        /// Message shown to the user: `detail`, or a generic status line
        message: String,
    },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Build a status error from a raw error body
    ///
    /// The service reports failures as `{"detail": ...}`. A string detail is
    /// used as-is; structured details (validation error lists) are rendered
    /// as JSON. Without a detail the generic status line is used.
    pub fn from_error_body(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| match parsed.detail {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            });

        let message = detail
            .clone()
            .unwrap_or_else(|| format!("Request failed with status code {}", status));

        ApiError::Status {
            status,
            detail,
            message,
        }
    }

    /// Message suitable for the single user-visible error slot
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(msg) => msg.clone(),
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Parse(msg) => format!("Invalid response from service: {}", msg),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

/// `GET /suggest` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SuggestResponse {
    /// Recommended LSB count; validated by [`crate::SuggestionClient`]
    pub recommended_bits: i64,
}

/// `POST /upload` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadResponse {
    /// Opaque server-side handle for the uploaded file
    pub file_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Parameters of `POST /embed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    pub file_id: String,
    pub message: String,
    /// Sent as `playfair_key`
    pub cipher_keyword: String,
    /// Sent as `railfence_key`
    pub transposition_depth: i64,
    /// Sent as `bits_per_sample`
    pub bit_depth: u8,
}

/// `POST /embed` response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedResponse {
    pub snr: f64,
    pub bits_embedded: u64,
    pub encrypted_message: String,
    pub output_file: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Parameters of `POST /extract`; the raw file is resubmitted
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub file: AudioFile,
    pub cipher_keyword: String,
    pub transposition_depth: i64,
    pub bit_depth: u8,
}

/// `POST /extract` response
///
/// A 2xx response may still report `success: false` with an `error`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    #[serde(default)]
    pub decrypted_message: Option<String>,
    #[serde(default)]
    pub extracted_ciphertext: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Watermarking service operations
///
/// No implementation retries; every failure is returned to the caller.
#[async_trait]
pub trait WatermarkApi: Send + Sync {
    /// Ask for a recommended bit depth for a file of `size_bytes`
    async fn suggest(&self, size_bytes: u64) -> Result<SuggestResponse, ApiError>;

    /// Upload a WAV file, returning its server-side id
    async fn upload(&self, file: &AudioFile) -> Result<UploadResponse, ApiError>;

    /// Encrypt and embed a message into a previously uploaded file
    async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, ApiError>;

    /// Extract and decrypt a message from a WAV file
    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResponse, ApiError>;

    /// Fetch the bytes behind a remote locator (a `/download/{id}` URL)
    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}
