//! Bit depth suggestion client
//!
//! Stateless: one request per call, no retries. Callers treat any error as
//! "no suggestion available".

use crate::api::{ApiError, WatermarkApi};
use std::sync::Arc;

/// Smallest and largest bit depth the embedder accepts
pub const BIT_DEPTH_RANGE: std::ops::RangeInclusive<i64> = 1..=8;

#[derive(Clone)]
pub struct SuggestionClient {
    api: Arc<dyn WatermarkApi>,
}

impl SuggestionClient {
    pub fn new(api: Arc<dyn WatermarkApi>) -> Self {
        Self { api }
    }

    /// Recommended bit depth for a file of `size_bytes`
    ///
    /// A recommendation outside 1..=8 is reported as a parse error.
    pub async fn fetch(&self, size_bytes: u64) -> Result<u8, ApiError> {
        let response = self.api.suggest(size_bytes).await?;
        let bits = response.recommended_bits;

        if !BIT_DEPTH_RANGE.contains(&bits) {
            return Err(ApiError::Parse(format!(
                "recommended_bits out of range: {}",
                bits
            )));
        }

        tracing::debug!(size_bytes, recommended_bits = bits, "Bit depth suggestion received");
        Ok(bits as u8)
    }
}
