//! Waveform presentation
//!
//! A [`WaveformPresenter`] shows one audio asset. It owns at most one
//! [`WaveformEngine`] at a time and replaces it whenever the asset's locator
//! changes, destroying the old engine first.

mod peaks;
mod presenter;
pub mod render;

pub use peaks::{decode_peaks, DecodedWaveform, PeakEngineFactory, PeakWaveformEngine};
pub use presenter::WaveformPresenter;

use crate::api::ApiError;
use crate::assets::{AssetError, Locator};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Waveform loading errors
#[derive(Debug, Error)]
pub enum WaveformError {
    /// Local locator could not be resolved (revoked or unknown)
    #[error("Audio source unavailable: {0}")]
    Source(#[from] AssetError),

    /// Remote locator could not be fetched
    #[error("Audio download failed: {0}")]
    Download(#[from] ApiError),

    /// Bytes are not a readable WAV stream
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Engine or presenter used after disposal
    #[error("Waveform already disposed")]
    Disposed,
}

impl From<hound::Error> for WaveformError {
    fn from(e: hound::Error) -> Self {
        WaveformError::Decode(e.to_string())
    }
}

/// Transport state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Rendering engine for a single locator
///
/// Engines hold decoded audio and must be [`destroy`](Self::destroy)ed
/// before being dropped or replaced.
#[async_trait]
pub trait WaveformEngine: Send + Sync {
    /// Fetch and decode the audio behind `locator`
    async fn load(&mut self, locator: &Locator) -> Result<(), WaveformError>;

    /// True once `load` finished successfully
    fn is_ready(&self) -> bool;

    /// Toggle playing/paused; ignored until ready. Returns the new state.
    fn play_pause(&mut self) -> PlaybackState;

    fn playback(&self) -> PlaybackState;

    /// Normalized bar heights in `0.0..=1.0`, once ready
    fn peaks(&self) -> Option<&[f32]>;

    fn duration(&self) -> Option<Duration>;

    /// Release decoded audio and playback resources
    fn destroy(&mut self);
}

/// Creates engines for a presenter
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn WaveformEngine>;
}
