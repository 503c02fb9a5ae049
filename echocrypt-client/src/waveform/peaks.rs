//! Peak-based waveform engine
//!
//! Decodes WAV audio with hound, folds all channels into one peak envelope
//! and buckets it into one value per bar.

use super::{EngineFactory, PlaybackState, WaveformEngine, WaveformError};
use crate::api::WatermarkApi;
use crate::assets::{BlobStore, Locator};
use async_trait::async_trait;
use echocrypt_common::config::WaveformSettings;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// Decoded envelope of one audio file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWaveform {
    /// One value per bar in `0.0..=1.0`
    pub peaks: Vec<f32>,
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decode WAV bytes into `bar_count` peak values
///
/// With `normalize` the loudest bar is scaled to 1.0.
pub fn decode_peaks(
    bytes: &[u8],
    bar_count: usize,
    normalize: bool,
) -> Result<DecodedWaveform, WaveformError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let amplitudes: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f32::abs))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f32 / full_scale).abs()))
                .collect::<Result<_, _>>()?
        }
    };

    let frame_peaks: Vec<f32> = amplitudes
        .chunks(channels)
        .map(|frame| frame.iter().copied().fold(0.0, f32::max))
        .collect();

    let frames = frame_peaks.len();
    let bars = bar_count.max(1);
    let mut peaks = vec![0.0f32; bars];

    for (i, peak) in frame_peaks.iter().enumerate() {
        let bar = i * bars / frames;
        peaks[bar] = peaks[bar].max(*peak);
    }

    if normalize {
        let loudest = peaks.iter().copied().fold(0.0, f32::max);
        if loudest > 0.0 {
            peaks.iter_mut().for_each(|p| *p /= loudest);
        }
    }
    peaks.iter_mut().for_each(|p| *p = p.min(1.0));

    let sample_rate = spec.sample_rate.max(1);
    Ok(DecodedWaveform {
        peaks,
        duration: Duration::from_secs_f64(frames as f64 / sample_rate as f64),
        sample_rate,
        channels: spec.channels,
    })
}

enum EngineState {
    Empty,
    Ready(DecodedWaveform),
    Failed(String),
    Destroyed,
}

/// Engine resolving local locators through the [`BlobStore`] and remote
/// ones through the service's download endpoint
pub struct PeakWaveformEngine {
    store: Arc<BlobStore>,
    api: Arc<dyn WatermarkApi>,
    settings: WaveformSettings,
    width: u32,
    state: EngineState,
    playback: PlaybackState,
}

impl PeakWaveformEngine {
    pub fn new(
        store: Arc<BlobStore>,
        api: Arc<dyn WatermarkApi>,
        settings: WaveformSettings,
        width: u32,
    ) -> Self {
        Self {
            store,
            api,
            settings,
            width,
            state: EngineState::Empty,
            playback: PlaybackState::Stopped,
        }
    }

    fn bar_count(&self) -> usize {
        let stride = (self.settings.bar_width + self.settings.bar_gap).max(1);
        (self.width / stride).max(1) as usize
    }

    /// Failure message of the last load, if it failed
    pub fn load_error(&self) -> Option<&str> {
        match &self.state {
            EngineState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[async_trait]
impl WaveformEngine for PeakWaveformEngine {
    async fn load(&mut self, locator: &Locator) -> Result<(), WaveformError> {
        if matches!(self.state, EngineState::Destroyed) {
            return Err(WaveformError::Disposed);
        }

        let bytes = if locator.is_local() {
            self.store.resolve(locator).map(|data| data.to_vec())?
        } else {
            self.api.download(locator.as_str()).await?
        };

        match decode_peaks(&bytes, self.bar_count(), self.settings.normalize) {
            Ok(decoded) => {
                tracing::debug!(
                    locator = %locator,
                    bars = decoded.peaks.len(),
                    duration_ms = decoded.duration.as_millis() as u64,
                    "Waveform loaded"
                );
                self.state = EngineState::Ready(decoded);
                self.playback = PlaybackState::Stopped;
                Ok(())
            }
            Err(e) => {
                self.state = EngineState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    fn play_pause(&mut self) -> PlaybackState {
        if self.is_ready() {
            self.playback = match self.playback {
                PlaybackState::Playing => PlaybackState::Paused,
                PlaybackState::Stopped | PlaybackState::Paused => PlaybackState::Playing,
            };
        }
        self.playback
    }

    fn playback(&self) -> PlaybackState {
        self.playback
    }

    fn peaks(&self) -> Option<&[f32]> {
        match &self.state {
            EngineState::Ready(decoded) => Some(&decoded.peaks),
            _ => None,
        }
    }

    fn duration(&self) -> Option<Duration> {
        match &self.state {
            EngineState::Ready(decoded) => Some(decoded.duration),
            _ => None,
        }
    }

    fn destroy(&mut self) {
        self.state = EngineState::Destroyed;
        self.playback = PlaybackState::Stopped;
    }
}

/// Builds [`PeakWaveformEngine`]s sharing one store and API client
pub struct PeakEngineFactory {
    store: Arc<BlobStore>,
    api: Arc<dyn WatermarkApi>,
    settings: WaveformSettings,
    width: u32,
}

impl PeakEngineFactory {
    pub fn new(
        store: Arc<BlobStore>,
        api: Arc<dyn WatermarkApi>,
        settings: WaveformSettings,
        width: u32,
    ) -> Self {
        Self {
            store,
            api,
            settings,
            width,
        }
    }
}

impl EngineFactory for PeakEngineFactory {
    fn create(&self) -> Box<dyn WaveformEngine> {
        Box::new(PeakWaveformEngine::new(
            Arc::clone(&self.store),
            Arc::clone(&self.api),
            self.settings,
            self.width,
        ))
    }
}
