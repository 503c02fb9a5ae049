//! Single-asset waveform presenter

use super::render::{render_bars, rows_for_height};
use super::{EngineFactory, PlaybackState, WaveformEngine, WaveformError};
use crate::assets::{AudioAsset, Locator};
use echocrypt_common::config::WaveformSettings;
use std::sync::Arc;

/// Shows one asset as a waveform with play/pause
///
/// Only reads assets; locator validity belongs to the asset manager.
/// [`dispose`](Self::dispose) must be called once by the owner.
pub struct WaveformPresenter {
    title: String,
    factory: Arc<dyn EngineFactory>,
    settings: WaveformSettings,
    engine: Option<Box<dyn WaveformEngine>>,
    locator: Option<Locator>,
    disposed: bool,
}

impl WaveformPresenter {
    pub fn new(
        title: impl Into<String>,
        factory: Arc<dyn EngineFactory>,
        settings: WaveformSettings,
    ) -> Self {
        Self {
            title: title.into(),
            factory,
            settings,
            engine: None,
            locator: None,
            disposed: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Locator currently shown
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// Show `asset`, re-initializing the engine if its locator changed
    ///
    /// The previous engine is destroyed before a new one is created. An
    /// unchanged locator keeps the current engine. A load failure leaves the
    /// new engine in place but not ready.
    pub async fn show(&mut self, asset: Option<&AudioAsset>) -> Result<(), WaveformError> {
        if self.disposed {
            return Err(WaveformError::Disposed);
        }

        let next = asset.map(|a| a.locator().clone());
        if next == self.locator {
            return Ok(());
        }

        self.destroy_engine();
        self.locator = next;

        let Some(locator) = self.locator.clone() else {
            return Ok(());
        };

        let mut engine = self.factory.create();
        let result = engine.load(&locator).await;
        self.engine = Some(engine);

        if let Err(e) = &result {
            tracing::warn!(
                title = %self.title,
                locator = %locator,
                error = %e,
                "Waveform load failed"
            );
        }
        result
    }

    /// Toggle playback
    ///
    /// No-op (returns `None`) without an asset or before the audio loaded.
    pub fn play_pause(&mut self) -> Option<PlaybackState> {
        let engine = self.engine.as_mut().filter(|e| e.is_ready())?;
        Some(engine.play_pause())
    }

    pub fn playback(&self) -> PlaybackState {
        self.engine
            .as_ref()
            .map(|e| e.playback())
            .unwrap_or_default()
    }

    pub fn is_ready(&self) -> bool {
        self.engine.as_ref().map(|e| e.is_ready()).unwrap_or(false)
    }

    /// Text rendering of the waveform, once loaded
    pub fn render(&self) -> Option<String> {
        let peaks = self.engine.as_ref()?.peaks()?;
        Some(render_bars(
            peaks,
            rows_for_height(self.settings.height),
            self.settings.bar_width,
            self.settings.bar_gap,
        ))
    }

    /// Destroy the engine; further `show` calls fail
    pub fn dispose(&mut self) {
        if self.disposed {
            tracing::warn!(title = %self.title, "WaveformPresenter disposed twice");
            return;
        }
        self.destroy_engine();
        self.locator = None;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn destroy_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
    }
}

impl Drop for WaveformPresenter {
    fn drop(&mut self) {
        if !self.disposed {
            tracing::warn!(title = %self.title, "WaveformPresenter dropped without dispose");
            self.destroy_engine();
        }
    }
}
