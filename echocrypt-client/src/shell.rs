//! Composition root
//!
//! Wires configuration, the API client, the workflow and one waveform
//! presenter per asset slot, and renders the whole page as text.

use crate::api::WatermarkApi;
use crate::assets::BlobStore;
use crate::waveform::{PeakEngineFactory, WaveformPresenter};
use crate::workflow::{EmbedOutcome, WatermarkWorkflow, WorkflowPhase, WorkflowSnapshot};
use echocrypt_common::{AssetSlot, ClientConfig, EventBus, WorkflowEvent, WorkflowMode};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Terminal columns available to a waveform
pub const WAVEFORM_COLUMNS: u32 = 72;

const EVENT_CAPACITY: usize = 256;
const CIPHERTEXT_PREVIEW_CHARS: usize = 10;

pub struct Shell {
    api: Arc<dyn WatermarkApi>,
    store: Arc<BlobStore>,
    workflow: WatermarkWorkflow,
    events: broadcast::Receiver<WorkflowEvent>,
    original_view: WaveformPresenter,
    processed_view: WaveformPresenter,
}

impl Shell {
    pub fn new(config: ClientConfig, api: Arc<dyn WatermarkApi>) -> Self {
        let store = Arc::new(BlobStore::new());
        let events = EventBus::new(EVENT_CAPACITY);
        let settings = config.waveform;

        let factory = Arc::new(PeakEngineFactory::new(
            Arc::clone(&store),
            Arc::clone(&api),
            settings,
            WAVEFORM_COLUMNS,
        ));

        let workflow =
            WatermarkWorkflow::new(config, Arc::clone(&api), Arc::clone(&store), events);
        let events = workflow.subscribe();

        Self {
            api,
            store,
            workflow,
            events,
            original_view: WaveformPresenter::new(
                AssetSlot::Original.label(),
                factory.clone(),
                settings,
            ),
            processed_view: WaveformPresenter::new(AssetSlot::Processed.label(), factory, settings),
        }
    }

    pub fn workflow(&self) -> &WatermarkWorkflow {
        &self.workflow
    }

    pub fn api(&self) -> &Arc<dyn WatermarkApi> {
        &self.api
    }

    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    pub fn view(&self, slot: AssetSlot) -> &WaveformPresenter {
        match slot {
            AssetSlot::Original => &self.original_view,
            AssetSlot::Processed => &self.processed_view,
        }
    }

    pub fn view_mut(&mut self, slot: AssetSlot) -> &mut WaveformPresenter {
        match slot {
            AssetSlot::Original => &mut self.original_view,
            AssetSlot::Processed => &mut self.processed_view,
        }
    }

    /// Point each presenter at the asset currently in its slot
    ///
    /// Load failures are logged; the presenter stays without a waveform.
    pub async fn sync_views(&mut self) {
        for slot in AssetSlot::ALL {
            let asset = self.workflow.asset(slot).await;
            if let Err(e) = self.view_mut(slot).show(asset.as_ref()).await {
                tracing::warn!(slot = %slot, error = %e, "Waveform unavailable");
            }
        }
    }

    /// Drain pending workflow events, re-syncing the presenters if any asset
    /// changed
    ///
    /// A lagged receiver re-syncs unconditionally. Returns the number of
    /// events consumed.
    pub async fn pump_events(&mut self) -> usize {
        let mut consumed = 0;
        let mut resync = false;

        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    consumed += 1;
                    if matches!(event, WorkflowEvent::AssetChanged { .. }) {
                        resync = true;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Shell event receiver lagged");
                    resync = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if resync {
            self.sync_views().await;
        }
        consumed
    }

    /// Render the current state as text
    pub async fn render(&self) -> String {
        let snapshot = self.workflow.snapshot().await;
        let mut out = String::new();

        let _ = writeln!(out, "EchoCrypt");
        let _ = writeln!(out, "Secure Audio Watermarking with Multi-Layer Encryption");
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", render_tabs(snapshot.mode));
        render_form(&mut out, &snapshot);

        if let Some(err) = snapshot.error() {
            let _ = writeln!(out, "Error: {}", err.message);
        }

        match snapshot.mode {
            WorkflowMode::Embed => {
                if let Some(outcome) = snapshot.embed_outcome() {
                    let _ = writeln!(out);
                    out.push_str(&format_embed_outcome(outcome));
                    self.render_view(&mut out, AssetSlot::Processed);
                    self.render_view(&mut out, AssetSlot::Original);
                }
            }
            WorkflowMode::Extract => {
                if let Some(outcome) = snapshot.extract_outcome() {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "Extraction Result");
                    let _ = writeln!(out, "  Decrypted Message: {}", outcome.decrypted_message);
                }
            }
        }

        out
    }

    fn render_view(&self, out: &mut String, slot: AssetSlot) {
        let view = self.view(slot);
        if view.locator().is_none() {
            return;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", view.title());
        match view.render() {
            Some(bars) => {
                let _ = writeln!(out, "{}", bars);
            }
            None => {
                let _ = writeln!(out, "(waveform unavailable)");
            }
        }
    }

    /// Dispose both presenters, then tear the workflow down
    ///
    /// Consumes the shell so teardown runs exactly once. Returns the number
    /// of locators revoked.
    pub async fn shutdown(mut self) -> usize {
        self.original_view.dispose();
        self.processed_view.dispose();
        self.workflow.teardown().await
    }
}

fn render_tabs(mode: WorkflowMode) -> String {
    let (embed, extract) = match mode {
        WorkflowMode::Embed => ("[Embed Watermark]", " Extract Message "),
        WorkflowMode::Extract => (" Embed Watermark ", "[Extract Message]"),
    };
    format!("{} | {}", embed, extract)
}

fn render_form(out: &mut String, snapshot: &WorkflowSnapshot) {
    let params = &snapshot.parameters;

    match &params.source_file {
        Some(file) => {
            let _ = writeln!(out, "Audio File (WAV): {} ({} bytes)", file.name(), file.size());
        }
        None => {
            let _ = writeln!(out, "Audio File (WAV): none selected");
        }
    }
    let _ = writeln!(out, "Playfair Key (Keyword): {}", params.cipher_keyword);
    let _ = writeln!(out, "Rail Fence Key (Depth): {}", params.transposition_depth);

    let mut bits_line = format!("Bit Depth (LSB): {}", bit_label(params.bit_depth));
    if snapshot.mode == WorkflowMode::Embed {
        if let Some(suggested) = snapshot.suggested_bit_depth {
            let _ = write!(bits_line, " (Recommended: {})", suggested);
        }
    }
    let _ = writeln!(out, "{}", bits_line);

    if snapshot.mode == WorkflowMode::Embed {
        let _ = writeln!(out, "Secret Message: {}", params.secret_message);
    }

    if snapshot.phase == WorkflowPhase::Loading {
        let _ = writeln!(out, "Processing...");
    }
}

fn bit_label(bits: u8) -> String {
    if bits > 1 {
        format!("{} bits", bits)
    } else {
        format!("{} bit", bits)
    }
}

/// First characters of a ciphertext followed by an ellipsis
pub fn ciphertext_preview(cipher_text: &str) -> String {
    let head: String = cipher_text.chars().take(CIPHERTEXT_PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// Metric card for a successful embed
pub fn format_embed_outcome(outcome: &EmbedOutcome) -> String {
    format!(
        "Embedding Successful\n  \
         Signal-to-Noise Ratio: {:.2} dB\n  \
         Bits Embedded: {}\n  \
         Ciphertext Preview: {}\n",
        outcome.signal_to_noise_ratio_db,
        outcome.bits_embedded,
        ciphertext_preview(&outcome.cipher_text)
    )
}
