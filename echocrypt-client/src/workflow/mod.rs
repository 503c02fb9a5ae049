//! Watermark workflow orchestrator
//!
//! State progression:
//! IDLE → (select_file) → READY → (submit) → LOADING → RESOLVED | FAILED
//!
//! From RESOLVED or FAILED, `select_file` or `set_mode` returns to READY.
//! There is no terminal state; the workflow is reusable until torn down.
//!
//! Embed runs two phases, upload then embed. Extract sends the raw file in a
//! single request. Only one submit may be in flight at a time.

mod error;
mod state;

pub use error::WorkflowError;
pub use state::{
    EmbedOutcome, ExtractOutcome, ParameterField, RequestError, Resolution, SubmitStatus,
    WatermarkParameters, WorkflowPhase, WorkflowSnapshot, DEFAULT_BIT_DEPTH,
    DEFAULT_TRANSPOSITION_DEPTH, MAX_BIT_DEPTH,
};

use crate::api::{ApiError, EmbedRequest, ExtractRequest, WatermarkApi};
use crate::assets::{AssetSource, AudioAsset, AudioFile, BlobStore};
use crate::services::SuggestionClient;
use chrono::Utc;
use echocrypt_common::{
    AssetSlot, ClientConfig, EventBus, RequestPhase, WorkflowEvent, WorkflowMode,
};
use state::{PendingSubmit, WorkflowState};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

const EXTRACT_FAILED_MESSAGE: &str = "Extraction failed";
const INACTIVE_MESSAGE: &str = "Workflow is no longer active";

struct WorkflowInner {
    config: ClientConfig,
    api: Arc<dyn WatermarkApi>,
    suggestions: SuggestionClient,
    events: EventBus,
    state: Mutex<WorkflowState>,
}

/// Handle to the workflow; clones share the same state
#[derive(Clone)]
pub struct WatermarkWorkflow {
    inner: Arc<WorkflowInner>,
}

impl WatermarkWorkflow {
    pub fn new(
        config: ClientConfig,
        api: Arc<dyn WatermarkApi>,
        store: Arc<BlobStore>,
        events: EventBus,
    ) -> Self {
        let suggestions = SuggestionClient::new(Arc::clone(&api));
        Self {
            inner: Arc::new(WorkflowInner {
                config,
                api,
                suggestions,
                events,
                state: Mutex::new(WorkflowState::new(store)),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.inner.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    pub async fn phase(&self) -> WorkflowPhase {
        self.inner.state.lock().await.phase()
    }

    pub async fn asset(&self, slot: AssetSlot) -> Option<AudioAsset> {
        self.inner.state.lock().await.assets.asset(slot).cloned()
    }

    fn emit(&self, event: WorkflowEvent) {
        self.inner.events.emit_lossy(event);
    }

    /// Select a new source file
    ///
    /// Replaces the original asset (revoking the previous locator), clears
    /// outcomes and the processed asset, and starts a suggestion request for
    /// the file size. The returned handle completes when the suggestion has
    /// been applied or dropped; awaiting it is optional.
    pub async fn select_file(&self, file: AudioFile) -> Result<JoinHandle<()>, WorkflowError> {
        let (generation, original, processed_cleared) = {
            let mut st = self.inner.state.lock().await;
            if st.torn_down {
                return Err(WorkflowError::Validation(INACTIVE_MESSAGE.to_string()));
            }

            st.generation += 1;
            st.params.source_file = Some(file.clone());
            st.suggested_bit_depth = None;
            st.resolution = None;
            let processed_cleared = st.assets.clear(AssetSlot::Processed);
            let original = st
                .assets
                .set_asset(AssetSlot::Original, AssetSource::Local(file.clone()));
            (st.generation, original, processed_cleared)
        };

        tracing::info!(
            file_name = %file.name(),
            file_size = file.size(),
            generation,
            "File selected"
        );

        self.emit(WorkflowEvent::FileSelected {
            file_name: file.name().to_string(),
            size_bytes: file.size(),
            generation,
            timestamp: Utc::now(),
        });
        self.emit(WorkflowEvent::AssetChanged {
            slot: AssetSlot::Original,
            locator: Some(original.locator().to_string()),
            timestamp: Utc::now(),
        });
        self.emit_processed_cleared(processed_cleared);

        let workflow = self.clone();
        let size_bytes = file.size();
        Ok(tokio::spawn(async move {
            workflow.apply_suggestion(generation, size_bytes).await;
        }))
    }

    /// Fetch a suggestion and store it if the file is still current
    ///
    /// Never touches `bit_depth`; failures are logged only.
    async fn apply_suggestion(&self, generation: u64, size_bytes: u64) {
        let bits = match self.inner.suggestions.fetch(size_bytes).await {
            Ok(bits) => bits,
            Err(e) => {
                tracing::warn!(generation, error = %e, "Bit depth suggestion unavailable");
                return;
            }
        };

        let mut st = self.inner.state.lock().await;
        if st.torn_down || st.generation != generation {
            let current_generation = st.generation;
            drop(st);
            tracing::debug!(generation, current_generation, "Dropping stale suggestion");
            self.emit(WorkflowEvent::StaleResultDiscarded {
                request: "suggestion".to_string(),
                generation,
                current_generation,
                timestamp: Utc::now(),
            });
            return;
        }

        st.suggested_bit_depth = Some(bits);
        drop(st);

        tracing::info!(generation, recommended_bits = bits, "Bit depth suggestion stored");
        self.emit(WorkflowEvent::SuggestionReceived {
            recommended_bits: bits,
            generation,
            timestamp: Utc::now(),
        });
    }

    /// Copy the stored suggestion into `bit_depth` (explicit user action)
    pub async fn accept_suggestion(&self) -> Option<u8> {
        let mut st = self.inner.state.lock().await;
        let bits = st.suggested_bit_depth?;
        st.params.bit_depth = bits;
        Some(bits)
    }

    /// Switch between Embed and Extract
    ///
    /// Clears outcomes, errors and the processed asset; parameters are kept.
    /// Switching to the current mode, or switching after teardown, does
    /// nothing.
    pub async fn set_mode(&self, mode: WorkflowMode) {
        let (old_mode, processed_cleared) = {
            let mut st = self.inner.state.lock().await;
            if st.torn_down {
                tracing::warn!(mode = %mode, "Mode change ignored, workflow torn down");
                return;
            }
            if st.mode == mode {
                return;
            }
            let old_mode = st.mode;
            st.mode = mode;
            st.resolution = None;
            (old_mode, st.assets.clear(AssetSlot::Processed))
        };

        tracing::info!(old_mode = %old_mode, new_mode = %mode, "Mode changed");
        self.emit(WorkflowEvent::ModeChanged {
            old_mode,
            new_mode: mode,
            timestamp: Utc::now(),
        });
        self.emit_processed_cleared(processed_cleared);
    }

    /// Update one form field from its text input
    ///
    /// Numeric fields must parse as integers; bit depth must also be one of
    /// the selectable values 1..=8. Cross-field checks happen on submit.
    pub async fn update_parameter(
        &self,
        field: ParameterField,
        value: &str,
    ) -> Result<(), WorkflowError> {
        let mut st = self.inner.state.lock().await;
        if st.torn_down {
            return Err(WorkflowError::Validation(INACTIVE_MESSAGE.to_string()));
        }
        match field {
            ParameterField::SecretMessage => st.params.secret_message = value.to_string(),
            ParameterField::CipherKeyword => st.params.cipher_keyword = value.to_string(),
            ParameterField::TranspositionDepth => {
                st.params.transposition_depth = value.trim().parse::<i64>().map_err(|_| {
                    WorkflowError::Validation(format!("{} must be an integer", field))
                })?;
            }
            ParameterField::BitDepth => {
                let bits = value
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|b| (1..=MAX_BIT_DEPTH).contains(b))
                    .ok_or_else(|| {
                        WorkflowError::Validation(format!(
                            "{} must be an integer between 1 and {}",
                            field, MAX_BIT_DEPTH
                        ))
                    })?;
                st.params.bit_depth = bits;
            }
        }
        tracing::trace!(field = %field, "Parameter updated");
        Ok(())
    }

    /// Run the request sequence for the current mode
    ///
    /// Returns `AlreadyInFlight` without doing anything while another submit
    /// is loading. Validation failures are stored and returned before any
    /// request is sent. A result whose file or mode changed while in flight
    /// is dropped and reported as `Superseded`.
    pub async fn submit(&self) -> Result<SubmitStatus, WorkflowError> {
        let (pending, processed_cleared) = {
            let mut st = self.inner.state.lock().await;
            if st.loading {
                tracing::debug!("Submit ignored, request already in flight");
                return Ok(SubmitStatus::AlreadyInFlight);
            }

            // The processed asset lives exactly as long as the embed outcome
            let processed_cleared = st.assets.clear(AssetSlot::Processed);

            match st.validate() {
                Ok(pending) => {
                    st.loading = true;
                    st.resolution = None;
                    (pending, processed_cleared)
                }
                Err(e) => {
                    st.resolution = Some(Resolution::Failed(RequestError::from(&e)));
                    drop(st);
                    tracing::info!(error = %e, "Submit blocked by validation");
                    self.emit_processed_cleared(processed_cleared);
                    self.emit_failure(&e);
                    return Err(e);
                }
            }
        };
        self.emit_processed_cleared(processed_cleared);

        tracing::info!(
            mode = %pending.mode,
            generation = pending.generation,
            file_name = %pending.file.name(),
            "Submit started"
        );
        self.emit(WorkflowEvent::SubmitStarted {
            mode: pending.mode,
            generation: pending.generation,
            timestamp: Utc::now(),
        });

        let result = match pending.mode {
            WorkflowMode::Embed => self.run_embed(&pending).await.map(Resolution::Embedded),
            WorkflowMode::Extract => self.run_extract(&pending).await.map(Resolution::Extracted),
        };

        self.resolve(&pending, result).await
    }

    /// Store the result of a finished request sequence
    async fn resolve(
        &self,
        pending: &PendingSubmit,
        result: Result<Resolution, WorkflowError>,
    ) -> Result<SubmitStatus, WorkflowError> {
        let mut st = self.inner.state.lock().await;
        st.loading = false;

        if st.torn_down || st.generation != pending.generation || st.mode != pending.mode {
            let current_generation = st.generation;
            drop(st);
            tracing::info!(
                mode = %pending.mode,
                generation = pending.generation,
                current_generation,
                "Dropping superseded submit result"
            );
            self.emit(WorkflowEvent::StaleResultDiscarded {
                request: pending.mode.to_string(),
                generation: pending.generation,
                current_generation,
                timestamp: Utc::now(),
            });
            return Ok(SubmitStatus::Superseded);
        }

        match result {
            Ok(resolution) => {
                let processed = match &resolution {
                    Resolution::Embedded(outcome) => {
                        let url = self.inner.config.download_url(&outcome.output_asset_id);
                        Some(
                            st.assets
                                .set_asset(AssetSlot::Processed, AssetSource::Remote(url)),
                        )
                    }
                    _ => None,
                };
                st.resolution = Some(resolution);
                drop(st);

                if let Some(asset) = processed {
                    self.emit(WorkflowEvent::AssetChanged {
                        slot: AssetSlot::Processed,
                        locator: Some(asset.locator().to_string()),
                        timestamp: Utc::now(),
                    });
                }
                tracing::info!(mode = %pending.mode, "Submit resolved");
                self.emit(WorkflowEvent::SubmitResolved {
                    mode: pending.mode,
                    timestamp: Utc::now(),
                });
                Ok(SubmitStatus::Completed)
            }
            Err(e) => {
                st.resolution = Some(Resolution::Failed(RequestError::from(&e)));
                drop(st);

                tracing::warn!(
                    mode = %pending.mode,
                    kind = ?e.kind(),
                    phase = ?e.phase(),
                    error = %e,
                    "Submit failed"
                );
                self.emit_failure(&e);
                Err(e)
            }
        }
    }

    fn emit_processed_cleared(&self, cleared: bool) {
        if cleared {
            self.emit(WorkflowEvent::AssetChanged {
                slot: AssetSlot::Processed,
                locator: None,
                timestamp: Utc::now(),
            });
        }
    }

    fn emit_failure(&self, err: &WorkflowError) {
        self.emit(WorkflowEvent::SubmitFailed {
            kind: err.kind(),
            message: err.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Upload phase, then embed phase
    async fn run_embed(&self, pending: &PendingSubmit) -> Result<EmbedOutcome, WorkflowError> {
        let upload = self
            .inner
            .api
            .upload(&pending.file)
            .await
            .map_err(|e| WorkflowError::from_api(RequestPhase::Upload, e))?;

        tracing::debug!(file_id = %upload.file_id, "Upload phase complete");
        self.emit(WorkflowEvent::UploadCompleted {
            file_id: upload.file_id.clone(),
            timestamp: Utc::now(),
        });

        let request = EmbedRequest {
            file_id: upload.file_id,
            message: pending.secret_message.clone(),
            cipher_keyword: pending.cipher_keyword.clone(),
            transposition_depth: pending.transposition_depth,
            bit_depth: pending.bit_depth,
        };

        let response = self
            .inner
            .api
            .embed(&request)
            .await
            .map_err(|e| WorkflowError::from_api(RequestPhase::Embed, e))?;

        Ok(EmbedOutcome::from(response))
    }

    /// Single extract request with the raw file
    async fn run_extract(&self, pending: &PendingSubmit) -> Result<ExtractOutcome, WorkflowError> {
        let request = ExtractRequest {
            file: pending.file.clone(),
            cipher_keyword: pending.cipher_keyword.clone(),
            transposition_depth: pending.transposition_depth,
            bit_depth: pending.bit_depth,
        };

        let response = self
            .inner
            .api
            .extract(&request)
            .await
            .map_err(|e| WorkflowError::from_api(RequestPhase::Extract, e))?;

        if !response.success {
            return Err(WorkflowError::LogicalFailure(
                response
                    .error
                    .unwrap_or_else(|| EXTRACT_FAILED_MESSAGE.to_string()),
            ));
        }

        let Some(decrypted_message) = response.decrypted_message else {
            return Err(WorkflowError::from_api(
                RequestPhase::Extract,
                ApiError::Parse("successful extract without decrypted_message".to_string()),
            ));
        };

        Ok(ExtractOutcome {
            success: true,
            decrypted_message,
            extracted_ciphertext: response.extracted_ciphertext,
        })
    }

    /// Release every locator; call once when the workflow is no longer shown
    ///
    /// Later calls do nothing. Returns the number of locators revoked.
    pub async fn teardown(&self) -> usize {
        let revoked = {
            let mut st = self.inner.state.lock().await;
            if st.torn_down {
                tracing::warn!("Workflow teardown called more than once");
                return 0;
            }
            st.torn_down = true;
            st.assets.teardown_all()
        };

        tracing::info!(revoked, "Workflow torn down");
        self.emit(WorkflowEvent::TornDown {
            timestamp: Utc::now(),
        });
        revoked
    }
}
