//! EchoCrypt client library
//!
//! Client side of the audio steganography service: drives the
//! upload → embed and extract request sequences, owns the playable audio
//! locators for the original and watermarked files, and renders their
//! waveforms.
//!
//! Layering, leaf first:
//! - [`assets`]: ephemeral locators and the two asset slots
//! - [`waveform`]: one presenter per asset, each owning a rendering engine
//! - [`services`]: bit-depth suggestion wrapper
//! - [`workflow`]: the orchestrator state machine
//! - [`shell`]: composition root used by the `echocrypt` binary

pub mod api;
pub mod assets;
pub mod services;
pub mod shell;
pub mod waveform;
pub mod workflow;

pub use api::{HttpWatermarkApi, WatermarkApi};
pub use assets::{AudioAsset, AudioAssetManager, AudioFile, BlobStore, Locator};
pub use services::SuggestionClient;
pub use shell::Shell;
pub use waveform::WaveformPresenter;
pub use workflow::{WatermarkWorkflow, WorkflowError};
