//! # EchoCrypt Common Library
//!
//! Shared code for the EchoCrypt client crates:
//! - Client configuration loading (TOML + environment + CLI overrides)
//! - Event types (WorkflowEvent enum) and the EventBus
//! - Shared workflow vocabulary (modes, asset slots, failure kinds)
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use events::{AssetSlot, EventBus, FailureKind, RequestPhase, WorkflowEvent, WorkflowMode};
