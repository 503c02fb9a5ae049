//! Request wrappers built on top of [`crate::api::WatermarkApi`]

pub mod suggestion_client;

pub use suggestion_client::SuggestionClient;
