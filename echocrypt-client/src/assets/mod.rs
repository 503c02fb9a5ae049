//! Audio assets and their playable locators
//!
//! A locator is either minted locally by the [`BlobStore`] for in-memory
//! audio (valid until revoked) or a remote URL served by the service. Only
//! [`AudioAssetManager`] mints and revokes; everything else just reads.

mod blob_store;
mod manager;

pub use blob_store::{BlobStore, BLOB_SCHEME};
pub use manager::AudioAssetManager;

use echocrypt_common::AssetSlot;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Asset and locator errors
#[derive(Debug, Error)]
pub enum AssetError {
    /// Locator was never minted, or has already been revoked
    #[error("Locator is not valid: {0}")]
    InvalidLocator(String),

    /// File rejected by the WAV filter
    #[error("Unsupported file type: {0} (only WAV files are supported)")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A user-selected audio file held in memory
///
/// Cloning shares the underlying bytes.
#[derive(Clone)]
pub struct AudioFile {
    name: String,
    data: Arc<[u8]>,
}

impl AudioFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: Arc::from(data),
        }
    }

    /// Read a file from disk, accepting only `.wav` files
    pub async fn from_path(path: &Path) -> Result<Self, AssetError> {
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);

        if !is_wav {
            return Err(AssetError::UnsupportedFormat(path.display().to_string()));
        }

        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        Ok(Self::new(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioFile")
            .field("name", &self.name)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Playable reference to audio bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for locators minted by a [`BlobStore`]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(BLOB_SCHEME)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an asset's bytes come from
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// In-memory file; gets a locally minted locator
    Local(AudioFile),
    /// Server-hosted file; the URL is used directly
    Remote(String),
}

/// One occupied asset slot
#[derive(Debug, Clone)]
pub struct AudioAsset {
    slot: AssetSlot,
    label: String,
    source: AssetSource,
    locator: Locator,
}

impl AudioAsset {
    pub fn slot(&self) -> AssetSlot {
        self.slot
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Whether the locator was minted locally and must be revoked
    pub fn is_locally_minted(&self) -> bool {
        matches!(self.source, AssetSource::Local(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_path_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let result = AudioFile::from_path(&path).await;
        assert!(matches!(result, Err(AssetError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_from_path_reads_wav_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Voice.WAV");
        std::fs::write(&path, b"RIFF0000WAVE").unwrap();

        let file = AudioFile::from_path(&path).await.unwrap();
        assert_eq!(file.name(), "Voice.WAV");
        assert_eq!(file.size(), 12);
    }

    #[test]
    fn test_debug_omits_bytes() {
        let file = AudioFile::new("a.wav", vec![1, 2, 3]);
        let debug = format!("{:?}", file);
        assert!(debug.contains("a.wav"));
        assert!(debug.contains("size: 3"));
    }
}
