//! In-memory store behind locally minted locators

use super::{AssetError, AudioFile, Locator};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Prefix of every locally minted locator
pub const BLOB_SCHEME: &str = "blob:echocrypt/";

#[derive(Default)]
struct StoreInner {
    blobs: HashMap<Locator, Arc<[u8]>>,
    minted: u64,
    revoked: u64,
}

/// Mints, resolves and revokes ephemeral locators
///
/// A locator resolves only between its mint and its revoke. Mint and revoke
/// counters are kept for leak checks.
#[derive(Default)]
pub struct BlobStore {
    inner: Mutex<StoreInner>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a fresh locator for `file`
    pub fn mint(&self, file: &AudioFile) -> Locator {
        let locator = Locator::new(format!("{}{}", BLOB_SCHEME, Uuid::new_v4()));
        let mut inner = self.lock();
        inner.blobs.insert(locator.clone(), file.shared_data());
        inner.minted += 1;

        tracing::debug!(locator = %locator, file_name = %file.name(), "Minted locator");
        locator
    }

    /// Revoke a locator; returns false if it was not live
    pub fn revoke(&self, locator: &Locator) -> bool {
        let mut inner = self.lock();
        if inner.blobs.remove(locator).is_some() {
            inner.revoked += 1;
            tracing::debug!(locator = %locator, "Revoked locator");
            true
        } else {
            tracing::warn!(locator = %locator, "Revoke of unknown or already revoked locator");
            false
        }
    }

    /// Bytes behind a live locator
    pub fn resolve(&self, locator: &Locator) -> Result<Arc<[u8]>, AssetError> {
        self.lock()
            .blobs
            .get(locator)
            .cloned()
            .ok_or_else(|| AssetError::InvalidLocator(locator.to_string()))
    }

    pub fn is_live(&self, locator: &Locator) -> bool {
        self.lock().blobs.contains_key(locator)
    }

    pub fn minted_count(&self) -> u64 {
        self.lock().minted
    }

    pub fn revoked_count(&self) -> u64 {
        self.lock().revoked
    }

    /// Locators minted and not yet revoked
    pub fn live_count(&self) -> usize {
        self.lock().blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_resolve_revoke() {
        let store = BlobStore::new();
        let file = AudioFile::new("a.wav", vec![7, 8, 9]);

        let locator = store.mint(&file);
        assert!(locator.is_local());
        assert_eq!(&*store.resolve(&locator).unwrap(), &[7, 8, 9]);

        assert!(store.revoke(&locator));
        assert!(matches!(
            store.resolve(&locator),
            Err(AssetError::InvalidLocator(_))
        ));
    }

    #[test]
    fn test_double_revoke_is_reported() {
        let store = BlobStore::new();
        let locator = store.mint(&AudioFile::new("a.wav", vec![0]));

        assert!(store.revoke(&locator));
        assert!(!store.revoke(&locator));
        assert_eq!(store.revoked_count(), 1);
    }

    #[test]
    fn test_locators_are_unique() {
        let store = BlobStore::new();
        let file = AudioFile::new("a.wav", vec![0]);

        let first = store.mint(&file);
        let second = store.mint(&file);
        assert_ne!(first, second);
        assert_eq!(store.minted_count(), 2);
        assert_eq!(store.live_count(), 2);
    }
}
