//! Owner of the "original" and "processed" asset slots

use super::{AssetSource, AudioAsset, BlobStore, Locator};
use echocrypt_common::AssetSlot;
use std::sync::Arc;

/// Holds at most one asset per slot and owns their locator lifetimes
///
/// Every locally minted locator is revoked exactly once: when its slot is
/// replaced, when the slot is cleared, or on [`teardown_all`](Self::teardown_all).
pub struct AudioAssetManager {
    store: Arc<BlobStore>,
    original: Option<AudioAsset>,
    processed: Option<AudioAsset>,
}

impl AudioAssetManager {
    pub fn new(store: Arc<BlobStore>) -> Self {
        Self {
            store,
            original: None,
            processed: None,
        }
    }

    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    fn slot_mut(&mut self, slot: AssetSlot) -> &mut Option<AudioAsset> {
        match slot {
            AssetSlot::Original => &mut self.original,
            AssetSlot::Processed => &mut self.processed,
        }
    }

    pub fn asset(&self, slot: AssetSlot) -> Option<&AudioAsset> {
        match slot {
            AssetSlot::Original => self.original.as_ref(),
            AssetSlot::Processed => self.processed.as_ref(),
        }
    }

    /// Fill `slot` from `source`, revoking whatever it held before
    ///
    /// Local sources get a freshly minted locator; remote URLs are used as-is.
    pub fn set_asset(&mut self, slot: AssetSlot, source: AssetSource) -> AudioAsset {
        self.release(slot);

        let locator = match &source {
            AssetSource::Local(file) => self.store.mint(file),
            AssetSource::Remote(url) => Locator::new(url.clone()),
        };

        let asset = AudioAsset {
            slot,
            label: slot.label().to_string(),
            source,
            locator,
        };

        tracing::debug!(slot = %slot, locator = %asset.locator, "Asset set");
        *self.slot_mut(slot) = Some(asset.clone());
        asset
    }

    /// Revoke and empty `slot`; returns whether it held an asset
    pub fn clear(&mut self, slot: AssetSlot) -> bool {
        self.release(slot)
    }

    /// Revoke every held locator and empty both slots
    ///
    /// Returns the number of locators revoked.
    pub fn teardown_all(&mut self) -> usize {
        let mut revoked = 0;
        for slot in AssetSlot::ALL {
            let held_local = self
                .asset(slot)
                .map(AudioAsset::is_locally_minted)
                .unwrap_or(false);
            if self.release(slot) && held_local {
                revoked += 1;
            }
        }
        tracing::debug!(revoked, "Asset manager torn down");
        revoked
    }

    fn release(&mut self, slot: AssetSlot) -> bool {
        let Some(previous) = self.slot_mut(slot).take() else {
            return false;
        };

        if previous.is_locally_minted() {
            self.store.revoke(&previous.locator);
        }
        true
    }

    fn holds_local(&self) -> bool {
        AssetSlot::ALL
            .iter()
            .filter_map(|slot| self.asset(*slot))
            .any(AudioAsset::is_locally_minted)
    }
}

impl Drop for AudioAssetManager {
    fn drop(&mut self) {
        if self.holds_local() {
            tracing::warn!("AudioAssetManager dropped without teardown, revoking held locators");
            self.teardown_all();
        }
    }
}
