//! Per-category snapshot cache
//!
//! Each category is either Disabled (the default) or Enabled with a
//! current snapshot blob.
//!
//! - Disabled: every read enumerates the live registry. Never stale.
//! - Enabled: reads decode the current snapshot from the blob store.
//!   `rebuild` re-enumerates, writes a new blob and swaps the reference.
//!
//! There is no automatic invalidation. A registry mutation does not touch
//! the cache; an Enabled category keeps serving the snapshot of its last
//! rebuild until the caller rebuilds again. Reads never fall back to the
//! live registry to hide this.
//!
//! The current reference per category is one `DashMap` slot, so a reader
//! sees either the old blob or the new one, never a mix. Superseded blobs
//! stay in the store, unreferenced.

use std::sync::Arc;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use tracing::{info, warn};

use loupe_core::{
    BlobRef, BlobStore, CategoryId, Error, HandlerRef, Result, Selector, SelectorTable,
};
use loupe_storage::format::{encode_handler_list, SnapshotView};

use crate::enumeration::{Enumeration, Strategy};

/// Cache mode of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Reads enumerate the live registry
    Disabled,
    /// Reads decode `blob`
    Enabled {
        /// Snapshot of the last rebuild
        blob: BlobRef,
    },
}

impl CacheState {
    /// Whether the fast path is on
    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheState::Enabled { .. })
    }
}

/// Snapshot cache over a blob store
pub struct SnapshotCache {
    store: Arc<dyn BlobStore>,
    strategy: Strategy,
    current: DashMap<CategoryId, BlobRef>,
}

impl SnapshotCache {
    /// Cache writing snapshots to `store`, enumerating with `strategy`
    pub fn new(store: Arc<dyn BlobStore>, strategy: Strategy) -> Self {
        SnapshotCache {
            store,
            strategy,
            current: DashMap::new(),
        }
    }

    /// Strategy used for rebuilds and Disabled reads
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Backing blob store
    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Mode of `category`
    pub fn state(&self, category: CategoryId) -> CacheState {
        match self.current.get(&category) {
            Some(blob) => CacheState::Enabled { blob: *blob },
            None => CacheState::Disabled,
        }
    }

    /// Categories in Enabled mode, ascending
    pub fn enabled_categories(&self) -> Vec<CategoryId> {
        let mut categories: Vec<CategoryId> = self.current.iter().map(|e| *e.key()).collect();
        categories.sort_unstable();
        categories
    }

    /// Switch `category` to Enabled, building its first snapshot
    ///
    /// # Errors
    ///
    /// `CacheAlreadyEnabled` if the category is already Enabled,
    /// `NoEntriesForCategory` if it has no entries. On error the category
    /// stays Disabled.
    pub fn enable_cache(&self, table: &dyn SelectorTable, category: CategoryId) -> Result<BlobRef> {
        match self.current.entry(category) {
            MapEntry::Occupied(_) => Err(Error::CacheAlreadyEnabled(category)),
            MapEntry::Vacant(slot) => {
                let blob = self.build(table, category)?;
                slot.insert(blob);
                info!(target: "loupe::cache", %category, %blob, "Cache enabled");
                Ok(blob)
            }
        }
    }

    /// Switch every Disabled category in `categories` to Enabled as one unit
    ///
    /// Already Enabled categories are skipped. All snapshots are built
    /// before any category changes mode, so on error every category keeps
    /// the mode it had before the call. Returns the categories enabled, in
    /// input order.
    ///
    /// # Errors
    ///
    /// `NoEntriesForCategory` or `BlobTooLarge` from the first category
    /// whose snapshot cannot be built.
    pub fn enable_caches(
        &self,
        table: &dyn SelectorTable,
        categories: &[CategoryId],
    ) -> Result<Vec<CategoryId>> {
        let mut built: Vec<(CategoryId, BlobRef)> = Vec::new();
        for &category in categories {
            if self.current.contains_key(&category) || built.iter().any(|(c, _)| *c == category) {
                continue;
            }
            built.push((category, self.build(table, category)?));
        }

        let mut enabled = Vec::with_capacity(built.len());
        for &(category, blob) in &built {
            let inserted = match self.current.entry(category) {
                MapEntry::Vacant(slot) => {
                    slot.insert(blob);
                    true
                }
                MapEntry::Occupied(_) => false,
            };
            if !inserted {
                // enabled concurrently; undo this call's slots
                for done in &enabled {
                    self.current.remove(done);
                }
                return Err(Error::CacheAlreadyEnabled(category));
            }
            enabled.push(category);
        }
        info!(target: "loupe::cache", count = enabled.len(), "Caches enabled");
        Ok(enabled)
    }

    /// Re-enumerate `category` and replace its snapshot
    ///
    /// Rebuilding an unchanged registry writes byte-identical bytes, so
    /// the reference does not change.
    ///
    /// # Errors
    ///
    /// `CacheNotEnabled` for a Disabled category, `NoEntriesForCategory`
    /// if every entry was removed since the last rebuild. On error the
    /// previous snapshot stays current.
    pub fn rebuild(&self, table: &dyn SelectorTable, category: CategoryId) -> Result<BlobRef> {
        if !self.current.contains_key(&category) {
            return Err(Error::CacheNotEnabled(category));
        }
        let blob = self.build(table, category)?;
        let mut slot = self
            .current
            .get_mut(&category)
            .ok_or(Error::CacheNotEnabled(category))?;
        let previous = std::mem::replace(&mut *slot, blob);
        info!(target: "loupe::cache", %category, %blob, changed = previous != blob, "Cache rebuilt");
        Ok(blob)
    }

    fn build(&self, table: &dyn SelectorTable, category: CategoryId) -> Result<BlobRef> {
        let enumeration = self.strategy.enumerate(table, Some(category));
        if enumeration.is_empty() {
            return Err(Error::NoEntriesForCategory(category));
        }
        let bytes = enumeration.encode_snapshot();
        let blob = self.store.write(&bytes)?;
        info!(
            target: "loupe::cache",
            %category,
            handlers = enumeration.handler_count(),
            selectors = enumeration.selector_count(),
            bytes = bytes.len(),
            "Snapshot written"
        );
        Ok(blob)
    }

    /// Run `f` over the decoded snapshot of an Enabled category
    fn with_snapshot<T>(&self, blob: BlobRef, f: impl FnOnce(&SnapshotView<'_>) -> T) -> Result<T> {
        let bytes = self.store.read(&blob)?;
        let view = SnapshotView::parse(&bytes).map_err(|e| {
            warn!(target: "loupe::cache", %blob, error = %e, "Rejected snapshot");
            Error::from(e)
        })?;
        Ok(f(&view))
    }

    fn live(&self, table: &dyn SelectorTable, category: CategoryId) -> Enumeration {
        self.strategy.enumerate(table, Some(category))
    }

    /// Enumeration of `category` in its current mode
    ///
    /// # Errors
    ///
    /// Enabled mode only: `BlobNotFound`, `Corruption` or
    /// `MalformedSnapshot` if the stored snapshot cannot be decoded.
    pub fn read(&self, table: &dyn SelectorTable, category: CategoryId) -> Result<Enumeration> {
        match self.state(category) {
            CacheState::Disabled => Ok(self.live(table, category)),
            CacheState::Enabled { blob } => self.with_snapshot(blob, Enumeration::from_view),
        }
    }

    /// Minimal packed form of `category`: the snapshot payload, no header
    pub fn read_packed(&self, table: &dyn SelectorTable, category: CategoryId) -> Result<Vec<u8>> {
        match self.state(category) {
            CacheState::Disabled => Ok(self.live(table, category).encode_payload()),
            CacheState::Enabled { blob } => self.with_snapshot(blob, |v| v.payload().to_vec()),
        }
    }

    /// Unique handlers of `category` packed back to back, 20 bytes each
    pub fn read_handlers_packed(
        &self,
        table: &dyn SelectorTable,
        category: CategoryId,
    ) -> Result<Vec<u8>> {
        match self.state(category) {
            CacheState::Disabled => Ok(self.live(table, category).encode_handlers()),
            CacheState::Enabled { blob } => {
                self.with_snapshot(blob, |v| encode_handler_list(v.handlers()))
            }
        }
    }

    /// Unique handlers of `category`
    pub fn handlers(&self, table: &dyn SelectorTable, category: CategoryId) -> Result<Vec<HandlerRef>> {
        match self.state(category) {
            CacheState::Disabled => Ok(self.live(table, category).handlers().collect()),
            CacheState::Enabled { blob } => self.with_snapshot(blob, |v| v.handlers().collect()),
        }
    }

    /// Selectors of `handler` within `category`; empty for an unknown handler
    pub fn selectors_of(
        &self,
        table: &dyn SelectorTable,
        category: CategoryId,
        handler: HandlerRef,
    ) -> Result<Vec<Selector>> {
        match self.state(category) {
            CacheState::Disabled => Ok(self
                .live(table, category)
                .selectors_of(handler)
                .map(<[Selector]>::to_vec)
                .unwrap_or_default()),
            CacheState::Enabled { blob } => self.with_snapshot(blob, |v| {
                v.selectors_of(handler)
                    .map(|s| s.to_vec())
                    .unwrap_or_default()
            }),
        }
    }

    /// Handler `selector` routes to, as seen by `category`'s current mode
    pub fn handler_of(
        &self,
        table: &dyn SelectorTable,
        category: CategoryId,
        selector: Selector,
    ) -> Result<Option<HandlerRef>> {
        match self.state(category) {
            CacheState::Disabled => Ok(table
                .get(selector)
                .filter(|e| e.category == category)
                .map(|e| e.handler)),
            CacheState::Enabled { blob } => self.with_snapshot(blob, |v| {
                v.groups()
                    .find(|g| g.selectors.iter().any(|s| s == selector))
                    .map(|g| g.handler)
            }),
        }
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("strategy", &self.strategy)
            .field("enabled_categories", &self.current.len())
            .field("stored_objects", &self.store.object_count())
            .finish()
    }
}
