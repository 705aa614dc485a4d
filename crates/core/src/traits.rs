//! Core traits for registry, blob storage and dispatch abstraction
//!
//! These traits are the seams between crates: the enumeration engine and
//! the router read a registry only through [`SelectorTable`], the snapshot
//! cache persists only through [`BlobStore`], and the router calls code
//! only through [`Handler`].

use std::sync::Arc;

use crate::error::Result;
use crate::types::{BlobRef, CategoryId, Entry, HandlerRef, Selector};

/// Read-only view of a selector registry
///
/// Iteration is restartable and reflects live state; it is not a snapshot.
pub trait SelectorTable: Send + Sync {
    /// Handler currently routed for `selector`
    fn lookup(&self, selector: Selector) -> Option<HandlerRef>;

    /// Full entry for `selector`
    fn get(&self, selector: Selector) -> Option<Entry>;

    /// Number of registered selectors
    fn len(&self) -> usize;

    /// Whether the registry holds no selectors
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `selector` is registered
    fn contains(&self, selector: Selector) -> bool {
        self.lookup(selector).is_some()
    }

    /// All entries in iteration order
    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_>;

    /// Entries of one category, in iteration order
    fn category_entries(&self, category: CategoryId) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(self.entries().filter(move |e| e.category == category))
    }
}

/// Write-once, content-addressed object store
///
/// Implementations must never change the bytes behind a reference once
/// it has been returned from `write`.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` and return their content address
    ///
    /// # Errors
    ///
    /// `BlobTooLarge` if the payload exceeds [`BlobStore::max_blob_size`].
    fn write(&self, bytes: &[u8]) -> Result<BlobRef>;

    /// Fetch the exact bytes stored under `blob`
    ///
    /// # Errors
    ///
    /// `BlobNotFound` if nothing was written under the reference.
    fn read(&self, blob: &BlobRef) -> Result<Arc<[u8]>>;

    /// Whether an object exists under `blob`
    fn contains(&self, blob: &BlobRef) -> bool;

    /// Largest payload `write` accepts
    fn max_blob_size(&self) -> usize;

    /// Number of stored objects
    fn object_count(&self) -> usize;
}

/// Code servicing one or more selectors
pub trait Handler: Send + Sync {
    /// Execute `selector` with `payload`
    fn handle(&self, selector: Selector, payload: &[u8]) -> Result<Vec<u8>>;
}

impl<F> Handler for F
where
    F: Fn(Selector, &[u8]) -> Result<Vec<u8>> + Send + Sync,
{
    fn handle(&self, selector: Selector, payload: &[u8]) -> Result<Vec<u8>> {
        self(selector, payload)
    }
}
