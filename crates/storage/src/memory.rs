//! In-memory content-addressed blob store
//!
//! Objects live in an `FxHashMap` keyed by their SHA-256 digest behind a
//! `parking_lot::RwLock`. Reads clone an `Arc<[u8]>`, so handing out a
//! stored blob is a pointer copy regardless of its size.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use loupe_core::{BlobRef, BlobStore, Error, Result, DEFAULT_MAX_BLOB_SIZE};

use crate::content::content_address;

/// Write-once blob store held in memory
pub struct MemoryBlobStore {
    objects: RwLock<FxHashMap<BlobRef, Arc<[u8]>>>,
    max_blob_size: usize,
    bytes_stored: AtomicU64,
}

impl MemoryBlobStore {
    /// Create a store with the default size limit
    pub fn new() -> Self {
        Self::with_max_blob_size(DEFAULT_MAX_BLOB_SIZE)
    }

    /// Create a store with a custom size limit
    pub fn with_max_blob_size(max_blob_size: usize) -> Self {
        MemoryBlobStore {
            objects: RwLock::new(FxHashMap::default()),
            max_blob_size,
            bytes_stored: AtomicU64::new(0),
        }
    }

    /// Total payload bytes held, counting each distinct object once
    pub fn bytes_stored(&self) -> u64 {
        self.bytes_stored.load(Ordering::Relaxed)
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryBlobStore {
    fn write(&self, bytes: &[u8]) -> Result<BlobRef> {
        if bytes.len() > self.max_blob_size {
            return Err(Error::BlobTooLarge {
                size: bytes.len(),
                max: self.max_blob_size,
            });
        }

        let blob = content_address(bytes);
        let mut objects = self.objects.write();
        if objects.contains_key(&blob) {
            debug!(target: "loupe::blob", %blob, "Blob already stored");
            return Ok(blob);
        }
        objects.insert(blob, Arc::from(bytes));
        self.bytes_stored
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        debug!(target: "loupe::blob", %blob, size = bytes.len(), "Blob written");
        Ok(blob)
    }

    fn read(&self, blob: &BlobRef) -> Result<Arc<[u8]>> {
        self.objects
            .read()
            .get(blob)
            .cloned()
            .ok_or(Error::BlobNotFound(*blob))
    }

    fn contains(&self, blob: &BlobRef) -> bool {
        self.objects.read().contains_key(blob)
    }

    fn max_blob_size(&self) -> usize {
        self.max_blob_size
    }

    fn object_count(&self) -> usize {
        self.objects.read().len()
    }
}

impl std::fmt::Debug for MemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlobStore")
            .field("object_count", &self.object_count())
            .field("bytes_stored", &self.bytes_stored())
            .field("max_blob_size", &self.max_blob_size)
            .finish()
    }
}
