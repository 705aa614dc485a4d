//! Enumeration, snapshot caching and dispatch for Loupe
//!
//! This crate sits on top of the registry and storage layers:
//! - enumeration: four interchangeable strategies and the `Enumeration` result
//! - cache: per-category snapshot cache, Disabled or Enabled
//! - router: selector → handler dispatch over the live registry
//! - config: `loupe.toml`
//! - Loupe: facade owning registry, cache and router
//!
//! Reads flow registry → enumeration → cache → caller. Writes go to the
//! registry only; the cache changes when the caller rebuilds it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod enumeration;
pub mod loupe;
pub mod router;

pub use cache::{CacheState, SnapshotCache};
pub use config::{LoupeConfig, CONFIG_FILE_NAME};
pub use enumeration::{
    Bitmap, BucketChained, Enumeration, EnumerationStrategy, HandlerSelectors, Naive, Strategy,
    TwoPass,
};
pub use loupe::Loupe;
pub use router::Router;

pub use loupe_core::{
    BlobRef, BlobStore, CategoryId, Entry, Error, Handler, HandlerRef, PackedSelectors,
    RegistryEvent, Result, Selector, SelectorTable,
};
pub use loupe_registry::{
    HandlerGroup, LinkedRegistry, MutableSelectorTable, SelectorList, SelectorRegistry,
};
pub use loupe_storage::{DiskBlobStore, MemoryBlobStore};
