//! Core types and traits for Loupe
//!
//! This crate defines the foundational types used throughout the system:
//! - Selector: 4-byte operation identifier
//! - HandlerRef: address-sized handler reference
//! - CategoryId: partition key for snapshot caching
//! - BlobRef: content address of an immutable blob
//! - Entry / RegistryEvent: registry rows and change notifications
//! - PackedSelectors: zero-copy view over packed selector buffers
//! - Error: Error type hierarchy
//! - Traits: SelectorTable, BlobStore, Handler

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod limits;
pub mod packed;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use event::RegistryEvent;
pub use limits::{
    BLOB_REF_WIDTH, BUCKET_DEPTH, DEFAULT_MAX_BLOB_SIZE, HANDLER_WIDTH, SELECTOR_SHIFT,
    SELECTOR_WIDTH,
};
pub use packed::{pack_selectors, PackedSelectors};
pub use traits::{BlobStore, Handler, SelectorTable};
pub use types::{BlobRef, CategoryId, Entry, HandlerRef, Selector};
