//! Storage layer for Loupe
//!
//! This crate implements the content-addressed blob stores and the
//! snapshot byte format:
//! - MemoryBlobStore: FxHashMap-backed store behind a RwLock
//! - DiskBlobStore: one write-once file per object
//! - content: SHA-256 content addressing
//! - format::snapshot: snapshot header, payload encoding, zero-copy decode
//!
//! Neither store ever mutates or deletes an object once written. A blob
//! reference stays valid, and resolves to the same bytes, for the life
//! of the store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod content;
pub mod disk;
pub mod format;
pub mod memory;

pub use content::content_address;
pub use disk::DiskBlobStore;
pub use format::{SnapshotFormatError, SnapshotView};
pub use memory::MemoryBlobStore;
