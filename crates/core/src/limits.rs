//! Fixed widths and size limits
//!
//! Every on-wire record in a snapshot is built from these widths, so
//! they are part of the format and must not change without a version bump.

/// Width of an operation identifier in bytes
pub const SELECTOR_WIDTH: usize = 4;

/// Width of a handler reference in bytes
pub const HANDLER_WIDTH: usize = 20;

/// Width of a blob reference (SHA-256 digest) in bytes
pub const BLOB_REF_WIDTH: usize = 32;

/// Shift used to index packed selector arrays (`index << 2 == index * 4`)
pub const SELECTOR_SHIFT: u32 = 2;

/// Default maximum size of a single stored blob (24 KiB)
///
/// Categories whose snapshot exceeds this must be split by the caller.
pub const DEFAULT_MAX_BLOB_SIZE: usize = 24_576;

/// Number of handler slots in one bucket of the bucket-chained strategy
pub const BUCKET_DEPTH: usize = 5;
