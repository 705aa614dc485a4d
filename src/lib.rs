//! Loupe - selector registry with content-addressed snapshot caching
//!
//! Loupe routes 4-byte selectors to handler references, enumerates the
//! registry with one of four interchangeable strategies, and caches those
//! enumerations per category as immutable, content-addressed snapshots.
//!
//! # Quick Start
//!
//! ```
//! use loupe::{CategoryId, HandlerGroup, HandlerRef, Loupe, Selector};
//!
//! let mut loupe = Loupe::new();
//! let selectors = [Selector::from_u32(1), Selector::from_u32(2)];
//! loupe.add(&[HandlerGroup::new(HandlerRef::from_low_u64(7), &selectors)])?;
//!
//! // Reads enumerate the live registry until the cache is enabled
//! loupe.enable_cache(CategoryId::DEFAULT)?;
//! let snapshot = loupe.read(CategoryId::DEFAULT)?;
//! assert_eq!(snapshot.selector_count(), 2);
//! # Ok::<(), loupe::Error>(())
//! ```
//!
//! # Architecture
//!
//! All functionality lives in the workspace crates; this package
//! re-exports the public API of `loupe-engine`.

pub use loupe_engine::*;
