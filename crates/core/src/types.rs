//! Core types for Loupe
//!
//! This module defines the foundational types:
//! - Selector: 4-byte operation identifier routed to a handler
//! - HandlerRef: 20-byte address-like reference to the code servicing a selector
//! - CategoryId: caller-assigned partition key for snapshot caching
//! - BlobRef: content address of an immutable stored payload
//! - Entry: one registry row as seen by readers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::limits::{BLOB_REF_WIDTH, HANDLER_WIDTH, SELECTOR_WIDTH};

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    for b in bytes {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

/// Operation identifier
///
/// A fixed 4-byte value. Unique within a registry at any point in time,
/// but may be reassigned to another handler after removal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Selector(pub [u8; SELECTOR_WIDTH]);

impl Selector {
    /// Create a selector from raw bytes
    pub const fn new(bytes: [u8; SELECTOR_WIDTH]) -> Self {
        Selector(bytes)
    }

    /// Create a selector from its big-endian integer form
    pub const fn from_u32(value: u32) -> Self {
        Selector(value.to_be_bytes())
    }

    /// Big-endian integer form
    pub const fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; SELECTOR_WIDTH] {
        &self.0
    }

    /// Read a selector from the start of a slice
    ///
    /// Returns None if fewer than 4 bytes are available.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; SELECTOR_WIDTH] = bytes.get(..SELECTOR_WIDTH)?.try_into().ok()?;
        Some(Selector(raw))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({})", self)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl From<u32> for Selector {
    fn from(value: u32) -> Self {
        Selector::from_u32(value)
    }
}

/// Handler reference
///
/// An opaque address-sized value identifying the code that services
/// a selector. The low byte (last byte, big-endian) is what the
/// hash-based enumeration strategies key on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerRef(pub [u8; HANDLER_WIDTH]);

impl HandlerRef {
    /// The all-zero handler reference
    pub const ZERO: HandlerRef = HandlerRef([0u8; HANDLER_WIDTH]);

    /// Create a handler reference from raw bytes
    pub const fn new(bytes: [u8; HANDLER_WIDTH]) -> Self {
        HandlerRef(bytes)
    }

    /// Create a handler reference whose low 8 bytes hold `value` (big-endian)
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; HANDLER_WIDTH];
        bytes[HANDLER_WIDTH - 8..].copy_from_slice(&value.to_be_bytes());
        HandlerRef(bytes)
    }

    /// Least significant byte
    #[inline]
    pub const fn low_byte(&self) -> u8 {
        self.0[HANDLER_WIDTH - 1]
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; HANDLER_WIDTH] {
        &self.0
    }

    /// Read a handler reference from the start of a slice
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; HANDLER_WIDTH] = bytes.get(..HANDLER_WIDTH)?.try_into().ok()?;
        Some(HandlerRef(raw))
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerRef({})", self)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

/// Caller-assigned partition key
///
/// Entries sharing a category are enumerated and cached together.
/// Keeping categories small keeps each snapshot under the blob size limit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CategoryId(pub u32);

impl CategoryId {
    /// The category entries land in when the caller does not choose one
    pub const DEFAULT: CategoryId = CategoryId(0);
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category:{}", self.0)
    }
}

impl From<u32> for CategoryId {
    fn from(value: u32) -> Self {
        CategoryId(value)
    }
}

/// Content address of an immutable blob
///
/// The SHA-256 digest of the exact bytes written. Two writes of the
/// same bytes produce the same reference.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobRef(pub [u8; BLOB_REF_WIDTH]);

impl BlobRef {
    /// Raw digest bytes
    pub const fn as_bytes(&self) -> &[u8; BLOB_REF_WIDTH] {
        &self.0
    }

    /// Lowercase hex form of the digest, without prefix
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(BLOB_REF_WIDTH * 2);
        for b in &self.0 {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }

    /// Parse the hex form produced by [`BlobRef::to_hex`]
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != BLOB_REF_WIDTH * 2 {
            return None;
        }
        let mut bytes = [0u8; BLOB_REF_WIDTH];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(BlobRef(bytes))
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({})", self)
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

/// A registry row as exposed to readers
///
/// `position` is the entry's index in the registry's iteration sequence
/// at the time it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Operation identifier
    pub selector: Selector,
    /// Handler servicing the selector
    pub handler: HandlerRef,
    /// Partition the entry is cached under
    pub category: CategoryId,
    /// Position in iteration order
    pub position: u32,
}
