//! Zero-copy view over packed selector arrays
//!
//! A packed array is a plain byte buffer holding selectors back to back,
//! 4 bytes each, with no length prefix. Callers hand these buffers to the
//! registry and the snapshot decoder exposes them straight out of stored
//! blobs, so the view borrows instead of copying.
//!
//! The length check happens once in [`PackedSelectors::new`]; after that
//! every index below `len()` is in bounds.

use crate::limits::{SELECTOR_SHIFT, SELECTOR_WIDTH};
use crate::types::Selector;

/// Borrowed, bounds-checked view of a packed selector array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedSelectors<'a> {
    bytes: &'a [u8],
}

impl<'a> PackedSelectors<'a> {
    /// Wrap a buffer whose length is a multiple of 4
    ///
    /// Returns None for any other length; the buffer is never truncated.
    pub fn new(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() % SELECTOR_WIDTH != 0 {
            return None;
        }
        Some(PackedSelectors { bytes })
    }

    /// Empty view
    pub const fn empty() -> Self {
        PackedSelectors { bytes: &[] }
    }

    /// Number of selectors in the view
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() >> SELECTOR_SHIFT
    }

    /// Whether the view holds no selectors
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Selector at `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<Selector> {
        if index >= self.len() {
            return None;
        }
        let start = index << SELECTOR_SHIFT;
        let raw = self.bytes.get(start..start + SELECTOR_WIDTH)?;
        Selector::from_slice(raw)
    }

    /// Underlying bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterate selectors in buffer order
    pub fn iter(&self) -> impl Iterator<Item = Selector> + 'a {
        self.bytes
            .chunks_exact(SELECTOR_WIDTH)
            .map(|c| Selector([c[0], c[1], c[2], c[3]]))
    }

    /// Copy the selectors out into an owned vector
    pub fn to_vec(&self) -> Vec<Selector> {
        self.iter().collect()
    }
}

/// Pack selectors into a contiguous buffer
pub fn pack_selectors(selectors: &[Selector]) -> Vec<u8> {
    let mut out = Vec::with_capacity(selectors.len() << SELECTOR_SHIFT);
    for s in selectors {
        out.extend_from_slice(s.as_bytes());
    }
    out
}
