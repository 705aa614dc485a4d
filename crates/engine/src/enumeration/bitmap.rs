use loupe_core::{CategoryId, HandlerRef, SelectorTable};

use super::{scan, Enumeration, EnumerationStrategy, HandlerSelectors};

/// 256-bit presence map over handler low bytes
#[derive(Debug, Clone, Copy, Default)]
struct LowByteMap([u64; 4]);

impl LowByteMap {
    /// Mark `handler` present; returns whether its low byte was already set
    #[inline]
    fn test_and_set(&mut self, handler: HandlerRef) -> bool {
        let byte = handler.low_byte() as usize;
        let word = &mut self.0[byte >> 6];
        let mask = 1u64 << (byte & 63);
        let hit = *word & mask != 0;
        *word |= mask;
        hit
    }
}

/// Low-byte bitmap in front of the linear scan
///
/// A miss in the bitmap proves the handler is new, so the scan is skipped.
/// A hit only means some handler with the same low byte was seen, and
/// falls back to scanning. With many handlers sharing a low byte this
/// degrades to [`Naive`](super::Naive).
#[derive(Debug, Clone, Copy, Default)]
pub struct Bitmap;

impl EnumerationStrategy for Bitmap {
    fn name(&self) -> &'static str {
        "bitmap"
    }

    fn enumerate(&self, table: &dyn SelectorTable, category: Option<CategoryId>) -> Enumeration {
        let mut seen = LowByteMap::default();
        let mut groups: Vec<HandlerSelectors> = Vec::new();

        for entry in scan(table, category) {
            if seen.test_and_set(entry.handler) {
                if let Some(group) = groups.iter_mut().find(|g| g.handler == entry.handler) {
                    group.selectors.push(entry.selector);
                    continue;
                }
            }
            groups.push(HandlerSelectors::new(entry.handler, entry.selector));
        }

        Enumeration::from_groups(groups)
    }
}
