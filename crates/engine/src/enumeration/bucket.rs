use loupe_core::{CategoryId, HandlerRef, SelectorTable, BUCKET_DEPTH};

use super::{scan, Enumeration, EnumerationStrategy, HandlerSelectors};

/// Fixed-depth bucket of group indices
#[derive(Debug, Clone, Copy)]
struct Bucket {
    slots: [u32; BUCKET_DEPTH],
    len: u8,
    next: Option<u32>,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        slots: [0; BUCKET_DEPTH],
        len: 0,
        next: None,
    };

    fn is_full(&self) -> bool {
        self.len as usize == BUCKET_DEPTH
    }

    fn occupied(&self) -> &[u32] {
        &self.slots[..self.len as usize]
    }

    fn push(&mut self, index: u32) {
        self.slots[self.len as usize] = index;
        self.len += 1;
    }
}

/// Handler → group index table keyed on the handler's low byte
///
/// Each of the 256 roots points at a chain of buckets. Lookups only
/// compare handlers that share a low byte, and a chain grows one bucket
/// per [`BUCKET_DEPTH`] colliding handlers.
struct BucketTable {
    roots: [Option<u32>; 256],
    buckets: Vec<Bucket>,
}

impl BucketTable {
    fn new() -> Self {
        BucketTable {
            roots: [None; 256],
            buckets: Vec::new(),
        }
    }

    /// Index of `handler`'s group, if one was inserted
    fn find(&self, handler: HandlerRef, groups: &[HandlerSelectors]) -> Option<usize> {
        let mut cursor = self.roots[handler.low_byte() as usize];
        while let Some(b) = cursor {
            let bucket = &self.buckets[b as usize];
            for &slot in bucket.occupied() {
                if groups[slot as usize].handler == handler {
                    return Some(slot as usize);
                }
            }
            cursor = bucket.next;
        }
        None
    }

    /// Record a new group for `handler`
    fn insert(&mut self, handler: HandlerRef, index: u32) {
        let root = handler.low_byte() as usize;
        let Some(mut b) = self.roots[root] else {
            self.roots[root] = Some(self.alloc(index));
            return;
        };
        loop {
            let bucket = self.buckets[b as usize];
            if !bucket.is_full() {
                self.buckets[b as usize].push(index);
                return;
            }
            match bucket.next {
                Some(next) => b = next,
                None => {
                    let fresh = self.alloc(index);
                    self.buckets[b as usize].next = Some(fresh);
                    return;
                }
            }
        }
    }

    fn alloc(&mut self, first: u32) -> u32 {
        let mut bucket = Bucket::EMPTY;
        bucket.push(first);
        self.buckets.push(bucket);
        (self.buckets.len() - 1) as u32
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

/// Bucket-chained hash over handler low bytes
///
/// Unlike [`Bitmap`](super::Bitmap), a collision only costs a walk over
/// handlers that share the low byte, never over every handler seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketChained;

impl EnumerationStrategy for BucketChained {
    fn name(&self) -> &'static str {
        "bucket"
    }

    fn enumerate(&self, table: &dyn SelectorTable, category: Option<CategoryId>) -> Enumeration {
        let mut index = BucketTable::new();
        let mut groups: Vec<HandlerSelectors> = Vec::new();

        for entry in scan(table, category) {
            match index.find(entry.handler, &groups) {
                Some(slot) => groups[slot].selectors.push(entry.selector),
                None => {
                    index.insert(entry.handler, groups.len() as u32);
                    groups.push(HandlerSelectors::new(entry.handler, entry.selector));
                }
            }
        }

        Enumeration::from_groups(groups)
    }
}
