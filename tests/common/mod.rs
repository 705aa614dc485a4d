//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any test's main.rs.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Once;

pub use loupe::{
    CategoryId, Enumeration, Error, HandlerGroup, HandlerRef, LinkedRegistry, Loupe, LoupeConfig,
    MutableSelectorTable, Selector, SelectorRegistry, SelectorTable,
};

static INIT_TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn h(n: u64) -> HandlerRef {
    HandlerRef::from_low_u64(n)
}

pub fn s(n: u32) -> Selector {
    Selector::from_u32(n)
}

/// Owned batch: one `(handler, selectors)` pair per group.
#[derive(Debug, Clone)]
pub struct Batch {
    pub category: CategoryId,
    pub groups: Vec<(HandlerRef, Vec<Selector>)>,
}

impl Batch {
    pub fn new(groups: &[(u64, &[u32])]) -> Self {
        Batch {
            category: CategoryId::DEFAULT,
            groups: groups
                .iter()
                .map(|(handler, sels)| (h(*handler), sels.iter().copied().map(s).collect()))
                .collect(),
        }
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category = category;
        self
    }

    /// Borrowed view for `add`.
    pub fn groups(&self) -> Vec<HandlerGroup<'_>> {
        self.groups
            .iter()
            .map(|(handler, sels)| HandlerGroup::new(*handler, sels).in_category(self.category))
            .collect()
    }

    pub fn selector_count(&self) -> usize {
        self.groups.iter().map(|(_, sels)| sels.len()).sum()
    }
}

/// Ground truth computed with plain std collections.
pub fn oracle<T: SelectorTable + ?Sized>(
    table: &T,
    category: CategoryId,
) -> BTreeMap<HandlerRef, std::collections::BTreeSet<Selector>> {
    let mut map: BTreeMap<HandlerRef, std::collections::BTreeSet<Selector>> = BTreeMap::new();
    for entry in table.entries().filter(|e| e.category == category) {
        map.entry(entry.handler).or_default().insert(entry.selector);
    }
    map
}

/// Group sizes of an enumeration, sorted ascending.
pub fn group_sizes(enumeration: &Enumeration) -> Vec<usize> {
    let mut sizes: Vec<usize> = enumeration
        .groups()
        .iter()
        .map(|g| g.selectors.len())
        .collect();
    sizes.sort_unstable();
    sizes
}
