//! Enumeration engine
//!
//! Given a registry (optionally restricted to one category), an
//! enumeration lists every unique handler together with the selectors
//! routed to it. Four interchangeable strategies compute it:
//!
//! | Strategy | Dedup | Cost |
//! |---|---|---|
//! | [`Naive`] | linear scan of groups seen so far | O(n²), over-allocates then trims |
//! | [`TwoPass`] | linear scan, count pass then exact allocation | O(n²), exact allocation |
//! | [`Bitmap`] | 256-bit presence map on the handler's low byte | O(n) average, O(n²) when low bytes collide |
//! | [`BucketChained`] | 5-slot buckets per low byte, chained on overflow | O(n) average, bounded degradation |
//!
//! All four must agree on the handler → selector-set mapping for the same
//! input; [`Enumeration::same_mapping`] is the comparison used by the
//! differential tests. Group order is first appearance in registry
//! iteration order, selectors within a group keep iteration order.

mod bitmap;
mod bucket;
mod naive;
mod two_pass;

pub use bitmap::Bitmap;
pub use bucket::BucketChained;
pub use naive::Naive;
pub use two_pass::TwoPass;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use loupe_core::{CategoryId, Entry, Error, HandlerRef, Result, Selector, SelectorTable};
use loupe_storage::format::{encode_handler_list, encode_payload, encode_snapshot, SnapshotView};

/// One handler and the selectors routed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSelectors {
    /// Handler reference
    pub handler: HandlerRef,
    /// Selectors in registry iteration order
    pub selectors: Vec<Selector>,
}

impl HandlerSelectors {
    /// Group holding a single selector
    pub fn new(handler: HandlerRef, first: Selector) -> Self {
        HandlerSelectors {
            handler,
            selectors: vec![first],
        }
    }
}

/// Result of enumerating a registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    groups: Vec<HandlerSelectors>,
}

impl Enumeration {
    /// Enumeration with no handlers
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap groups computed by a strategy
    pub fn from_groups(groups: Vec<HandlerSelectors>) -> Self {
        Enumeration { groups }
    }

    /// Copy a decoded snapshot out into an owned enumeration
    pub fn from_view(view: &SnapshotView<'_>) -> Self {
        let groups = view
            .groups()
            .map(|g| HandlerSelectors {
                handler: g.handler,
                selectors: g.selectors.to_vec(),
            })
            .collect();
        Enumeration { groups }
    }

    /// Groups in order
    pub fn groups(&self) -> &[HandlerSelectors] {
        &self.groups
    }

    /// Unique handlers in order
    pub fn handlers(&self) -> impl Iterator<Item = HandlerRef> + '_ {
        self.groups.iter().map(|g| g.handler)
    }

    /// Selectors routed to `handler`
    pub fn selectors_of(&self, handler: HandlerRef) -> Option<&[Selector]> {
        self.groups
            .iter()
            .find(|g| g.handler == handler)
            .map(|g| g.selectors.as_slice())
    }

    /// Handler whose group contains `selector`
    pub fn handler_of(&self, selector: Selector) -> Option<HandlerRef> {
        self.groups
            .iter()
            .find(|g| g.selectors.contains(&selector))
            .map(|g| g.handler)
    }

    /// Number of unique handlers
    pub fn handler_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of selectors
    pub fn selector_count(&self) -> usize {
        self.groups.iter().map(|g| g.selectors.len()).sum()
    }

    /// Whether no handler was found
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Order-insensitive form: handler → selector set
    pub fn normalized(&self) -> BTreeMap<HandlerRef, BTreeSet<Selector>> {
        self.groups
            .iter()
            .map(|g| (g.handler, g.selectors.iter().copied().collect()))
            .collect()
    }

    /// Whether both enumerations pair the same handlers with the same
    /// selector sets, ignoring order
    pub fn same_mapping(&self, other: &Enumeration) -> bool {
        self.normalized() == other.normalized()
    }

    fn as_pairs(&self) -> impl Iterator<Item = (HandlerRef, &[Selector])> + Clone {
        self.groups.iter().map(|g| (g.handler, g.selectors.as_slice()))
    }

    /// Serialize as a snapshot blob (header + payload)
    pub fn encode_snapshot(&self) -> Vec<u8> {
        encode_snapshot(self.as_pairs())
    }

    /// Serialize as the minimal packed form (payload only)
    pub fn encode_payload(&self) -> Vec<u8> {
        encode_payload(self.as_pairs())
    }

    /// Unique handlers packed back to back, 20 bytes each
    pub fn encode_handlers(&self) -> Vec<u8> {
        encode_handler_list(self.handlers())
    }
}

/// An algorithm that enumerates a registry
pub trait EnumerationStrategy: Send + Sync {
    /// Short name, as used in configuration
    fn name(&self) -> &'static str;

    /// Enumerate `table`, restricted to `category` when given
    fn enumerate(&self, table: &dyn SelectorTable, category: Option<CategoryId>) -> Enumeration;
}

/// Entries a strategy should consider
pub(crate) fn scan<'a>(
    table: &'a dyn SelectorTable,
    category: Option<CategoryId>,
) -> Box<dyn Iterator<Item = Entry> + 'a> {
    match category {
        Some(category) => table.category_entries(category),
        None => table.entries(),
    }
}

/// Selectable enumeration strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Linear-scan dedup
    Naive,
    /// Count pass, then exact-size fill pass
    TwoPass,
    /// Low-byte presence bitmap in front of the linear scan
    Bitmap,
    /// Low-byte buckets with overflow chaining
    #[default]
    Bucket,
}

impl Strategy {
    /// Every strategy, for differential checks
    pub const ALL: [Strategy; 4] = [
        Strategy::Naive,
        Strategy::TwoPass,
        Strategy::Bitmap,
        Strategy::Bucket,
    ];

    /// Name used in `loupe.toml`
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Naive => "naive",
            Strategy::TwoPass => "two-pass",
            Strategy::Bitmap => "bitmap",
            Strategy::Bucket => "bucket",
        }
    }

    /// The algorithm behind this choice
    pub fn implementation(&self) -> &'static dyn EnumerationStrategy {
        match self {
            Strategy::Naive => &Naive,
            Strategy::TwoPass => &TwoPass,
            Strategy::Bitmap => &Bitmap,
            Strategy::Bucket => &BucketChained,
        }
    }

    /// Enumerate with this strategy
    pub fn enumerate(&self, table: &dyn SelectorTable, category: Option<CategoryId>) -> Enumeration {
        self.implementation().enumerate(table, category)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                Error::Config(format!(
                    "Invalid strategy '{}'. Expected \"naive\", \"two-pass\", \"bitmap\" or \"bucket\".",
                    s
                ))
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use loupe_core::{CategoryId, HandlerRef, Selector};
    use loupe_registry::{HandlerGroup, LinkedRegistry, MutableSelectorTable};

    /// Registry with one group per `(handler, selectors)` pair
    pub fn registry(groups: &[(u64, &[u32])]) -> LinkedRegistry {
        registry_in(CategoryId::DEFAULT, groups)
    }

    pub fn registry_in(category: CategoryId, groups: &[(u64, &[u32])]) -> LinkedRegistry {
        let owned: Vec<(HandlerRef, Vec<Selector>)> = groups
            .iter()
            .map(|(h, sels)| {
                (
                    HandlerRef::from_low_u64(*h),
                    sels.iter().copied().map(Selector::from_u32).collect(),
                )
            })
            .collect();
        let batch: Vec<HandlerGroup<'_>> = owned
            .iter()
            .map(|(h, s)| HandlerGroup::new(*h, s).in_category(category))
            .collect();
        let mut registry = LinkedRegistry::new();
        registry.add(&batch).unwrap();
        registry
    }
}
