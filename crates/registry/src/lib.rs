//! Selector registries for Loupe
//!
//! This crate implements the mutable source of truth that maps selectors
//! to handlers:
//! - SelectorRegistry: Vec + FxHashMap, O(1) swap-remove
//! - LinkedRegistry: doubly linked handler groups, single-pass batch
//!   insertion with deferred head linkage
//! - HandlerGroup / SelectorList: batch input, typed or packed
//!
//! Both registries implement [`MutableSelectorTable`], so everything above
//! this crate (enumeration, caching, routing) is written against the trait.
//!
//! Every mutation is all-or-nothing: batches are validated in full before
//! the first write, and the events of a failed call are never published.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod batch;
pub mod linked;

pub use array::SelectorRegistry;
pub use batch::{validate_batch, validate_removals, HandlerGroup, SelectorList};
pub use linked::LinkedRegistry;

use loupe_core::{HandlerRef, RegistryEvent, Result, Selector, SelectorTable};

/// Mutation interface shared by all registry variants
pub trait MutableSelectorTable: SelectorTable {
    /// Add a batch of handler groups
    ///
    /// # Errors
    ///
    /// `DuplicateOperationId` if any selector is already registered or
    /// repeated in the batch, `EmptyHandlerGroup` for a group with no
    /// selectors. Nothing is written on error.
    fn add(&mut self, batch: &[HandlerGroup<'_>]) -> Result<()>;

    /// Remove one selector, returning the handler it routed to
    fn remove(&mut self, selector: Selector) -> Result<HandlerRef>;

    /// Re-point a selector, returning the previous handler
    ///
    /// # Errors
    ///
    /// `OperationNotFound` for an unknown selector, `SameHandler` when the
    /// selector already routes to `new_handler`.
    fn replace(&mut self, selector: Selector, new_handler: HandlerRef) -> Result<HandlerRef>;

    /// Take all committed events, oldest first
    fn drain_events(&mut self) -> Vec<RegistryEvent>;

    /// Committed events not yet drained
    fn pending_events(&self) -> &[RegistryEvent];

    /// Remove several selectors as one unit
    ///
    /// Fails without removing anything if any selector is missing or
    /// listed twice.
    fn remove_batch(&mut self, selectors: &[Selector]) -> Result<()> {
        validate_removals(&*self, selectors)?;
        for &selector in selectors {
            self.remove(selector)?;
        }
        Ok(())
    }
}
