//! Array-backed selector registry
//!
//! Selectors are kept in a `Vec` in iteration order, with an `FxHashMap`
//! from selector to its slot. Each slot records the selector's index in
//! the vector, so removal swaps the last selector into the hole and fixes
//! up one slot: O(1) regardless of registry size.
//!
//! Removal reorders iteration (the last selector moves), which is the
//! price of O(1) removal without links.

use rustc_hash::FxHashMap;
use tracing::debug;

use loupe_core::{
    CategoryId, Entry, Error, HandlerRef, RegistryEvent, Result, Selector, SelectorTable,
};

use crate::batch::{validate_batch, HandlerGroup};
use crate::MutableSelectorTable;

#[derive(Debug, Clone, Copy)]
struct Slot {
    handler: HandlerRef,
    category: CategoryId,
    position: u32,
}

/// Selector registry with swap-remove storage
#[derive(Default)]
pub struct SelectorRegistry {
    sequence: Vec<Selector>,
    slots: FxHashMap<Selector, Slot>,
    events: Vec<RegistryEvent>,
}

impl SelectorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Selectors in iteration order
    pub fn selectors(&self) -> &[Selector] {
        &self.sequence
    }

    fn emit(&mut self, event: RegistryEvent) {
        debug!(target: "loupe::registry", kind = event.kind(), selector = %event.selector(), "Registry event");
        self.events.push(event);
    }
}

impl SelectorTable for SelectorRegistry {
    fn lookup(&self, selector: Selector) -> Option<HandlerRef> {
        self.slots.get(&selector).map(|s| s.handler)
    }

    fn get(&self, selector: Selector) -> Option<Entry> {
        self.slots.get(&selector).map(|s| Entry {
            selector,
            handler: s.handler,
            category: s.category,
            position: s.position,
        })
    }

    fn len(&self) -> usize {
        self.sequence.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(self.sequence.iter().filter_map(move |&sel| self.get(sel)))
    }
}

impl MutableSelectorTable for SelectorRegistry {
    fn add(&mut self, batch: &[HandlerGroup<'_>]) -> Result<()> {
        let added = validate_batch(&*self, batch)?;
        self.sequence.reserve(added);
        self.slots.reserve(added);

        for group in batch {
            for selector in group.selectors.iter() {
                let position = self.sequence.len() as u32;
                self.sequence.push(selector);
                self.slots.insert(
                    selector,
                    Slot {
                        handler: group.handler,
                        category: group.category,
                        position,
                    },
                );
                self.emit(RegistryEvent::Added {
                    selector,
                    handler: group.handler,
                    category: group.category,
                });
            }
        }

        debug!(target: "loupe::registry", groups = batch.len(), added, total = self.sequence.len(), "Batch added");
        Ok(())
    }

    fn remove(&mut self, selector: Selector) -> Result<HandlerRef> {
        let slot = self
            .slots
            .remove(&selector)
            .ok_or(Error::OperationNotFound(selector))?;

        let hole = slot.position as usize;
        self.sequence.swap_remove(hole);
        if let Some(&moved) = self.sequence.get(hole) {
            if let Some(moved_slot) = self.slots.get_mut(&moved) {
                moved_slot.position = hole as u32;
            }
        }

        self.emit(RegistryEvent::Removed {
            selector,
            handler: slot.handler,
        });
        Ok(slot.handler)
    }

    fn replace(&mut self, selector: Selector, new_handler: HandlerRef) -> Result<HandlerRef> {
        let slot = self
            .slots
            .get_mut(&selector)
            .ok_or(Error::OperationNotFound(selector))?;
        if slot.handler == new_handler {
            return Err(Error::SameHandler {
                selector,
                handler: new_handler,
            });
        }
        let old_handler = std::mem::replace(&mut slot.handler, new_handler);
        self.emit(RegistryEvent::Replaced {
            selector,
            old_handler,
            new_handler,
        });
        Ok(old_handler)
    }

    fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    fn pending_events(&self) -> &[RegistryEvent] {
        &self.events
    }
}

impl std::fmt::Debug for SelectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectorRegistry")
            .field("selector_count", &self.sequence.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}
