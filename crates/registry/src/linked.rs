//! Linked-list selector registry
//!
//! Each batch group is stored as a doubly linked chain of selectors that
//! starts at the group's head. Heads are additionally linked to each other
//! (`prev_head` / `next_head`), so iteration walks head 1, its members,
//! head 2, its members, and so on. All links are selectors, and every node
//! lives in one `FxHashMap`, so lookup, removal and relinking are O(1).
//!
//! # Batch insertion
//!
//! A head's record cannot be written until the next group's head is known,
//! because it carries the forward `next_head` link. [`BatchLinker`] runs in
//! a single pass with one group of deferred state:
//!
//! 1. Phase one, per group: emit the `Added` event for the head right away
//!    (events follow iteration order), write the member records (their
//!    links are all inside the group), and park the head as pending.
//! 2. Phase two, when the next head arrives: write the pending head with
//!    its now-known successor. The last head is written by `finish` with no
//!    successor.
//!
//! Event emission order and storage write order therefore differ on
//! purpose: the head's event precedes its members' events, its record
//! follows them.

use rustc_hash::FxHashMap;
use tracing::debug;

use loupe_core::{
    CategoryId, Entry, Error, HandlerRef, RegistryEvent, Result, Selector, SelectorTable,
};

use crate::batch::{validate_batch, HandlerGroup};
use crate::MutableSelectorTable;

/// Links carried only by group heads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeadLinks {
    prev_head: Option<Selector>,
    next_head: Option<Selector>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    handler: HandlerRef,
    category: CategoryId,
    /// Previous selector within the group (None for the head)
    prev: Option<Selector>,
    /// Next selector within the group
    next: Option<Selector>,
    head: Option<HeadLinks>,
}

fn emit(events: &mut Vec<RegistryEvent>, event: RegistryEvent) {
    debug!(target: "loupe::registry", kind = event.kind(), selector = %event.selector(), "Registry event");
    events.push(event);
}

/// A group head whose forward link is not known yet
#[derive(Debug, Clone, Copy)]
struct PendingHead {
    selector: Selector,
    handler: HandlerRef,
    category: CategoryId,
    prev_head: Option<Selector>,
    first_member: Option<Selector>,
}

impl PendingHead {
    fn into_node(self, next_head: Option<Selector>) -> Node {
        Node {
            handler: self.handler,
            category: self.category,
            prev: None,
            next: self.first_member,
            head: Some(HeadLinks {
                prev_head: self.prev_head,
                next_head,
            }),
        }
    }
}

/// Single-pass batch writer with one deferred head
struct BatchLinker {
    pending: Option<PendingHead>,
    first_head: Option<Selector>,
    prev_head: Option<Selector>,
}

impl BatchLinker {
    /// Start a batch that will be appended after `tail`
    fn new(tail: Option<Selector>) -> Self {
        BatchLinker {
            pending: None,
            first_head: None,
            prev_head: tail,
        }
    }

    fn push_group(
        &mut self,
        nodes: &mut FxHashMap<Selector, Node>,
        events: &mut Vec<RegistryEvent>,
        group: &HandlerGroup<'_>,
    ) {
        let list = group.selectors;
        let Some(head) = list.head() else {
            return;
        };

        emit(
            events,
            RegistryEvent::Added {
                selector: head,
                handler: group.handler,
                category: group.category,
            },
        );

        for i in 1..list.len() {
            let Some(selector) = list.get(i) else {
                continue;
            };
            nodes.insert(
                selector,
                Node {
                    handler: group.handler,
                    category: group.category,
                    prev: list.get(i - 1),
                    next: list.get(i + 1),
                    head: None,
                },
            );
            emit(
                events,
                RegistryEvent::Added {
                    selector,
                    handler: group.handler,
                    category: group.category,
                },
            );
        }

        self.flush(nodes, Some(head));

        self.first_head.get_or_insert(head);
        self.pending = Some(PendingHead {
            selector: head,
            handler: group.handler,
            category: group.category,
            prev_head: self.prev_head,
            first_member: list.get(1),
        });
        self.prev_head = Some(head);
    }

    fn flush(&mut self, nodes: &mut FxHashMap<Selector, Node>, next_head: Option<Selector>) {
        if let Some(pending) = self.pending.take() {
            nodes.insert(pending.selector, pending.into_node(next_head));
        }
    }

    /// Write the last head and return the batch's first and last heads
    fn finish(mut self, nodes: &mut FxHashMap<Selector, Node>) -> Option<(Selector, Selector)> {
        let last = self.pending.map(|p| p.selector);
        self.flush(nodes, None);
        Some((self.first_head?, last?))
    }
}

/// Selector registry stored as linked handler groups
#[derive(Default)]
pub struct LinkedRegistry {
    nodes: FxHashMap<Selector, Node>,
    first_head: Option<Selector>,
    last_head: Option<Selector>,
    events: Vec<RegistryEvent>,
}

impl LinkedRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Group heads in iteration order
    pub fn heads(&self) -> Vec<Selector> {
        let mut heads = Vec::new();
        let mut current = self.first_head;
        while let Some(head) = current {
            heads.push(head);
            current = self
                .nodes
                .get(&head)
                .and_then(|n| n.head)
                .and_then(|l| l.next_head);
        }
        heads
    }

    fn set_next_head(&mut self, at: Option<Selector>, to: Option<Selector>) {
        match at {
            Some(sel) => {
                if let Some(links) = self.nodes.get_mut(&sel).and_then(|n| n.head.as_mut()) {
                    links.next_head = to;
                }
            }
            None => self.first_head = to,
        }
    }

    fn set_prev_head(&mut self, at: Option<Selector>, to: Option<Selector>) {
        match at {
            Some(sel) => {
                if let Some(links) = self.nodes.get_mut(&sel).and_then(|n| n.head.as_mut()) {
                    links.prev_head = to;
                }
            }
            None => self.last_head = to,
        }
    }

    /// Point the neighbors of a removed head at `replacement`, or at each
    /// other when the group is gone
    fn relink_heads(&mut self, links: HeadLinks, replacement: Option<Selector>) {
        let (after_prev, before_next) = match replacement {
            Some(r) => (Some(r), Some(r)),
            None => (links.next_head, links.prev_head),
        };
        self.set_next_head(links.prev_head, after_prev);
        self.set_prev_head(links.next_head, before_next);
    }
}

impl SelectorTable for LinkedRegistry {
    fn lookup(&self, selector: Selector) -> Option<HandlerRef> {
        self.nodes.get(&selector).map(|n| n.handler)
    }

    /// O(n): the position is only known by walking the links.
    fn get(&self, selector: Selector) -> Option<Entry> {
        if !self.nodes.contains_key(&selector) {
            return None;
        }
        self.entries().find(|e| e.selector == selector)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(LinkedIter {
            nodes: &self.nodes,
            current: self.first_head,
            group_head: None,
            position: 0,
        })
    }
}

struct LinkedIter<'a> {
    nodes: &'a FxHashMap<Selector, Node>,
    current: Option<Selector>,
    group_head: Option<Selector>,
    position: u32,
}

impl<'a> Iterator for LinkedIter<'a> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let selector = self.current?;
        let node = self.nodes.get(&selector)?;
        if node.head.is_some() {
            self.group_head = Some(selector);
        }
        self.current = match node.next {
            Some(next) => Some(next),
            None => self
                .group_head
                .and_then(|h| self.nodes.get(&h))
                .and_then(|h| h.head)
                .and_then(|l| l.next_head),
        };

        let entry = Entry {
            selector,
            handler: node.handler,
            category: node.category,
            position: self.position,
        };
        self.position += 1;
        Some(entry)
    }
}

impl MutableSelectorTable for LinkedRegistry {
    fn add(&mut self, batch: &[HandlerGroup<'_>]) -> Result<()> {
        let added = validate_batch(&*self, batch)?;
        self.nodes.reserve(added);

        let tail = self.last_head;
        let mut linker = BatchLinker::new(tail);
        for group in batch {
            linker.push_group(&mut self.nodes, &mut self.events, group);
        }
        if let Some((first, last)) = linker.finish(&mut self.nodes) {
            self.set_next_head(tail, Some(first));
            self.last_head = Some(last);
        }

        debug!(target: "loupe::registry", groups = batch.len(), added, total = self.nodes.len(), "Batch linked");
        Ok(())
    }

    fn remove(&mut self, selector: Selector) -> Result<HandlerRef> {
        let node = self
            .nodes
            .remove(&selector)
            .ok_or(Error::OperationNotFound(selector))?;

        match node.head {
            None => {
                if let Some(prev) = node.prev.and_then(|p| self.nodes.get_mut(&p)) {
                    prev.next = node.next;
                }
                if let Some(next) = node.next.and_then(|n| self.nodes.get_mut(&n)) {
                    next.prev = node.prev;
                }
            }
            Some(links) => match node.next {
                Some(successor) => {
                    if let Some(promoted) = self.nodes.get_mut(&successor) {
                        promoted.prev = None;
                        promoted.head = Some(links);
                    }
                    self.relink_heads(links, Some(successor));
                }
                None => self.relink_heads(links, None),
            },
        }

        emit(
            &mut self.events,
            RegistryEvent::Removed {
                selector,
                handler: node.handler,
            },
        );
        Ok(node.handler)
    }

    fn replace(&mut self, selector: Selector, new_handler: HandlerRef) -> Result<HandlerRef> {
        let node = self
            .nodes
            .get_mut(&selector)
            .ok_or(Error::OperationNotFound(selector))?;
        if node.handler == new_handler {
            return Err(Error::SameHandler {
                selector,
                handler: new_handler,
            });
        }
        let old_handler = std::mem::replace(&mut node.handler, new_handler);
        emit(
            &mut self.events,
            RegistryEvent::Replaced {
                selector,
                old_handler,
                new_handler,
            },
        );
        Ok(old_handler)
    }

    fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    fn pending_events(&self) -> &[RegistryEvent] {
        &self.events
    }
}

impl std::fmt::Debug for LinkedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedRegistry")
            .field("selector_count", &self.nodes.len())
            .field("group_count", &self.heads().len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}
