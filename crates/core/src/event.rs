//! Registry notification events
//!
//! Every individual change to a registry produces one event, in the
//! order the change becomes visible to iteration. External indexers
//! consume them via `drain_events()`; events from a failed batch are
//! never published.

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, HandlerRef, Selector};

/// A single committed registry change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// Selector became routable
    Added {
        /// New selector
        selector: Selector,
        /// Handler it routes to
        handler: HandlerRef,
        /// Category it was added under
        category: CategoryId,
    },
    /// Selector was re-pointed to another handler
    Replaced {
        /// Selector that changed
        selector: Selector,
        /// Handler before the change
        old_handler: HandlerRef,
        /// Handler after the change
        new_handler: HandlerRef,
    },
    /// Selector stopped being routable
    Removed {
        /// Removed selector
        selector: Selector,
        /// Handler it used to route to
        handler: HandlerRef,
    },
}

impl RegistryEvent {
    /// Selector the event is about
    pub fn selector(&self) -> Selector {
        match self {
            RegistryEvent::Added { selector, .. }
            | RegistryEvent::Replaced { selector, .. }
            | RegistryEvent::Removed { selector, .. } => *selector,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEvent::Added { .. } => "added",
            RegistryEvent::Replaced { .. } => "replaced",
            RegistryEvent::Removed { .. } => "removed",
        }
    }
}
