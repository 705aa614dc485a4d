//! Dispatch router
//!
//! Resolves a selector through the registry and forwards the call to the
//! handler implementation bound to the resolved reference. The router
//! reads the live registry only; it never consults the snapshot cache.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use loupe_core::{Error, Handler, HandlerRef, Result, Selector, SelectorTable};

/// Handler reference → implementation bindings
#[derive(Default)]
pub struct Router {
    bindings: FxHashMap<HandlerRef, Arc<dyn Handler>>,
}

impl Router {
    /// Router with no bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an implementation to `handler`, returning the previous one
    pub fn bind(&mut self, handler: HandlerRef, implementation: Arc<dyn Handler>) -> Option<Arc<dyn Handler>> {
        self.bindings.insert(handler, implementation)
    }

    /// Bind a closure to `handler`
    pub fn bind_fn<F>(&mut self, handler: HandlerRef, f: F) -> Option<Arc<dyn Handler>>
    where
        F: Fn(Selector, &[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.bind(handler, Arc::new(f))
    }

    /// Drop the binding for `handler`
    pub fn unbind(&mut self, handler: HandlerRef) -> Option<Arc<dyn Handler>> {
        self.bindings.remove(&handler)
    }

    /// Whether `handler` has an implementation
    pub fn is_bound(&self, handler: HandlerRef) -> bool {
        self.bindings.contains_key(&handler)
    }

    /// Execute `selector` against the handler `table` routes it to
    ///
    /// # Errors
    ///
    /// `OperationNotFound` if `table` has no entry for `selector`,
    /// `HandlerUnavailable` if the resolved handler has no binding.
    /// Otherwise the handler's own result is returned unchanged.
    pub fn route(&self, table: &dyn SelectorTable, selector: Selector, payload: &[u8]) -> Result<Vec<u8>> {
        let handler = table
            .lookup(selector)
            .ok_or(Error::OperationNotFound(selector))?;
        let implementation = self
            .bindings
            .get(&handler)
            .ok_or(Error::HandlerUnavailable(handler))?;

        debug!(target: "loupe::router", %selector, %handler, payload_len = payload.len(), "Routing call");
        implementation.handle(selector, payload)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("bound_handlers", &self.bindings.len())
            .finish()
    }
}
