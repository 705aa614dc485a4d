//! The `Loupe` facade
//!
//! Owns a registry, the snapshot cache over a blob store, and the router,
//! and exposes the whole external interface through one type:
//!
//! - Registry mutation: `add`, `remove`, `remove_batch`, `replace`, `drain_events`
//! - Registry query: `lookup`, `entries`, `enumerate`
//! - Cache admin: `enable_cache`, `rebuild`, `read` and its packed variants
//! - Dispatch: `route`
//!
//! Mutations never rebuild a cache. Rebuilding after a change is the
//! caller's decision.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use loupe_core::{
    BlobRef, BlobStore, CategoryId, Entry, Handler, HandlerRef, RegistryEvent, Result, Selector,
    SelectorTable,
};
use loupe_registry::{HandlerGroup, LinkedRegistry, MutableSelectorTable};
use loupe_storage::{DiskBlobStore, MemoryBlobStore};

use crate::cache::{CacheState, SnapshotCache};
use crate::config::{LoupeConfig, CONFIG_FILE_NAME};
use crate::enumeration::{Enumeration, Strategy};
use crate::router::Router;

/// Registry, snapshot cache and router behind one interface
pub struct Loupe<R = LinkedRegistry> {
    registry: R,
    cache: SnapshotCache,
    router: Router,
    config: LoupeConfig,
}

impl Loupe<LinkedRegistry> {
    /// In-memory instance with the default configuration
    pub fn new() -> Self {
        let config = LoupeConfig::default();
        let store: Arc<dyn BlobStore> =
            Arc::new(MemoryBlobStore::with_max_blob_size(config.max_blob_size));
        Loupe {
            registry: LinkedRegistry::new(),
            cache: SnapshotCache::new(store, Strategy::default()),
            router: Router::new(),
            config,
        }
    }

    /// Open an instance in `dir`, creating `loupe.toml` with defaults if missing
    ///
    /// A relative `blob_dir` resolves against `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE_NAME);
        LoupeConfig::write_default_if_missing(&path)?;
        let mut config = LoupeConfig::from_file(&path)?;
        if let Some(blob_dir) = config.blob_dir.take() {
            config.blob_dir = Some(if blob_dir.is_relative() {
                dir.join(blob_dir)
            } else {
                blob_dir
            });
        }
        info!(target: "loupe::engine", path = %dir.display(), strategy = %config.strategy, "Opening loupe");
        Self::from_config(config)
    }

    /// Instance described by `config`, with an empty linked registry
    pub fn from_config(config: LoupeConfig) -> Result<Self> {
        Loupe::with_registry(LinkedRegistry::new(), config)
    }
}

impl Default for Loupe<LinkedRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: MutableSelectorTable> Loupe<R> {
    /// Instance over an existing registry
    ///
    /// # Errors
    ///
    /// `Config` if `config` is invalid, `IoError` if the blob directory
    /// cannot be created.
    pub fn with_registry(registry: R, config: LoupeConfig) -> Result<Self> {
        config.validate()?;
        let strategy = config.strategy()?;
        let store: Arc<dyn BlobStore> = match &config.blob_dir {
            Some(dir) => Arc::new(DiskBlobStore::open_with_max_blob_size(dir, config.max_blob_size)?),
            None => Arc::new(MemoryBlobStore::with_max_blob_size(config.max_blob_size)),
        };
        Ok(Loupe {
            registry,
            cache: SnapshotCache::new(store, strategy),
            router: Router::new(),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &LoupeConfig {
        &self.config
    }

    /// The registry
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The snapshot cache
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// The router, for binding handler implementations
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Bind an implementation to `handler`
    pub fn bind(&mut self, handler: HandlerRef, implementation: Arc<dyn Handler>) {
        self.router.bind(handler, implementation);
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Add a batch of handler groups, all or nothing
    pub fn add(&mut self, batch: &[HandlerGroup<'_>]) -> Result<()> {
        self.registry.add(batch)
    }

    /// Remove one selector
    pub fn remove(&mut self, selector: Selector) -> Result<HandlerRef> {
        self.registry.remove(selector)
    }

    /// Remove several selectors, all or nothing
    pub fn remove_batch(&mut self, selectors: &[Selector]) -> Result<()> {
        self.registry.remove_batch(selectors)
    }

    /// Re-point `selector` to `new_handler`
    pub fn replace(&mut self, selector: Selector, new_handler: HandlerRef) -> Result<HandlerRef> {
        self.registry.replace(selector, new_handler)
    }

    /// Take committed registry events, oldest first
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        self.registry.drain_events()
    }

    /// Handler `selector` routes to in the live registry
    pub fn lookup(&self, selector: Selector) -> Option<HandlerRef> {
        self.registry.lookup(selector)
    }

    /// Live registry entries in iteration order
    pub fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        self.registry.entries()
    }

    /// Enumerate the live registry, bypassing the cache
    pub fn enumerate(&self, category: Option<CategoryId>) -> Enumeration {
        self.cache.strategy().enumerate(&self.registry, category)
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// Switch `category` to Enabled, building its first snapshot
    pub fn enable_cache(&self, category: CategoryId) -> Result<BlobRef> {
        self.cache.enable_cache(&self.registry, category)
    }

    /// Enable every category listed in `cached_categories` that is not
    /// enabled yet; returns the ones switched on by this call
    ///
    /// All or nothing: if one category fails, none is switched on.
    pub fn enable_configured_caches(&self) -> Result<Vec<CategoryId>> {
        let categories: Vec<CategoryId> = self.config.cached_categories().collect();
        self.cache.enable_caches(&self.registry, &categories)
    }

    /// Rebuild the snapshot of an Enabled category
    pub fn rebuild(&self, category: CategoryId) -> Result<BlobRef> {
        self.cache.rebuild(&self.registry, category)
    }

    /// Mode of `category`
    pub fn cache_state(&self, category: CategoryId) -> CacheState {
        self.cache.state(category)
    }

    /// Enumeration of `category` in its current cache mode
    pub fn read(&self, category: CategoryId) -> Result<Enumeration> {
        self.cache.read(&self.registry, category)
    }

    /// Minimal packed form of `category`
    pub fn read_packed(&self, category: CategoryId) -> Result<Vec<u8>> {
        self.cache.read_packed(&self.registry, category)
    }

    /// Unique handlers of `category`, 20 bytes each
    pub fn read_handlers_packed(&self, category: CategoryId) -> Result<Vec<u8>> {
        self.cache.read_handlers_packed(&self.registry, category)
    }

    /// Unique handlers of `category`
    pub fn handlers(&self, category: CategoryId) -> Result<Vec<HandlerRef>> {
        self.cache.handlers(&self.registry, category)
    }

    /// Selectors of `handler` within `category`
    pub fn selectors_of(&self, category: CategoryId, handler: HandlerRef) -> Result<Vec<Selector>> {
        self.cache.selectors_of(&self.registry, category, handler)
    }

    /// Handler of `selector` as seen by `category`'s cache mode
    pub fn handler_of(&self, category: CategoryId, selector: Selector) -> Result<Option<HandlerRef>> {
        self.cache.handler_of(&self.registry, category, selector)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Execute `selector` against its live handler
    pub fn route(&self, selector: Selector, payload: &[u8]) -> Result<Vec<u8>> {
        self.router.route(&self.registry, selector, payload)
    }
}

impl<R: MutableSelectorTable> std::fmt::Debug for Loupe<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loupe")
            .field("selector_count", &self.registry.len())
            .field("cache", &self.cache)
            .field("router", &self.router)
            .finish()
    }
}
