//! Batch input for registry mutations
//!
//! A batch is an ordered list of [`HandlerGroup`]s. Each group names one
//! handler and the selectors it contributes; the first selector of a group
//! is its head. Selectors may be supplied either as a typed slice or as a
//! packed byte buffer (4 bytes per selector) that is read in place.

use rustc_hash::FxHashSet;

use loupe_core::{
    CategoryId, Error, HandlerRef, PackedSelectors, Result, Selector, SelectorTable,
};

/// Selectors contributed by one handler group
#[derive(Debug, Clone, Copy)]
pub enum SelectorList<'a> {
    /// Typed slice
    Slice(&'a [Selector]),
    /// Packed buffer, borrowed without copying
    Packed(PackedSelectors<'a>),
}

impl<'a> SelectorList<'a> {
    /// Number of selectors
    pub fn len(&self) -> usize {
        match self {
            SelectorList::Slice(s) => s.len(),
            SelectorList::Packed(p) => p.len(),
        }
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Selector at `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<Selector> {
        match self {
            SelectorList::Slice(s) => s.get(index).copied(),
            SelectorList::Packed(p) => p.get(index),
        }
    }

    /// First selector (the group head)
    pub fn head(&self) -> Option<Selector> {
        self.get(0)
    }

    /// Iterate in order
    pub fn iter(&self) -> impl Iterator<Item = Selector> + 'a {
        let list = *self;
        (0..list.len()).filter_map(move |i| list.get(i))
    }
}

/// One handler and the selectors it contributes to a batch
#[derive(Debug, Clone, Copy)]
pub struct HandlerGroup<'a> {
    /// Handler the selectors route to
    pub handler: HandlerRef,
    /// Category the selectors are cached under
    pub category: CategoryId,
    /// Selectors, head first
    pub selectors: SelectorList<'a>,
}

impl<'a> HandlerGroup<'a> {
    /// Group in the default category
    pub fn new(handler: HandlerRef, selectors: &'a [Selector]) -> Self {
        HandlerGroup {
            handler,
            category: CategoryId::DEFAULT,
            selectors: SelectorList::Slice(selectors),
        }
    }

    /// Group reading its selectors straight out of a packed buffer
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the buffer length is not a multiple of 4.
    pub fn packed(handler: HandlerRef, bytes: &'a [u8]) -> Result<Self> {
        let view = PackedSelectors::new(bytes).ok_or_else(|| {
            Error::invalid(format!(
                "packed selector buffer of {} bytes is not a multiple of 4",
                bytes.len()
            ))
        })?;
        Ok(HandlerGroup {
            handler,
            category: CategoryId::DEFAULT,
            selectors: SelectorList::Packed(view),
        })
    }

    /// Move the group into `category`
    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category = category;
        self
    }
}

/// Check a whole batch before anything is written
///
/// Returns the number of selectors the batch adds. Fails on the first
/// empty group or on any selector already present in `table` or repeated
/// within the batch.
pub fn validate_batch<T>(table: &T, batch: &[HandlerGroup<'_>]) -> Result<usize>
where
    T: SelectorTable + ?Sized,
{
    let mut seen = FxHashSet::default();
    let mut total = 0usize;
    for group in batch {
        if group.selectors.is_empty() {
            return Err(Error::EmptyHandlerGroup(group.handler));
        }
        for selector in group.selectors.iter() {
            if table.contains(selector) || !seen.insert(selector) {
                return Err(Error::DuplicateOperationId(selector));
            }
        }
        total += group.selectors.len();
    }
    Ok(total)
}

/// Check a removal list before anything is removed
pub fn validate_removals<T>(table: &T, selectors: &[Selector]) -> Result<()>
where
    T: SelectorTable + ?Sized,
{
    let mut seen = FxHashSet::default();
    for &selector in selectors {
        if !table.contains(selector) {
            return Err(Error::OperationNotFound(selector));
        }
        if !seen.insert(selector) {
            return Err(Error::invalid(format!(
                "selector {} listed twice for removal",
                selector
            )));
        }
    }
    Ok(())
}
