//! Error types for Loupe
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every error aborts the current call. Mutations that fail leave the
//! registry and cache exactly as they were before the call.

use crate::types::{BlobRef, CategoryId, HandlerRef, Selector};
use std::io;
use thiserror::Error;

/// Result type alias for Loupe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Loupe
#[derive(Debug, Error)]
pub enum Error {
    /// A batch tried to add a selector that is already registered
    /// (or appears twice in the same batch)
    #[error("Duplicate operation id: {0}")]
    DuplicateOperationId(Selector),

    /// No entry exists for the selector
    #[error("Operation not found: {0}")]
    OperationNotFound(Selector),

    /// A stored snapshot failed validation on decode
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// A rebuild was requested for a category with no entries
    #[error("No entries for {0}")]
    NoEntriesForCategory(CategoryId),

    /// A handler group in a batch contributed no selectors
    #[error("Handler {0} contributes no operation ids")]
    EmptyHandlerGroup(HandlerRef),

    /// Replace would map a selector to the handler it already has
    #[error("Operation {selector} is already routed to {handler}")]
    SameHandler {
        /// Selector being replaced
        selector: Selector,
        /// Handler it already maps to
        handler: HandlerRef,
    },

    /// Cache was already enabled for the category
    #[error("Cache already enabled for {0}")]
    CacheAlreadyEnabled(CategoryId),

    /// Cache admin operation on a category whose cache is disabled
    #[error("Cache not enabled for {0}")]
    CacheNotEnabled(CategoryId),

    /// No blob stored under the reference
    #[error("Blob not found: {0}")]
    BlobNotFound(BlobRef),

    /// Blob exceeds the store's maximum object size
    #[error("Blob too large: {size} bytes exceeds limit of {max}")]
    BlobTooLarge {
        /// Size of the rejected payload
        size: usize,
        /// Store limit
        max: usize,
    },

    /// Stored bytes do not match their content address
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Selector resolved to a handler with no bound implementation
    #[error("Handler unavailable: {0}")]
    HandlerUnavailable(HandlerRef),

    /// Failure raised by a handler implementation
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    /// Invalid operation or input
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (disk blob store, config files)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl Error {
    /// Create a MalformedSnapshot error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedSnapshot(reason.into())
    }

    /// Create an InvalidOperation error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidOperation(reason.into())
    }

    /// Whether this error was raised while validating snapshot bytes
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedSnapshot(_))
    }
}
