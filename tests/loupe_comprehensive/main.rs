//! Loupe comprehensive tests
//!
//! End-to-end checks across registry, enumeration, cache and router:
//! - scenarios: the fixed behaviors callers rely on
//! - differential: all strategies and both registries agree
//! - cache_modes: Disabled vs Enabled semantics, staleness, idempotence
//! - persistence: disk blob store and `loupe.toml`

#[path = "../common/mod.rs"]
mod common;

mod cache_modes;
mod differential;
mod persistence;
mod scenarios;
