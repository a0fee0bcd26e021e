//! Library entrypoint for scorewatch.
//!
//! Exposes all modules so integration tests can import them.

pub mod config;
pub mod feed;
pub mod reconcile;
pub mod store;
pub mod sync;
