//! Fixture feed: models and HTTP client for the Fantasy Premier League API.

pub mod client;
pub mod models;

pub use client::{FeedError, FplClient};
