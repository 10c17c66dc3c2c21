//! Bing Web Search v7 integration.
pub mod client;
pub mod types;

pub use client::{BingApi, review_query};
