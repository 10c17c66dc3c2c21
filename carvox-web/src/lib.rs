//! Web discovery for carvox.
//!
//! - Bing Web Search API client (`bing`) turning search hits into
//!   `"title: snippet"` review fragments
pub mod bing;

pub use bing::BingApi;
