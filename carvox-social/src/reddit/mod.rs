//! Reddit API integration: application-only OAuth, subreddit search, and
//! top-level comment retrieval.
//!
//! Submodules provide the HTTP client wrapper, the listing models, and the
//! pure helpers that turn submissions and comments into review fragments.
pub mod client;
pub mod extract;
pub mod types;

pub use client::RedditApi;
