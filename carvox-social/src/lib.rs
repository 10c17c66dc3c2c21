//! Social network clients and extractors used by carvox.
//!
//! Only Reddit is implemented. See [`reddit::RedditApi`] for the request flow
//! and [`reddit::extract`] for how listings become review fragments.
pub mod reddit;

pub use reddit::RedditApi;
