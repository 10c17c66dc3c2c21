//! The carvox lookup pipeline: fetch forum and web reviews for one car model,
//! print them, and print a language-model summary.
pub mod pipeline;

pub use pipeline::{Report, conclude, run_pipeline};
