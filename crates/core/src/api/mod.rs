//! High-level extraction API.

pub mod high_level;

pub use high_level::{extract_text, ExtractOptions, Pdf};
