//! Layout analysis: positioned glyphs into lines and text boxes.

pub mod analysis;
pub mod elements;
pub mod params;

pub use analysis::PageAggregator;
pub use elements::{PageLayout, TextBox, TextChar, TextLine};
pub use params::LaParams;
