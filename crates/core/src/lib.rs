//! slate - PDF plain-text extraction.
//!
//! Parses the PDF container (xref, object graph, streams), interprets page
//! content streams into positioned glyphs, and reassembles reading-order
//! text per page. The [`api::high_level::Pdf`] facade ties it together.

pub mod api;
pub mod codec;
pub mod converter;
pub mod document;
pub mod encoding;
pub mod error;
pub mod interp;
pub mod layout;
pub mod model;
pub mod parser;
pub mod utils;

pub use api::high_level::{extract_text, ExtractOptions, Pdf};
pub use document::catalog::Document;
pub use encoding::EncodingDetector;
pub use error::{PdfError, Result};
pub use layout::params::LaParams;
