//! Error types for the slate extraction pipeline.

use thiserror::Error;

/// Primary error type for PDF extraction operations.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Container-level damage: header, xref, trailer or object graph is
    /// unusable. Fatal for the whole document.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The supplied credential was rejected by the security handler.
    #[error("authentication failed: password rejected")]
    AuthError,

    /// The page tree revisits a node; traversal would never terminate.
    #[error("cyclic page tree at object {0}")]
    CyclicPageTree(u32),

    /// A page's content stream has unparsable operator syntax. Page-scoped:
    /// the page yields partial or empty text, extraction continues.
    #[error("corrupt content stream: {0}")]
    CorruptContentStream(String),

    /// Encoding detection gave no usable guess for the extracted bytes.
    #[error("unknown text encoding (confidence {confidence:.2} below {threshold:.2})")]
    UnknownEncoding { confidence: f32, threshold: f32 },

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("PDF syntax error: {0}")]
    SyntaxError(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
