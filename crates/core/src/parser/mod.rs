//! Low-level tokenization of PDF primitive objects.

pub mod lexer;

pub use lexer::{Lexer, ObjectParser, Token};
