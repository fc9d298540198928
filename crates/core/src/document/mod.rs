//! Document container: xref resolution, object store, encryption and the
//! page tree.

pub mod catalog;
pub mod page;
pub mod security;

pub use catalog::Document;
pub use page::Page;
