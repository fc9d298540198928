//! Content-stream interpretation.

pub mod content;
pub mod device;
pub mod interpreter;

pub use device::TextDevice;
pub use interpreter::PageInterpreter;
