//! Core PDF value types and interpreter state.

pub mod objects;
pub mod state;
