//! Passes over the intermediate representation.

pub mod ir_to_pretty;
pub mod resolve_imports;
