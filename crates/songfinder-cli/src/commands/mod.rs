//! CLI command implementations.

pub mod devices;
pub mod listen;
pub mod state;
