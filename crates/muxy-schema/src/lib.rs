//! Shared value types for muxy-formula.
//!
//! Everything in this crate is plain data: no I/O, no network. The core
//! crate builds the formula table and install procedure on top of these.

pub mod arch;
pub mod digest;
pub mod types;

// Re-exports
pub use arch::*;
pub use digest::*;
pub use types::*;
