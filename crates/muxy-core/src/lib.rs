//! Core library for muxy-formula.
//!
//! - [`formula`]: the declarative release table and the descriptor resolver
//! - [`io`]: side effects (download + verify, zip extraction, placement)
//! - [`install`]: the fetch, verify, place sequence
//! - [`smoke`]: post-install self-test

pub mod formula;
pub mod install;
pub mod io;
pub mod paths;
pub mod reporter;
pub mod smoke;
pub mod types;

pub use formula::{Formula, FormulaError, FormulaTable};
pub use install::{InstallError, InstallReceipt, InstallRequest, Installer};
pub use paths::*;
pub use reporter::{NullReporter, Reporter};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("muxy-formula/", env!("CARGO_PKG_VERSION"));
