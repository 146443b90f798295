//! Domain models for amalgamation.
//!
//! This module contains the core domain types: unit names, line
//! classification and configuration.

/// Unit names and guard-name derivation.
pub mod unit;
pub use unit::UnitName;

/// Classification of source lines.
pub mod line;
pub use line::{IncludeTarget, Line, MalformedInclude, classify};

mod config;
pub use config::Config;
