//! Single-header amalgamation
//!
//! Flattens a C library of paired interface and implementation files into
//! one self-contained header. Quoted includes are expanded depth first, each
//! unit is emitted once, and implementation bodies are wrapped in guards so
//! the result can be included repeatedly.

pub mod domain;
pub use domain::{Config, Line, UnitName, classify};

/// Filesystem layout and the amalgamation engine.
pub mod storage;
pub use storage::{Amalgamator, Error, Layout, Summary, amalgamate};
