//! Line classification.
//!
//! The amalgamator is line oriented: each source line is either passed
//! through as text or names another unit through a quoted include directive.
//! This module is the only place that looks at raw line text.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use super::unit::UnitName;

static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#\s*include\s+"(\S*)"\s*$"#).expect("include pattern is valid")
});

/// A classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Text to be emitted (after linkage rewriting).
    Plain(&'a str),
    /// A quoted include directive naming another unit.
    Include(IncludeTarget),
}

/// The target of a quoted include directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeTarget {
    path: PathBuf,
    unit: UnitName,
}

impl IncludeTarget {
    /// The included path, relative to the interface directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The unit the included header belongs to.
    #[must_use]
    pub const fn unit(&self) -> &UnitName {
        &self.unit
    }
}

/// Classify a single line of source text.
///
/// `text` may carry its line terminator. Only lines consisting entirely of
/// `#include "<path>"` (with optional whitespace) are include directives;
/// angle-bracket includes and everything else are plain lines.
///
/// # Errors
///
/// Returns [`MalformedInclude`] if the line is a quoted include whose target
/// does not end in `header_extension`.
pub fn classify<'a>(text: &'a str, header_extension: &str) -> Result<Line<'a>, MalformedInclude> {
    let stripped = text.trim_end_matches(['\n', '\r']);
    let Some(captures) = INCLUDE_PATTERN.captures(stripped) else {
        return Ok(Line::Plain(text));
    };
    let target = &captures[1];
    let path = PathBuf::from(target);

    if path.extension() != Some(OsStr::new(header_extension)) {
        return Err(MalformedInclude(target.to_string()));
    }
    let unit = UnitName::from_path(&path).map_err(|_| MalformedInclude(target.to_string()))?;

    Ok(Line::Include(IncludeTarget { path, unit }))
}

/// A quoted include whose target is not a header.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("include target '{0}' is not a header file")]
pub struct MalformedInclude(String);

impl MalformedInclude {
    /// The offending include target, as written.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.0
    }
}
