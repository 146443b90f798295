use std::{fmt, ops::Deref, path::Path};

/// The logical name of a library unit.
///
/// A unit is a named component of the library with at most one interface
/// file and at most one implementation file. Its name is the file name of
/// its interface header with the extension stripped, so `include/array.h`
/// and `include/containers/array.h` both name the unit `array`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitName(String);

impl UnitName {
    /// Creates a new `UnitName`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitNameError` if the name is empty or contains a path
    /// separator.
    pub fn new(name: String) -> Result<Self, InvalidUnitNameError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(InvalidUnitNameError(name));
        }
        Ok(Self(name))
    }

    /// Derives the unit name from the file stem of `path`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitNameError` if the path has no UTF-8 file stem.
    pub fn from_path(path: &Path) -> Result<Self, InvalidUnitNameError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| InvalidUnitNameError(path.display().to_string()))?;
        Self::new(stem.to_string())
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier used to build guard macros for this unit.
    ///
    /// Upper-cased, with every character that cannot appear in a C identifier
    /// replaced by `_`.
    #[must_use]
    pub fn guard_stem(&self) -> String {
        guard_stem(&self.0)
    }
}

/// Upper-cases `name` and replaces non-identifier characters with `_`.
pub(crate) fn guard_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

impl TryFrom<&str> for UnitName {
    type Error = InvalidUnitNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl Deref for UnitName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string cannot name a unit.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid unit name '{0}': must be a non-empty file name")]
pub struct InvalidUnitNameError(String);
