//! Mapping units onto the library's directory layout
//!
//! A library keeps interface files under one directory and implementation
//! files under another, with matching relative paths:
//!
//! - `include/array.h` ↔ `src/array.c`
//! - `include/containers/rb_tree.h` ↔ `src/containers/rb_tree.c`

use std::path::{Component, Path, PathBuf};

use crate::domain::{Config, IncludeTarget, UnitName, unit::InvalidUnitNameError};

/// The on-disk layout of a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    include_dir: PathBuf,
    source_dir: PathBuf,
    source_extension: String,
}

/// The files belonging to one unit.
///
/// Neither file is guaranteed to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFiles {
    /// The unit these files belong to.
    pub name: UnitName,
    /// The interface (header) file.
    pub interface: PathBuf,
    /// The implementation file.
    pub implementation: PathBuf,
}

impl Layout {
    /// Builds the layout of the library rooted at `root`.
    #[must_use]
    pub fn new(root: &Path, config: &Config) -> Self {
        Self {
            include_dir: root.join(&config.include_dir),
            source_dir: root.join(&config.source_dir),
            source_extension: config.source_extension.clone(),
        }
    }

    /// Path of the interface file for a header path relative to the include
    /// directory.
    #[must_use]
    pub fn interface_path(&self, relative: &Path) -> PathBuf {
        self.include_dir.join(relative)
    }

    /// Path of the implementation file paired with a header path relative to
    /// the include directory.
    #[must_use]
    pub fn implementation_path(&self, relative: &Path) -> PathBuf {
        self.source_dir
            .join(relative)
            .with_extension(&self.source_extension)
    }

    /// Resolves the files of a unit named by an include directive.
    #[must_use]
    pub fn resolve(&self, target: &IncludeTarget) -> UnitFiles {
        UnitFiles {
            name: target.unit().clone(),
            interface: self.interface_path(target.path()),
            implementation: self.implementation_path(target.path()),
        }
    }

    /// Resolves the files of the entry unit.
    ///
    /// The entry's interface file is `entry` itself, wherever it lives. Its
    /// implementation is found by the entry's path relative to the include
    /// directory, or by its file name when the entry lies outside it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry path has no usable file name.
    pub fn resolve_entry(&self, entry: &Path) -> Result<UnitFiles, InvalidUnitNameError> {
        let name = UnitName::from_path(entry)?;
        let relative = without_cur_dir(entry)
            .strip_prefix(without_cur_dir(&self.include_dir))
            .map_or_else(
                |_| PathBuf::from(entry.file_name().unwrap_or_default()),
                Path::to_path_buf,
            );

        Ok(UnitFiles {
            name,
            interface: entry.to_path_buf(),
            implementation: self.implementation_path(&relative),
        })
    }
}

/// Drops `.` components, so `./include/a.h` and `include/a.h` compare equal.
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(Path::new("."), &Config::default())
    }
}
