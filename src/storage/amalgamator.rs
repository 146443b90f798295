//! Flattening a library into a single header
//!
//! The [`Amalgamator`] walks the include graph depth first, starting at an
//! entry header, and writes every reachable unit into one output stream:
//! first the unit's interface, then its implementation wrapped in a guard.
//! Each unit is emitted once, no matter how many paths lead to it.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    domain::{
        Config, IncludeTarget, Line, MalformedInclude, UnitName, classify,
        unit::{InvalidUnitNameError, guard_stem},
    },
    storage::layout::{Layout, UnitFiles},
};

/// Flattens a library into a single header.
#[derive(Debug, Clone, Default)]
pub struct Amalgamator {
    layout: Layout,
    config: Config,
}

/// What an amalgamation run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// The units emitted, in output order.
    pub units: Vec<UnitName>,
    /// The number of source lines written.
    pub lines: usize,
    /// The number of linkage markers rewritten.
    pub rewrites: usize,
    /// Headers skipped because an earlier header had the same unit name.
    pub shadowed: Vec<PathBuf>,
}

impl Amalgamator {
    /// Creates an amalgamator for the library at `layout`.
    #[must_use]
    pub const fn new(layout: Layout, config: Config) -> Self {
        Self { layout, config }
    }

    /// Amalgamates the library reachable from `entry` into `sink`.
    ///
    /// `artifact` names the output; it determines the outer include guard.
    /// The sink is flushed but not closed.
    ///
    /// # Errors
    ///
    /// This method fails if:
    ///
    /// - a quoted include does not name a header file
    /// - the entry file or an included header does not exist
    /// - a source file cannot be read
    /// - the sink cannot be written to
    ///
    /// On failure the sink holds a partial, unterminated output.
    #[instrument(skip(self, sink))]
    pub fn amalgamate<W: Write>(
        &self,
        entry: &Path,
        artifact: &str,
        sink: W,
    ) -> Result<Summary, Error> {
        let entry = self.layout.resolve_entry(entry)?;
        let guard = format!("__{}_SINGLE_HEADER_INCLUDE__", guard_stem(artifact));

        let mut traversal = Traversal {
            amalgamator: self,
            sink,
            visited: BTreeMap::new(),
            summary: Summary::default(),
        };

        traversal.write(&format!("#ifndef {guard}\n#define {guard}\n\n"))?;
        traversal.visit(entry)?;
        traversal.write("\n#endif\n")?;
        traversal.sink.flush().map_err(Error::Write)?;

        tracing::info!(
            "Amalgamated {} units into {artifact} ({} lines, {} linkage rewrites)",
            traversal.summary.units.len(),
            traversal.summary.lines,
            traversal.summary.rewrites,
        );
        Ok(traversal.summary)
    }
}

/// Amalgamates the library in the current directory using the default
/// configuration.
///
/// # Errors
///
/// See [`Amalgamator::amalgamate`].
pub fn amalgamate<W: Write>(entry: &Path, artifact: &str, sink: W) -> Result<Summary, Error> {
    Amalgamator::default().amalgamate(entry, artifact, sink)
}

/// The state of one amalgamation run.
struct Traversal<'a, W> {
    amalgamator: &'a Amalgamator,
    sink: W,
    /// Emitted units, with the interface file each was emitted from.
    visited: BTreeMap<UnitName, PathBuf>,
    summary: Summary,
}

impl<W: Write> Traversal<'_, W> {
    #[instrument(skip_all, fields(unit = %files.name))]
    fn visit(&mut self, files: UnitFiles) -> Result<(), Error> {
        if self.visited.contains_key(&files.name) {
            tracing::debug!("Unit {} already emitted", files.name);
            return Ok(());
        }
        self.visited.insert(files.name.clone(), files.interface.clone());
        self.summary.units.push(files.name.clone());

        let interface = fs::read_to_string(&files.interface).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingFile {
                unit: files.name.clone(),
                path: files.interface.clone(),
            },
            _ => Error::Read {
                path: files.interface.clone(),
                source: e,
            },
        })?;
        self.emit(&files.name, &files.interface, &interface)?;

        if !files.implementation.is_file() {
            tracing::debug!(
                "No implementation for {} at {}",
                files.name,
                files.implementation.display()
            );
            return Ok(());
        }
        let implementation = fs::read_to_string(&files.implementation).map_err(|e| Error::Read {
            path: files.implementation.clone(),
            source: e,
        })?;

        let guard = format!("__{}_IMPLEMENTATION__", files.name.guard_stem());
        self.write(&format!("#ifndef {guard}\n#define {guard}\n"))?;
        self.emit(&files.name, &files.implementation, &implementation)?;
        self.write(&format!("#endif /* {guard} */\n"))
    }

    /// Writes the lines of one source file, following includes.
    fn emit(&mut self, unit: &UnitName, path: &Path, content: &str) -> Result<(), Error> {
        let amalgamator = self.amalgamator;
        let config = &amalgamator.config;
        let rewrite = !config.linkage_token.is_empty() && !config.is_verbatim(unit);

        for (number, text) in content.split_inclusive('\n').enumerate() {
            let line = classify(text, &config.header_extension).map_err(|source| {
                Error::MalformedInclude {
                    file: path.to_path_buf(),
                    line: number + 1,
                    source,
                }
            })?;

            match line {
                Line::Include(target) => self.include(&target)?,
                Line::Plain(text) if rewrite && text.contains(&config.linkage_token) => {
                    self.summary.rewrites += text.matches(&config.linkage_token).count();
                    let text = text.replace(&config.linkage_token, &config.linkage_keyword);
                    self.write_line(&text)?;
                }
                Line::Plain(text) => self.write_line(text)?,
            }
        }
        Ok(())
    }

    fn include(&mut self, target: &IncludeTarget) -> Result<(), Error> {
        let files = self.amalgamator.layout.resolve(target);
        self.write("\n")?;

        let Some(emitted) = self.visited.get(target.unit()) else {
            tracing::debug!(
                "Resolved {} to {}",
                target.path().display(),
                files.interface.display()
            );
            return self.visit(files);
        };

        if same_file(emitted, &files.interface) {
            tracing::trace!("Skipping repeated include of {}", target.path().display());
        } else {
            tracing::warn!(
                "Skipping {}: unit '{}' was already emitted from {}",
                files.interface.display(),
                files.name,
                emitted.display()
            );
            self.summary.shadowed.push(files.interface);
        }
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<(), Error> {
        self.summary.lines += 1;
        self.write(text)?;
        if text.ends_with('\n') {
            Ok(())
        } else {
            self.write("\n")
        }
    }

    fn write(&mut self, text: &str) -> Result<(), Error> {
        self.sink.write_all(text.as_bytes()).map_err(Error::Write)
    }
}

/// Whether two paths name the same file, falling back to comparing the paths
/// themselves when either cannot be resolved.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Errors that abort an amalgamation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A quoted include names something other than a header.
    #[error("{}:{line}: {source}", file.display())]
    MalformedInclude {
        /// The file containing the include.
        file: PathBuf,
        /// The 1-based line number of the include.
        line: usize,
        /// The offending target.
        source: MalformedInclude,
    },

    /// A unit's interface file does not exist.
    #[error("unit '{unit}' has no interface file at {}", path.display())]
    MissingFile {
        /// The unit being visited.
        unit: UnitName,
        /// Where its interface file was expected.
        path: PathBuf,
    },

    /// A source file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The output could not be written.
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),

    /// The entry path does not name a unit.
    #[error(transparent)]
    InvalidEntry(#[from] InvalidUnitNameError),
}
