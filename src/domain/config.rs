use std::path::Path;

use serde::Deserialize;

/// Configuration for an amalgamation run.
///
/// Describes where the library keeps its interface and implementation
/// files, and how the linkage marker is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Versions")]
pub struct Config {
    /// Directory holding interface (header) files, relative to the root.
    pub include_dir: String,

    /// Directory holding implementation files, relative to the root.
    pub source_dir: String,

    /// Extension every quoted include target must carry, without the dot.
    pub header_extension: String,

    /// Extension of implementation files, without the dot.
    pub source_extension: String,

    /// The placeholder token marking symbols that need internal linkage.
    pub linkage_token: String,

    /// The keyword the linkage token is replaced with.
    ///
    /// For example, 'static'.
    pub linkage_keyword: String,

    /// Units whose lines are emitted without linkage rewriting.
    ///
    /// Includes inside these units are still followed.
    pub verbatim: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_dir: default_include_dir(),
            source_dir: default_source_dir(),
            header_extension: default_header_extension(),
            source_extension: default_source_extension(),
            linkage_token: default_linkage_token(),
            linkage_keyword: default_linkage_keyword(),
            verbatim: default_verbatim(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Checks whether a unit's lines are passed through without rewriting.
    #[must_use]
    pub fn is_verbatim(&self, unit: &str) -> bool {
        self.verbatim.iter().any(|v| v == unit)
    }
}

fn default_include_dir() -> String {
    "include".to_string()
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_header_extension() -> String {
    "h".to_string()
}

fn default_source_extension() -> String {
    "c".to_string()
}

fn default_linkage_token() -> String {
    "__AD_LINKAGE".to_string()
}

fn default_linkage_keyword() -> String {
    "static".to_string()
}

fn default_verbatim() -> Vec<String> {
    vec!["config".to_string()]
}

/// The on-disk versions of the configuration file, tagged by `_version`.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_include_dir")]
        include_dir: String,

        #[serde(default = "default_source_dir")]
        source_dir: String,

        #[serde(default = "default_header_extension")]
        header_extension: String,

        #[serde(default = "default_source_extension")]
        source_extension: String,

        #[serde(default = "default_linkage_token")]
        linkage_token: String,

        #[serde(default = "default_linkage_keyword")]
        linkage_keyword: String,

        #[serde(default = "default_verbatim")]
        verbatim: Vec<String>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                include_dir,
                source_dir,
                header_extension,
                source_extension,
                linkage_token,
                linkage_keyword,
                verbatim,
            } => Self {
                include_dir,
                source_dir,
                header_extension,
                source_extension,
                linkage_token,
                linkage_keyword,
                verbatim,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ninclude_dir = \"inc\"\nsource_dir = \"lib\"\nlinkage_keyword = \"static inline\"\nverbatim = [\"config\", \"platform\"]\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.include_dir, "inc");
        assert_eq!(config.source_dir, "lib");
        assert_eq!(config.linkage_keyword, "static inline");
        assert_eq!(config.linkage_token, "__AD_LINKAGE");
        assert!(config.is_verbatim("platform"));
        assert!(!config.is_verbatim("array"));
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nverbatim = \"config\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }
}
