use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::ArgAction;
use single_header::{Amalgamator, Config, Layout};
use tracing::instrument;

/// The name of the configuration file looked up in the library root.
const CONFIG_FILE: &str = "single-header.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// The root of the library, holding the include and source directories
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Configuration file (defaults to `single-header.toml` in the root, if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keyword the linkage marker is rewritten to
    #[arg(long, value_name = "KEYWORD")]
    linkage: Option<String>,

    /// The entry header of the library
    input: PathBuf,

    /// Where to write the single header
    ///
    /// The file name, without its extension, names the artifact.
    output: PathBuf,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.amalgamate()
    }

    #[instrument(skip(self), fields(input = %self.input.display(), output = %self.output.display()))]
    fn amalgamate(self) -> anyhow::Result<()> {
        let mut config = self.load_config()?;
        if let Some(keyword) = self.linkage {
            config.linkage_keyword = keyword;
        }

        let artifact = self
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("invalid output path: {}", self.output.display()))?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = File::create(&self.output)
            .with_context(|| format!("failed to create {}", self.output.display()))?;

        let layout = Layout::new(&self.root, &config);
        let summary = Amalgamator::new(layout, config)
            .amalgamate(&self.input, artifact, BufWriter::new(file))
            .with_context(|| {
                format!(
                    "failed to amalgamate {}; {} is incomplete",
                    self.input.display(),
                    self.output.display()
                )
            })?;

        tracing::info!(
            "Wrote {} ({} units)",
            self.output.display(),
            summary.units.len()
        );
        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        if let Some(path) = &self.config {
            return Config::load(path).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()));
        }
        Ok(load_config(&self.root))
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        // Fails only if a subscriber is already installed.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        return Config::default();
    }
    Config::load(&path).unwrap_or_else(|e| {
        tracing::warn!("Ignoring {}: {e}", path.display());
        Config::default()
    })
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use tempfile::TempDir;

    use super::*;

    fn library() -> TempDir {
        let tmp = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(tmp.path().join("include")).unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(
            tmp.path().join("include/mylib.h"),
            "#include \"util.h\"\n__AD_LINKAGE int mylib(void);\n",
        )
        .unwrap();
        fs::write(tmp.path().join("include/util.h"), "int util(void);\n").unwrap();
        fs::write(
            tmp.path().join("src/mylib.c"),
            "__AD_LINKAGE int mylib(void) { return util(); }\n",
        )
        .unwrap();
        tmp
    }

    fn run(tmp: &TempDir, extra: &[&str]) -> anyhow::Result<String> {
        let root = tmp.path().to_str().unwrap();
        let input = tmp.path().join("include/mylib.h");
        let output = tmp.path().join("dist/mylib.h");

        let mut args = vec!["single-header", "--root", root];
        args.extend_from_slice(extra);
        args.push(input.to_str().unwrap());
        args.push(output.to_str().unwrap());

        Cli::try_parse_from(args)?.run()?;
        Ok(fs::read_to_string(output)?)
    }

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_is_guarded_by_artifact_name() {
        let tmp = library();

        let output = run(&tmp, &[]).unwrap();

        assert!(output.starts_with("#ifndef __MYLIB_SINGLE_HEADER_INCLUDE__\n"));
        assert!(output.ends_with("\n#endif\n"));
        assert!(output.contains("static int mylib(void) { return util(); }\n"));
        assert!(output.find("int util(void);") < output.find("static int mylib(void);"));
    }

    #[test]
    fn linkage_flag_overrides_keyword() {
        let tmp = library();

        let output = run(&tmp, &["--linkage", "static inline"]).unwrap();

        assert!(output.contains("static inline int mylib(void);\n"));
    }

    #[test]
    fn root_config_file_is_used() {
        let tmp = library();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "_version = \"1\"\nverbatim = [\"mylib\"]\n",
        )
        .unwrap();

        let output = run(&tmp, &[]).unwrap();

        assert!(output.contains("__AD_LINKAGE int mylib(void);\n"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let tmp = library();
        let missing = tmp.path().join("missing.toml");

        let error = run(&tmp, &["--config", missing.to_str().unwrap()]).unwrap_err();

        assert!(error.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn failure_reports_incomplete_output() {
        let tmp = library();
        fs::write(tmp.path().join("include/util.h"), "#include \"util.c\"\n").unwrap();

        let error = run(&tmp, &[]).unwrap_err();

        assert!(error.to_string().contains("is incomplete"));
        let partial = fs::read_to_string(tmp.path().join("dist/mylib.h")).unwrap();
        assert!(!partial.ends_with("\n#endif\n"));
    }
}
