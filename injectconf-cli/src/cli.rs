//! Command-line interface definitions for `injectconf`.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use injectconf::{ConflictPolicy, SourceKind};

/// Source integrations selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Environment variables.
    Env,
    /// System properties.
    SystemProperty,
    /// Remote parameter store entries.
    RemoteParameter,
    /// Command-line arguments of the generated program.
    Cli,
}

impl From<SourceArg> for SourceKind {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Env => Self::Env,
            SourceArg::SystemProperty => Self::SystemProperty,
            SourceArg::RemoteParameter => Self::RemoteParameter,
            SourceArg::Cli => Self::Cli,
        }
    }
}

/// Severity of requiredness conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Warn and treat the parameter as required.
    Warn,
    /// Report an error.
    Error,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Warn => Self::Warn,
            PolicyArg::Error => Self::Error,
        }
    }
}

/// Parsed CLI arguments for `injectconf`.
#[derive(Debug, Parser)]
#[command(name = "injectconf")]
#[command(about = "Plan configuration provider modules for a dependency-injection graph")]
#[command(version)]
pub struct Args {
    /// Serialized graph document (JSON).
    #[arg(long, value_name = "path")]
    pub graph: Utf8PathBuf,
    /// Root component to analyze (repeat for several; default: every component).
    #[arg(long = "root", value_name = "type")]
    pub roots: Vec<String>,
    /// TOML configuration layered between defaults and `INJECTCONF_*` variables.
    #[arg(long, value_name = "path")]
    pub config: Option<Utf8PathBuf>,
    /// Directory receiving `plans/<Root>.<source>.json`.
    #[arg(long, value_name = "path", default_value = "target/injectconf")]
    pub out_dir: Utf8PathBuf,
    /// Source integration to plan (repeat for several; default: from configuration).
    #[arg(long = "source", value_enum, value_name = "kind")]
    pub sources: Vec<SourceArg>,
    /// Override the configured conflict policy.
    #[arg(long, value_enum)]
    pub conflict_policy: Option<PolicyArg>,
    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn repeated_flags_accumulate() -> Result<(), clap::Error> {
        let args = Args::try_parse_from([
            "injectconf",
            "--graph",
            "graph.json",
            "--root",
            "app.A",
            "--root",
            "app.B",
            "--source",
            "env",
            "--source",
            "system-property",
            "--conflict-policy",
            "error",
        ])?;
        assert_eq!(args.roots, vec!["app.A", "app.B"]);
        assert_eq!(args.sources, vec![SourceArg::Env, SourceArg::SystemProperty]);
        assert_eq!(args.conflict_policy, Some(PolicyArg::Error));
        assert_eq!(args.out_dir, Utf8PathBuf::from("target/injectconf"));
        Ok(())
    }

    #[rstest]
    fn graph_is_mandatory() {
        assert!(Args::try_parse_from(["injectconf"]).is_err());
    }
}
