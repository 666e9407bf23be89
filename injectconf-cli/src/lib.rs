//! Library interface for the `injectconf` driver.
//!
//! The driver reads a serialized dependency graph, layers the analysis
//! configuration, analyzes the requested root components, and writes one
//! provider module plan per root and source integration.

pub mod cli;
pub mod digest;
pub mod error;
pub mod logging;
pub mod output;

use camino::Utf8PathBuf;
use injectconf::{
    AnalysisConfig, Diagnostics, GraphDocument, InjectconfError, ProcessingContext, SourceKind,
    Universe,
};
use tracing::info;

use crate::cli::Args;
use crate::error::InjectconfCliError;

/// What one run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Plans written, in root then source order.
    pub written: Vec<Utf8PathBuf>,
    /// Findings across all roots.
    pub diagnostics: Diagnostics,
    /// Roots whose analysis was aborted.
    pub fatal: Vec<InjectconfError>,
}

impl RunReport {
    /// Returns `true` when the run should exit unsuccessfully.
    #[must_use]
    pub fn failed(&self) -> bool {
        !self.fatal.is_empty() || self.diagnostics.has_errors()
    }
}

/// Merges command-line overrides over the layered configuration.
///
/// # Errors
///
/// Returns [`InjectconfCliError::Analysis`] when the configuration layers
/// cannot be loaded.
pub fn load_config(args: &Args) -> Result<AnalysisConfig, InjectconfCliError> {
    let mut config = AnalysisConfig::load(args.config.as_deref())?;
    if let Some(policy) = args.conflict_policy {
        config.conflict_policy = policy.into();
    }
    if !args.sources.is_empty() {
        config.sources = args.sources.iter().copied().map(SourceKind::from).collect();
    }
    Ok(config)
}

/// Runs the full pipeline for `args`.
///
/// # Errors
///
/// Returns an error when the graph or configuration cannot be read or a plan
/// cannot be written. Per-root failures are reported in [`RunReport`].
pub fn run(args: &Args) -> Result<RunReport, InjectconfCliError> {
    let config = load_config(args)?;
    let input = digest::read_graph(&args.graph)?;
    let document = GraphDocument::from_json(&input.json)?;
    let universe = Universe::new(document, config.conventions.clone(), config.markers.clone());

    let roots = if args.roots.is_empty() {
        universe.component_names()
    } else {
        args.roots.clone()
    };
    let mut context = ProcessingContext::new(config);
    for root in roots {
        context.add_root(root);
    }
    let outcome = context.finalize(&universe);

    let mut written = Vec::with_capacity(outcome.plans.len());
    for mut plan in outcome.plans {
        plan.graph_digest = Some(input.digest.clone());
        let path = output::write_plan(&args.out_dir, &plan)?;
        info!(path = %path, providers = plan.providers.len(), "wrote plan");
        written.push(path);
    }
    Ok(RunReport {
        written,
        diagnostics: outcome.diagnostics,
        fatal: outcome.fatal,
    })
}
