//! Root accumulation across discovery rounds.
//!
//! Roots are collected with [`ProcessingContext::add_root`] while input is
//! discovered and analyzed once by [`ProcessingContext::finalize`].

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::analyzer::ComponentAnalyzer;
use crate::config::AnalysisConfig;
use crate::diagnostics::Diagnostics;
use crate::error::InjectconfError;
use crate::model::Universe;
use crate::plan::{ModulePlan, plan_module};

/// Roots waiting for analysis plus the configuration to analyze them with.
#[derive(Debug, Clone, Default)]
pub struct ProcessingContext {
    config: AnalysisConfig,
    roots: BTreeSet<String>,
}

/// Everything produced by [`ProcessingContext::finalize`].
#[derive(Debug, Default)]
pub struct ProcessingOutcome {
    /// One plan per analyzed root and enabled integration, skipping empty
    /// plans.
    pub plans: Vec<ModulePlan>,
    /// Site-level findings across all roots.
    pub diagnostics: Diagnostics,
    /// Roots whose analysis was aborted.
    pub fatal: Vec<InjectconfError>,
}

impl ProcessingOutcome {
    /// Returns `true` when a root was aborted or an error was reported.
    #[must_use]
    pub fn failed(&self) -> bool {
        !self.fatal.is_empty() || self.diagnostics.has_errors()
    }

    /// Converts the fatal errors into a single error, if any.
    #[must_use]
    pub fn fatal_error(self) -> Option<InjectconfError> {
        InjectconfError::try_aggregate(self.fatal)
    }
}

impl ProcessingContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            roots: BTreeSet::new(),
        }
    }

    /// Records a root component; repeated names are kept once.
    pub fn add_root(&mut self, name: impl Into<String>) {
        self.roots.insert(name.into());
    }

    /// Roots recorded so far, in analysis order.
    #[must_use = "iterators are lazy"]
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(String::as_str)
    }

    /// Analyzes every recorded root against `universe`.
    ///
    /// A fatal error for one root is collected and the remaining roots are
    /// still analyzed.
    #[must_use]
    pub fn finalize(self, universe: &Universe) -> ProcessingOutcome {
        let analyzer = ComponentAnalyzer::new(universe);
        let mut outcome = ProcessingOutcome::default();
        for root in &self.roots {
            let mut diagnostics = Diagnostics::new();
            let sites = match analyzer.analyze(root, &mut diagnostics) {
                Ok(sites) => sites,
                Err(err) => {
                    warn!(root = %root, error = %err, "root analysis aborted");
                    outcome.fatal.push(InjectconfError::graph(root.clone(), err));
                    outcome.diagnostics.extend(diagnostics);
                    continue;
                }
            };
            for &source in &self.config.sources {
                let plan = plan_module(universe, root, &sites, source, &self.config, &mut diagnostics);
                if !plan.is_empty() {
                    outcome.plans.push(plan);
                }
            }
            outcome.diagnostics.extend(diagnostics);
        }
        debug!(
            roots = self.roots.len(),
            plans = outcome.plans.len(),
            fatal = outcome.fatal.len(),
            "processing finalized"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::fixtures::{component, env, provision, string, universe};
    use rstest::rstest;

    #[rstest]
    fn one_fatal_root_does_not_stop_the_others() {
        let mut root = component("app.Good", &[], &[]);
        root.methods.push(provision("name", string(), vec![env("NAME")]));
        let universe = universe(vec![root]);

        let mut context = ProcessingContext::new(AnalysisConfig::default());
        context.add_root("app.Missing");
        context.add_root("app.Good");
        context.add_root("app.Good");
        assert_eq!(context.roots().count(), 2);

        let outcome = context.finalize(&universe);
        assert_eq!(outcome.fatal.len(), 1);
        assert_eq!(outcome.plans.len(), 1);
        assert!(outcome.failed());
        assert!(matches!(
            outcome.fatal_error(),
            Some(InjectconfError::Graph { root, .. }) if root == "app.Missing"
        ));
    }

    #[rstest]
    fn empty_context_produces_nothing() {
        let outcome = ProcessingContext::default().finalize(&universe(Vec::new()));
        assert!(outcome.plans.is_empty());
        assert!(!outcome.failed());
    }
}
