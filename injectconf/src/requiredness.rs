//! Requiredness reconciliation.
//!
//! A site alone requires its parameter when it is neither nullable nor
//! defaulted. When a parameter's sites disagree the parameter is treated as
//! required and the disagreement is reported at the severity chosen by
//! [`ConflictPolicy`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::config::ConflictPolicy;
use crate::diagnostics::Diagnostics;
use crate::keys::KeyGroups;
use crate::source::ParameterKey;

/// Reconciled facts about one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterMetadata {
    /// Whether a missing value fails initialization.
    pub required: bool,
}

/// Computes [`ParameterMetadata`] for every grouped parameter.
#[must_use]
pub fn reconcile(
    groups: &KeyGroups,
    policy: ConflictPolicy,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<ParameterKey, ParameterMetadata> {
    let source = groups.source();
    let mut out = BTreeMap::new();
    for (key, usages) in groups.iter() {
        let votes: BTreeSet<bool> = usages.iter().map(|usage| usage.locally_required()).collect();
        let required = if votes.len() > 1 {
            let message = format!(
                "{source} {key} is required at some sites and optional at others; treating it as required"
            );
            match policy {
                ConflictPolicy::Warn => diagnostics.warning(None, message),
                ConflictPolicy::Error => diagnostics.error(None, message),
            }
            true
        } else {
            votes.contains(&true)
        };

        if required {
            for usage in usages {
                if usage.nullable {
                    diagnostics.warning(
                        Some(&usage.element),
                        format!("{} is nullable but {source} {key} is required", usage.element),
                    );
                }
                if let Some(default) = usage.effective_default() {
                    diagnostics.warning(
                        Some(&usage.element),
                        format!(
                            "default '{default}' of {} is ignored because {source} {key} is required",
                            usage.element
                        ),
                    );
                }
            }
        }
        debug!(parameter = %key, required, "reconciled requiredness");
        out.insert(key.clone(), ParameterMetadata { required });
    }
    out
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::analyzer::ComponentAnalyzer;
    use crate::diagnostics::Severity;
    use crate::keys::extract_keys;
    use crate::model::{Annotation, TypeRef, Universe};
    use crate::source::CliSource;
    use crate::walker::fixtures::{component, provision, string, universe};
    use rstest::rstest;

    const CLI_MARKER: &str = "io.injectconf.CommandLine";

    fn port(default: Option<&str>) -> Annotation {
        default.into_iter().fold(
            Annotation::new(CLI_MARKER).with_str("longName", "port"),
            |marker, default| marker.with_str("defaultValue", default),
        )
    }

    fn groups(universe: &Universe) -> anyhow::Result<KeyGroups> {
        let mut diagnostics = Diagnostics::new();
        let sites = ComponentAnalyzer::new(universe).analyze("app.Root", &mut diagnostics)?;
        Ok(extract_keys(
            universe,
            &sites,
            &CliSource,
            CLI_MARKER,
            &mut diagnostics,
        ))
    }

    fn port_graph() -> Universe {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision("port", string(), vec![port(None)]));
        root.methods
            .push(provision("portOrDefault", string(), vec![port(Some("8080"))]));
        universe(vec![root])
    }

    fn long_port() -> ParameterKey {
        ParameterKey::CliOption {
            short: None,
            long: Some("port".into()),
        }
    }

    #[rstest]
    fn conflicting_sites_warn_and_require() -> anyhow::Result<()> {
        let groups = groups(&port_graph())?;
        let mut diagnostics = Diagnostics::new();
        let metadata = reconcile(&groups, ConflictPolicy::Warn, &mut diagnostics);

        assert_eq!(
            metadata.get(&long_port()),
            Some(&ParameterMetadata { required: true })
        );
        assert!(!diagnostics.has_errors());
        let first = diagnostics
            .with_severity(Severity::Warning)
            .next()
            .map(|diagnostic| diagnostic.message.clone())
            .unwrap_or_default();
        assert!(first.contains("--port"), "{first}");
        assert_eq!(diagnostics.len(), 2, "{:?}", diagnostics.entries());
        Ok(())
    }

    #[rstest]
    fn error_policy_reports_an_error() -> anyhow::Result<()> {
        let groups = groups(&port_graph())?;
        let mut diagnostics = Diagnostics::new();
        let metadata = reconcile(&groups, ConflictPolicy::Error, &mut diagnostics);
        assert!(diagnostics.has_errors());
        assert!(metadata.values().all(|meta| meta.required));
        Ok(())
    }

    #[rstest]
    #[case::nullable_marker(string(), vec![Annotation::new("javax.annotation.Nullable")])]
    #[case::optional_wrapper(
        TypeRef::generic("java.util.Optional", vec![string()]),
        Vec::new()
    )]
    fn nullable_sites_of_a_required_parameter_are_flagged(
        #[case] ty: TypeRef,
        #[case] extra: Vec<Annotation>,
    ) -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision("port", string(), vec![port(None)]));
        let mut annotations = vec![port(None)];
        annotations.extend(extra);
        root.methods.push(provision("maybePort", ty, annotations));
        let groups = groups(&universe(vec![root]))?;
        let mut diagnostics = Diagnostics::new();
        let metadata = reconcile(&groups, ConflictPolicy::Warn, &mut diagnostics);

        assert_eq!(
            metadata.get(&long_port()),
            Some(&ParameterMetadata { required: true })
        );
        let nullable: Vec<&str> = diagnostics
            .with_severity(Severity::Warning)
            .map(|diagnostic| diagnostic.message.as_str())
            .filter(|message| message.contains("is nullable but"))
            .collect();
        assert_eq!(nullable.len(), 1, "{:?}", diagnostics.entries());
        assert!(
            nullable.iter().all(|message| {
                message.starts_with("app.Root#maybePort()") && message.ends_with("--port is required")
            }),
            "{nullable:?}"
        );
        Ok(())
    }

    #[rstest]
    #[case::all_defaulted(Some("8080"), Some("8080"), false)]
    #[case::all_required(None, None, true)]
    #[case::mixed(None, Some("8080"), true)]
    fn requiredness_is_monotone(
        #[case] first: Option<&str>,
        #[case] second: Option<&str>,
        #[case] expected: bool,
    ) -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision("a", string(), vec![port(first)]));
        root.methods.push(provision("b", string(), vec![port(second)]));
        let groups = groups(&universe(vec![root]))?;
        let metadata = reconcile(&groups, ConflictPolicy::Warn, &mut Diagnostics::new());
        assert_eq!(metadata.get(&long_port()).map(|meta| meta.required), Some(expected));
        Ok(())
    }
}
