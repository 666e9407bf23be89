//! Module plans: the structured description of one generated provider
//! module per (root component, integration) pair.

use std::collections::{BTreeMap, BTreeSet};

use heck::ToUpperCamelCase;
use serde::Serialize;
use tracing::debug;

use crate::analyzer::SiteSet;
use crate::config::AnalysisConfig;
use crate::conversion::{Conversion, resolve};
use crate::diagnostics::Diagnostics;
use crate::keys::{RepresentationKey, extract_keys, is_native, native_type};
use crate::model::{TypeRef, Universe};
use crate::requiredness::reconcile;
use crate::runtime::{InitializationError, provide_value};
use crate::source::{ParameterKey, SourceKind};

/// One generated provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderPlan {
    /// Generated method name, unique within the module.
    pub method_name: String,
    /// Parameter read.
    pub key: ParameterKey,
    /// Type the provider returns.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Form the source yields before conversion.
    pub native_type: TypeRef,
    /// Effective default.
    pub default: Option<String>,
    /// Whether a missing value fails initialization.
    pub required: bool,
    /// Conversion from the native form.
    pub conversion: Conversion,
    /// The conversion rendered over the raw value.
    pub expression: String,
    /// Error raised when a required value is missing.
    pub missing_message: String,
}

impl ProviderPlan {
    /// Applies this provider's defaulting and requiredness to a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`InitializationError::Missing`] for an absent required value.
    pub fn provide(
        &self,
        source: SourceKind,
        value: Option<String>,
    ) -> Result<Option<String>, InitializationError> {
        provide_value(
            value,
            source,
            &self.key,
            self.required,
            self.default.as_deref(),
        )
    }
}

/// The providers generated for one root and one integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModulePlan {
    /// Root component.
    pub root: String,
    /// Integration the providers read from.
    pub source: SourceKind,
    /// Generated module name.
    pub module_name: String,
    /// SHA-256 of the graph the plan was derived from, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_digest: Option<String>,
    /// Providers ordered by parameter, default, then type.
    pub providers: Vec<ProviderPlan>,
}

impl ModulePlan {
    /// Returns `true` when no provider is generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Plans the module generated for `root` and `source`.
///
/// Every non-native representation gets a native companion with the same
/// parameter and default. Representations whose type cannot be converted
/// are reported and left out.
#[must_use]
pub fn plan_module(
    universe: &Universe,
    root: &str,
    sites: &SiteSet,
    source: SourceKind,
    config: &AnalysisConfig,
    diagnostics: &mut Diagnostics,
) -> ModulePlan {
    let integration = source.integration();
    let groups = extract_keys(
        universe,
        sites,
        integration.as_ref(),
        config.markers.for_source(source),
        diagnostics,
    );
    let metadata = reconcile(&groups, config.conflict_policy, diagnostics);

    let mut representations = groups.representations();
    let companions: Vec<RepresentationKey> = representations
        .iter()
        .filter(|rep| !is_native(universe, &rep.ty))
        .map(|rep| RepresentationKey {
            ty: native_type(universe, &rep.ty),
            ..rep.clone()
        })
        .collect();
    representations.extend(companions);

    let mut names = MethodNames::default();
    let mut providers = Vec::new();
    for representation in representations {
        let native = native_type(universe, &representation.ty);
        let conversion = match resolve(universe, &representation.ty, &native) {
            Ok(conversion) => conversion,
            Err(err) => {
                diagnostics.error(None, format!("{source} {}: {err}", representation.key));
                continue;
            }
        };
        let required = metadata
            .get(&representation.key)
            .is_some_and(|meta| meta.required);
        providers.push(ProviderPlan {
            method_name: names.allocate(&representation),
            missing_message: InitializationError::Missing {
                source_kind: source,
                key: representation.key.clone(),
            }
            .to_string(),
            expression: conversion.render("value"),
            key: representation.key,
            ty: representation.ty,
            native_type: native,
            default: representation.default,
            required,
            conversion,
        });
    }
    debug!(root, %source, providers = providers.len(), "planned module");
    ModulePlan {
        root: root.to_owned(),
        source,
        module_name: module_name(root, source),
        graph_digest: None,
        providers,
    }
}

/// `<RootSimpleName><SourceSuffix>Module`.
#[must_use]
pub fn module_name(root: &str, source: SourceKind) -> String {
    let simple = TypeRef::declared(root).simple_name();
    format!("{simple}{}Module", source.module_suffix())
}

#[derive(Debug, Default)]
struct MethodNames {
    taken: BTreeSet<String>,
    counters: BTreeMap<String, usize>,
}

impl MethodNames {
    fn allocate(&mut self, representation: &RepresentationKey) -> String {
        let base = format!(
            "provide{}{}",
            representation.key.name_fragment().to_upper_camel_case(),
            representation.ty.simple_name().to_upper_camel_case()
        );
        if self.taken.insert(base.clone()) {
            return base;
        }
        let counter = self.counters.entry(base.clone()).or_insert(1);
        loop {
            *counter += 1;
            let candidate = format!("{base}{counter}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::analyzer::ComponentAnalyzer;
    use crate::model::{Annotation, ClassDecl, ClassKind, PrimitiveKind};
    use crate::walker::fixtures::{component, env, provision, string, universe};
    use rstest::rstest;

    fn plan(universe: &Universe, diagnostics: &mut Diagnostics) -> anyhow::Result<ModulePlan> {
        let sites = ComponentAnalyzer::new(universe).analyze("app.Root", diagnostics)?;
        Ok(plan_module(
            universe,
            "app.Root",
            &sites,
            SourceKind::Env,
            &AnalysisConfig::default(),
            diagnostics,
        ))
    }

    fn summary(plan: &ModulePlan) -> Vec<(String, String, Option<String>)> {
        plan.providers
            .iter()
            .map(|p| (p.method_name.clone(), p.expression.clone(), p.default.clone()))
            .collect()
    }

    #[rstest]
    fn derived_providers_parse_the_native_value() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "timeoutText",
            string(),
            vec![env("TIMEOUT").with_str("defaultValue", "30000")],
        ));
        root.methods.push(provision(
            "timeout",
            TypeRef::primitive(PrimitiveKind::Long),
            vec![env("TIMEOUT")],
        ));
        let universe = universe(vec![root]);
        let mut diagnostics = Diagnostics::new();
        let plan = plan(&universe, &mut diagnostics)?;

        assert_eq!(plan.module_name, "RootEnvironmentVariableModule");
        let thirty = Some(String::from("30000"));
        assert_eq!(
            summary(&plan),
            vec![
                (
                    String::from("provideTimeoutLong"),
                    String::from("java.lang.Long.parseLong(value)"),
                    thirty.clone()
                ),
                (
                    String::from("provideTimeoutString"),
                    String::from("value"),
                    thirty
                ),
            ]
        );
        assert!(plan.providers.iter().all(|p| !p.required));
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.entries());
        Ok(())
    }

    #[rstest]
    fn every_representation_has_a_native_companion() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "workers",
            TypeRef::primitive(PrimitiveKind::Int),
            vec![env("WORKERS").with_str("defaultValue", "4")],
        ));
        let universe = universe(vec![root]);
        let plan = plan(&universe, &mut Diagnostics::new())?;
        let native: Vec<&ProviderPlan> = plan
            .providers
            .iter()
            .filter(|p| p.ty == p.native_type)
            .collect();
        assert_eq!(native.len(), 1);
        assert_eq!(native.first().and_then(|p| p.default.as_deref()), Some("4"));
        Ok(())
    }

    #[rstest]
    fn unconvertible_representations_are_reported_and_skipped() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "endpoint",
            TypeRef::declared("app.Endpoint"),
            vec![env("ENDPOINT")],
        ));
        let endpoint = ClassDecl::new("app.Endpoint", ClassKind::Class);
        let universe = universe(vec![root, endpoint]);
        let mut diagnostics = Diagnostics::new();
        let plan = plan(&universe, &mut diagnostics)?;

        assert!(plan.providers.iter().all(|p| p.ty != TypeRef::declared("app.Endpoint")));
        let message = diagnostics
            .entries()
            .first()
            .map(|d| d.message.clone())
            .unwrap_or_default();
        assert!(
            message.contains("app.Endpoint") && message.contains("java.lang.String"),
            "{message}"
        );
        Ok(())
    }

    fn list_of(element: TypeRef) -> TypeRef {
        TypeRef::generic("java.util.List", vec![element])
    }

    #[rstest]
    #[case::collection("java.util.Collection")]
    #[case::iterable("java.lang.Iterable")]
    fn other_string_containers_get_a_list_companion(
        #[case] container: &str,
    ) -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "hosts",
            TypeRef::generic(container, vec![string()]),
            vec![env("HOSTS").with_str("defaultValue", "a")],
        ));
        let universe = universe(vec![root]);
        let plan = plan(&universe, &mut Diagnostics::new())?;

        let shapes: Vec<(String, String, String)> = plan
            .providers
            .iter()
            .map(|p| (p.ty.to_string(), p.native_type.to_string(), p.expression.clone()))
            .collect();
        let list = list_of(string()).to_string();
        assert_eq!(
            shapes,
            vec![
                (
                    TypeRef::generic(container, vec![string()]).to_string(),
                    list.clone(),
                    String::from("map(value, item -> item)")
                ),
                (list.clone(), list, String::from("value")),
            ]
        );
        assert!(plan.providers.iter().all(|p| p.default.as_deref() == Some("a")));
        Ok(())
    }

    #[rstest]
    fn lists_of_unconvertible_elements_are_skipped() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "endpoints",
            list_of(TypeRef::declared("app.Endpoint")),
            vec![env("ENDPOINTS")],
        ));
        let endpoint = ClassDecl::new("app.Endpoint", ClassKind::Class);
        let universe = universe(vec![root, endpoint]);
        let mut diagnostics = Diagnostics::new();
        let plan = plan(&universe, &mut diagnostics)?;

        let types: Vec<TypeRef> = plan.providers.iter().map(|p| p.ty.clone()).collect();
        assert_eq!(types, vec![list_of(string())]);
        let message = diagnostics
            .entries()
            .first()
            .map(|d| d.message.clone())
            .unwrap_or_default();
        assert!(
            message.contains("java.util.List<app.Endpoint>")
                && message.contains("java.util.List<java.lang.String>"),
            "{message}"
        );
        Ok(())
    }

    #[rstest]
    fn colliding_method_names_get_suffixes() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "a",
            string(),
            vec![env("MODE").with_str("defaultValue", "fast")],
        ));
        root.methods.push(provision(
            "b",
            string(),
            vec![env("MODE").with_str("defaultValue", "safe")],
        ));
        root.methods.push(provision(
            "c",
            string(),
            vec![Annotation::new("app.Unrelated")],
        ));
        let universe = universe(vec![root]);
        let plan = plan(&universe, &mut Diagnostics::new())?;
        let names: Vec<&str> = plan.providers.iter().map(|p| p.method_name.as_str()).collect();
        assert_eq!(names, vec!["provideModeString", "provideModeString2"]);
        Ok(())
    }

    #[rstest]
    fn provider_contract_honours_requiredness() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision("region", string(), vec![env("REGION")]));
        let universe = universe(vec![root]);
        let plan = plan(&universe, &mut Diagnostics::new())?;
        let provider = plan
            .providers
            .first()
            .ok_or_else(|| anyhow::anyhow!("no provider planned"))?;
        assert!(provider.required);
        assert_eq!(
            provider.provide(SourceKind::Env, None).map_err(|e| e.to_string()),
            Err(provider.missing_message.clone())
        );
        assert_eq!(
            provider.provide(SourceKind::Env, Some("eu".into()))?,
            Some(String::from("eu"))
        );
        Ok(())
    }
}
