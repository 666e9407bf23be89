//! End-to-end analysis of a serialized graph.

#![expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]

use anyhow::{Context, Result, anyhow};
use injectconf::{
    AnalysisConfig, ConflictPolicy, GraphDocument, ModulePlan, ParameterKey, ProcessingContext,
    ProcessingOutcome, ProviderPlan, Severity, SourceKind, TypeRef, Universe,
};
use rstest::rstest;
use test_helpers::fixtures;

const ROOT: &str = "app.SettingsComponent";

fn load_universe() -> Result<Universe> {
    let dir = fixtures::fixture_dir(env!("CARGO_MANIFEST_DIR"));
    let json = fixtures::read(&dir, "settings_graph.json")?;
    let document = GraphDocument::from_json(&json).context("parse settings_graph.json")?;
    let config = AnalysisConfig::default();
    Ok(Universe::new(document, config.conventions, config.markers))
}

fn analyze(universe: &Universe, config: AnalysisConfig) -> ProcessingOutcome {
    let mut context = ProcessingContext::new(config);
    context.add_root(ROOT);
    context.finalize(universe)
}

fn plan(outcome: &ProcessingOutcome, source: SourceKind) -> Result<&ModulePlan> {
    outcome
        .plans
        .iter()
        .find(|plan| plan.source == source)
        .ok_or_else(|| anyhow!("no {source} plan"))
}

fn env_key(name: &str) -> ParameterKey {
    ParameterKey::Env { name: name.into() }
}

fn providers_for<'p>(plan: &'p ModulePlan, key: &ParameterKey) -> Vec<&'p ProviderPlan> {
    plan.providers.iter().filter(|p| &p.key == key).collect()
}

#[rstest]
fn fixture_graph_is_loaded() -> Result<()> {
    let universe = load_universe()?;
    assert_eq!(
        universe.component_names(),
        vec!["app.SettingsComponent", "app.SharedComponent"]
    );
    Ok(())
}

#[rstest]
fn string_and_derived_long_share_one_optional_parameter() -> Result<()> {
    let universe = load_universe()?;
    let outcome = analyze(&universe, AnalysisConfig::default());
    let env = plan(&outcome, SourceKind::Env)?;
    let timeout = providers_for(env, &env_key("TIMEOUT"));

    let shapes: Vec<(String, Option<&str>, bool, &str)> = timeout
        .iter()
        .map(|p| {
            (
                p.ty.to_string(),
                p.default.as_deref(),
                p.required,
                p.expression.as_str(),
            )
        })
        .collect();
    assert_eq!(
        shapes,
        vec![
            (
                String::from("java.lang.Long"),
                Some("30000"),
                false,
                "java.lang.Long.parseLong(value)"
            ),
            (String::from("java.lang.String"), Some("30000"), false, "value"),
        ]
    );
    Ok(())
}

#[rstest]
fn conflicting_cli_option_is_required_with_a_warning() -> Result<()> {
    let universe = load_universe()?;
    let outcome = analyze(&universe, AnalysisConfig::default());
    let warning = outcome
        .diagnostics
        .with_severity(Severity::Warning)
        .find(|d| d.message.contains("--port"))
        .context("conflict warning naming the option")?;
    assert!(warning.message.contains("treating it as required"));

    let cli = plan(&outcome, SourceKind::Cli)?;
    let port = ParameterKey::CliOption {
        short: None,
        long: Some("port".into()),
    };
    let providers = providers_for(cli, &port);
    assert_eq!(providers.len(), 2);
    assert!(providers.iter().all(|p| p.required));
    let names: Vec<&str> = providers.iter().map(|p| p.method_name.as_str()).collect();
    assert_eq!(names, vec!["providePortString", "providePortString2"]);
    Ok(())
}

#[rstest]
fn error_policy_escalates_the_conflict() -> Result<()> {
    let universe = load_universe()?;
    let config = AnalysisConfig {
        conflict_policy: ConflictPolicy::Error,
        ..AnalysisConfig::default()
    };
    let outcome = analyze(&universe, config);
    assert!(
        outcome
            .diagnostics
            .with_severity(Severity::Error)
            .any(|d| d.message.contains("--port"))
    );
    Ok(())
}

#[rstest]
fn unconvertible_type_is_reported_and_not_planned() -> Result<()> {
    let universe = load_universe()?;
    let outcome = analyze(&universe, AnalysisConfig::default());
    let error = outcome
        .diagnostics
        .with_severity(Severity::Error)
        .find(|d| d.message.contains("app.Endpoint"))
        .context("conversion error")?;
    assert!(error.message.contains("java.lang.String"), "{}", error.message);

    let env = plan(&outcome, SourceKind::Env)?;
    assert!(
        env.providers
            .iter()
            .all(|p| p.ty != TypeRef::declared("app.Endpoint"))
    );
    let endpoint = providers_for(env, &env_key("ENDPOINT"));
    assert_eq!(endpoint.len(), 1);
    assert!(endpoint.iter().all(|p| p.required));
    Ok(())
}

#[rstest]
fn enums_and_optionals_are_planned() -> Result<()> {
    let universe = load_universe()?;
    let outcome = analyze(&universe, AnalysisConfig::default());
    let env = plan(&outcome, SourceKind::Env)?;

    let level = providers_for(env, &env_key("LEVEL"));
    assert!(
        level
            .iter()
            .any(|p| p.expression == "app.Level.valueOf(value)")
    );
    for name in ["REGION", "RETRIES"] {
        let providers = providers_for(env, &env_key(name));
        assert!(!providers.is_empty(), "{name}");
        assert!(providers.iter().all(|p| !p.required), "{name}");
    }
    Ok(())
}

#[rstest]
fn injectable_classes_and_dependency_components_contribute() -> Result<()> {
    let universe = load_universe()?;
    let outcome = analyze(&universe, AnalysisConfig::default());

    let remote = plan(&outcome, SourceKind::RemoteParameter)?;
    let hosts = remote.providers.first().context("remote provider")?;
    assert_eq!(hosts.method_name, "provideEnvStageDevServiceHostsListString");
    assert_eq!(hosts.conversion, injectconf::Conversion::Identity);

    let sys = plan(&outcome, SourceKind::SystemProperty)?;
    assert_eq!(sys.module_name, "SettingsComponentSystemPropertyModule");
    assert_eq!(sys.providers.len(), 1);

    let cli = plan(&outcome, SourceKind::Cli)?;
    let verbose = ParameterKey::CliOption {
        short: Some('v'),
        long: None,
    };
    let shapes: Vec<String> = providers_for(cli, &verbose)
        .iter()
        .map(|p| p.ty.to_string())
        .collect();
    assert_eq!(shapes, vec!["java.lang.Boolean", "java.lang.String"]);
    Ok(())
}

#[rstest]
fn every_representation_has_a_native_companion() -> Result<()> {
    let universe = load_universe()?;
    let outcome = analyze(&universe, AnalysisConfig::default());
    let env = plan(&outcome, SourceKind::Env)?;
    let peers: Vec<(String, String)> = providers_for(env, &env_key("PEERS"))
        .iter()
        .map(|p| (p.ty.to_string(), p.native_type.to_string()))
        .collect();
    let list = String::from("java.util.List<java.lang.String>");
    assert_eq!(
        peers,
        vec![
            (String::from("java.util.Collection<java.lang.String>"), list.clone()),
            (list.clone(), list),
        ]
    );

    for plan in &outcome.plans {
        for provider in plan.providers.iter().filter(|p| p.ty != p.native_type) {
            assert!(
                plan.providers.iter().any(|other| other.key == provider.key
                    && other.default == provider.default
                    && other.ty == provider.native_type),
                "{} lacks a native companion in {}",
                provider.method_name,
                plan.module_name
            );
        }
    }
    Ok(())
}

#[rstest]
fn output_is_deterministic() -> Result<()> {
    let universe = load_universe()?;
    let first = serde_json::to_string(&analyze(&universe, AnalysisConfig::default()).plans)?;
    let second = serde_json::to_string(&analyze(&universe, AnalysisConfig::default()).plans)?;
    assert_eq!(first, second);

    let outcome = analyze(&universe, AnalysisConfig::default());
    for plan in &outcome.plans {
        let keys: Vec<(&ParameterKey, Option<&str>, String)> = plan
            .providers
            .iter()
            .map(|p| (&p.key, p.default.as_deref(), p.ty.to_string()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "{}", plan.module_name);
    }
    Ok(())
}

#[rstest]
fn every_component_can_be_a_root() -> Result<()> {
    let universe = load_universe()?;
    let mut context = ProcessingContext::new(AnalysisConfig::default());
    for root in universe.component_names() {
        context.add_root(root);
    }
    let outcome = context.finalize(&universe);
    assert!(outcome.fatal.is_empty(), "{:?}", outcome.fatal);
    let roots: std::collections::BTreeSet<&str> =
        outcome.plans.iter().map(|p| p.root.as_str()).collect();
    assert_eq!(roots.len(), 2);
    Ok(())
}
