//! Templated parameter names, from the graph through to runtime lookup.

#![expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use injectconf::template::{ProcessEnv, TemplateContext};
use injectconf::{
    AnalysisConfig, GraphDocument, ParameterKey, ProcessingContext, Severity, SourceKind,
    TemplateError, Universe, runtime,
};
use rstest::rstest;
use test_helpers::env;

fn graph(property: &str) -> String {
    let document = serde_json::json!({
        "classes": [{
            "name": "app.Root",
            "kind": "interface",
            "annotations": [{ "type": "dagger.Component" }],
            "methods": [{
                "name": "databaseUrl",
                "modifiers": ["abstract"],
                "annotations": [{
                    "type": "io.injectconf.SystemProperty",
                    "values": { "value": property }
                }],
                "returns": { "kind": "declared", "name": "java.lang.String" }
            }]
        }]
    });
    document.to_string()
}

fn analyze(property: &str) -> Result<injectconf::ProcessingOutcome> {
    let config = AnalysisConfig::default();
    let document = GraphDocument::from_json(&graph(property))?;
    let universe = Universe::new(document, config.conventions.clone(), config.markers.clone());
    let mut context = ProcessingContext::new(config);
    context.add_root("app.Root");
    Ok(context.finalize(&universe))
}

#[rstest]
fn malformed_template_is_reported_at_the_site() -> Result<()> {
    let outcome = analyze("${env.STAGE")?;
    assert!(outcome.plans.is_empty());
    assert!(outcome.failed());
    let error = outcome
        .diagnostics
        .with_severity(Severity::Error)
        .next()
        .context("template diagnostic")?;
    assert!(
        error.message.contains("unterminated template expression at index 0"),
        "{}",
        error.message
    );
    Ok(())
}

#[rstest]
#[case::unknown_namespace("${home.dir}.db.url")]
#[case::empty_reference("${env.}.db.url")]
fn other_malformed_groups_are_rejected(#[case] property: &str) -> Result<()> {
    let outcome = analyze(property)?;
    assert!(outcome.plans.is_empty());
    assert_eq!(outcome.diagnostics.with_severity(Severity::Error).count(), 1);
    Ok(())
}

#[rstest]
fn templated_name_resolves_from_the_process_environment() -> Result<()> {
    let outcome = analyze("${env.INJECTCONF_IT_STAGE:-dev}.db.url")?;
    let plan = outcome
        .plans
        .iter()
        .find(|plan| plan.source == SourceKind::SystemProperty)
        .context("system property plan")?;
    let provider = plan.providers.first().context("provider")?;
    assert_eq!(provider.method_name, "provideEnvInjectconfItStageDevDbUrlString");

    let sys = BTreeMap::new();
    let context = TemplateContext {
        env: &ProcessEnv,
        sys: &sys,
    };
    let _lock = env::lock();
    {
        let _unset = env::remove_var("INJECTCONF_IT_STAGE");
        assert_eq!(runtime::resolve_name(&provider.key, &context)?, "dev.db.url");
    }
    let _stage = env::set_var("INJECTCONF_IT_STAGE", "prod");
    assert_eq!(runtime::resolve_name(&provider.key, &context)?, "prod.db.url");
    Ok(())
}

#[rstest]
fn missing_reference_without_default_fails_resolution() {
    let key = ParameterKey::SystemProperty {
        name: String::from("${sys.region}.endpoint"),
    };
    let empty = BTreeMap::new();
    let context = TemplateContext {
        env: &empty,
        sys: &empty,
    };
    let err = runtime::resolve_name(&key, &context);
    assert!(matches!(
        err,
        Err(injectconf::InitializationError::Name(TemplateError::Unresolved { .. }))
    ));
}
