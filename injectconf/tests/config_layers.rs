//! Layered configuration driving a full analysis.

#![expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]

use anyhow::Result;
use camino::Utf8Path;
use injectconf::{AnalysisConfig, GraphDocument, ProcessingContext, Severity, SourceKind, Universe};
use rstest::rstest;
use test_helpers::figment::{figment_error, with_jail};
use test_helpers::fixtures;

fn analyze(config: AnalysisConfig) -> Result<injectconf::ProcessingOutcome> {
    let dir = fixtures::fixture_dir(env!("CARGO_MANIFEST_DIR"));
    let document = GraphDocument::from_json(&fixtures::read(&dir, "settings_graph.json")?)?;
    let universe = Universe::new(document, config.conventions.clone(), config.markers.clone());
    let mut context = ProcessingContext::new(config);
    context.add_root("app.SettingsComponent");
    Ok(context.finalize(&universe))
}

#[rstest]
fn file_layer_selects_sources_and_policy() -> Result<()> {
    let config = with_jail(|jail| {
        jail.create_file(
            "injectconf.toml",
            r#"
            conflict_policy = "error"
            sources = ["cli"]
            "#,
        )?;
        AnalysisConfig::load(Some(Utf8Path::new("injectconf.toml"))).map_err(figment_error)
    })?;
    let outcome = analyze(config)?;

    let sources: Vec<SourceKind> = outcome.plans.iter().map(|plan| plan.source).collect();
    assert_eq!(sources, vec![SourceKind::Cli]);
    assert!(
        outcome
            .diagnostics
            .with_severity(Severity::Error)
            .any(|d| d.message.contains("--port"))
    );
    assert!(outcome.failed());
    Ok(())
}

#[rstest]
fn environment_layer_renames_a_marker() -> Result<()> {
    let config = with_jail(|jail| {
        jail.set_env("INJECTCONF_MARKERS__ENV", "com.example.Unused");
        AnalysisConfig::load(None).map_err(figment_error)
    })?;
    let outcome = analyze(config)?;
    assert!(outcome.plans.iter().all(|plan| plan.source != SourceKind::Env));
    assert!(
        outcome
            .plans
            .iter()
            .any(|plan| plan.source == SourceKind::Cli)
    );
    Ok(())
}
