//! Drives the full pipeline through the library entry point.

#![expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]

use anyhow::{Context, Result};
use clap::Parser;
use injectconf_cli::cli::Args;
use injectconf_cli::{digest, run};
use rstest::rstest;
use test_helpers::env;
use test_helpers::fixtures::{Staged, fixture_dir};

const GRAPH: &str = "greeter_graph.json";

fn args(staged: &Staged, extra: &[&str]) -> Result<Args> {
    let graph = staged.copy_fixture(&fixture_dir(env!("CARGO_MANIFEST_DIR")), GRAPH)?;
    let out = staged.path().join("out");
    let mut argv = vec![
        "injectconf",
        "--graph",
        graph.as_str(),
        "--out-dir",
        out.as_str(),
    ];
    argv.extend_from_slice(extra);
    Ok(Args::try_parse_from(argv)?)
}

#[rstest]
fn writes_one_plan_per_source_with_the_graph_digest() -> Result<()> {
    let _scope = env::scope_with(|lock| lock.clear_prefixed("INJECTCONF_"));
    let staged = Staged::new()?;
    let args = args(&staged, &[])?;
    let report = run(&args)?;

    assert!(!report.failed());
    let names: Vec<&str> = report
        .written
        .iter()
        .filter_map(|path| path.file_name())
        .collect();
    assert_eq!(
        names,
        vec!["app.GreeterComponent.env.json", "app.GreeterComponent.cli.json"]
    );

    let expected = digest::sha256_hex(std::fs::read_to_string(&args.graph)?.as_bytes());
    let path = report.written.first().context("env plan")?;
    let plan: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    assert_eq!(plan["graph_digest"], serde_json::Value::from(expected));
    assert_eq!(plan["module_name"], "GreeterComponentEnvironmentVariableModule");
    assert_eq!(plan["providers"][0]["default"], "hello");
    Ok(())
}

#[rstest]
fn source_flags_narrow_the_output() -> Result<()> {
    let _scope = env::scope_with(|lock| lock.clear_prefixed("INJECTCONF_"));
    let staged = Staged::new()?;
    let report = run(&args(&staged, &["--source", "cli"])?)?;
    let cli = report.written.first().context("cli plan")?;
    assert_eq!(report.written.len(), 1);
    assert_eq!(cli.file_name(), Some("app.GreeterComponent.cli.json"));

    let plan: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(cli)?)?;
    let methods: Vec<&str> = plan["providers"]
        .as_array()
        .context("providers")?
        .iter()
        .filter_map(|provider| provider["method_name"].as_str())
        .collect();
    assert_eq!(methods, vec!["providePortInteger", "providePortString"]);
    Ok(())
}

#[rstest]
fn missing_root_is_fatal_but_others_are_written() -> Result<()> {
    let _scope = env::scope_with(|lock| lock.clear_prefixed("INJECTCONF_"));
    let staged = Staged::new()?;
    let report = run(&args(
        &staged,
        &["--root", "app.Missing", "--root", "app.GreeterComponent"],
    )?)?;
    assert!(report.failed());
    assert_eq!(report.fatal.len(), 1);
    assert_eq!(report.written.len(), 2);
    Ok(())
}

#[rstest]
fn unreadable_graph_is_an_error() -> Result<()> {
    let staged = Staged::new()?;
    let missing = staged.path().join("absent.json");
    let args = Args::try_parse_from(["injectconf", "--graph", missing.as_str()])?;
    assert!(run(&args).is_err());
    Ok(())
}
