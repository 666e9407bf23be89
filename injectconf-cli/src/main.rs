//! CLI entrypoint for `injectconf`.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use injectconf_cli::cli::Args;
use injectconf_cli::error::InjectconfCliError;
use injectconf_cli::{RunReport, logging, run};

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);
    match run(&args) {
        Ok(report) => {
            let failed = report.failed();
            if let Err(err) = print_report(&report) {
                tracing::error!(error = %err, "failed to print report");
            }
            if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
        }
        Err(err) => {
            tracing::error!(error = %err, "injectconf failed");
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &RunReport) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    for fatal in &report.fatal {
        writeln!(stderr, "error: {fatal}")?;
    }
    let mut stdout = std::io::stdout().lock();
    for path in &report.written {
        writeln!(stdout, "{path}")?;
    }
    writeln!(
        stderr,
        "{} plan(s) written, {} diagnostic(s)",
        report.written.len(),
        report.diagnostics.len()
    )?;
    Ok(())
}

fn report_error(err: &InjectconfCliError) {
    let mut stderr = std::io::stderr().lock();
    let _written = writeln!(stderr, "error: {err}");
}
