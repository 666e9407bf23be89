//! Error types for the `injectconf` driver.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by the `injectconf` pipeline.
#[derive(Debug, Error)]
pub enum InjectconfCliError {
    #[error(transparent)]
    Analysis(#[from] injectconf::InjectconfError),

    #[error("failed to serialize plan: {0}")]
    PlanJson(#[from] serde_json::Error),

    #[error("graph path {0} has no file name")]
    InvalidGraphPath(Utf8PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
