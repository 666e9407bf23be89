//! Error types produced by the analyzer and its drivers.

mod aggregate;
mod constructors;
mod types;

pub use aggregate::AggregatedErrors;
pub use types::{GraphError, InjectconfError};

#[cfg(test)]
mod tests;
