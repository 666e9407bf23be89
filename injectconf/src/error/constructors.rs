//! Constructors and aggregation helpers for `InjectconfError`.

use std::sync::Arc;

use super::{AggregatedErrors, GraphError, InjectconfError};

impl InjectconfError {
    /// Wraps a structural error with the root it aborted.
    #[must_use]
    pub fn graph(root: impl Into<String>, source: GraphError) -> Self {
        Self::Graph {
            root: root.into(),
            source,
        }
    }

    /// Tries to build an [`InjectconfError`] from an iterator of errors.
    ///
    /// Returns `None` for an empty iterator, the error itself when exactly one
    /// uniquely-owned error is supplied, and [`Self::Aggregate`] otherwise.
    #[must_use]
    pub fn try_aggregate<I, E>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Arc<Self>>,
    {
        let mut arcs: Vec<Arc<Self>> = errors.into_iter().map(Into::into).collect();
        if arcs.is_empty() {
            return None;
        }
        Some(if arcs.len() == 1 {
            let last = arcs.pop()?;
            match Arc::try_unwrap(last) {
                Ok(err) => err,
                Err(shared) => Self::Aggregate(Box::new(AggregatedErrors::new(vec![shared]))),
            }
        } else {
            Self::Aggregate(Box::new(AggregatedErrors::new(arcs)))
        })
    }
}
