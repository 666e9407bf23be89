//! Primary error enums for graph analysis.

use figment::Error as FigmentError;
use thiserror::Error;

use super::aggregate::AggregatedErrors;
use crate::model::ElementId;

/// Structural errors that abort the analysis of one root component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// A referenced declaration is absent from the metadata model.
    #[error("type '{name}' is not present in the graph")]
    MissingDeclaration {
        /// Name that failed to resolve.
        name: String,
    },

    /// The root declaration does not carry a component marker.
    #[error("'{name}' is not annotated as a component")]
    NotAComponent {
        /// Declaration that was expected to be a component.
        name: String,
    },

    /// A module reference does not carry a module marker.
    #[error("'{name}' is not annotated as a module")]
    NotAModule {
        /// Declaration that was expected to be a module.
        name: String,
    },

    /// An abstract provision method returns `void` without taking an argument.
    #[error("provision method {element} must not return void")]
    VoidProvision {
        /// The offending method.
        element: ElementId,
    },

    /// An abstract provision method declares more than one parameter.
    #[error("provision method {element} declares {arity} parameters; at most one is allowed")]
    MultiArgumentProvision {
        /// The offending method.
        element: ElementId,
        /// Number of declared parameters.
        arity: usize,
    },
}

/// Errors surfaced by the crate's public entry points.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InjectconfError {
    /// The serialized graph could not be parsed.
    #[error("failed to parse graph document: {0}")]
    GraphJson(#[source] serde_json::Error),

    /// Configuration layers could not be merged.
    #[error("failed to load analysis configuration: {0}")]
    Config(#[source] Box<FigmentError>),

    /// A root component could not be analyzed.
    #[error("analysis of '{root}' failed: {source}")]
    Graph {
        /// Root component being analyzed.
        root: String,
        /// Underlying structural error.
        #[source]
        source: GraphError,
    },

    /// Several roots failed.
    #[error("multiple analysis errors:\n{0}")]
    Aggregate(Box<AggregatedErrors>),
}
