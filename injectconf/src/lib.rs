//! Dependency-graph analysis for injected configuration values.
//!
//! Given the metadata of a dependency-injection graph, this crate walks every
//! root component, finds each point where a configuration value is consumed,
//! reconciles how the same parameter is used across the graph, and plans one
//! provider module per root and source integration.
//!
//! ```rust,no_run
//! # use injectconf::{AnalysisConfig, GraphDocument, InjectconfError, ProcessingContext, Universe};
//! # fn main() -> Result<(), InjectconfError> {
//! let config = AnalysisConfig::load(None)?;
//! let document = GraphDocument::from_json(r#"{"classes": []}"#)?;
//! let universe = Universe::new(document, config.conventions.clone(), config.markers.clone());
//! let mut context = ProcessingContext::new(config);
//! for root in universe.component_names() {
//!     context.add_root(root);
//! }
//! let outcome = context.finalize(&universe);
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod context;
pub mod conversion;
pub mod diagnostics;
mod error;
pub mod keys;
pub mod model;
pub mod plan;
pub mod requiredness;
pub mod runtime;
pub mod site;
pub mod source;
pub mod template;
pub mod walker;

pub use analyzer::{ComponentAnalyzer, SiteSet};
pub use config::{AnalysisConfig, ConflictPolicy, Conventions, MarkerTypes};
pub use context::{ProcessingContext, ProcessingOutcome};
pub use conversion::{Conversion, ConversionCapabilities, ConversionError};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{AggregatedErrors, GraphError, InjectconfError};
pub use keys::{KeyGroups, RepresentationKey, Usage};
pub use model::{GraphDocument, TypeRef, Universe};
pub use plan::{ModulePlan, ProviderPlan};
pub use requiredness::ParameterMetadata;
pub use runtime::InitializationError;
pub use site::{ConsumptionSite, ProvisionStyle, SiteKind};
pub use source::{ConfigSource, KeyError, ParameterKey, SourceKind};
pub use template::{Template, TemplateError};
