//! Analysis configuration.
//!
//! [`AnalysisConfig`] is layered with Figment: serialized defaults first, then
//! an optional TOML file, then `INJECTCONF_`-prefixed environment variables
//! where `__` separates nested keys (for example
//! `INJECTCONF_CONVENTIONS__STRING_TYPE`).

use camino::Utf8Path;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::InjectconfError;
use crate::source::SourceKind;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "INJECTCONF_";

/// How a parameter used as both required and optional is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Emit a warning and treat the parameter as required.
    #[default]
    Warn,
    /// Emit an error; the parameter is still treated as required.
    Error,
}

/// Names the host framework uses for its declarative markers and wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    /// Annotations marking a component.
    pub component_annotations: Vec<String>,
    /// Annotations marking a module.
    pub module_annotations: Vec<String>,
    /// Annotations marking a provider method inside a module.
    pub provides_annotations: Vec<String>,
    /// Annotations marking an injectable constructor, field, or method.
    pub inject_annotations: Vec<String>,
    /// Simple names treated as "nullable" regardless of package.
    pub nullable_simple_names: Vec<String>,
    /// Meta-annotation that turns an annotation type into a qualifier.
    pub qualifier_annotation: String,
    /// Deferred-supplier wrapper type.
    pub provider_type: String,
    /// Memoizing-supplier wrapper type.
    pub lazy_type: String,
    /// Optional/maybe wrapper types.
    pub optional_types: Vec<String>,
    /// Generic containers treated as lists during conversion.
    pub list_types: Vec<String>,
    /// The built-in string type every source natively produces.
    pub string_type: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            component_annotations: vec![String::from("dagger.Component")],
            module_annotations: vec![String::from("dagger.Module")],
            provides_annotations: vec![String::from("dagger.Provides")],
            inject_annotations: vec![
                String::from("javax.inject.Inject"),
                String::from("jakarta.inject.Inject"),
            ],
            nullable_simple_names: vec![String::from("Nullable")],
            qualifier_annotation: String::from("javax.inject.Qualifier"),
            provider_type: String::from("javax.inject.Provider"),
            lazy_type: String::from("dagger.Lazy"),
            optional_types: vec![String::from("java.util.Optional")],
            list_types: vec![
                String::from("java.util.List"),
                String::from("java.util.Collection"),
                String::from("java.lang.Iterable"),
            ],
            string_type: String::from("java.lang.String"),
        }
    }
}

/// Marker annotation type consumed by each source integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerTypes {
    /// Environment variable marker.
    pub env: String,
    /// System property marker.
    pub system_property: String,
    /// Remote parameter marker.
    pub remote_parameter: String,
    /// Command-line argument marker.
    pub cli: String,
}

impl Default for MarkerTypes {
    fn default() -> Self {
        Self {
            env: String::from("io.injectconf.EnvironmentVariable"),
            system_property: String::from("io.injectconf.SystemProperty"),
            remote_parameter: String::from("io.injectconf.RemoteParameter"),
            cli: String::from("io.injectconf.CommandLine"),
        }
    }
}

impl MarkerTypes {
    /// Marker type for `kind`.
    #[must_use]
    pub fn for_source(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Env => &self.env,
            SourceKind::SystemProperty => &self.system_property,
            SourceKind::RemoteParameter => &self.remote_parameter,
            SourceKind::Cli => &self.cli,
        }
    }

    /// Returns `true` when `type_name` is any source marker.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        SourceKind::ALL
            .iter()
            .any(|kind| self.for_source(*kind) == type_name)
    }
}

/// Settings for one processing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Severity of requiredness conflicts.
    pub conflict_policy: ConflictPolicy,
    /// Host framework naming conventions.
    pub conventions: Conventions,
    /// Marker annotation types per source.
    pub markers: MarkerTypes,
    /// Sources to plan modules for.
    pub sources: Vec<SourceKind>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            conventions: Conventions::default(),
            markers: MarkerTypes::default(),
            sources: SourceKind::ALL.to_vec(),
        }
    }
}

impl AnalysisConfig {
    /// Figment layering defaults, an optional TOML file, and the environment.
    #[must_use]
    pub fn figment(path: Option<&Utf8Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = path {
            figment = figment.merge(Toml::file(file.as_std_path()));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InjectconfError::Config`] when a layer cannot be read or the
    /// merged values do not match the schema.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, InjectconfError> {
        Self::figment(path)
            .extract()
            .map_err(|err| InjectconfError::Config(Box::new(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[rstest]
    fn defaults_enable_every_source() {
        let config = AnalysisConfig::default();
        assert_eq!(config.sources.len(), 4);
        assert_eq!(config.conflict_policy, ConflictPolicy::Warn);
        assert!(config.markers.contains("io.injectconf.CommandLine"));
    }

    #[rstest]
    fn file_then_environment_layers_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "injectconf.toml",
                r#"
                conflict_policy = "error"
                sources = ["env"]

                [markers]
                env = "com.example.Env"
                "#,
            )?;
            jail.set_env("INJECTCONF_CONVENTIONS__STRING_TYPE", "kotlin.String");
            let config = AnalysisConfig::load(Some(Utf8Path::new("injectconf.toml")))
                .map_err(|err| err.to_string())?;
            assert_eq!(config.conflict_policy, ConflictPolicy::Error);
            assert_eq!(config.sources, vec![SourceKind::Env]);
            assert_eq!(config.markers.env, "com.example.Env");
            assert_eq!(config.conventions.string_type, "kotlin.String");
            assert_eq!(config.conventions.lazy_type, "dagger.Lazy");
            Ok(())
        });
    }
}
