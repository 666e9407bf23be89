//! Configuration-source integrations.
//!
//! Each integration recognises one marker annotation type and maps marker
//! instances to a [`ParameterKey`] plus an optional declared default. The
//! analyzer output is shared; integrations run independently over it.

mod cli;
mod env;
mod remote;
mod system_property;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Annotation;
use crate::template::{Template, TemplateError};

pub use cli::CliSource;
pub use env::EnvSource;
pub use remote::RemoteParameterSource;
pub use system_property::SystemPropertySource;

/// Sentinel stored in `defaultValue` when the marker declares no default.
///
/// An empty string is a legitimate default, so absence needs its own value.
pub const DEFAULT_VALUE_NOT_SET: &str = "__injectconf.DEFAULT_VALUE_NOT_SET__";

/// The known integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Environment variables.
    Env,
    /// System properties.
    SystemProperty,
    /// Remote parameter store entries.
    RemoteParameter,
    /// Command-line arguments.
    Cli,
}

impl SourceKind {
    /// Every integration, in planning order.
    pub const ALL: [Self; 4] = [Self::Env, Self::SystemProperty, Self::RemoteParameter, Self::Cli];

    /// Short identifier used in file names and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::SystemProperty => "system_property",
            Self::RemoteParameter => "remote_parameter",
            Self::Cli => "cli",
        }
    }

    /// Suffix of the generated module name.
    #[must_use]
    pub const fn module_suffix(self) -> &'static str {
        match self {
            Self::Env => "EnvironmentVariable",
            Self::SystemProperty => "SystemProperty",
            Self::RemoteParameter => "RemoteParameter",
            Self::Cli => "CommandLine",
        }
    }

    /// Integration for this kind.
    #[must_use]
    pub fn integration(self) -> Box<dyn ConfigSource> {
        match self {
            Self::Env => Box::new(EnvSource),
            Self::SystemProperty => Box::new(SystemPropertySource),
            Self::RemoteParameter => Box::new(RemoteParameterSource),
            Self::Cli => Box::new(CliSource),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Env => "environment variable",
            Self::SystemProperty => "system property",
            Self::RemoteParameter => "remote parameter",
            Self::Cli => "command-line argument",
        })
    }
}

/// Identity of one logical configuration input.
///
/// Derived only from a marker's identity-bearing elements, never from the
/// requested type or the default.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ParameterKey {
    /// Environment variable name.
    Env {
        /// Variable name.
        name: String,
    },
    /// System property name template.
    SystemProperty {
        /// Raw name template.
        name: String,
    },
    /// Remote parameter path template.
    RemoteParameter {
        /// Raw path template.
        name: String,
    },
    /// Named command-line option.
    CliOption {
        /// Single-character form, used as `-p`.
        short: Option<char>,
        /// Long form, used as `--port`.
        long: Option<String>,
    },
    /// Positional command-line argument.
    CliPositional {
        /// Zero-based position.
        position: u32,
    },
}

impl ParameterKey {
    /// Identifier fragment used to name generated providers.
    #[must_use]
    pub fn name_fragment(&self) -> String {
        match self {
            Self::Env { name } | Self::SystemProperty { name } | Self::RemoteParameter { name } => {
                name.clone()
            }
            Self::CliOption { long: Some(long), .. } => long.clone(),
            Self::CliOption { short: Some(short), .. } => short.to_string(),
            Self::CliOption { .. } => String::from("option"),
            Self::CliPositional { position } => format!("arg{position}"),
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env { name } | Self::SystemProperty { name } | Self::RemoteParameter { name } => {
                f.write_str(name)
            }
            Self::CliOption { short, long } => match (short, long) {
                (Some(s), Some(l)) => write!(f, "-{s}/--{l}"),
                (Some(s), None) => write!(f, "-{s}"),
                (None, Some(l)) => write!(f, "--{l}"),
                (None, None) => f.write_str("<unnamed option>"),
            },
            Self::CliPositional { position } => write!(f, "<argument {position}>"),
        }
    }
}

/// What an integration extracts from one marker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerData {
    /// Parameter identity.
    pub key: ParameterKey,
    /// Declared default, absent when the sentinel (or nothing) was given.
    pub default: Option<String>,
    /// Parsed name template, for integrations with templated names.
    pub template: Option<Template>,
}

/// Marker contents an integration cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The name-bearing element is missing or empty.
    #[error("{marker} does not name a {source_kind}")]
    MissingName {
        /// Marker as written.
        marker: String,
        /// Integration that rejected it.
        source_kind: SourceKind,
    },
    /// The name breaks the integration's naming rules.
    #[error("invalid {source_kind} name '{name}': {reason}")]
    InvalidName {
        /// Offending name.
        name: String,
        /// Integration that rejected it.
        source_kind: SourceKind,
        /// Rule that was broken.
        reason: String,
    },
    /// The name template is malformed.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl KeyError {
    pub(crate) fn invalid(source_kind: SourceKind, name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_owned(),
            source_kind,
            reason: reason.into(),
        }
    }
}

/// A configuration-source integration.
pub trait ConfigSource {
    /// Which integration this is.
    fn kind(&self) -> SourceKind;

    /// Maps a marker instance to its parameter identity and default.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the marker names nothing usable.
    fn extract(&self, marker: &Annotation) -> Result<MarkerData, KeyError>;
}

/// Reads `defaultValue`, treating the sentinel as absent.
pub(crate) fn declared_default(marker: &Annotation) -> Option<String> {
    marker
        .get_str("defaultValue")
        .filter(|value| *value != DEFAULT_VALUE_NOT_SET)
        .map(str::to_owned)
}

/// Reads the non-empty `value` element.
pub(crate) fn required_name(marker: &Annotation, source_kind: SourceKind) -> Result<String, KeyError> {
    marker
        .get_str("value")
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| KeyError::MissingName {
            marker: marker.to_string(),
            source_kind,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn sentinel_and_missing_defaults_are_absent() {
        let base = Annotation::new("io.injectconf.EnvironmentVariable");
        assert_eq!(declared_default(&base), None);
        let sentinel = base.clone().with_str("defaultValue", DEFAULT_VALUE_NOT_SET);
        assert_eq!(declared_default(&sentinel), None);
        let empty = base.with_str("defaultValue", "");
        assert_eq!(declared_default(&empty), Some(String::new()));
    }

    #[rstest]
    #[case(ParameterKey::CliOption { short: Some('p'), long: Some("port".into()) }, "-p/--port", "port")]
    #[case(ParameterKey::CliOption { short: Some('v'), long: None }, "-v", "v")]
    #[case(ParameterKey::CliPositional { position: 1 }, "<argument 1>", "arg1")]
    #[case(ParameterKey::Env { name: "TIMEOUT".into() }, "TIMEOUT", "TIMEOUT")]
    fn keys_render_for_messages_and_names(
        #[case] key: ParameterKey,
        #[case] display: &str,
        #[case] fragment: &str,
    ) {
        assert_eq!(key.to_string(), display);
        assert_eq!(key.name_fragment(), fragment);
    }
}
