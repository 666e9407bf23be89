//! Behaviour every generated provider follows at initialization.

use thiserror::Error;

use crate::source::{ParameterKey, SourceKind};
use crate::template::{Template, TemplateContext, TemplateError};

/// A generated provider could not produce its value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitializationError {
    /// A required parameter had no value.
    #[error("missing required {source_kind} {key}")]
    Missing {
        /// Integration the value was read from.
        source_kind: SourceKind,
        /// The parameter.
        key: ParameterKey,
    },
    /// A character parameter was empty.
    #[error("{source_kind} {key} must not be empty")]
    EmptyCharacter {
        /// Integration the value was read from.
        source_kind: SourceKind,
        /// The parameter.
        key: ParameterKey,
    },
    /// A templated name could not be resolved.
    #[error(transparent)]
    Name(#[from] TemplateError),
}

/// Applies defaulting and requiredness to a raw value.
///
/// A present value always wins. Otherwise a required parameter fails, even
/// when a default was declared, and an optional one falls back to
/// `default`.
///
/// # Errors
///
/// Returns [`InitializationError::Missing`] for an absent required value.
pub fn provide_value(
    value: Option<String>,
    source_kind: SourceKind,
    key: &ParameterKey,
    required: bool,
    default: Option<&str>,
) -> Result<Option<String>, InitializationError> {
    match (value, required) {
        (Some(value), _) => Ok(Some(value)),
        (None, true) => Err(InitializationError::Missing {
            source_kind,
            key: key.clone(),
        }),
        (None, false) => Ok(default.map(str::to_owned)),
    }
}

/// First character of `value`.
///
/// # Errors
///
/// Returns [`InitializationError::EmptyCharacter`] for an empty value.
pub fn first_char(
    value: &str,
    source_kind: SourceKind,
    key: &ParameterKey,
) -> Result<char, InitializationError> {
    value
        .chars()
        .next()
        .ok_or_else(|| InitializationError::EmptyCharacter {
            source_kind,
            key: key.clone(),
        })
}

/// Name to look up at runtime: the key's template resolved against
/// `context`, or the key's display form for untemplated integrations.
///
/// # Errors
///
/// Returns [`InitializationError::Name`] when the template is malformed or
/// references a value that is absent and has no default.
pub fn resolve_name(
    key: &ParameterKey,
    context: &TemplateContext<'_>,
) -> Result<String, InitializationError> {
    match key {
        ParameterKey::SystemProperty { name } | ParameterKey::RemoteParameter { name } => {
            Ok(Template::parse(name)?.resolve(context)?)
        }
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn timeout() -> ParameterKey {
        ParameterKey::Env {
            name: "TIMEOUT".into(),
        }
    }

    #[rstest]
    #[case::present(Some("5"), true, Some("30000"), Some("5"))]
    #[case::defaulted(None, false, Some("30000"), Some("30000"))]
    #[case::optional_absent(None, false, None, None)]
    fn provides_present_or_default(
        #[case] value: Option<&str>,
        #[case] required: bool,
        #[case] default: Option<&str>,
        #[case] expected: Option<&str>,
    ) -> anyhow::Result<()> {
        let provided = provide_value(
            value.map(str::to_owned),
            SourceKind::Env,
            &timeout(),
            required,
            default,
        )?;
        assert_eq!(provided.as_deref(), expected);
        Ok(())
    }

    #[rstest]
    fn missing_required_value_names_the_key() {
        let err = provide_value(None, SourceKind::Env, &timeout(), true, Some("30000"));
        assert_eq!(
            err.map_err(|e| e.to_string()),
            Err(String::from(
                "missing required environment variable TIMEOUT"
            ))
        );
    }

    #[rstest]
    fn first_char_rejects_empty_values() {
        assert_eq!(first_char("yes", SourceKind::Env, &timeout()), Ok('y'));
        assert!(first_char("", SourceKind::Env, &timeout()).is_err());
    }

    #[rstest]
    fn templated_names_resolve_at_runtime() -> anyhow::Result<()> {
        let env = BTreeMap::from([(String::from("STAGE"), String::from("prod"))]);
        let sys = BTreeMap::new();
        let context = TemplateContext {
            env: &env,
            sys: &sys,
        };
        let key = ParameterKey::RemoteParameter {
            name: "/${env.STAGE}/db/${sys.region:-eu}".into(),
        };
        assert_eq!(resolve_name(&key, &context)?, "/prod/db/eu");
        Ok(())
    }
}
