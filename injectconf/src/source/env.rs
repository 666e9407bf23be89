//! Environment-variable integration.

use super::{
    ConfigSource, KeyError, MarkerData, ParameterKey, SourceKind, declared_default, required_name,
};
use crate::model::Annotation;

/// Reads `value` as a POSIX-style variable name.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Env
    }

    fn extract(&self, marker: &Annotation) -> Result<MarkerData, KeyError> {
        let name = required_name(marker, SourceKind::Env)?;
        validate(&name)?;
        Ok(MarkerData {
            key: ParameterKey::Env { name },
            default: declared_default(marker),
            template: None,
        })
    }
}

fn validate(name: &str) -> Result<(), KeyError> {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_well {
        return Err(KeyError::invalid(
            SourceKind::Env,
            name,
            "must start with a letter or underscore",
        ));
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(KeyError::invalid(
            SourceKind::Env,
            name,
            format!("character '{bad}' is not allowed"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn marker(name: &str) -> Annotation {
        Annotation::new("io.injectconf.EnvironmentVariable").with_str("value", name)
    }

    #[rstest]
    fn extracts_name_and_default() -> anyhow::Result<()> {
        let data = EnvSource.extract(&marker("TIMEOUT").with_str("defaultValue", "30000"))?;
        assert_eq!(
            data.key,
            ParameterKey::Env {
                name: "TIMEOUT".into()
            }
        );
        assert_eq!(data.default.as_deref(), Some("30000"));
        Ok(())
    }

    #[rstest]
    #[case::leading_digit("1PORT")]
    #[case::dash("APP-PORT")]
    #[case::dot("app.port")]
    fn rejects_invalid_names(#[case] name: &str) {
        assert!(matches!(
            EnvSource.extract(&marker(name)),
            Err(KeyError::InvalidName { .. })
        ));
    }

    #[rstest]
    fn rejects_missing_name() {
        assert!(matches!(
            EnvSource.extract(&Annotation::new("io.injectconf.EnvironmentVariable")),
            Err(KeyError::MissingName { .. })
        ));
    }
}
