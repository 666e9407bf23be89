//! Command-line integration.
//!
//! A marker names either an option (`shortName` and/or `longName`) or a
//! zero-based `position`, never both.

use super::{ConfigSource, KeyError, MarkerData, ParameterKey, SourceKind, declared_default};
use crate::model::Annotation;

/// Reads option names or a positional index.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliSource;

impl ConfigSource for CliSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Cli
    }

    fn extract(&self, marker: &Annotation) -> Result<MarkerData, KeyError> {
        let short = marker.get_str("shortName").filter(|s| !s.is_empty());
        let long = marker.get_str("longName").filter(|s| !s.is_empty());
        let position = marker.get("position").and_then(|value| value.as_int());

        let key = match (short, long, position) {
            (None, None, None) => {
                return Err(KeyError::MissingName {
                    marker: marker.to_string(),
                    source_kind: SourceKind::Cli,
                });
            }
            (_, _, Some(position)) if short.is_some() || long.is_some() => {
                return Err(KeyError::invalid(
                    SourceKind::Cli,
                    &position.to_string(),
                    "an argument is either named or positional",
                ));
            }
            (_, _, Some(position)) => ParameterKey::CliPositional {
                position: u32::try_from(position).map_err(|_| {
                    KeyError::invalid(
                        SourceKind::Cli,
                        &position.to_string(),
                        "position must be a non-negative index",
                    )
                })?,
            },
            (short, long, None) => ParameterKey::CliOption {
                short: short.map(validate_short).transpose()?,
                long: long.map(validate_long).transpose()?,
            },
        };
        Ok(MarkerData {
            key,
            default: declared_default(marker),
            template: None,
        })
    }
}

fn validate_short(short: &str) -> Result<char, KeyError> {
    let mut chars = short.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Ok(c),
        _ => Err(KeyError::invalid(
            SourceKind::Cli,
            short,
            "a short name is a single letter or digit",
        )),
    }
}

fn validate_long(long: &str) -> Result<String, KeyError> {
    let mut chars = long.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    if first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Ok(long.to_owned())
    } else {
        Err(KeyError::invalid(
            SourceKind::Cli,
            long,
            "a long name starts with a letter or digit and contains only letters, digits, and '-'",
        ))
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::model::AnnotationValue;
    use rstest::rstest;

    fn marker() -> Annotation {
        Annotation::new("io.injectconf.CommandLine")
    }

    #[rstest]
    fn options_key_on_both_names() -> anyhow::Result<()> {
        let data = CliSource.extract(
            &marker()
                .with_str("shortName", "p")
                .with_str("longName", "port")
                .with_str("defaultValue", "8080"),
        )?;
        assert_eq!(
            data.key,
            ParameterKey::CliOption {
                short: Some('p'),
                long: Some("port".into())
            }
        );
        assert_eq!(data.default.as_deref(), Some("8080"));
        Ok(())
    }

    #[rstest]
    fn positional_arguments_key_on_index() -> anyhow::Result<()> {
        let data = CliSource.extract(&marker().with("position", AnnotationValue::Int(0)))?;
        assert_eq!(data.key, ParameterKey::CliPositional { position: 0 });
        Ok(())
    }

    #[rstest]
    #[case::two_char_short(marker().with_str("shortName", "pp"))]
    #[case::leading_dash(marker().with_str("longName", "--port"))]
    #[case::negative(marker().with("position", AnnotationValue::Int(-1)))]
    #[case::mixed(marker().with_str("longName", "port").with("position", AnnotationValue::Int(0)))]
    #[case::nothing(marker())]
    fn rejects_malformed_markers(#[case] annotation: Annotation) {
        assert!(CliSource.extract(&annotation).is_err());
    }
}
