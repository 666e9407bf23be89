//! Remote parameter-store integration.
//!
//! Paths may be templates such as `/${env.STAGE}/db/url`. Literal parts are
//! limited to `[A-Za-z0-9_.\-/]` and a path must not start with the reserved
//! `aws` or `ssm` prefixes in any case, with or without a leading `/`.

use super::{
    ConfigSource, KeyError, MarkerData, ParameterKey, SourceKind, declared_default, required_name,
};
use crate::model::Annotation;
use crate::template::Template;

const RESERVED_PREFIXES: [&str; 2] = ["aws", "ssm"];

/// Reads `value` as a parameter path template.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteParameterSource;

impl ConfigSource for RemoteParameterSource {
    fn kind(&self) -> SourceKind {
        SourceKind::RemoteParameter
    }

    fn extract(&self, marker: &Annotation) -> Result<MarkerData, KeyError> {
        let name = required_name(marker, SourceKind::RemoteParameter)?;
        let template = Template::parse(&name)?;
        validate(&name, &template.skeleton("x"))?;
        Ok(MarkerData {
            key: ParameterKey::RemoteParameter { name },
            default: declared_default(marker),
            template: Some(template),
        })
    }
}

fn validate(name: &str, skeleton: &str) -> Result<(), KeyError> {
    if let Some(bad) = skeleton
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/')))
    {
        return Err(KeyError::invalid(
            SourceKind::RemoteParameter,
            name,
            format!("character '{bad}' is not allowed"),
        ));
    }
    let head = skeleton.trim_start_matches('/').to_ascii_lowercase();
    if let Some(prefix) = RESERVED_PREFIXES
        .iter()
        .find(|prefix| head.starts_with(*prefix))
    {
        return Err(KeyError::invalid(
            SourceKind::RemoteParameter,
            name,
            format!("the '{prefix}' prefix is reserved"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn marker(name: &str) -> Annotation {
        Annotation::new("io.injectconf.RemoteParameter").with_str("value", name)
    }

    #[rstest]
    #[case("/${env.STAGE}/db/url")]
    #[case("service.timeout-ms")]
    fn accepts_valid_paths(#[case] name: &str) {
        assert!(RemoteParameterSource.extract(&marker(name)).is_ok());
    }

    #[rstest]
    #[case::reserved_aws("/AWS/key")]
    #[case::reserved_ssm("ssm-settings")]
    #[case::bad_character("/db/url?x")]
    fn rejects_invalid_paths(#[case] name: &str) {
        assert!(matches!(
            RemoteParameterSource.extract(&marker(name)),
            Err(KeyError::InvalidName { .. })
        ));
    }
}
