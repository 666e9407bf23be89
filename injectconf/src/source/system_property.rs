//! System-property integration.
//!
//! Property names may be templates, for example `${env.STAGE}.db.url`.

use super::{
    ConfigSource, KeyError, MarkerData, ParameterKey, SourceKind, declared_default, required_name,
};
use crate::model::Annotation;
use crate::template::Template;

/// Reads `value` as a property name template.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPropertySource;

impl ConfigSource for SystemPropertySource {
    fn kind(&self) -> SourceKind {
        SourceKind::SystemProperty
    }

    fn extract(&self, marker: &Annotation) -> Result<MarkerData, KeyError> {
        let name = required_name(marker, SourceKind::SystemProperty)?;
        let template = Template::parse(&name)?;
        if template.skeleton("x").chars().any(char::is_whitespace) {
            return Err(KeyError::invalid(
                SourceKind::SystemProperty,
                &name,
                "whitespace is not allowed",
            ));
        }
        Ok(MarkerData {
            key: ParameterKey::SystemProperty { name },
            default: declared_default(marker),
            template: Some(template),
        })
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::template::TemplateError;
    use rstest::rstest;

    fn marker(name: &str) -> Annotation {
        Annotation::new("io.injectconf.SystemProperty").with_str("value", name)
    }

    #[rstest]
    fn keeps_raw_template_as_identity() -> anyhow::Result<()> {
        let data = SystemPropertySource.extract(&marker("${env.STAGE:-dev}.db.url"))?;
        assert_eq!(
            data.key,
            ParameterKey::SystemProperty {
                name: "${env.STAGE:-dev}.db.url".into()
            }
        );
        assert!(data.template.is_some_and(|t| !t.is_literal()));
        Ok(())
    }

    #[rstest]
    fn surfaces_template_syntax_errors() {
        assert_eq!(
            SystemPropertySource.extract(&marker("${env.STAGE")),
            Err(KeyError::Template(TemplateError::Unterminated {
                template: "${env.STAGE".into(),
                index: 0,
            }))
        );
    }

    #[rstest]
    fn rejects_whitespace() {
        assert!(matches!(
            SystemPropertySource.extract(&marker("db url")),
            Err(KeyError::InvalidName { .. })
        ));
    }
}
