//! Name templates such as `/${env.STAGE:-dev}/db/url`.
//!
//! A template is parsed in a single left-to-right scan. `${` opens a
//! reference group and the next unescaped `}` closes it; inside a group the
//! first unescaped `:` separates the reference from its default (a `-`
//! directly after the `:` is part of the delimiter). `\` escapes the
//! following character anywhere. A `$` not followed by `{` is literal.
//!
//! References name a namespace, `env.` for environment variables or `sys.`
//! for system properties, and are resolved against runtime lookups when the
//! generated module initialises.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Namespace a reference resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Namespace {
    /// Environment variables.
    Env,
    /// System properties.
    Sys,
}

impl Namespace {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Env => "env.",
            Self::Sys => "sys.",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Env => "environment variable",
            Self::Sys => "system property",
        })
    }
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, escapes already removed.
    Literal(String),
    /// A reference to a runtime value.
    Reference {
        /// Where the value comes from.
        namespace: Namespace,
        /// Variable or property name.
        name: String,
        /// Substitute used when the value is absent.
        default: Option<String>,
    },
}

/// Template parsing and resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `${` group is never closed.
    #[error("unterminated template expression at index {index} in '{template}'")]
    Unterminated {
        /// Full template text.
        template: String,
        /// Character index of the opening `$`.
        index: usize,
    },
    /// A group does not start with `env.` or `sys.`.
    #[error("unknown template namespace at index {index} in '{template}'; expected 'env.' or 'sys.'")]
    UnknownNamespace {
        /// Full template text.
        template: String,
        /// Character index of the group body.
        index: usize,
    },
    /// A group names no variable.
    #[error("empty template reference at index {index} in '{template}'")]
    EmptyName {
        /// Full template text.
        template: String,
        /// Character index where the name should start.
        index: usize,
    },
    /// A reference without default has no runtime value.
    #[error("{namespace} '{name}' referenced by '{template}' is not set")]
    Unresolved {
        /// Full template text.
        template: String,
        /// Namespace of the reference.
        namespace: Namespace,
        /// Name of the missing value.
        name: String,
    },
}

/// Source of runtime values.
pub trait Lookup {
    /// Returns the value stored under `name`.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<S: std::hash::BuildHasher> Lookup for std::collections::HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Lookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Runtime lookups for both namespaces.
#[derive(Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Environment variables.
    pub env: &'a dyn Lookup,
    /// System properties.
    pub sys: &'a dyn Lookup,
}

impl TemplateContext<'_> {
    fn lookup(&self, namespace: Namespace, name: &str) -> Option<String> {
        match namespace {
            Namespace::Env => self.env.lookup(name),
            Namespace::Sys => self.sys.lookup(name),
        }
    }
}

/// A parsed name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    raw: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Unterminated`], [`TemplateError::UnknownNamespace`],
    /// or [`TemplateError::EmptyName`] for malformed groups.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let chars: Vec<char> = raw.chars().collect();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut i = 0;
        while let Some(&c) = chars.get(i) {
            match c {
                '\\' => {
                    literal.push(chars.get(i + 1).copied().unwrap_or('\\'));
                    i += 2;
                }
                '$' if chars.get(i + 1) == Some(&'{') => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let (segment, next) = parse_group(raw, &chars, i)?;
                    segments.push(segment);
                    i = next;
                }
                _ => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// Original template text.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` when the template contains no references.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// Literal text with references replaced by a fixed marker; used to
    /// validate names before runtime values are known.
    #[must_use]
    pub fn skeleton(&self, placeholder: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Reference { .. } => placeholder,
            })
            .collect()
    }

    /// Substitutes every reference.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Unresolved`] for the first reference that has
    /// neither a runtime value nor a default.
    pub fn resolve(&self, context: &TemplateContext<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Reference {
                    namespace,
                    name,
                    default,
                } => {
                    let value = context
                        .lookup(*namespace, name)
                        .or_else(|| default.clone())
                        .ok_or_else(|| TemplateError::Unresolved {
                            template: self.raw.clone(),
                            namespace: *namespace,
                            name: name.clone(),
                        })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses the group opened by the `$` at `start`; returns the segment and the
/// index just past the closing brace.
fn parse_group(raw: &str, chars: &[char], start: usize) -> Result<(Segment, usize), TemplateError> {
    let body_start = start + 2;
    let mut reference = String::new();
    let mut default: Option<String> = None;
    let mut i = body_start;
    loop {
        let Some(&c) = chars.get(i) else {
            return Err(TemplateError::Unterminated {
                template: raw.to_owned(),
                index: start,
            });
        };
        let in_default = default.is_some();
        let target = default.as_mut().unwrap_or(&mut reference);
        match c {
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    target.push(next);
                }
                i += 2;
            }
            '}' => break,
            ':' if !in_default => {
                default = Some(String::new());
                i += if chars.get(i + 1) == Some(&'-') { 2 } else { 1 };
            }
            _ => {
                target.push(c);
                i += 1;
            }
        }
    }

    let namespace = [Namespace::Env, Namespace::Sys]
        .into_iter()
        .find(|ns| reference.starts_with(ns.prefix()))
        .ok_or_else(|| TemplateError::UnknownNamespace {
            template: raw.to_owned(),
            index: body_start,
        })?;
    let name = reference
        .strip_prefix(namespace.prefix())
        .unwrap_or_default()
        .to_owned();
    if name.is_empty() {
        return Err(TemplateError::EmptyName {
            template: raw.to_owned(),
            index: body_start + namespace.prefix().len(),
        });
    }
    Ok((
        Segment::Reference {
            namespace,
            name,
            default,
        },
        i + 1,
    ))
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn context<'a>(
        env: &'a BTreeMap<String, String>,
        sys: &'a BTreeMap<String, String>,
    ) -> TemplateContext<'a> {
        TemplateContext { env, sys }
    }

    #[rstest]
    fn parses_references_with_and_without_defaults() -> anyhow::Result<()> {
        let template = Template::parse("/${env.STAGE:-dev}/db/${sys.db.name}")?;
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("/".into()),
                Segment::Reference {
                    namespace: Namespace::Env,
                    name: "STAGE".into(),
                    default: Some("dev".into()),
                },
                Segment::Literal("/db/".into()),
                Segment::Reference {
                    namespace: Namespace::Sys,
                    name: "db.name".into(),
                    default: None,
                },
            ]
        );
        assert!(!template.is_literal());
        assert_eq!(template.skeleton("x"), "/x/db/x");
        Ok(())
    }

    #[rstest]
    #[case::bare_dollar("cost$5", "cost$5")]
    #[case::escaped_group(r"\${env.HOME}", "${env.HOME}")]
    #[case::plain("app.timeout", "app.timeout")]
    fn literals_survive(#[case] raw: &str, #[case] expected: &str) -> anyhow::Result<()> {
        let template = Template::parse(raw)?;
        assert!(template.is_literal());
        assert_eq!(template.skeleton(""), expected);
        Ok(())
    }

    #[rstest]
    fn only_first_colon_delimits_the_default() -> anyhow::Result<()> {
        let template = Template::parse("${env.URL:http://localhost:8080}")?;
        assert_eq!(
            template.segments().first(),
            Some(&Segment::Reference {
                namespace: Namespace::Env,
                name: "URL".into(),
                default: Some("http://localhost:8080".into()),
            })
        );
        Ok(())
    }

    #[rstest]
    #[case::at_start("${env.STAGE", 0)]
    #[case::after_prefix("prefix/${env.STAGE", 7)]
    fn unterminated_group_reports_opening_index(#[case] raw: &str, #[case] index: usize) {
        assert_eq!(
            Template::parse(raw),
            Err(TemplateError::Unterminated {
                template: raw.to_owned(),
                index,
            })
        );
    }

    #[rstest]
    fn rejects_unknown_namespace_and_empty_name() {
        assert!(matches!(
            Template::parse("${home}"),
            Err(TemplateError::UnknownNamespace { index: 2, .. })
        ));
        assert!(matches!(
            Template::parse("a${env.}"),
            Err(TemplateError::EmptyName { index: 7, .. })
        ));
    }

    #[rstest]
    fn resolves_against_lookups() -> anyhow::Result<()> {
        let env = BTreeMap::from([("STAGE".to_owned(), "prod".to_owned())]);
        let sys = BTreeMap::new();
        let template = Template::parse("/${env.STAGE}/${sys.region:-eu}/url")?;
        assert_eq!(template.resolve(&context(&env, &sys))?, "/prod/eu/url");

        let missing = Template::parse("${sys.region}")?;
        assert!(matches!(
            missing.resolve(&context(&env, &sys)),
            Err(TemplateError::Unresolved { namespace: Namespace::Sys, .. })
        ));
        Ok(())
    }

    #[rstest]
    fn process_environment_is_a_lookup() -> anyhow::Result<()> {
        let _guard = test_helpers::env::set_var("INJECTCONF_TEMPLATE_STAGE", "qa");
        let sys = BTreeMap::new();
        let template = Template::parse("${env.INJECTCONF_TEMPLATE_STAGE}")?;
        let resolved = template.resolve(&TemplateContext {
            env: &ProcessEnv,
            sys: &sys,
        })?;
        assert_eq!(resolved, "qa");
        Ok(())
    }
}
