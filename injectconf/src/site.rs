//! Consumption sites: every point where a value is requested.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::{Annotation, ElementId, TypeRef, Universe};

/// Where a value is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Return value of an abstract component provision method.
    ComponentProvisionResult,
    /// Parameter of a static module provider method.
    ModuleStaticProviderParameter,
    /// Parameter of an instance module provider method.
    ModuleInstanceProviderParameter,
    /// Parameter of an injectable constructor.
    InjectedConstructorParameter,
    /// An injectable field.
    InjectedField,
    /// Parameter of an injectable method.
    InjectedMethodParameter,
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ComponentProvisionResult => "component provision",
            Self::ModuleStaticProviderParameter => "static provider parameter",
            Self::ModuleInstanceProviderParameter => "instance provider parameter",
            Self::InjectedConstructorParameter => "constructor parameter",
            Self::InjectedField => "field",
            Self::InjectedMethodParameter => "method parameter",
        })
    }
}

/// How the declared type wraps the supplied payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStyle {
    /// Declared type is the payload.
    Verbatim,
    /// Declared a primitive; the payload is its wrapper.
    Primitive,
    /// Payload wrapped in a deferred supplier.
    Provider,
    /// Payload wrapped in a memoizing supplier.
    Lazy,
    /// Payload wrapped in an optional; implies nullable.
    Optional,
}

/// Reasons a site is rejected before entering the result set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiteError {
    /// The payload type cannot be materialised.
    #[error("{kind} {element} requests non-reified type '{ty}'")]
    InvalidType {
        /// Offending site.
        element: ElementId,
        /// Site kind.
        kind: SiteKind,
        /// Rejected type.
        ty: TypeRef,
    },
    /// More than one qualifier is attached.
    #[error("{kind} {element} carries {count} qualifiers; at most one is allowed")]
    MultipleQualifiers {
        /// Offending site.
        element: ElementId,
        /// Site kind.
        kind: SiteKind,
        /// Number of qualifiers found.
        count: usize,
    },
}

impl SiteError {
    /// Location the error is attached to.
    #[must_use]
    pub const fn element(&self) -> &ElementId {
        match self {
            Self::InvalidType { element, .. } | Self::MultipleQualifiers { element, .. } => element,
        }
    }
}

/// A point where a value of some type is required.
///
/// Equality and ordering consider the element, kind, provision style,
/// supplied type, and marker; the declared type and nullability follow from
/// those and are ignored.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionSite {
    /// Syntactic location.
    pub element: ElementId,
    /// Site kind.
    pub kind: SiteKind,
    /// Type as written.
    pub declared_type: TypeRef,
    /// Wrapper shape of `declared_type`.
    pub style: ProvisionStyle,
    /// Payload type after unwrapping and boxing.
    pub supplied_type: TypeRef,
    /// Qualifier carried by the site.
    pub marker: Option<Annotation>,
    /// Whether an absent value is acceptable.
    pub nullable: bool,
}

impl ConsumptionSite {
    /// Classifies a raw request into a site.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] when the payload type is not reified or more than
    /// one qualifier is attached.
    pub fn classify(
        universe: &Universe,
        element: ElementId,
        kind: SiteKind,
        declared_type: &TypeRef,
        annotations: &[Annotation],
    ) -> Result<Self, SiteError> {
        let (style, supplied_type) = unwrap_style(universe, declared_type);
        if !supplied_type.is_reified() {
            return Err(SiteError::InvalidType {
                element,
                kind,
                ty: declared_type.clone(),
            });
        }
        let mut qualifiers = annotations
            .iter()
            .filter(|annotation| universe.is_qualifier(annotation));
        let marker = qualifiers.next().cloned();
        let extra = qualifiers.count();
        if extra > 0 {
            return Err(SiteError::MultipleQualifiers {
                element,
                kind,
                count: extra + 1,
            });
        }
        let nullable = style == ProvisionStyle::Optional || universe.is_nullable(annotations);
        Ok(Self {
            element,
            kind,
            declared_type: declared_type.clone(),
            style,
            supplied_type,
            marker,
            nullable,
        })
    }

    fn identity(&self) -> (&ElementId, SiteKind, ProvisionStyle, &TypeRef, Option<&Annotation>) {
        (
            &self.element,
            self.kind,
            self.style,
            &self.supplied_type,
            self.marker.as_ref(),
        )
    }
}

impl PartialEq for ConsumptionSite {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ConsumptionSite {}

impl PartialOrd for ConsumptionSite {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConsumptionSite {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

fn unwrap_style(universe: &Universe, declared: &TypeRef) -> (ProvisionStyle, TypeRef) {
    let conventions = universe.conventions();
    match declared {
        TypeRef::Primitive { .. } => (ProvisionStyle::Primitive, declared.boxed()),
        TypeRef::Declared { name, args } if args.len() == 1 => {
            let style = if *name == conventions.provider_type {
                ProvisionStyle::Provider
            } else if *name == conventions.lazy_type {
                ProvisionStyle::Lazy
            } else if conventions.optional_types.contains(name) {
                ProvisionStyle::Optional
            } else {
                ProvisionStyle::Verbatim
            };
            match (style, args.first()) {
                (ProvisionStyle::Verbatim, _) | (_, None) => {
                    (ProvisionStyle::Verbatim, declared.clone())
                }
                (ProvisionStyle::Provider, Some(inner))
                    if inner.declared_name() == Some(conventions.lazy_type.as_str()) =>
                {
                    // Provider<Lazy<T>> supplies T.
                    let payload = inner.type_args().first().cloned().unwrap_or(TypeRef::Error);
                    (ProvisionStyle::Provider, payload)
                }
                (style, Some(inner)) => (style, inner.clone()),
            }
        }
        _ => (ProvisionStyle::Verbatim, declared.clone()),
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::config::{Conventions, MarkerTypes};
    use crate::model::{GraphDocument, PrimitiveKind};
    use rstest::{fixture, rstest};

    #[fixture]
    fn universe() -> Universe {
        Universe::new(
            GraphDocument::default(),
            Conventions::default(),
            MarkerTypes::default(),
        )
    }

    fn wrap(name: &str, inner: TypeRef) -> TypeRef {
        TypeRef::generic(name, vec![inner])
    }

    fn string() -> TypeRef {
        TypeRef::declared("java.lang.String")
    }

    #[rstest]
    #[case::verbatim(string(), ProvisionStyle::Verbatim, string())]
    #[case::primitive(
        TypeRef::primitive(PrimitiveKind::Long),
        ProvisionStyle::Primitive,
        TypeRef::declared("java.lang.Long")
    )]
    #[case::provider(wrap("javax.inject.Provider", string()), ProvisionStyle::Provider, string())]
    #[case::lazy(wrap("dagger.Lazy", string()), ProvisionStyle::Lazy, string())]
    #[case::optional(wrap("java.util.Optional", string()), ProvisionStyle::Optional, string())]
    #[case::provider_of_lazy(
        wrap("javax.inject.Provider", wrap("dagger.Lazy", string())),
        ProvisionStyle::Provider,
        string()
    )]
    #[case::plain_generic(
        wrap("java.util.List", string()),
        ProvisionStyle::Verbatim,
        wrap("java.util.List", string())
    )]
    fn unwraps_provision_styles(
        universe: Universe,
        #[case] declared: TypeRef,
        #[case] style: ProvisionStyle,
        #[case] supplied: TypeRef,
    ) -> anyhow::Result<()> {
        let site = ConsumptionSite::classify(
            &universe,
            ElementId::new("app.Root#value()"),
            SiteKind::ComponentProvisionResult,
            &declared,
            &[],
        )?;
        assert_eq!(site.style, style);
        assert_eq!(site.supplied_type, supplied);
        assert_eq!(site.nullable, style == ProvisionStyle::Optional);
        Ok(())
    }

    #[rstest]
    fn nullable_annotation_marks_site_nullable(universe: Universe) -> anyhow::Result<()> {
        let site = ConsumptionSite::classify(
            &universe,
            ElementId::new("app.Service#name"),
            SiteKind::InjectedField,
            &string(),
            &[
                Annotation::new("javax.annotation.Nullable"),
                Annotation::new("io.injectconf.EnvironmentVariable").with_str("value", "NAME"),
            ],
        )?;
        assert!(site.nullable);
        assert_eq!(
            site.marker.map(|m| m.type_name),
            Some(String::from("io.injectconf.EnvironmentVariable"))
        );
        Ok(())
    }

    #[rstest]
    fn rejects_open_types_and_double_qualifiers(universe: Universe) {
        let open = ConsumptionSite::classify(
            &universe,
            ElementId::new("app.Root#items()"),
            SiteKind::ComponentProvisionResult,
            &wrap("javax.inject.Provider", TypeRef::Variable { name: "T".into() }),
            &[],
        );
        assert!(matches!(open, Err(SiteError::InvalidType { .. })));

        let doubled = ConsumptionSite::classify(
            &universe,
            ElementId::new("app.Root#port()"),
            SiteKind::ComponentProvisionResult,
            &string(),
            &[
                Annotation::new("io.injectconf.EnvironmentVariable"),
                Annotation::new("io.injectconf.SystemProperty"),
            ],
        );
        assert!(matches!(
            doubled,
            Err(SiteError::MultipleQualifiers { count: 2, .. })
        ));
    }

    #[rstest]
    fn identity_ignores_declared_type(universe: Universe) -> anyhow::Result<()> {
        let element = ElementId::new("app.Root#value()");
        let a = ConsumptionSite::classify(
            &universe,
            element.clone(),
            SiteKind::ComponentProvisionResult,
            &string(),
            &[],
        )?;
        let mut b = a.clone();
        b.declared_type = TypeRef::declared("java.lang.CharSequence");
        assert_eq!(a, b);
        let c = ConsumptionSite::classify(
            &universe,
            element,
            SiteKind::InjectedField,
            &string(),
            &[],
        )?;
        assert_ne!(a, c);
        Ok(())
    }
}
