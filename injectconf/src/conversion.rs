//! Type-conversion resolution.
//!
//! Finds how a provider turns the source's native value into the requested
//! type. Candidates are tried in a fixed order and the first match wins:
//!
//! 1. identity;
//! 2. the boxed numeric and boolean wrappers via their parse call;
//! 3. `Character` via the first character of the value;
//! 4. a public static `valueOf(S)` returning the target (enums have one
//!    implicitly);
//! 5. a public static `fromString(S)` when `S` is the string type;
//! 6. a public single-argument constructor taking `S`;
//! 7. list-like to list-like, mapping each element with the conversion
//!    resolved for the element types.

use serde::Serialize;
use thiserror::Error;

use crate::model::{ClassKind, Modifier, PrimitiveKind, TypeRef, Universe};

/// Member lookups conversion resolution depends on.
pub trait ConversionCapabilities {
    /// Returns `true` when `owner` declares a public static `method(param)`
    /// returning `owner`.
    fn find_static_factory(&self, owner: &TypeRef, method: &str, param: &TypeRef) -> bool;

    /// Returns `true` when `owner` declares a public constructor taking only
    /// `param`.
    fn find_constructor(&self, owner: &TypeRef, param: &TypeRef) -> bool;

    /// Element type when `ty` is list-like.
    fn list_element<'t>(&self, ty: &'t TypeRef) -> Option<&'t TypeRef>;

    /// Returns `true` for the string type.
    fn is_string(&self, ty: &TypeRef) -> bool;
}

impl ConversionCapabilities for Universe {
    fn find_static_factory(&self, owner: &TypeRef, method: &str, param: &TypeRef) -> bool {
        let Some(class) = self.class_of(owner) else {
            return false;
        };
        if class.kind == ClassKind::Enum && method == "valueOf" && self.is_string(param) {
            return true;
        }
        class.methods.iter().any(|candidate| {
            candidate.name == method
                && candidate.has(Modifier::Public)
                && candidate.has(Modifier::Static)
                && candidate.returns.erased() == owner.erased()
                && matches!(candidate.params.as_slice(), [only] if only.ty.erased() == param.erased())
        })
    }

    fn find_constructor(&self, owner: &TypeRef, param: &TypeRef) -> bool {
        self.class_of(owner).is_some_and(|class| {
            !class.is_abstract()
                && class.constructors.iter().any(|ctor| {
                    ctor.has(Modifier::Public)
                        && matches!(ctor.params.as_slice(), [only] if only.ty.erased() == param.erased())
                })
        })
    }

    fn list_element<'t>(&self, ty: &'t TypeRef) -> Option<&'t TypeRef> {
        Self::list_element(self, ty)
    }

    fn is_string(&self, ty: &TypeRef) -> bool {
        Self::is_string(self, ty)
    }
}

/// How a provider derives its value from the native one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Conversion {
    /// The native value is already the target.
    Identity,
    /// A wrapper's parse call, such as `Long.parseLong`.
    Parse {
        /// Wrapper type.
        wrapper: String,
        /// Static parse method.
        method: String,
    },
    /// The first character; an empty value is an error.
    FirstChar,
    /// A static factory on the target.
    StaticFactory {
        /// Target type.
        owner: String,
        /// `valueOf` or `fromString`.
        method: String,
    },
    /// A single-argument constructor.
    Constructor {
        /// Target type.
        owner: String,
    },
    /// Element-wise mapping of a list.
    ListMap {
        /// Conversion applied to every element.
        element: Box<Conversion>,
    },
}

impl Conversion {
    /// Renders the conversion as an expression over `value`.
    #[must_use]
    pub fn render(&self, value: &str) -> String {
        match self {
            Self::Identity => value.to_owned(),
            Self::Parse { wrapper, method } => format!("{wrapper}.{method}({value})"),
            Self::FirstChar => format!("firstChar({value})"),
            Self::StaticFactory { owner, method } => format!("{owner}.{method}({value})"),
            Self::Constructor { owner } => format!("new {owner}({value})"),
            Self::ListMap { element } => {
                format!("map({value}, item -> {})", element.render("item"))
            }
        }
    }
}

/// No strategy converts between two types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Every strategy was tried and none matched.
    #[error("cannot convert {source_type} to {target}: no valueOf, fromString, or single-argument constructor")]
    Unconvertible {
        /// Requested type.
        target: TypeRef,
        /// Native type of the source.
        source_type: TypeRef,
    },
}

/// Resolves how to turn `source` into `target`.
///
/// # Errors
///
/// Returns [`ConversionError::Unconvertible`] naming both types when no
/// strategy applies.
pub fn resolve(
    caps: &dyn ConversionCapabilities,
    target: &TypeRef,
    source: &TypeRef,
) -> Result<Conversion, ConversionError> {
    let target = target.boxed();
    if target == *source {
        return Ok(Conversion::Identity);
    }
    if caps.is_string(source)
        && let Some(kind) = target.declared_name().and_then(PrimitiveKind::from_boxed_name)
    {
        return Ok(match kind.parse_method() {
            Some(method) => Conversion::Parse {
                wrapper: kind.boxed_name().to_owned(),
                method: method.to_owned(),
            },
            None => Conversion::FirstChar,
        });
    }
    if let Some(owner) = target.declared_name() {
        if caps.find_static_factory(&target, "valueOf", source) {
            return Ok(Conversion::StaticFactory {
                owner: owner.to_owned(),
                method: String::from("valueOf"),
            });
        }
        if caps.is_string(source) && caps.find_static_factory(&target, "fromString", source) {
            return Ok(Conversion::StaticFactory {
                owner: owner.to_owned(),
                method: String::from("fromString"),
            });
        }
        if caps.find_constructor(&target, source) {
            return Ok(Conversion::Constructor {
                owner: owner.to_owned(),
            });
        }
    }
    if let (Some(target_element), Some(source_element)) =
        (caps.list_element(&target), caps.list_element(source))
    {
        return resolve(caps, target_element, source_element)
            .map(|element| Conversion::ListMap {
                element: Box::new(element),
            })
            .map_err(|_| ConversionError::Unconvertible {
                target: target.clone(),
                source_type: source.clone(),
            });
    }
    Err(ConversionError::Unconvertible {
        target,
        source_type: source.clone(),
    })
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::model::{ClassDecl, MethodDecl};
    use crate::walker::fixtures::{constructor, method, param, string, universe};
    use rstest::rstest;

    fn factory(name: &str, owner: &str) -> MethodDecl {
        method(
            name,
            &[Modifier::Public, Modifier::Static],
            Vec::new(),
            vec![param("text", string(), Vec::new())],
            TypeRef::declared(owner),
        )
    }

    fn strings() -> TypeRef {
        TypeRef::generic("java.util.List", vec![string()])
    }

    #[rstest]
    #[case::long("java.lang.Long", "java.lang.Long.parseLong(v)")]
    #[case::boolean("java.lang.Boolean", "java.lang.Boolean.parseBoolean(v)")]
    #[case::character("java.lang.Character", "firstChar(v)")]
    #[case::string("java.lang.String", "v")]
    fn builtin_targets(#[case] target: &str, #[case] expected: &str) -> anyhow::Result<()> {
        let universe = universe(Vec::new());
        let conversion = resolve(&universe, &TypeRef::declared(target), &string())?;
        assert_eq!(conversion.render("v"), expected);
        Ok(())
    }

    #[rstest]
    fn primitive_targets_are_boxed_first() -> anyhow::Result<()> {
        let universe = universe(Vec::new());
        let conversion = resolve(&universe, &TypeRef::primitive(PrimitiveKind::Int), &string())?;
        assert_eq!(conversion.render("v"), "java.lang.Integer.parseInt(v)");
        Ok(())
    }

    #[rstest]
    fn value_of_beats_from_string() -> anyhow::Result<()> {
        let mut class = ClassDecl::new("app.Level", ClassKind::Class);
        class.methods.push(factory("fromString", "app.Level"));
        class.methods.push(factory("valueOf", "app.Level"));
        let universe = universe(vec![class]);
        let conversion = resolve(&universe, &TypeRef::declared("app.Level"), &string())?;
        assert_eq!(
            conversion,
            Conversion::StaticFactory {
                owner: "app.Level".into(),
                method: "valueOf".into()
            }
        );
        Ok(())
    }

    #[rstest]
    fn enums_have_an_implicit_value_of() -> anyhow::Result<()> {
        let universe = universe(vec![ClassDecl::new("app.Mode", ClassKind::Enum)]);
        let conversion = resolve(&universe, &TypeRef::declared("app.Mode"), &string())?;
        assert_eq!(conversion.render("v"), "app.Mode.valueOf(v)");
        Ok(())
    }

    #[rstest]
    fn constructors_are_the_last_scalar_strategy() -> anyhow::Result<()> {
        let mut class = ClassDecl::new("app.Url", ClassKind::Class);
        class.constructors.push(constructor(
            Vec::new(),
            vec![param("text", string(), Vec::new())],
        ));
        let universe = universe(vec![class]);
        let conversion = resolve(&universe, &TypeRef::declared("app.Url"), &string())?;
        assert_eq!(conversion.render("v"), "new app.Url(v)");
        Ok(())
    }

    #[rstest]
    fn private_or_instance_factories_do_not_count() {
        let mut class = ClassDecl::new("app.Opaque", ClassKind::Class);
        class.methods.push(method(
            "valueOf",
            &[Modifier::Public],
            Vec::new(),
            vec![param("text", string(), Vec::new())],
            TypeRef::declared("app.Opaque"),
        ));
        class.methods.push(method(
            "fromString",
            &[Modifier::Private, Modifier::Static],
            Vec::new(),
            vec![param("text", string(), Vec::new())],
            TypeRef::declared("app.Opaque"),
        ));
        let universe = universe(vec![class]);
        assert_eq!(
            resolve(&universe, &TypeRef::declared("app.Opaque"), &string()),
            Err(ConversionError::Unconvertible {
                target: TypeRef::declared("app.Opaque"),
                source_type: string(),
            })
        );
    }

    #[rstest]
    fn unconvertible_error_names_both_types() {
        let universe = universe(vec![ClassDecl::new("app.Opaque", ClassKind::Class)]);
        let err = resolve(&universe, &TypeRef::declared("app.Opaque"), &string())
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.contains("app.Opaque") && err.contains("java.lang.String"), "{err}");
    }

    #[rstest]
    fn lists_map_their_elements() -> anyhow::Result<()> {
        let universe = universe(Vec::new());
        let target = TypeRef::generic("java.util.Collection", vec![TypeRef::declared("java.lang.Long")]);
        let conversion = resolve(&universe, &target, &strings())?;
        assert_eq!(
            conversion.render("v"),
            "map(v, item -> java.lang.Long.parseLong(item))"
        );
        Ok(())
    }

    #[rstest]
    fn unconvertible_elements_fail_the_whole_list() {
        let universe = universe(vec![ClassDecl::new("app.Opaque", ClassKind::Class)]);
        let target = TypeRef::generic("java.util.List", vec![TypeRef::declared("app.Opaque")]);
        assert_eq!(
            resolve(&universe, &target, &strings()),
            Err(ConversionError::Unconvertible {
                target,
                source_type: strings(),
            })
        );
    }
}
