//! Type references as exposed by the host framework's metadata model.
//!
//! Types are structural: two references are equal when they name the same
//! declaration with the same arguments. Display output is the canonical
//! type string used for ordering generated providers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive kinds known to the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `char`
    Char,
    /// `float`
    Float,
    /// `double`
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Boolean,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Char,
        Self::Float,
        Self::Double,
    ];

    /// Keyword used for the primitive in source form.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Fully-qualified name of the wrapper type the primitive boxes into.
    #[must_use]
    pub const fn boxed_name(self) -> &'static str {
        match self {
            Self::Boolean => "java.lang.Boolean",
            Self::Byte => "java.lang.Byte",
            Self::Short => "java.lang.Short",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Char => "java.lang.Character",
            Self::Float => "java.lang.Float",
            Self::Double => "java.lang.Double",
        }
    }

    /// Static parse method on the wrapper type, if the wrapper has one.
    ///
    /// `Character` has no parse method and is handled separately.
    #[must_use]
    pub const fn parse_method(self) -> Option<&'static str> {
        match self {
            Self::Boolean => Some("parseBoolean"),
            Self::Byte => Some("parseByte"),
            Self::Short => Some("parseShort"),
            Self::Int => Some("parseInt"),
            Self::Long => Some("parseLong"),
            Self::Float => Some("parseFloat"),
            Self::Double => Some("parseDouble"),
            Self::Char => None,
        }
    }

    /// Looks up the primitive whose wrapper has the given name.
    #[must_use]
    pub fn from_boxed_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.boxed_name() == name)
    }
}

/// A type as written at a declaration site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// A primitive such as `long`.
    Primitive {
        /// The primitive kind.
        name: PrimitiveKind,
    },
    /// A class or interface, optionally parameterised.
    Declared {
        /// Fully-qualified declaration name.
        name: String,
        /// Type arguments, in declaration order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeRef>,
    },
    /// An array of some component type.
    Array {
        /// Element type of the array.
        component: Box<TypeRef>,
    },
    /// An open type variable.
    Variable {
        /// Name of the variable.
        name: String,
    },
    /// A wildcard argument (`?`).
    Wildcard,
    /// The `void` pseudo-type.
    Void,
    /// A type the host could not resolve.
    Error,
}

impl TypeRef {
    /// Builds a non-generic declared type.
    #[must_use]
    pub fn declared(name: impl Into<String>) -> Self {
        Self::Declared {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Builds a parameterised declared type.
    #[must_use]
    pub fn generic(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Declared {
            name: name.into(),
            args,
        }
    }

    /// Builds a primitive type.
    #[must_use]
    pub const fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive { name: kind }
    }

    /// Name of the declaration, for declared types.
    #[must_use]
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Self::Declared { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Type arguments, for declared types.
    #[must_use]
    pub fn type_args(&self) -> &[Self] {
        match self {
            Self::Declared { args, .. } => args,
            _ => &[],
        }
    }

    /// Returns `true` when the type is the `void` pseudo-type.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns `true` when the type can be materialised at runtime.
    ///
    /// Type variables, wildcards, `void`, and unresolved types are rejected at
    /// any nesting depth.
    #[must_use]
    pub fn is_reified(&self) -> bool {
        match self {
            Self::Primitive { .. } => true,
            Self::Declared { args, .. } => args.iter().all(Self::is_reified),
            Self::Array { component } => component.is_reified(),
            Self::Variable { .. } | Self::Wildcard | Self::Void | Self::Error => false,
        }
    }

    /// Boxes primitives into their wrapper type; other types are returned as-is.
    #[must_use]
    pub fn boxed(&self) -> Self {
        match self {
            Self::Primitive { name } => Self::declared(name.boxed_name()),
            other => other.clone(),
        }
    }

    /// Replaces type variables according to `bindings`.
    #[must_use]
    pub fn substitute(&self, bindings: &BTreeMap<String, Self>) -> Self {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            Self::Variable { name } => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            Self::Declared { name, args } => Self::Declared {
                name: name.clone(),
                args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
            Self::Array { component } => Self::Array {
                component: Box::new(component.substitute(bindings)),
            },
            other => other.clone(),
        }
    }

    /// Erased form used to compare method signatures.
    ///
    /// Type arguments are dropped and unbound type variables erase to their
    /// bound, which the metadata model does not carry, so they collapse to a
    /// single placeholder.
    #[must_use]
    pub fn erased(&self) -> String {
        match self {
            Self::Primitive { name } => name.keyword().to_owned(),
            Self::Declared { name, .. } => name.clone(),
            Self::Array { component } => format!("{}[]", component.erased()),
            Self::Variable { .. } | Self::Wildcard => String::from("java.lang.Object"),
            Self::Void => String::from("void"),
            Self::Error => String::from("<error>"),
        }
    }

    /// Last segment of the declared name (`Long` for `java.lang.Long`).
    #[must_use]
    pub fn simple_name(&self) -> String {
        match self {
            Self::Declared { name, args } => {
                let base = name.rsplit(['.', '$']).next().unwrap_or(name);
                let mut out = base.to_owned();
                for arg in args {
                    out.push_str(&arg.simple_name());
                }
                out
            }
            Self::Array { component } => format!("{}Array", component.simple_name()),
            Self::Primitive { name } => name.keyword().to_owned(),
            Self::Variable { name } => name.clone(),
            Self::Wildcard => String::from("Wildcard"),
            Self::Void => String::from("Void"),
            Self::Error => String::from("Error"),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { name } => f.write_str(name.keyword()),
            Self::Declared { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Array { component } => write!(f, "{component}[]"),
            Self::Variable { name } => f.write_str(name),
            Self::Wildcard => f.write_str("?"),
            Self::Void => f.write_str("void"),
            Self::Error => f.write_str("<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn list_of(arg: TypeRef) -> TypeRef {
        TypeRef::generic("java.util.List", vec![arg])
    }

    #[rstest]
    #[case::primitive(TypeRef::primitive(PrimitiveKind::Long), true)]
    #[case::string(TypeRef::declared("java.lang.String"), true)]
    #[case::nested_variable(list_of(TypeRef::Variable { name: "T".into() }), false)]
    #[case::nested_wildcard(list_of(TypeRef::Wildcard), false)]
    #[case::void(TypeRef::Void, false)]
    #[case::array_of_error(TypeRef::Array { component: Box::new(TypeRef::Error) }, false)]
    fn reification(#[case] ty: TypeRef, #[case] expected: bool) {
        assert_eq!(ty.is_reified(), expected, "{ty}");
    }

    #[rstest]
    fn boxing_maps_primitives_to_wrappers() {
        assert_eq!(
            TypeRef::primitive(PrimitiveKind::Int).boxed(),
            TypeRef::declared("java.lang.Integer")
        );
        assert_eq!(
            PrimitiveKind::from_boxed_name("java.lang.Character"),
            Some(PrimitiveKind::Char)
        );
    }

    #[rstest]
    fn substitution_reaches_nested_arguments() {
        let bindings = BTreeMap::from([("T".to_owned(), TypeRef::declared("java.lang.String"))]);
        let ty = list_of(TypeRef::Variable { name: "T".into() });
        assert_eq!(ty.substitute(&bindings).to_string(), "java.util.List<java.lang.String>");
    }

    #[rstest]
    fn display_renders_generic_arguments() {
        let ty = TypeRef::generic(
            "java.util.Map",
            vec![TypeRef::declared("java.lang.String"), list_of(TypeRef::Wildcard)],
        );
        assert_eq!(ty.to_string(), "java.util.Map<java.lang.String, java.util.List<?>>");
        assert_eq!(ty.erased(), "java.util.Map");
    }
}
