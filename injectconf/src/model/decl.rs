//! Declarations: classes, members, and the annotations attached to them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::TypeRef;

/// Opaque reference to a syntactic location, used only in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Wraps a location string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Location string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn member(owner: &str, member: &str) -> Self {
        Self(format!("{owner}#{member}"))
    }

    pub(crate) fn parameter(owner: &str, member: &str, param: &str) -> Self {
        Self(format!("{owner}#{member}({param})"))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value stored in an annotation element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// Boolean element.
    Bool(bool),
    /// Integral element.
    Int(i64),
    /// String or class-literal element.
    Str(String),
    /// Array element.
    List(Vec<AnnotationValue>),
}

impl AnnotationValue {
    /// String payload, if the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Integral payload, if the value is an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// String entries of an array value; a single string counts as one entry.
    #[must_use]
    pub fn string_list(&self) -> Vec<&str> {
        match self {
            Self::Str(value) => vec![value.as_str()],
            Self::List(items) => items.iter().filter_map(Self::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// An annotation instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Fully-qualified annotation type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Explicitly supplied element values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, AnnotationValue>,
}

impl Annotation {
    /// Creates an annotation without element values.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Adds an element value.
    #[must_use]
    pub fn with(mut self, element: impl Into<String>, value: AnnotationValue) -> Self {
        self.values.insert(element.into(), value);
        self
    }

    /// Adds a string element value.
    #[must_use]
    pub fn with_str(self, element: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(element, AnnotationValue::Str(value.into()))
    }

    /// Looks up an element value.
    #[must_use]
    pub fn get(&self, element: &str) -> Option<&AnnotationValue> {
        self.values.get(element)
    }

    /// Looks up a string element value.
    #[must_use]
    pub fn get_str(&self, element: &str) -> Option<&str> {
        self.get(element).and_then(AnnotationValue::as_str)
    }

    /// Simple name of the annotation type.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.type_name
            .rsplit(['.', '$'])
            .next()
            .unwrap_or(&self.type_name)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.type_name)?;
        if self.values.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value:?}")?;
        }
        f.write_str(")")
    }
}

/// Member and class modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// `public`
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
    /// `static`
    Static,
    /// `final`
    Final,
    /// `abstract`
    Abstract,
    /// `default`, an interface method with a body.
    Default,
}

/// Shape of a type declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    /// A class.
    #[default]
    Class,
    /// An interface; always abstract.
    Interface,
    /// An enum; carries an implicit `valueOf(String)`.
    Enum,
    /// An annotation type.
    Annotation,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Annotations on the parameter.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// A method or constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Method name; constructors use `<init>`.
    #[serde(default = "MethodDecl::constructor_name")]
    pub name: String,
    /// Modifiers.
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Annotations on the method.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Parameters, in order.
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Return type; `void` for constructors.
    #[serde(default = "MethodDecl::void")]
    pub returns: TypeRef,
}

impl MethodDecl {
    fn constructor_name() -> String {
        String::from("<init>")
    }

    const fn void() -> TypeRef {
        TypeRef::Void
    }

    /// Returns `true` when the method carries `modifier`.
    #[must_use]
    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Returns `true` when any annotation has one of the given type names.
    #[must_use]
    pub fn annotated_with(&self, names: &[String]) -> bool {
        annotated_with(&self.annotations, names)
    }
}

/// A field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Modifiers.
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Annotations on the field.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl FieldDecl {
    /// Returns `true` when the field carries `modifier`.
    #[must_use]
    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

/// A class, interface, enum, or annotation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Fully-qualified name.
    pub name: String,
    /// Declaration shape.
    #[serde(default)]
    pub kind: ClassKind,
    /// Modifiers.
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Declared type parameters.
    #[serde(default)]
    pub type_params: Vec<String>,
    /// Direct superclass, if any.
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    /// Directly implemented or extended interfaces.
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    /// Annotations on the type.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Constructors.
    #[serde(default)]
    pub constructors: Vec<MethodDecl>,
    /// Fields.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Methods.
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    /// Creates an empty class declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Vec::new(),
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Returns `true` for interfaces and classes marked `abstract`.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
            || self.modifiers.contains(&Modifier::Abstract)
    }

    /// First annotation whose type is one of `names`.
    #[must_use]
    pub fn annotation(&self, names: &[String]) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|annotation| names.contains(&annotation.type_name))
    }

    /// Direct supertypes: the superclass first, then interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}

pub(crate) fn annotated_with(annotations: &[Annotation], names: &[String]) -> bool {
    annotations
        .iter()
        .any(|annotation| names.contains(&annotation.type_name))
}
