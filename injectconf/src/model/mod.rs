//! Read-only metadata model of the host dependency-injection graph.
//!
//! The host framework materialises its declarations into a [`GraphDocument`]
//! before analysis starts. [`Universe`] indexes that document by name and
//! answers the structural questions the walkers ask: ancestry, markers,
//! qualifiers, and wrapper types.

mod decl;
mod types;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

pub use decl::{
    Annotation, AnnotationValue, ClassDecl, ClassKind, ElementId, FieldDecl, MethodDecl,
    Modifier, ParamDecl,
};
pub(crate) use decl::annotated_with;
pub use types::{PrimitiveKind, TypeRef};

use crate::config::{Conventions, MarkerTypes};
use crate::error::InjectconfError;

/// Serialized form of the host graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Every declaration the host exposes.
    pub classes: Vec<ClassDecl>,
}

impl GraphDocument {
    /// Parses a graph document from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`InjectconfError::GraphJson`] when the input is malformed.
    pub fn from_json(input: &str) -> Result<Self, InjectconfError> {
        serde_json::from_str(input).map_err(InjectconfError::GraphJson)
    }
}

/// One ancestor reached while walking a type's hierarchy.
#[derive(Debug, Clone)]
pub struct Ancestor<'u> {
    /// The ancestor declaration.
    pub class: &'u ClassDecl,
    /// Type-variable bindings as seen from the walked type.
    pub bindings: BTreeMap<String, TypeRef>,
}

/// Indexed view over a [`GraphDocument`].
#[derive(Debug, Clone)]
pub struct Universe {
    classes: BTreeMap<String, ClassDecl>,
    conventions: Conventions,
    markers: MarkerTypes,
}

impl Universe {
    /// Indexes `document` under the given conventions.
    ///
    /// Later declarations with a duplicate name replace earlier ones.
    #[must_use]
    pub fn new(document: GraphDocument, conventions: Conventions, markers: MarkerTypes) -> Self {
        let classes = document
            .classes
            .into_iter()
            .map(|class| (class.name.clone(), class))
            .collect();
        Self {
            classes,
            conventions,
            markers,
        }
    }

    /// Host naming conventions.
    #[must_use]
    pub const fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Looks up a declaration by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.get(name)
    }

    /// Looks up the declaration behind a declared type.
    #[must_use]
    pub fn class_of(&self, ty: &TypeRef) -> Option<&ClassDecl> {
        ty.declared_name().and_then(|name| self.class(name))
    }

    /// All declarations, ordered by name.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.values()
    }

    /// Names of every declaration carrying a component marker.
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        self.classes
            .values()
            .filter(|class| class.annotation(&self.conventions.component_annotations).is_some())
            .map(|class| class.name.clone())
            .collect()
    }

    /// Returns `true` when `annotation` is a qualifier.
    ///
    /// Source markers always qualify; other annotation types qualify when
    /// their declaration carries the qualifier meta-annotation.
    #[must_use]
    pub fn is_qualifier(&self, annotation: &Annotation) -> bool {
        if self.markers.contains(&annotation.type_name) {
            return true;
        }
        self.class(&annotation.type_name).is_some_and(|decl| {
            decl.annotations
                .iter()
                .any(|meta| meta.type_name == self.conventions.qualifier_annotation)
        })
    }

    /// Returns `true` when any annotation is a nullable marker.
    #[must_use]
    pub fn is_nullable(&self, annotations: &[Annotation]) -> bool {
        annotations.iter().any(|annotation| {
            self.conventions
                .nullable_simple_names
                .iter()
                .any(|name| name == annotation.simple_name())
        })
    }

    /// Returns `true` when `ty` is the native string type.
    #[must_use]
    pub fn is_string(&self, ty: &TypeRef) -> bool {
        ty.declared_name() == Some(self.conventions.string_type.as_str()) && ty.type_args().is_empty()
    }

    /// The native string type.
    #[must_use]
    pub fn string_type(&self) -> TypeRef {
        TypeRef::declared(self.conventions.string_type.clone())
    }

    /// Element type when `ty` is one of the list-like containers.
    #[must_use]
    pub fn list_element<'t>(&self, ty: &'t TypeRef) -> Option<&'t TypeRef> {
        match ty {
            TypeRef::Declared { name, args } if args.len() == 1 => self
                .conventions
                .list_types
                .contains(name)
                .then(|| args.first())
                .flatten(),
            _ => None,
        }
    }

    /// Walks `ty` and every ancestor breadth-first, most-derived first.
    ///
    /// Each declaration is visited once. Supertypes missing from the
    /// universe are skipped. Bindings map each ancestor's type parameters to
    /// the arguments they take when seen from `ty`.
    #[must_use]
    pub fn ancestry(&self, ty: &TypeRef) -> Vec<Ancestor<'_>> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(current) = queue.pop_front() {
            let Some(class) = self.class_of(&current) else {
                continue;
            };
            if !seen.insert(class.name.clone()) {
                continue;
            }
            let bindings: BTreeMap<String, TypeRef> = class
                .type_params
                .iter()
                .cloned()
                .zip(current.type_args().iter().cloned())
                .collect();
            for parent in class.supertypes() {
                queue.push_back(parent.substitute(&bindings));
            }
            out.push(Ancestor { class, bindings });
        }
        out
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

    fn universe(classes: Vec<ClassDecl>) -> Universe {
        Universe::new(
            GraphDocument { classes },
            Conventions::default(),
            MarkerTypes::default(),
        )
    }

    #[rstest]
    fn ancestry_substitutes_generic_arguments() {
        let mut base = ClassDecl::new("app.Base", ClassKind::Class);
        base.type_params = vec![String::from("T")];
        base.interfaces = vec![TypeRef::generic(
            "app.Holder",
            vec![TypeRef::Variable { name: "T".into() }],
        )];
        let mut holder = ClassDecl::new("app.Holder", ClassKind::Interface);
        holder.type_params = vec![String::from("V")];
        let mut leaf = ClassDecl::new("app.Leaf", ClassKind::Class);
        leaf.superclass = Some(TypeRef::generic(
            "app.Base",
            vec![TypeRef::declared("java.lang.String")],
        ));
        let universe = universe(vec![base, holder, leaf]);

        let ancestry = universe.ancestry(&TypeRef::declared("app.Leaf"));
        let names: Vec<&str> = ancestry.iter().map(|a| a.class.name.as_str()).collect();
        assert_eq!(names, vec!["app.Leaf", "app.Base", "app.Holder"]);
        let holder_bindings = &ancestry.get(2).map(|a| a.bindings.clone()).unwrap_or_default();
        assert_eq!(
            holder_bindings.get("V"),
            Some(&TypeRef::declared("java.lang.String"))
        );
    }

    #[rstest]
    fn qualifiers_include_source_markers_and_meta_annotated_types() {
        let mut named = ClassDecl::new("javax.inject.Named", ClassKind::Annotation);
        named.annotations.push(Annotation::new("javax.inject.Qualifier"));
        let universe = universe(vec![named]);
        assert!(universe.is_qualifier(&Annotation::new("javax.inject.Named")));
        assert!(universe.is_qualifier(&Annotation::new("io.injectconf.EnvironmentVariable")));
        assert!(!universe.is_qualifier(&Annotation::new("javax.annotation.Nullable")));
    }

    #[rstest]
    fn documents_parse_from_json() -> anyhow::Result<()> {
        let document = GraphDocument::from_json(
            r#"{"classes":[{"name":"app.Config","methods":[{"name":"port","returns":{"kind":"primitive","name":"int"}}]}]}"#,
        )?;
        let class = document.classes.first().ok_or_else(|| anyhow::anyhow!("no class"))?;
        assert_eq!(class.kind, ClassKind::Class);
        let method = class.methods.first().ok_or_else(|| anyhow::anyhow!("no method"))?;
        assert_eq!(method.returns, TypeRef::primitive(PrimitiveKind::Int));
        Ok(())
    }
}
