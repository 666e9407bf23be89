//! Stateless walkers over components, modules, and injectable classes.
//!
//! Each walker returns an ordered list of events for a single node. The
//! [`crate::analyzer`] drives them to a fixed point.

mod class;
mod component;
mod module;

use crate::model::{Annotation, ElementId, TypeRef};
use crate::site::SiteKind;

pub use class::walk_injectable;
pub use component::{ComponentEvent, walk_component, walk_provisions};
pub use module::{ModuleEvent, walk_module};

/// A raw request for a value, before classification into a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Location of the request.
    pub element: ElementId,
    /// Kind of site the request becomes.
    pub kind: SiteKind,
    /// Declared type, with generic arguments substituted.
    pub ty: TypeRef,
    /// Annotations on the requesting element.
    pub annotations: Vec<Annotation>,
}

/// Method identity for override resolution: name plus erased parameter types.
pub(crate) fn signature(name: &str, params: impl Iterator<Item = TypeRef>) -> (String, Vec<String>) {
    (name.to_owned(), params.map(|ty| ty.erased()).collect())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for small graphs used across walker and analyzer tests.

    use crate::config::{Conventions, MarkerTypes};
    use crate::model::{
        Annotation, AnnotationValue, ClassDecl, ClassKind, FieldDecl, GraphDocument, MethodDecl,
        Modifier, ParamDecl, TypeRef, Universe,
    };

    pub fn universe(classes: Vec<ClassDecl>) -> Universe {
        Universe::new(
            GraphDocument { classes },
            Conventions::default(),
            MarkerTypes::default(),
        )
    }

    pub fn string() -> TypeRef {
        TypeRef::declared("java.lang.String")
    }

    pub fn env(name: &str) -> Annotation {
        Annotation::new("io.injectconf.EnvironmentVariable").with_str("value", name)
    }

    pub fn inject() -> Annotation {
        Annotation::new("javax.inject.Inject")
    }

    fn type_list(names: &[&str]) -> AnnotationValue {
        AnnotationValue::List(
            names
                .iter()
                .map(|name| AnnotationValue::Str((*name).to_owned()))
                .collect(),
        )
    }

    pub fn component(name: &str, modules: &[&str], dependencies: &[&str]) -> ClassDecl {
        let mut class = ClassDecl::new(name, ClassKind::Interface);
        class.annotations.push(
            Annotation::new("dagger.Component")
                .with("modules", type_list(modules))
                .with("dependencies", type_list(dependencies)),
        );
        class
    }

    pub fn module(name: &str, includes: &[&str]) -> ClassDecl {
        let mut class = ClassDecl::new(name, ClassKind::Class);
        class
            .annotations
            .push(Annotation::new("dagger.Module").with("includes", type_list(includes)));
        class
    }

    pub fn param(name: &str, ty: TypeRef, annotations: Vec<Annotation>) -> ParamDecl {
        ParamDecl {
            name: name.to_owned(),
            ty,
            annotations,
        }
    }

    pub fn method(
        name: &str,
        modifiers: &[Modifier],
        annotations: Vec<Annotation>,
        params: Vec<ParamDecl>,
        returns: TypeRef,
    ) -> MethodDecl {
        MethodDecl {
            name: name.to_owned(),
            modifiers: modifiers.to_vec(),
            annotations,
            params,
            returns,
        }
    }

    pub fn provision(name: &str, returns: TypeRef, annotations: Vec<Annotation>) -> MethodDecl {
        method(name, &[Modifier::Abstract], annotations, Vec::new(), returns)
    }

    pub fn provides(name: &str, modifiers: &[Modifier], params: Vec<ParamDecl>) -> MethodDecl {
        method(
            name,
            modifiers,
            vec![Annotation::new("dagger.Provides")],
            params,
            TypeRef::declared("java.lang.Object"),
        )
    }

    pub fn constructor(annotations: Vec<Annotation>, params: Vec<ParamDecl>) -> MethodDecl {
        method("<init>", &[Modifier::Public], annotations, params, TypeRef::Void)
    }

    pub fn field(name: &str, ty: TypeRef, modifiers: &[Modifier], annotations: Vec<Annotation>) -> FieldDecl {
        FieldDecl {
            name: name.to_owned(),
            ty,
            modifiers: modifiers.to_vec(),
            annotations,
        }
    }
}
