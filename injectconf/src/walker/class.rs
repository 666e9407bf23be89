//! Injectable-class walker.
//!
//! Visits, for one concrete type, the injectable constructor, the injectable
//! fields of every ancestor, and the injectable methods that survive
//! override resolution.

use std::collections::BTreeSet;

use tracing::debug;

use super::{Request, signature};
use crate::diagnostics::Diagnostics;
use crate::model::{ClassKind, ElementId, MethodDecl, Modifier, TypeRef, Universe, annotated_with};
use crate::site::SiteKind;

/// Lists the injection points of the concrete type `ty`.
///
/// Abstract types and types absent from the universe yield nothing. A class
/// with several inject-marked constructors is reported and its constructor
/// is skipped; fields and methods are still visited.
pub fn walk_injectable(
    universe: &Universe,
    ty: &TypeRef,
    diagnostics: &mut Diagnostics,
) -> Vec<Request> {
    let Some(class) = universe.class_of(ty) else {
        return Vec::new();
    };
    if class.is_abstract() {
        return Vec::new();
    }
    let inject = &universe.conventions().inject_annotations;
    let ancestry = universe.ancestry(ty);
    let mut requests = Vec::new();

    let bindings = ancestry
        .first()
        .map(|own| own.bindings.clone())
        .unwrap_or_default();
    let marked: Vec<&MethodDecl> = class
        .constructors
        .iter()
        .filter(|ctor| ctor.annotated_with(inject))
        .collect();
    let constructor = match marked.as_slice() {
        [single] => Some(*single),
        [] => class.constructors.iter().find(|ctor| ctor.params.is_empty()),
        _ => {
            diagnostics.error(
                Some(&ElementId::new(class.name.clone())),
                format!(
                    "{} declares {} injectable constructors; at most one is allowed",
                    class.name,
                    marked.len()
                ),
            );
            None
        }
    };
    if let Some(ctor) = constructor {
        requests.extend(ctor.params.iter().map(|param| Request {
            element: ElementId::parameter(&class.name, "<init>", &param.name),
            kind: SiteKind::InjectedConstructorParameter,
            ty: param.ty.substitute(&bindings),
            annotations: param.annotations.clone(),
        }));
    }

    for ancestor in &ancestry {
        requests.extend(
            ancestor
                .class
                .fields
                .iter()
                .filter(|field| {
                    !field.has(Modifier::Static)
                        && !field.has(Modifier::Final)
                        && !field.has(Modifier::Private)
                        && annotated_with(&field.annotations, inject)
                })
                .map(|field| Request {
                    element: ElementId::member(&ancestor.class.name, &field.name),
                    kind: SiteKind::InjectedField,
                    ty: field.ty.substitute(&ancestor.bindings),
                    annotations: field.annotations.clone(),
                }),
        );
    }

    let mut seen = BTreeSet::new();
    for ancestor in &ancestry {
        for method in &ancestor.class.methods {
            if method.has(Modifier::Static) || method.has(Modifier::Private) {
                continue;
            }
            let params: Vec<TypeRef> = method
                .params
                .iter()
                .map(|param| param.ty.substitute(&ancestor.bindings))
                .collect();
            if !seen.insert(signature(&method.name, params.iter().cloned())) {
                continue;
            }
            let eligible = !method.has(Modifier::Abstract)
                && ancestor.class.kind != ClassKind::Interface
                && method.annotated_with(inject);
            let (true, [param], [ty]) = (eligible, method.params.as_slice(), params.as_slice())
            else {
                continue;
            };
            requests.push(Request {
                element: ElementId::parameter(&ancestor.class.name, &method.name, &param.name),
                kind: SiteKind::InjectedMethodParameter,
                ty: ty.clone(),
                annotations: param.annotations.clone(),
            });
        }
    }
    debug!(class = %class.name, requests = requests.len(), "walked injectable class");
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassDecl, ClassKind};
    use crate::walker::fixtures::{
        constructor, env, field, inject, method, param, string, universe,
    };
    use rstest::rstest;

    fn elements(requests: &[Request]) -> Vec<String> {
        requests.iter().map(|r| r.element.to_string()).collect()
    }

    fn setter(name: &str, ty: TypeRef, annotations: Vec<crate::model::Annotation>) -> MethodDecl {
        method(
            name,
            &[Modifier::Public],
            annotations,
            vec![param("value", ty, vec![env("SETTING")])],
            TypeRef::Void,
        )
    }

    #[rstest]
    fn prefers_marked_constructor_then_no_arg() {
        let mut marked = ClassDecl::new("app.Marked", ClassKind::Class);
        marked.constructors.push(constructor(Vec::new(), Vec::new()));
        marked.constructors.push(constructor(
            vec![inject()],
            vec![param("host", string(), vec![env("HOST")])],
        ));
        let mut fallback = ClassDecl::new("app.Fallback", ClassKind::Class);
        fallback.constructors.push(constructor(
            Vec::new(),
            vec![param("ignored", string(), Vec::new())],
        ));
        let universe = universe(vec![marked, fallback]);
        let mut diagnostics = Diagnostics::new();

        let requests = walk_injectable(&universe, &TypeRef::declared("app.Marked"), &mut diagnostics);
        assert_eq!(elements(&requests), vec!["app.Marked#<init>(host)"]);
        let none = walk_injectable(&universe, &TypeRef::declared("app.Fallback"), &mut diagnostics);
        assert!(none.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[rstest]
    fn ambiguous_constructors_are_reported() {
        let mut class = ClassDecl::new("app.Twice", ClassKind::Class);
        class.constructors.push(constructor(vec![inject()], Vec::new()));
        class.constructors.push(constructor(
            vec![inject()],
            vec![param("a", string(), Vec::new())],
        ));
        let universe = universe(vec![class]);
        let mut diagnostics = Diagnostics::new();
        let requests = walk_injectable(&universe, &TypeRef::declared("app.Twice"), &mut diagnostics);
        assert!(requests.is_empty());
        assert!(diagnostics.has_errors());
    }

    #[rstest]
    fn fields_follow_modifier_rules_across_ancestors() {
        let mut base = ClassDecl::new("app.Base", ClassKind::Class);
        base.fields.push(field("region", string(), &[], vec![inject(), env("REGION")]));
        base.fields.push(field("secret", string(), &[Modifier::Private], vec![inject()]));
        let mut leaf = ClassDecl::new("app.Leaf", ClassKind::Class);
        leaf.superclass = Some(TypeRef::declared("app.Base"));
        leaf.fields.push(field("name", string(), &[], vec![inject(), env("NAME")]));
        leaf.fields.push(field("constant", string(), &[Modifier::Final], vec![inject()]));
        leaf.fields.push(field("shared", string(), &[Modifier::Static], vec![inject()]));
        leaf.fields.push(field("plain", string(), &[], Vec::new()));
        let universe = universe(vec![base, leaf]);

        let requests = walk_injectable(
            &universe,
            &TypeRef::declared("app.Leaf"),
            &mut Diagnostics::new(),
        );
        assert_eq!(elements(&requests), vec!["app.Leaf#name", "app.Base#region"]);
    }

    #[rstest]
    fn overridden_methods_resolve_through_generic_substitution() {
        let mut base = ClassDecl::new("app.Base", ClassKind::Class);
        base.type_params = vec![String::from("T")];
        base.methods.push(setter(
            "configure",
            TypeRef::Variable { name: "T".into() },
            vec![inject()],
        ));
        base.methods.push(setter("tune", string(), vec![inject()]));
        let mut leaf = ClassDecl::new("app.Leaf", ClassKind::Class);
        leaf.superclass = Some(TypeRef::generic("app.Base", vec![string()]));
        leaf.methods.push(setter("configure", string(), vec![inject()]));
        let universe = universe(vec![base, leaf]);

        let requests = walk_injectable(
            &universe,
            &TypeRef::declared("app.Leaf"),
            &mut Diagnostics::new(),
        );
        assert_eq!(
            elements(&requests),
            vec!["app.Leaf#configure(value)", "app.Base#tune(value)"]
        );
    }

    #[rstest]
    fn unmarked_override_hides_inherited_injection() {
        let mut base = ClassDecl::new("app.Base", ClassKind::Class);
        base.methods.push(setter("configure", string(), vec![inject()]));
        let mut leaf = ClassDecl::new("app.Leaf", ClassKind::Class);
        leaf.superclass = Some(TypeRef::declared("app.Base"));
        leaf.methods.push(setter("configure", string(), Vec::new()));
        let universe = universe(vec![base, leaf]);
        let requests = walk_injectable(
            &universe,
            &TypeRef::declared("app.Leaf"),
            &mut Diagnostics::new(),
        );
        assert!(requests.is_empty());
    }

    #[rstest]
    fn abstract_types_are_not_walked() {
        let mut base = ClassDecl::new("app.Abstract", ClassKind::Class);
        base.modifiers.push(Modifier::Abstract);
        base.fields.push(field("name", string(), &[], vec![inject()]));
        let universe = universe(vec![base]);
        assert!(walk_injectable(
            &universe,
            &TypeRef::declared("app.Abstract"),
            &mut Diagnostics::new()
        )
        .is_empty());
    }
}
