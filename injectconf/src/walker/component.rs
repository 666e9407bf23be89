//! Component walker.

use std::collections::BTreeSet;

use tracing::debug;

use super::{Request, signature};
use crate::error::GraphError;
use crate::model::{ClassDecl, ElementId, MethodDecl, Modifier, TypeRef, Universe};
use crate::site::SiteKind;

/// One reference discovered on a component, in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentEvent {
    /// A module named by the component marker.
    Module(TypeRef),
    /// A dependency component named by the component marker.
    Dependency(TypeRef),
    /// An abstract zero-argument provision method.
    Provision(Request),
    /// An abstract one-argument members-injection method; carries the
    /// injected type.
    MembersInjection {
        /// The method.
        element: ElementId,
        /// Type whose members are injected.
        target: TypeRef,
    },
}

/// Walks a component: modules, then dependencies, then provision methods.
///
/// # Errors
///
/// Returns [`GraphError::MissingDeclaration`] or [`GraphError::NotAComponent`]
/// when `name` is not a component, and the errors of [`walk_provisions`].
pub fn walk_component(universe: &Universe, name: &str) -> Result<Vec<ComponentEvent>, GraphError> {
    let class = universe
        .class(name)
        .ok_or_else(|| GraphError::MissingDeclaration {
            name: name.to_owned(),
        })?;
    let marker = class
        .annotation(&universe.conventions().component_annotations)
        .ok_or_else(|| GraphError::NotAComponent {
            name: name.to_owned(),
        })?;

    let referenced = |element: &str| -> Vec<TypeRef> {
        marker
            .get(element)
            .map(|value| value.string_list().into_iter().map(TypeRef::declared).collect())
            .unwrap_or_default()
    };
    let mut events: Vec<ComponentEvent> = referenced("modules")
        .into_iter()
        .map(ComponentEvent::Module)
        .collect();
    events.extend(
        referenced("dependencies")
            .into_iter()
            .map(ComponentEvent::Dependency),
    );
    events.extend(walk_provisions(universe, class)?);
    debug!(component = name, events = events.len(), "walked component");
    Ok(events)
}

/// Collects the abstract methods of `class` and its ancestors.
///
/// Methods are deduplicated by erased signature; the most-derived
/// declaration wins, so a concrete override hides an inherited abstract one.
///
/// # Errors
///
/// Returns [`GraphError::VoidProvision`] for an abstract zero-argument `void`
/// method and [`GraphError::MultiArgumentProvision`] for an abstract method
/// with more than one parameter.
pub fn walk_provisions(
    universe: &Universe,
    class: &ClassDecl,
) -> Result<Vec<ComponentEvent>, GraphError> {
    let mut events = Vec::new();
    let mut seen = BTreeSet::new();
    for ancestor in universe.ancestry(&TypeRef::declared(class.name.clone())) {
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
            if !is_abstract(method) {
                continue;
            }
            let element = ElementId::member(&ancestor.class.name, &format!("{}()", method.name));
            let returns = method.returns.substitute(&ancestor.bindings);
            match params.as_slice() {
                [] if returns.is_void() => return Err(GraphError::VoidProvision { element }),
                [] => events.push(ComponentEvent::Provision(Request {
                    element,
                    kind: SiteKind::ComponentProvisionResult,
                    ty: returns,
                    annotations: method.annotations.clone(),
                })),
                [target] => events.push(ComponentEvent::MembersInjection {
                    element,
                    target: target.clone(),
                }),
                _ => {
                    return Err(GraphError::MultiArgumentProvision {
                        element,
                        arity: params.len(),
                    });
                }
            }
        }
    }
    Ok(events)
}

/// Interface members carry `abstract` in the graph metadata just like
/// abstract class members; `default` methods have a body.
fn is_abstract(method: &MethodDecl) -> bool {
    method.has(Modifier::Abstract) && !method.has(Modifier::Default)
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::model::ClassKind;
    use crate::walker::fixtures::{component, env, method, provision, string, universe};
    use rstest::rstest;

    fn provision_names(events: &[ComponentEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                ComponentEvent::Provision(request) => Some(request.element.to_string()),
                _ => None,
            })
            .collect()
    }

    #[rstest]
    fn reports_modules_then_dependencies_then_provisions() -> anyhow::Result<()> {
        let mut root = component("app.Root", &["app.ConfigModule"], &["app.Parent"]);
        root.methods.push(provision("timeout", string(), vec![env("TIMEOUT")]));
        let universe = universe(vec![root]);

        let events = walk_component(&universe, "app.Root")?;
        assert_eq!(
            events.first(),
            Some(&ComponentEvent::Module(TypeRef::declared("app.ConfigModule")))
        );
        assert_eq!(
            events.get(1),
            Some(&ComponentEvent::Dependency(TypeRef::declared("app.Parent")))
        );
        assert_eq!(provision_names(&events), vec!["app.Root#timeout()"]);
        Ok(())
    }

    #[rstest]
    fn inherited_provisions_are_deduplicated_most_derived_first() -> anyhow::Result<()> {
        let mut base = crate::model::ClassDecl::new("app.Base", ClassKind::Interface);
        base.methods.push(provision("name", string(), Vec::new()));
        base.methods.push(provision("region", string(), Vec::new()));
        let mut root = component("app.Root", &[], &[]);
        root.interfaces.push(TypeRef::declared("app.Base"));
        root.methods.push(provision("name", string(), vec![env("NAME")]));
        let universe = universe(vec![base, root]);

        let events = walk_component(&universe, "app.Root")?;
        assert_eq!(
            provision_names(&events),
            vec!["app.Root#name()", "app.Base#region()"]
        );
        Ok(())
    }

    #[rstest]
    fn missing_marker_is_fatal() {
        let plain = crate::model::ClassDecl::new("app.Plain", ClassKind::Interface);
        let universe = universe(vec![plain]);
        assert_eq!(
            walk_component(&universe, "app.Plain"),
            Err(GraphError::NotAComponent {
                name: "app.Plain".into()
            })
        );
        assert!(matches!(
            walk_component(&universe, "app.Absent"),
            Err(GraphError::MissingDeclaration { .. })
        ));
    }

    #[rstest]
    fn void_and_multi_argument_provisions_are_fatal() {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision("run", TypeRef::Void, Vec::new()));
        let universe_void = universe(vec![root]);
        assert!(matches!(
            walk_component(&universe_void, "app.Root"),
            Err(GraphError::VoidProvision { .. })
        ));

        let mut root = component("app.Root", &[], &[]);
        root.methods.push(method(
            "make",
            &[Modifier::Abstract],
            Vec::new(),
            vec![
                crate::walker::fixtures::param("a", string(), Vec::new()),
                crate::walker::fixtures::param("b", string(), Vec::new()),
            ],
            string(),
        ));
        let universe_multi = universe(vec![root]);
        assert!(matches!(
            walk_component(&universe_multi, "app.Root"),
            Err(GraphError::MultiArgumentProvision { arity: 2, .. })
        ));
    }

    #[rstest]
    #[case::plain_interface_method(&[Modifier::Public])]
    #[case::default_method(&[Modifier::Public, Modifier::Abstract, Modifier::Default])]
    fn methods_with_bodies_are_not_provisions(
        #[case] modifiers: &[Modifier],
    ) -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods
            .push(method("log", modifiers, Vec::new(), Vec::new(), TypeRef::Void));
        root.methods
            .push(method("describe", modifiers, vec![env("DESC")], Vec::new(), string()));
        root.methods.push(provision("name", string(), vec![env("NAME")]));
        let universe = universe(vec![root]);

        let events = walk_component(&universe, "app.Root")?;
        assert_eq!(provision_names(&events), vec!["app.Root#name()"]);
        Ok(())
    }

    #[rstest]
    fn single_argument_methods_request_members_injection() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(method(
            "inject",
            &[Modifier::Abstract],
            Vec::new(),
            vec![crate::walker::fixtures::param(
                "target",
                TypeRef::declared("app.Activity"),
                Vec::new(),
            )],
            TypeRef::Void,
        ));
        let universe = universe(vec![root]);
        let events = walk_component(&universe, "app.Root")?;
        assert!(events.iter().any(|event| matches!(
            event,
            ComponentEvent::MembersInjection { target, .. } if *target == TypeRef::declared("app.Activity")
        )));
        Ok(())
    }
}
