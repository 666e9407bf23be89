//! Module walker: includes and provider-method parameters.

use tracing::debug;

use super::Request;
use crate::error::GraphError;
use crate::model::{ElementId, Modifier, TypeRef, Universe};
use crate::site::SiteKind;

/// One reference discovered on a module, in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEvent {
    /// A module named in `includes`.
    Include(TypeRef),
    /// A parameter of a provider method.
    ProviderParameter(Request),
}

/// Walks a module's includes, then the parameters of every provider method
/// it declares or inherits.
///
/// # Errors
///
/// Returns [`GraphError::MissingDeclaration`] or [`GraphError::NotAModule`]
/// when `name` is not a module.
pub fn walk_module(universe: &Universe, name: &str) -> Result<Vec<ModuleEvent>, GraphError> {
    let conventions = universe.conventions();
    let class = universe
        .class(name)
        .ok_or_else(|| GraphError::MissingDeclaration {
            name: name.to_owned(),
        })?;
    let marker = class
        .annotation(&conventions.module_annotations)
        .ok_or_else(|| GraphError::NotAModule {
            name: name.to_owned(),
        })?;

    let mut events: Vec<ModuleEvent> = marker
        .get("includes")
        .map(|value| {
            value
                .string_list()
                .into_iter()
                .map(|include| ModuleEvent::Include(TypeRef::declared(include)))
                .collect()
        })
        .unwrap_or_default();

    for ancestor in universe.ancestry(&TypeRef::declared(name)) {
        let owner = &ancestor.class.name;
        for method in ancestor
            .class
            .methods
            .iter()
            .filter(|method| method.annotated_with(&conventions.provides_annotations))
        {
            let kind = if method.has(Modifier::Static) {
                SiteKind::ModuleStaticProviderParameter
            } else {
                SiteKind::ModuleInstanceProviderParameter
            };
            events.extend(method.params.iter().map(|param| {
                ModuleEvent::ProviderParameter(Request {
                    element: ElementId::parameter(owner, &method.name, &param.name),
                    kind,
                    ty: param.ty.substitute(&ancestor.bindings),
                    annotations: param.annotations.clone(),
                })
            }));
        }
    }
    debug!(module = name, events = events.len(), "walked module");
    Ok(events)
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::walker::fixtures::{env, module, param, provides, string, universe};
    use rstest::rstest;

    #[rstest]
    fn reports_includes_and_provider_parameters() -> anyhow::Result<()> {
        let mut config = module("app.ConfigModule", &["app.NetworkModule"]);
        config.methods.push(provides(
            "client",
            &[Modifier::Static],
            vec![param("timeout", string(), vec![env("TIMEOUT")])],
        ));
        config.methods.push(provides(
            "pool",
            &[],
            vec![param("size", TypeRef::declared("java.lang.Integer"), Vec::new())],
        ));
        let universe = universe(vec![config]);

        let events = walk_module(&universe, "app.ConfigModule")?;
        assert_eq!(
            events.first(),
            Some(&ModuleEvent::Include(TypeRef::declared("app.NetworkModule")))
        );
        let kinds: Vec<(String, SiteKind)> = events
            .iter()
            .filter_map(|event| match event {
                ModuleEvent::ProviderParameter(request) => {
                    Some((request.element.to_string(), request.kind))
                }
                ModuleEvent::Include(_) => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (
                    String::from("app.ConfigModule#client(timeout)"),
                    SiteKind::ModuleStaticProviderParameter
                ),
                (
                    String::from("app.ConfigModule#pool(size)"),
                    SiteKind::ModuleInstanceProviderParameter
                ),
            ]
        );
        Ok(())
    }

    #[rstest]
    fn unmarked_module_is_rejected() {
        let plain = crate::model::ClassDecl::new("app.Plain", crate::model::ClassKind::Class);
        let universe = universe(vec![plain]);
        assert_eq!(
            walk_module(&universe, "app.Plain"),
            Err(GraphError::NotAModule {
                name: "app.Plain".into()
            })
        );
    }
}
