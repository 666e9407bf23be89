//! Fixed-point traversal of a root component.
//!
//! The analyzer keeps one work queue and visited set per node family
//! (components, modules, dependency types) plus the ordered set of sites.
//! Components drain first, then modules, then the dependency types seeded
//! from every collected site's payload. Because every queue is guarded by
//! its visited set, the traversal terminates over the finite universe.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, trace};

use crate::diagnostics::Diagnostics;
use crate::error::GraphError;
use crate::model::{TypeRef, Universe};
use crate::site::ConsumptionSite;
use crate::walker::{
    ComponentEvent, ModuleEvent, Request, walk_component, walk_injectable, walk_module,
    walk_provisions,
};

/// Every consumption site reachable from one root, deduplicated and ordered.
pub type SiteSet = BTreeSet<ConsumptionSite>;

#[derive(Debug)]
struct WorkQueue<T: Ord + Clone> {
    pending: VecDeque<T>,
    visited: BTreeSet<T>,
}

impl<T: Ord + Clone> WorkQueue<T> {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            visited: BTreeSet::new(),
        }
    }

    /// Enqueues `item` unless it was seen before; returns `true` when queued.
    fn push(&mut self, item: T) -> bool {
        if self.visited.insert(item.clone()) {
            self.pending.push_back(item);
            true
        } else {
            false
        }
    }

    fn pop(&mut self) -> Option<T> {
        self.pending.pop_front()
    }
}

/// Collects the consumption sites of root components.
#[derive(Debug, Clone, Copy)]
pub struct ComponentAnalyzer<'u> {
    universe: &'u Universe,
}

struct Traversal<'a, 'u> {
    universe: &'u Universe,
    diagnostics: &'a mut Diagnostics,
    components: WorkQueue<String>,
    modules: WorkQueue<String>,
    types: WorkQueue<TypeRef>,
    sites: SiteSet,
}

impl<'u> ComponentAnalyzer<'u> {
    /// Creates an analyzer over `universe`.
    #[must_use]
    pub const fn new(universe: &'u Universe) -> Self {
        Self { universe }
    }

    /// Walks `root` and everything reachable from it.
    ///
    /// Site-local problems are reported to `diagnostics` and the offending
    /// site is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when the root itself is malformed: missing,
    /// not a component, or declaring an invalid provision method.
    pub fn analyze(&self, root: &str, diagnostics: &mut Diagnostics) -> Result<SiteSet, GraphError> {
        let mut traversal = Traversal {
            universe: self.universe,
            diagnostics,
            components: WorkQueue::new(),
            modules: WorkQueue::new(),
            types: WorkQueue::new(),
            sites: SiteSet::new(),
        };
        traversal.components.visited.insert(root.to_owned());
        let events = walk_component(self.universe, root)?;
        traversal.absorb_component(events);
        traversal.drain_components();
        traversal.drain_modules();
        traversal.drain_types();
        debug!(root, sites = traversal.sites.len(), "analysis reached fixed point");
        Ok(traversal.sites)
    }
}

impl Traversal<'_, '_> {
    fn absorb_component(&mut self, events: Vec<ComponentEvent>) {
        for event in events {
            match event {
                ComponentEvent::Module(ty) => self.enqueue_module(&ty),
                ComponentEvent::Dependency(ty) => {
                    if let Some(name) = ty.declared_name()
                        && !self.components.push(name.to_owned())
                    {
                        trace!(component = name, "component already visited");
                    }
                }
                ComponentEvent::Provision(request) => self.record(request),
                ComponentEvent::MembersInjection { target, .. } => {
                    self.types.push(target);
                }
            }
        }
    }

    fn enqueue_module(&mut self, ty: &TypeRef) {
        if let Some(name) = ty.declared_name()
            && !self.modules.push(name.to_owned())
        {
            trace!(module = name, "module already visited");
        }
    }

    fn drain_components(&mut self) {
        while let Some(name) = self.components.pop() {
            let universe = self.universe;
            let events = match walk_component(universe, &name) {
                Ok(events) => events,
                Err(GraphError::NotAComponent { .. }) => {
                    // Plain dependency types still expose provision methods.
                    let Some(class) = universe.class(&name) else {
                        continue;
                    };
                    match walk_provisions(universe, class) {
                        Ok(events) => events,
                        Err(err) => {
                            self.diagnostics.error(None, err.to_string());
                            continue;
                        }
                    }
                }
                Err(err) => {
                    self.diagnostics.error(None, err.to_string());
                    continue;
                }
            };
            self.absorb_component(events);
        }
    }

    fn drain_modules(&mut self) {
        while let Some(name) = self.modules.pop() {
            match walk_module(self.universe, &name) {
                Ok(events) => {
                    for event in events {
                        match event {
                            ModuleEvent::Include(ty) => self.enqueue_module(&ty),
                            ModuleEvent::ProviderParameter(request) => self.record(request),
                        }
                    }
                }
                Err(err) => self.diagnostics.error(None, err.to_string()),
            }
        }
    }

    fn drain_types(&mut self) {
        let seeds: Vec<TypeRef> = self
            .sites
            .iter()
            .map(|site| site.supplied_type.clone())
            .collect();
        for ty in seeds {
            self.types.push(ty);
        }
        while let Some(ty) = self.types.pop() {
            let universe = self.universe;
            for request in walk_injectable(universe, &ty, self.diagnostics) {
                self.record(request);
            }
        }
    }

    /// Classifies `request`, keeps it when valid, and queues its payload type.
    fn record(&mut self, request: Request) {
        match ConsumptionSite::classify(
            self.universe,
            request.element,
            request.kind,
            &request.ty,
            &request.annotations,
        ) {
            Ok(site) => {
                self.types.push(site.supplied_type.clone());
                self.sites.insert(site);
            }
            Err(err) => self.diagnostics.error(Some(err.element()), err.to_string()),
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::model::{ClassDecl, ClassKind, Modifier};
    use crate::site::SiteKind;
    use crate::walker::fixtures::{
        component, constructor, env, field, inject, module, param, provides, provision, string,
        universe,
    };
    use rstest::rstest;

    fn elements(sites: &SiteSet) -> Vec<String> {
        sites.iter().map(|site| site.element.to_string()).collect()
    }

    fn graph() -> Universe {
        let mut root = component("app.Root", &["app.ConfigModule"], &["app.Parent"]);
        root.methods.push(provision("service", TypeRef::declared("app.Service"), Vec::new()));
        root.methods.push(provision("timeout", string(), vec![env("TIMEOUT")]));

        let mut parent = component("app.Parent", &["app.ParentModule"], &["app.Root"]);
        parent.methods.push(provision("region", string(), vec![env("REGION")]));

        let mut config = module("app.ConfigModule", &["app.ParentModule"]);
        config.methods.push(provides(
            "client",
            &[Modifier::Static],
            vec![param("host", string(), vec![env("HOST")])],
        ));
        let parent_module = module("app.ParentModule", &["app.ConfigModule"]);

        let mut service = ClassDecl::new("app.Service", ClassKind::Class);
        service.constructors.push(constructor(
            vec![inject()],
            vec![param("repo", TypeRef::declared("app.Repository"), Vec::new())],
        ));
        let mut repository = ClassDecl::new("app.Repository", ClassKind::Class);
        repository
            .fields
            .push(field("url", string(), &[], vec![inject(), env("DB_URL")]));
        repository.fields.push(field(
            "service",
            TypeRef::generic("javax.inject.Provider", vec![TypeRef::declared("app.Service")]),
            &[],
            vec![inject()],
        ));

        universe(vec![root, parent, config, parent_module, service, repository])
    }

    #[rstest]
    fn reaches_fixed_point_across_cycles() -> anyhow::Result<()> {
        let universe = graph();
        let mut diagnostics = Diagnostics::new();
        let sites = ComponentAnalyzer::new(&universe).analyze("app.Root", &mut diagnostics)?;

        let mut found = elements(&sites);
        found.sort();
        assert_eq!(
            found,
            vec![
                "app.ConfigModule#client(host)",
                "app.Parent#region()",
                "app.Repository#service",
                "app.Repository#url",
                "app.Root#service()",
                "app.Root#timeout()",
                "app.Service#<init>(repo)",
            ]
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.entries());
        Ok(())
    }

    #[rstest]
    fn invalid_sites_are_dropped_without_aborting() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "items",
            TypeRef::generic("java.util.List", vec![TypeRef::Wildcard]),
            Vec::new(),
        ));
        root.methods.push(provision("name", string(), vec![env("NAME")]));
        let universe = universe(vec![root]);
        let mut diagnostics = Diagnostics::new();

        let sites = ComponentAnalyzer::new(&universe).analyze("app.Root", &mut diagnostics)?;
        assert_eq!(elements(&sites), vec!["app.Root#name()"]);
        assert!(diagnostics.has_errors());
        Ok(())
    }

    #[rstest]
    fn missing_modules_are_reported_not_fatal() -> anyhow::Result<()> {
        let mut root = component("app.Root", &["app.Ghost"], &[]);
        root.methods.push(provision("name", string(), vec![env("NAME")]));
        let universe = universe(vec![root]);
        let mut diagnostics = Diagnostics::new();
        let sites = ComponentAnalyzer::new(&universe).analyze("app.Root", &mut diagnostics)?;
        assert_eq!(sites.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        Ok(())
    }

    #[rstest]
    fn members_injection_targets_are_walked() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(crate::walker::fixtures::method(
            "inject",
            &[Modifier::Abstract],
            Vec::new(),
            vec![param("target", TypeRef::declared("app.Screen"), Vec::new())],
            TypeRef::Void,
        ));
        let mut screen = ClassDecl::new("app.Screen", ClassKind::Class);
        screen
            .fields
            .push(field("theme", string(), &[], vec![inject(), env("THEME")]));
        let universe = universe(vec![root, screen]);

        let sites =
            ComponentAnalyzer::new(&universe).analyze("app.Root", &mut Diagnostics::new())?;
        let kinds: Vec<SiteKind> = sites.iter().map(|site| site.kind).collect();
        assert_eq!(kinds, vec![SiteKind::InjectedField]);
        Ok(())
    }

    #[rstest]
    fn malformed_root_is_fatal() {
        let universe = universe(Vec::new());
        let result = ComponentAnalyzer::new(&universe).analyze("app.Missing", &mut Diagnostics::new());
        assert!(matches!(result, Err(GraphError::MissingDeclaration { .. })));
    }
}
