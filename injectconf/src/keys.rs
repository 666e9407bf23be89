//! Key extraction and grouping.
//!
//! Sites carrying one integration's marker are reduced to [`Usage`]s and
//! grouped by [`ParameterKey`]. Each usage records its [`RepresentationKey`]:
//! the parameter, the requested type, and the effective default. Equal
//! representation keys share one generated provider.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::analyzer::SiteSet;
use crate::diagnostics::Diagnostics;
use crate::model::{ElementId, TypeRef, Universe};
use crate::site::{ConsumptionSite, SiteKind};
use crate::source::{ConfigSource, MarkerData, ParameterKey, SourceKind};
use crate::template::Template;

/// A parameter read as one type with one effective default.
///
/// Ordered by parameter, then default, then the rendered type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepresentationKey {
    /// The parameter read.
    pub key: ParameterKey,
    /// Requested type, primitives boxed.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Effective default.
    pub default: Option<String>,
}

impl RepresentationKey {
    fn sort_key(&self) -> (&ParameterKey, Option<&str>, String) {
        (&self.key, self.default.as_deref(), self.ty.to_string())
    }
}

impl PartialOrd for RepresentationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RepresentationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.ty.cmp(&other.ty))
    }
}

/// One site's use of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Usage {
    /// Where the value is consumed.
    pub element: ElementId,
    /// How the value is consumed.
    pub kind: SiteKind,
    /// Whether the site accepts an absent value.
    pub nullable: bool,
    /// Default written on the site's own marker.
    pub declared_default: Option<String>,
    /// Whether the site reads the source's native form.
    pub native: bool,
    /// Parameter, type, and effective default.
    pub representation: RepresentationKey,
}

impl Usage {
    /// Effective default, declared or inherited.
    #[must_use]
    pub fn effective_default(&self) -> Option<&str> {
        self.representation.default.as_deref()
    }

    /// Whether this site alone would make the parameter mandatory.
    #[must_use]
    pub const fn locally_required(&self) -> bool {
        !self.nullable && self.representation.default.is_none()
    }

    /// Whether the default came from another site.
    #[must_use]
    pub fn inherits_default(&self) -> bool {
        self.declared_default.is_none() && self.representation.default.is_some()
    }
}

/// Usages of one integration, grouped by parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGroups {
    source: SourceKind,
    usages: BTreeMap<ParameterKey, Vec<Usage>>,
    templates: BTreeMap<ParameterKey, Template>,
}

impl KeyGroups {
    /// The integration the groups were extracted for.
    #[must_use]
    pub const fn source(&self) -> SourceKind {
        self.source
    }

    /// Parameters in order.
    #[must_use = "iterators are lazy"]
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterKey> {
        self.usages.keys()
    }

    /// Usages of `key`, in site order.
    #[must_use]
    pub fn usages(&self, key: &ParameterKey) -> &[Usage] {
        self.usages.get(key).map_or(&[], Vec::as_slice)
    }

    /// Every parameter with its usages.
    #[must_use = "iterators are lazy"]
    pub fn iter(&self) -> impl Iterator<Item = (&ParameterKey, &[Usage])> {
        self.usages.iter().map(|(key, usages)| (key, usages.as_slice()))
    }

    /// Parsed name template of `key`, for templated integrations.
    #[must_use]
    pub fn template(&self, key: &ParameterKey) -> Option<&Template> {
        self.templates.get(key)
    }

    /// Distinct representation keys in order.
    #[must_use]
    pub fn representations(&self) -> BTreeSet<RepresentationKey> {
        self.usages
            .values()
            .flatten()
            .map(|usage| usage.representation.clone())
            .collect()
    }

    /// Returns `true` when no site used the integration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }
}

/// Native form a provider of `ty` reads: a list of strings, typed as the
/// first configured list container, for list-like targets, otherwise the
/// string type.
#[must_use]
pub fn native_type(universe: &Universe, ty: &TypeRef) -> TypeRef {
    let list = universe.conventions().list_types.first();
    match (universe.list_element(ty), list) {
        (Some(_), Some(list)) => TypeRef::generic(list.clone(), vec![universe.string_type()]),
        _ => universe.string_type(),
    }
}

/// Returns `true` when `ty` is exactly what its source yields, so no
/// conversion or companion provider is needed.
///
/// Other list containers of strings, such as `Collection<String>`, are not
/// native: they are mapped from the native list.
#[must_use]
pub fn is_native(universe: &Universe, ty: &TypeRef) -> bool {
    *ty == native_type(universe, ty)
}

/// Groups the sites marked with `marker_type` by parameter.
///
/// Markers the integration rejects are reported against their site and the
/// site is dropped. Grouping the same site set twice yields equal groups.
#[must_use]
pub fn extract_keys(
    universe: &Universe,
    sites: &SiteSet,
    source: &dyn ConfigSource,
    marker_type: &str,
    diagnostics: &mut Diagnostics,
) -> KeyGroups {
    let mut accepted: Vec<(&ConsumptionSite, MarkerData)> = Vec::new();
    for site in sites {
        let Some(marker) = site
            .marker
            .as_ref()
            .filter(|marker| marker.type_name == marker_type)
        else {
            continue;
        };
        match source.extract(marker) {
            Ok(data) => accepted.push((site, data)),
            Err(err) => diagnostics.error(
                Some(&site.element),
                format!("{} {}: {err}", site.kind, site.element),
            ),
        }
    }

    let mut native_defaults: BTreeMap<&ParameterKey, BTreeSet<&str>> = BTreeMap::new();
    for (site, data) in &accepted {
        if let Some(default) = data.default.as_deref()
            && is_native(universe, &site.supplied_type)
        {
            native_defaults.entry(&data.key).or_default().insert(default);
        }
    }

    let mut usages: BTreeMap<ParameterKey, Vec<Usage>> = BTreeMap::new();
    let mut templates = BTreeMap::new();
    for (site, data) in &accepted {
        let native = is_native(universe, &site.supplied_type);
        let inherited = native_defaults
            .get(&data.key)
            .filter(|defaults| !native && defaults.len() == 1)
            .and_then(|defaults| defaults.first())
            .map(|default| (*default).to_owned());
        let default = data.default.clone().or(inherited);
        if let Some(template) = &data.template {
            templates
                .entry(data.key.clone())
                .or_insert_with(|| template.clone());
        }
        usages.entry(data.key.clone()).or_default().push(Usage {
            element: site.element.clone(),
            kind: site.kind,
            nullable: site.nullable,
            declared_default: data.default.clone(),
            native,
            representation: RepresentationKey {
                key: data.key.clone(),
                ty: site.supplied_type.clone(),
                default,
            },
        });
    }
    debug!(
        source = %source.kind(),
        parameters = usages.len(),
        "grouped parameter usages"
    );
    KeyGroups {
        source: source.kind(),
        usages,
        templates,
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;
    use crate::analyzer::ComponentAnalyzer;
    use crate::model::{Annotation, PrimitiveKind};
    use crate::source::{EnvSource, SystemPropertySource};
    use crate::walker::fixtures::{component, env, provision, string, universe};
    use rstest::rstest;

    const ENV_MARKER: &str = "io.injectconf.EnvironmentVariable";

    fn env_with_default(name: &str, default: &str) -> Annotation {
        env(name).with_str("defaultValue", default)
    }

    fn sites(universe: &Universe) -> anyhow::Result<SiteSet> {
        Ok(ComponentAnalyzer::new(universe).analyze("app.Root", &mut Diagnostics::new())?)
    }

    fn timeout_graph() -> Universe {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision(
            "timeoutText",
            string(),
            vec![env_with_default("TIMEOUT", "30000")],
        ));
        root.methods.push(provision(
            "timeout",
            TypeRef::primitive(PrimitiveKind::Long),
            vec![env("TIMEOUT")],
        ));
        universe(vec![root])
    }

    #[rstest]
    fn derivative_representation_inherits_native_default() -> anyhow::Result<()> {
        let universe = timeout_graph();
        let sites = sites(&universe)?;
        let groups = extract_keys(
            &universe,
            &sites,
            &EnvSource,
            ENV_MARKER,
            &mut Diagnostics::new(),
        );

        let key = ParameterKey::Env {
            name: "TIMEOUT".into(),
        };
        assert_eq!(groups.parameters().collect::<Vec<_>>(), vec![&key]);
        let representations: Vec<(String, Option<String>)> = groups
            .representations()
            .into_iter()
            .map(|rep| (rep.ty.to_string(), rep.default))
            .collect();
        assert_eq!(
            representations,
            vec![
                (String::from("java.lang.Long"), Some(String::from("30000"))),
                (String::from("java.lang.String"), Some(String::from("30000"))),
            ]
        );
        assert!(groups.usages(&key).iter().all(|usage| !usage.locally_required()));
        assert!(
            groups
                .usages(&key)
                .iter()
                .any(|usage| usage.inherits_default() && !usage.native)
        );
        Ok(())
    }

    #[rstest]
    fn native_sites_never_inherit() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods
            .push(provision("a", string(), vec![env_with_default("REGION", "eu")]));
        root.methods.push(provision("b", string(), vec![env("REGION")]));
        let universe = universe(vec![root]);
        let sites = sites(&universe)?;
        let groups = extract_keys(
            &universe,
            &sites,
            &EnvSource,
            ENV_MARKER,
            &mut Diagnostics::new(),
        );
        let defaults: Vec<Option<String>> = groups
            .representations()
            .into_iter()
            .map(|rep| rep.default)
            .collect();
        assert_eq!(defaults, vec![None, Some(String::from("eu"))]);
        Ok(())
    }

    #[rstest]
    fn ambiguous_native_defaults_are_not_inherited() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods
            .push(provision("a", string(), vec![env_with_default("PORT", "80")]));
        root.methods
            .push(provision("b", string(), vec![env_with_default("PORT", "8080")]));
        root.methods.push(provision(
            "c",
            TypeRef::primitive(PrimitiveKind::Int),
            vec![env("PORT")],
        ));
        let universe = universe(vec![root]);
        let sites = sites(&universe)?;
        let groups = extract_keys(
            &universe,
            &sites,
            &EnvSource,
            ENV_MARKER,
            &mut Diagnostics::new(),
        );
        let int_rep = groups
            .representations()
            .into_iter()
            .find(|rep| rep.ty == TypeRef::declared("java.lang.Integer"));
        assert_eq!(int_rep.and_then(|rep| rep.default), None);
        Ok(())
    }

    #[rstest]
    fn grouping_is_idempotent() -> anyhow::Result<()> {
        let universe = timeout_graph();
        let sites = sites(&universe)?;
        let first = extract_keys(
            &universe,
            &sites,
            &EnvSource,
            ENV_MARKER,
            &mut Diagnostics::new(),
        );
        let second = extract_keys(
            &universe,
            &sites,
            &EnvSource,
            ENV_MARKER,
            &mut Diagnostics::new(),
        );
        assert_eq!(first, second);
        Ok(())
    }

    #[rstest]
    fn other_markers_and_invalid_names_are_excluded() -> anyhow::Result<()> {
        let mut root = component("app.Root", &[], &[]);
        root.methods.push(provision("bad", string(), vec![env("1BAD")]));
        root.methods.push(provision(
            "prop",
            string(),
            vec![Annotation::new("io.injectconf.SystemProperty").with_str("value", "app.name")],
        ));
        let universe = universe(vec![root]);
        let sites = sites(&universe)?;
        let mut diagnostics = Diagnostics::new();

        let env_groups = extract_keys(&universe, &sites, &EnvSource, ENV_MARKER, &mut diagnostics);
        assert!(env_groups.is_empty());
        assert_eq!(diagnostics.len(), 1);

        let sys_groups = extract_keys(
            &universe,
            &sites,
            &SystemPropertySource,
            "io.injectconf.SystemProperty",
            &mut diagnostics,
        );
        let key = ParameterKey::SystemProperty {
            name: "app.name".into(),
        };
        assert!(sys_groups.template(&key).is_some());
        Ok(())
    }
}
