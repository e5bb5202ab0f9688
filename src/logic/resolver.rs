//! Dependency resolver
//!
//! Turns a selection set into an ordered list of steps in which every
//! prerequisite precedes its dependents.
//!
//! # Design
//!
//! - **Closure**: unselected options and shared actions that a selected
//!   option needs are pulled in implicitly, and only those
//! - **Graph**: nodes are options plus shared-action keys; edges run
//!   prerequisite → dependent, key → option requiring (or providing) it
//! - **Ordering**: priority topological sort keyed by
//!   `(section, catalog position)`. A shared-action node takes the smallest
//!   key among its producers and its dependents: it is realized where its
//!   producer sits in the catalog, or earlier if a dependent needs it first.
//!   Selecting the producer therefore never moves the key
//! - **Demands**: the output lists one step per demand, so a key required by
//!   three options appears three times. Collapsing them is the
//!   deduplicator's job
//!
//! # What This Explicitly Refuses To Do
//!
//! - Pick between several producers of a key: the key's own record is what
//!   gets realized, producers only add their extra commands
//! - Reorder sections: a section never moves, the catalog guarantees no
//!   prerequisite lives in a later section

use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

use crate::catalog::{Catalog, SetupOption, SharedAction, Variant};
use crate::error::{CatalogProblem, NattdError, Result};
use crate::logic::graph::DependencyGraph;
use crate::selection::SelectionSet;
use crate::types::Section;

/// A node of the resolved plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'c> {
    Setup {
        option: &'c SetupOption,
        variant: Option<&'c Variant>,
    },
    Shared(&'c SharedAction),
}

impl<'c> NodeRef<'c> {
    /// Option id or shared-action key
    pub fn id(&self) -> &'c str {
        match self {
            Self::Setup { option, .. } => &option.id,
            Self::Shared(action) => &action.key,
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'c str {
        match self {
            Self::Setup { option, .. } => &option.label,
            Self::Shared(action) => &action.label,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

/// Why a step is part of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Chosen by the caller, or realized by a chosen producer
    Explicit,
    /// Pulled in because `required_by` needs it
    Implicit { required_by: String },
}

impl Origin {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit)
    }
}

/// One demand for a node, placed at the node's resolved position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStep<'c> {
    pub node: NodeRef<'c>,
    pub section: Section,
    pub origin: Origin,
}

/// Ordered steps; the same node may appear several times.
#[derive(Debug, Clone, Default)]
pub struct Resolution<'c> {
    pub steps: Vec<ResolvedStep<'c>>,
}

type Priority = (Section, usize, u8);

struct Node<'c> {
    node: NodeRef<'c>,
    priority: Priority,
}

struct Closure<'c> {
    catalog: &'c Catalog,
    nodes: Vec<Node<'c>>,
    index: BTreeMap<&'c str, usize>,
    demands: Vec<(usize, Origin)>,
}

impl<'c> Closure<'c> {
    fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            nodes: Vec::new(),
            index: BTreeMap::new(),
            demands: Vec::new(),
        }
    }

    /// Return the node index, creating the node if needed. The flag tells
    /// whether it was just created.
    fn intern(&mut self, node: NodeRef<'c>) -> (usize, bool) {
        if let Some(&i) = self.index.get(node.id()) {
            return (i, false);
        }
        let priority = match node {
            NodeRef::Setup { option, .. } => (
                option.section,
                self.catalog.position(&option.id).unwrap_or(usize::MAX),
                1,
            ),
            // Lowered to its earliest dependent once all edges are known
            NodeRef::Shared(action) => self
                .catalog
                .shared_action_producers(&action.key)
                .into_iter()
                .map(|p| {
                    let position = self.catalog.position(&p.id).unwrap_or(usize::MAX);
                    (p.section, position, 0)
                })
                .min()
                .unwrap_or((Section::CustomScript, usize::MAX, 0)),
        };
        self.nodes.push(Node { node, priority });
        self.index.insert(node.id(), self.nodes.len() - 1);
        (self.nodes.len() - 1, true)
    }

    fn option_node(&self, option: &'c SetupOption, variant: Option<&'c Variant>) -> NodeRef<'c> {
        NodeRef::Setup {
            option,
            variant: variant.or_else(|| option.default_variant()),
        }
    }
}

/// Resolve a selection set against the catalog.
///
/// # Errors
///
/// - `UnknownSelection` listing every id absent from the catalog
/// - `UnknownVariant` when a pinned variant is not declared by its option
/// - `CatalogIntegrity` with the participating ids if a cycle is found
pub fn resolve<'c>(catalog: &'c Catalog, selection: &SelectionSet) -> Result<Resolution<'c>> {
    let unknown: Vec<String> = selection
        .iter()
        .filter(|s| catalog.lookup(&s.id).is_none())
        .map(|s| s.id)
        .collect();
    if !unknown.is_empty() {
        return Err(NattdError::UnknownSelection { ids: unknown });
    }

    let mut closure = Closure::new(catalog);
    let mut queue = VecDeque::new();

    for chosen in selection.iter() {
        let Some(option) = catalog.lookup(&chosen.id) else {
            continue;
        };
        let variant = match chosen.variant.as_deref() {
            Some(name) => Some(option.variant(name).ok_or_else(|| NattdError::UnknownVariant {
                id: chosen.id.clone(),
                variant: name.to_string(),
            })?),
            None => None,
        };
        let node = closure.option_node(option, variant);
        let (i, _) = closure.intern(node);
        closure.demands.push((i, Origin::Explicit));
        queue.push_back(i);
    }

    let mut edges = Vec::new();
    while let Some(dependent) = queue.pop_front() {
        let NodeRef::Setup { option, variant } = closure.nodes[dependent].node else {
            continue;
        };
        let explicit = selection.contains(&option.id);

        for requirement in option.requirements(variant) {
            let provided = option.provides_key.as_deref() == Some(requirement);
            let node = if let Some(required) = catalog.lookup(requirement) {
                closure.option_node(required, None)
            } else if let Some(action) = catalog.shared_action(requirement) {
                NodeRef::Shared(action)
            } else {
                // Unreachable for a validated catalog
                continue;
            };

            let (i, created) = closure.intern(node);
            let origin = if provided && explicit {
                Origin::Explicit
            } else {
                Origin::Implicit {
                    required_by: option.id.clone(),
                }
            };
            closure.demands.push((i, origin));
            edges.push((i, dependent));
            if created && !node.is_shared() {
                queue.push_back(i);
            }
        }
    }

    // A shared action sorts just ahead of its earliest dependent
    for &(before, after) in &edges {
        if closure.nodes[before].node.is_shared() {
            let (section, position, _) = closure.nodes[after].priority;
            let lowered = (section, position, 0);
            if lowered < closure.nodes[before].priority {
                closure.nodes[before].priority = lowered;
            }
        }
    }

    let mut graph = DependencyGraph::new();
    for node in &closure.nodes {
        graph.add_node(node.priority);
    }
    for &(before, after) in &edges {
        graph.add_edge(before, after);
    }

    let order = graph.sort().map_err(|members| {
        NattdError::catalog(CatalogProblem::Cycle {
            ids: members
                .iter()
                .map(|&i| closure.nodes[i].node.id().to_string())
                .collect(),
        })
    })?;

    let mut rank = vec![0; order.len()];
    for (position, &node) in order.iter().enumerate() {
        rank[node] = position;
    }

    let mut demands = closure.demands;
    demands.sort_by_key(|(node, _)| rank[*node]);

    let steps: Vec<ResolvedStep<'c>> = demands
        .into_iter()
        .map(|(i, origin)| ResolvedStep {
            node: closure.nodes[i].node,
            section: closure.nodes[i].priority.0,
            origin,
        })
        .collect();

    debug!(
        "Resolved {} selections into {} nodes ({} demands)",
        selection.len(),
        order.len(),
        steps.len()
    );
    Ok(Resolution { steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandSpec;

    fn cmd(text: &str) -> CommandSpec {
        CommandSpec {
            text: text.to_string(),
            description: text.to_string(),
            tolerable: false,
        }
    }

    fn option(id: &str, section: Section) -> SetupOption {
        SetupOption {
            id: id.to_string(),
            label: id.to_string(),
            section,
            description: String::new(),
            commands: vec![cmd(&format!("echo {}", id))],
            prerequisites: vec![],
            provides_key: None,
            requires_keys: vec![],
            variants: vec![],
        }
    }

    fn shared(key: &str) -> SharedAction {
        SharedAction {
            key: key.to_string(),
            label: key.to_string(),
            commands: vec![cmd(&format!("enable {}", key))],
        }
    }

    /// Catalog with an RPM Fusion producer, codecs in system_config and
    /// CUDA in app_install
    fn test_catalog() -> Catalog {
        let mut enable = option("enable-rpmfusion", Section::SystemConfig);
        enable.commands.clear();
        enable.provides_key = Some("rpmfusion-enabled".to_string());

        let mut codecs = option("install-codecs", Section::SystemConfig);
        codecs.requires_keys = vec!["rpmfusion-enabled".to_string()];

        let mut cuda = option("install-cuda", Section::AppInstall);
        cuda.requires_keys = vec!["rpmfusion-enabled".to_string()];

        let mut git = option("install-git", Section::AppInstall);
        git.prerequisites = vec![];

        let mut theme = option("install-theme", Section::Customization);
        theme.prerequisites = vec!["install-git".to_string()];

        let upgrade = option("system-upgrade", Section::SystemUpgrade);

        let mut flatpak_app = option("install-flatpak-app", Section::AppInstall);
        flatpak_app.requires_keys = vec!["flathub-enabled".to_string()];

        Catalog::from_parts(
            vec![shared("rpmfusion-enabled"), shared("flathub-enabled")],
            vec![upgrade, enable, codecs, git, cuda, theme, flatpak_app],
        )
        .unwrap()
    }

    fn ids(resolution: &Resolution<'_>) -> Vec<String> {
        resolution.steps.iter().map(|s| s.node.id().to_string()).collect()
    }

    #[test]
    fn test_empty_selection() {
        let catalog = test_catalog();
        let resolution = resolve(&catalog, &SelectionSet::new()).unwrap();
        assert!(resolution.steps.is_empty());
    }

    #[test]
    fn test_unknown_selection_lists_all_ids() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["install-cuda", "nope", "also-nope"]).unwrap();
        match resolve(&catalog, &selection) {
            Err(NattdError::UnknownSelection { ids }) => {
                assert_eq!(ids, vec!["also-nope".to_string(), "nope".to_string()]);
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.steps.len())),
        }
    }

    #[test]
    fn test_unknown_variant() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["install-cuda=flatpak"]).unwrap();
        assert!(matches!(
            resolve(&catalog, &selection),
            Err(NattdError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn test_shared_key_pulled_in_before_dependent() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["install-cuda"]).unwrap();
        let resolution = resolve(&catalog, &selection).unwrap();

        assert_eq!(ids(&resolution), vec!["rpmfusion-enabled", "install-cuda"]);
        let key_step = &resolution.steps[0];
        // Realized where its producer sits even though the producer is unselected
        assert_eq!(key_step.section, Section::SystemConfig);
        assert_eq!(
            key_step.origin,
            Origin::Implicit {
                required_by: "install-cuda".to_string()
            }
        );
    }

    #[test]
    fn test_shared_key_lands_in_earliest_section() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["install-cuda", "install-codecs"]).unwrap();
        let resolution = resolve(&catalog, &selection).unwrap();

        assert_eq!(
            ids(&resolution),
            vec!["rpmfusion-enabled", "rpmfusion-enabled", "install-codecs", "install-cuda"]
        );
        assert!(resolution.steps[..2].iter().all(|s| s.section == Section::SystemConfig));
    }

    #[test]
    fn test_key_without_producer_lands_before_dependent() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["install-flatpak-app", "install-theme"]).unwrap();
        let resolution = resolve(&catalog, &selection).unwrap();

        assert_eq!(
            ids(&resolution),
            vec!["install-git", "flathub-enabled", "install-flatpak-app", "install-theme"]
        );
        assert_eq!(resolution.steps[1].section, Section::AppInstall);
    }

    #[test]
    fn test_producer_selection_does_not_move_key() {
        let catalog = test_catalog();
        let implicit = resolve(&catalog, &SelectionSet::parse(["install-cuda"]).unwrap()).unwrap();
        let explicit = resolve(
            &catalog,
            &SelectionSet::parse(["enable-rpmfusion", "install-cuda"]).unwrap(),
        )
        .unwrap();
        assert_eq!(implicit.steps[0].node, explicit.steps[0].node);
        assert_eq!(implicit.steps[0].section, explicit.steps[0].section);
    }

    #[test]
    fn test_explicit_producer_marks_key_explicit() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["enable-rpmfusion"]).unwrap();
        let resolution = resolve(&catalog, &selection).unwrap();

        assert_eq!(ids(&resolution), vec!["rpmfusion-enabled", "enable-rpmfusion"]);
        assert!(resolution.steps.iter().all(|s| s.origin.is_explicit()));
    }

    #[test]
    fn test_implicit_option_closure() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["install-theme"]).unwrap();
        let resolution = resolve(&catalog, &selection).unwrap();

        assert_eq!(ids(&resolution), vec!["install-git", "install-theme"]);
        assert_eq!(resolution.steps[0].section, Section::AppInstall);
        assert!(!resolution.steps[0].origin.is_explicit());
    }

    #[test]
    fn test_selected_and_implied_option_listed_twice() {
        let catalog = test_catalog();
        let selection = SelectionSet::parse(["install-theme", "install-git"]).unwrap();
        let resolution = resolve(&catalog, &selection).unwrap();
        assert_eq!(ids(&resolution), vec!["install-git", "install-git", "install-theme"]);
    }

    #[test]
    fn test_section_order_is_primary_key() {
        let catalog = test_catalog();
        let selection =
            SelectionSet::parse(["install-theme", "system-upgrade", "install-cuda"]).unwrap();
        let resolution = resolve(&catalog, &selection).unwrap();
        let sections: Vec<Section> = resolution.steps.iter().map(|s| s.section).collect();
        let mut sorted = sections.clone();
        sorted.sort();
        assert_eq!(sections, sorted);
        assert_eq!(resolution.steps[0].node.id(), "system-upgrade");
    }
}
