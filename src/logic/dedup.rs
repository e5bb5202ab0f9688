//! Deduplicator
//!
//! Collapses the resolver's demand list into a plan where every node appears
//! exactly once, at the position of its first demand. Provenance is merged:
//! a node demanded explicitly anywhere is explicit, and every dependent that
//! pulled it in is remembered for reporting.

use std::collections::BTreeMap;

use crate::logic::resolver::{NodeRef, Origin, Resolution};
use crate::types::Section;

/// A node that will be rendered exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNode<'c> {
    pub node: NodeRef<'c>,
    pub section: Section,
    pub explicit: bool,
    /// Dependents that required this node, in plan order
    pub required_by: Vec<String>,
}

/// A node the caller did not select but the plan needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitInclusion {
    pub id: String,
    pub label: String,
    pub shared: bool,
    pub required_by: Vec<String>,
}

/// Ordered, duplicate-free plan.
#[derive(Debug, Clone, Default)]
pub struct Plan<'c> {
    pub nodes: Vec<PlannedNode<'c>>,
}

impl<'c> Plan<'c> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes assigned to `section`, in plan order
    pub fn in_section(&self, section: Section) -> impl Iterator<Item = &PlannedNode<'c>> {
        self.nodes.iter().filter(move |n| n.section == section)
    }

    /// Nodes pulled in only because something else needed them
    pub fn implicit_inclusions(&self) -> Vec<ImplicitInclusion> {
        self.nodes
            .iter()
            .filter(|n| !n.explicit)
            .map(|n| ImplicitInclusion {
                id: n.node.id().to_string(),
                label: n.node.label().to_string(),
                shared: n.node.is_shared(),
                required_by: n.required_by.clone(),
            })
            .collect()
    }
}

/// Keep the earliest occurrence of every node and merge the rest into it.
pub fn deduplicate(resolution: Resolution<'_>) -> Plan<'_> {
    let mut nodes: Vec<PlannedNode<'_>> = Vec::new();
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();

    for step in resolution.steps {
        let slot = match seen.get(step.node.id()) {
            Some(&slot) => slot,
            None => {
                seen.insert(step.node.id(), nodes.len());
                nodes.push(PlannedNode {
                    node: step.node,
                    section: step.section,
                    explicit: false,
                    required_by: Vec::new(),
                });
                nodes.len() - 1
            }
        };

        let planned = &mut nodes[slot];
        match step.origin {
            Origin::Explicit => planned.explicit = true,
            Origin::Implicit { required_by } => {
                if !planned.required_by.contains(&required_by) {
                    planned.required_by.push(required_by);
                }
            }
        }
    }

    Plan { nodes }
}
