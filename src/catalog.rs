//! Catalog model: every selectable setup option and shared action.
//!
//! The catalog is a closed, validated record set loaded once per process.
//! All integrity checks happen in [`Catalog::from_json_str`]; once a
//! `Catalog` exists, every prerequisite and key reference in it resolves,
//! no prerequisite lives in a later section than its dependent, and the
//! prerequisite graph is acyclic.
//!
//! # File format
//!
//! ```json
//! {
//!   "shared_actions": [
//!     { "key": "rpmfusion-enabled", "label": "RPM Fusion",
//!       "commands": [{ "text": "dnf install -y ...", "description": "Enabling RPM Fusion" }] }
//!   ],
//!   "options": [
//!     { "id": "install-cuda", "label": "CUDA", "section": "app_install",
//!       "commands": [{ "text": "dnf install -y cuda", "description": "Installing CUDA" }],
//!       "requires_keys": ["rpmfusion-enabled"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CatalogProblem, NattdError, Result};
use crate::logic::graph::DependencyGraph;
use crate::types::Section;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// One logical shell operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    /// Shell text, possibly spanning several lines
    pub text: String,
    /// Human-readable description used in log lines
    pub description: String,
    /// Failure is logged and execution continues
    #[serde(default)]
    pub tolerable: bool,
}

/// Alternative way of installing an option (e.g. DNF vs Flatpak).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    #[serde(default)]
    pub requires_keys: Vec<String>,
}

/// A side effect several options may need but which runs at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedAction {
    pub key: String,
    pub label: String,
    pub commands: Vec<CommandSpec>,
}

/// A selectable setup step bound to exactly one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupOption {
    pub id: String,
    pub label: String,
    pub section: Section,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    /// Option ids or shared-action keys that must run first
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub provides_key: Option<String>,
    #[serde(default)]
    pub requires_keys: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl SetupOption {
    /// Look up a variant by name
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Variant used when the selection does not name one
    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }

    /// Own commands followed by the variant's
    pub fn effective_commands<'a>(
        &'a self,
        variant: Option<&'a Variant>,
    ) -> impl Iterator<Item = &'a CommandSpec> + 'a {
        self.commands
            .iter()
            .chain(variant.into_iter().flat_map(|v| v.commands.iter()))
    }

    /// Every id or key this option needs before it can run, in declaration
    /// order and without repeats. A producer depends on the key it provides.
    pub fn requirements<'a>(&'a self, variant: Option<&'a Variant>) -> Vec<&'a str> {
        let mut seen = BTreeSet::new();
        self.prerequisites
            .iter()
            .chain(self.requires_keys.iter())
            .chain(variant.into_iter().flat_map(|v| v.requires_keys.iter()))
            .chain(self.provides_key.iter())
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    shared_actions: Vec<SharedAction>,
    options: Vec<SetupOption>,
}

/// Immutable, validated catalog shared read-only by every request.
#[derive(Debug, Clone)]
pub struct Catalog {
    options: Vec<SetupOption>,
    option_index: HashMap<String, usize>,
    shared_actions: Vec<SharedAction>,
    shared_index: HashMap<String, usize>,
    producers: BTreeMap<String, Vec<usize>>,
}

impl Catalog {
    /// The catalog shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Load and validate a catalog from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        info!("Loading catalog from {:?}", path.as_ref());
        Self::from_json_str(&content)
    }

    /// Parse and validate a catalog. Every problem found is reported at once.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content).map_err(|e| {
            NattdError::catalog(CatalogProblem::InvalidFormat {
                reason: e.to_string(),
            })
        })?;
        Self::from_parts(file.shared_actions, file.options)
    }

    /// Build a catalog from already-typed records
    pub fn from_parts(shared_actions: Vec<SharedAction>, options: Vec<SetupOption>) -> Result<Self> {
        let mut problems = Vec::new();

        let mut shared_index = HashMap::new();
        for (i, action) in shared_actions.iter().enumerate() {
            if shared_index.insert(action.key.clone(), i).is_some() {
                problems.push(CatalogProblem::DuplicateSharedAction {
                    key: action.key.clone(),
                });
            }
        }

        let mut option_index = HashMap::new();
        for (i, option) in options.iter().enumerate() {
            if option_index.insert(option.id.clone(), i).is_some() {
                problems.push(CatalogProblem::DuplicateOption {
                    id: option.id.clone(),
                });
            }
            if shared_index.contains_key(&option.id) {
                problems.push(CatalogProblem::NamespaceClash {
                    id: option.id.clone(),
                });
            }
        }

        let mut producers: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, option) in options.iter().enumerate() {
            if let Some(key) = &option.provides_key {
                producers.entry(key.clone()).or_default().push(i);
            }
        }

        let catalog = Self {
            options,
            option_index,
            shared_actions,
            shared_index,
            producers,
        };

        catalog.check_records(&mut problems);
        catalog.check_references(&mut problems);
        // Cycle detection needs a clean graph
        if problems.is_empty() {
            catalog.check_acyclic(&mut problems);
        }

        if !problems.is_empty() {
            return Err(NattdError::CatalogIntegrity(problems));
        }

        debug!(
            "Catalog loaded: {} options, {} shared actions",
            catalog.options.len(),
            catalog.shared_actions.len()
        );
        Ok(catalog)
    }

    /// Find an option by id
    pub fn lookup(&self, id: &str) -> Option<&SetupOption> {
        self.option_index.get(id).map(|&i| &self.options[i])
    }

    /// Find a shared action by key
    pub fn shared_action(&self, key: &str) -> Option<&SharedAction> {
        self.shared_index.get(key).map(|&i| &self.shared_actions[i])
    }

    /// Options that realize `key`, in catalog order
    pub fn shared_action_producers(&self, key: &str) -> Vec<&SetupOption> {
        self.producers
            .get(key)
            .map(|indices| indices.iter().map(|&i| &self.options[i]).collect())
            .unwrap_or_default()
    }

    /// All options in catalog file order
    pub fn all_options(&self) -> &[SetupOption] {
        &self.options
    }

    /// All shared actions in catalog file order
    pub fn shared_actions(&self) -> &[SharedAction] {
        &self.shared_actions
    }

    /// Catalog file position of an option, the intra-section tie-break
    pub fn position(&self, id: &str) -> Option<usize> {
        self.option_index.get(id).copied()
    }

    /// Options assigned to a section, in catalog order
    pub fn options_in(&self, section: Section) -> impl Iterator<Item = &SetupOption> {
        self.options.iter().filter(move |o| o.section == section)
    }

    fn check_records(&self, problems: &mut Vec<CatalogProblem>) {
        for action in &self.shared_actions {
            if action.key.trim().is_empty() {
                problems.push(empty_field("<shared action>", "key"));
            }
            if action.label.trim().is_empty() {
                problems.push(empty_field(&action.key, "label"));
            }
            check_single_line(&action.key, "label", &action.label, problems);
            if action.commands.is_empty() {
                problems.push(empty_field(&action.key, "command list"));
            }
            check_commands(&action.key, &action.commands, problems);
        }

        for option in &self.options {
            if option.id.trim().is_empty() {
                problems.push(empty_field("<option>", "id"));
            }
            if option.label.trim().is_empty() {
                problems.push(empty_field(&option.id, "label"));
            }
            check_single_line(&option.id, "label", &option.label, problems);
            check_single_line(&option.id, "description", &option.description, problems);
            if option.commands.is_empty()
                && option.variants.is_empty()
                && option.provides_key.is_none()
            {
                problems.push(CatalogProblem::EmptyOption {
                    owner: option.id.clone(),
                });
            }
            check_commands(&option.id, &option.commands, problems);

            let mut names = BTreeSet::new();
            for variant in &option.variants {
                if variant.name.trim().is_empty() {
                    problems.push(empty_field(&option.id, "variant name"));
                }
                if let Some(label) = &variant.label {
                    check_single_line(&option.id, "variant label", label, problems);
                }
                if !names.insert(variant.name.as_str()) {
                    problems.push(CatalogProblem::DuplicateVariant {
                        owner: option.id.clone(),
                        variant: variant.name.clone(),
                    });
                }
                check_commands(&option.id, &variant.commands, problems);
            }
        }
    }

    fn check_references(&self, problems: &mut Vec<CatalogProblem>) {
        for option in &self.options {
            let dangling = |reference: &String| CatalogProblem::DanglingReference {
                owner: option.id.clone(),
                reference: reference.clone(),
            };

            for prerequisite in &option.prerequisites {
                if let Some(required) = self.lookup(prerequisite) {
                    if required.section > option.section {
                        problems.push(CatalogProblem::SectionInversion {
                            owner: option.id.clone(),
                            owner_section: option.section,
                            prerequisite: required.id.clone(),
                            prerequisite_section: required.section,
                        });
                    }
                } else if self.shared_action(prerequisite).is_none() {
                    problems.push(dangling(prerequisite));
                }
            }

            let keys = option
                .requires_keys
                .iter()
                .chain(option.provides_key.iter())
                .chain(option.variants.iter().flat_map(|v| v.requires_keys.iter()));
            for key in keys {
                if self.shared_action(key).is_none() {
                    problems.push(dangling(key));
                }
            }
        }
    }

    /// Shared actions carry no prerequisites, so only option-to-option
    /// edges can close a cycle.
    fn check_acyclic(&self, problems: &mut Vec<CatalogProblem>) {
        let mut graph = DependencyGraph::new();
        for i in 0..self.options.len() {
            graph.add_node(i);
        }
        for (i, option) in self.options.iter().enumerate() {
            for prerequisite in &option.prerequisites {
                if let Some(p) = self.position(prerequisite) {
                    graph.add_edge(p, i);
                }
            }
        }
        if let Err(members) = graph.sort() {
            problems.push(CatalogProblem::Cycle {
                ids: members.iter().map(|&i| self.options[i].id.clone()).collect(),
            });
        }
    }
}

fn empty_field(owner: &str, field: &'static str) -> CatalogProblem {
    CatalogProblem::EmptyField {
        owner: owner.to_string(),
        field,
    }
}

fn check_commands(owner: &str, commands: &[CommandSpec], problems: &mut Vec<CatalogProblem>) {
    for command in commands {
        if command.text.trim().is_empty() {
            problems.push(empty_field(owner, "command text"));
        }
        if command.description.trim().is_empty() {
            problems.push(empty_field(owner, "command description"));
        }
        check_single_line(owner, "command description", &command.description, problems);
    }
}

/// Labels and descriptions end up in `#` comments and log lines.
fn check_single_line(
    owner: &str,
    field: &'static str,
    text: &str,
    problems: &mut Vec<CatalogProblem>,
) {
    if text.chars().any(char::is_control) {
        problems.push(CatalogProblem::ControlCharacter {
            owner: owner.to_string(),
            field,
        });
    }
}
