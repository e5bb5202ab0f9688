//! NATTD Library
//!
//! Composes Fedora Workstation setup scripts from a catalog of selectable
//! options: dependency resolution, shared-action deduplication, quiet or
//! verbose rendering, and substitution into a base shell template.

pub mod catalog;
pub mod cli;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod logic;
pub mod profiles;
pub mod selection;
pub mod types;

// Re-export main types for convenience
pub use catalog::{Catalog, CommandSpec, SetupOption, SharedAction, Variant};
pub use config_file::GenerationConfig;
pub use engine::render::{ModeRenderer, QUIET_REDIRECT};
pub use engine::template::ScriptTemplate;
pub use engine::{GeneratedScript, GenerationRequest, ScriptGenerator, DEFAULT_HOSTNAME};
pub use error::{CatalogProblem, NattdError, Result, TemplateProblem};
pub use logic::dedup::{deduplicate, ImplicitInclusion, Plan};
pub use logic::resolver::{resolve, Origin, Resolution};
pub use profiles::Profile;
pub use selection::{Selection, SelectionSet};
pub use types::{RenderMode, Section};
