//! Error handling module for NATTD
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every generator-time failure is one of these; none of them ever yields a
//! partially generated script.

use thiserror::Error;

use crate::types::Section;

/// A single defect found in a catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogProblem {
    /// The catalog file could not be parsed against the schema
    #[error("invalid catalog format: {reason}")]
    InvalidFormat { reason: String },

    /// A required text field is blank
    #[error("'{owner}' has an empty {field}")]
    EmptyField { owner: String, field: &'static str },

    /// Two options share an id
    #[error("duplicate option id '{id}'")]
    DuplicateOption { id: String },

    /// Two shared actions share a key
    #[error("duplicate shared-action key '{key}'")]
    DuplicateSharedAction { key: String },

    /// An option id is also used as a shared-action key
    #[error("'{id}' is used both as an option id and a shared-action key")]
    NamespaceClash { id: String },

    /// A prerequisite or key reference resolves to nothing
    #[error("'{owner}' references unknown id or key '{reference}'")]
    DanglingReference { owner: String, reference: String },

    /// A label or description would break out of its comment or log line
    #[error("'{owner}' has a control character in its {field}")]
    ControlCharacter { owner: String, field: &'static str },

    /// An option names a variant twice
    #[error("'{owner}' declares variant '{variant}' more than once")]
    DuplicateVariant { owner: String, variant: String },

    /// An option would render nothing and realize nothing
    #[error("'{owner}' has no commands, variants or provided key")]
    EmptyOption { owner: String },

    /// A prerequisite option lives in a later section than its dependent
    #[error(
        "'{owner}' ({owner_section}) requires '{prerequisite}' from the later section {prerequisite_section}"
    )]
    SectionInversion {
        owner: String,
        owner_section: Section,
        prerequisite: String,
        prerequisite_section: Section,
    },

    /// Prerequisites form a cycle
    #[error("dependency cycle between: {}", .ids.join(", "))]
    Cycle { ids: Vec<String> },
}

/// A defect in the base template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateProblem {
    #[error("placeholder {placeholder} is missing")]
    MissingPlaceholder { placeholder: String },

    #[error("placeholder {placeholder} appears {count} times, expected exactly once")]
    DuplicatePlaceholder { placeholder: String, count: usize },

    #[error("logging helper '{helper}' is not defined")]
    MissingHelper { helper: String },
}

/// Main error type for NATTD
#[derive(Error, Debug)]
pub enum NattdError {
    /// Malformed catalog, dangling reference or dependency cycle
    #[error("Catalog integrity error: {}", format_problems(.0))]
    CatalogIntegrity(Vec<CatalogProblem>),

    /// Selection names ids that are not in the catalog
    #[error("Unknown selection: {}", .ids.join(", "))]
    UnknownSelection { ids: Vec<String> },

    /// Selection names a variant the option does not declare
    #[error("Unknown variant '{variant}' for option '{id}'")]
    UnknownVariant { id: String, variant: String },

    /// Same option selected with two different variants
    #[error("Option '{id}' selected with conflicting variants '{first}' and '{second}'")]
    ConflictingVariants {
        id: String,
        first: String,
        second: String,
    },

    /// Base template cannot be substituted safely
    #[error("Template integrity error: {0}")]
    TemplateIntegrity(#[from] TemplateProblem),

    /// Request values (hostname, selection syntax) are invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO errors (reading catalog or template files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for NATTD operations
pub type Result<T> = std::result::Result<T, NattdError>;

impl NattdError {
    /// Create a catalog integrity error from a single problem
    pub fn catalog(problem: CatalogProblem) -> Self {
        Self::CatalogIntegrity(vec![problem])
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

fn format_problems(problems: &[CatalogProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
