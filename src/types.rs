//! Type-safe generation types for NATTD
//!
//! Sections and render modes are closed enums rather than strings so the
//! five template regions and the two verbosity modes are checked at compile
//! time and matched exhaustively.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// One of the five fixed regions of the generated script.
///
/// Declaration order is the emission order and is load-bearing: the derived
/// `Ord` is used as the primary sort key when ordering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    SystemUpgrade,
    SystemConfig,
    AppInstall,
    Customization,
    CustomScript,
}

impl Section {
    /// Number of sections in every template
    pub const COUNT: usize = 5;

    /// Zero-based position in the fixed section order
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Placeholder token in the base template, e.g. `{{system_config}}`
    pub fn placeholder(self) -> String {
        format!("{{{{{}}}}}", self)
    }

    /// Heading used by the preview, e.g. "System Config"
    pub fn title(self) -> &'static str {
        match self {
            Self::SystemUpgrade => "System Upgrade",
            Self::SystemConfig => "System Config",
            Self::AppInstall => "App Install",
            Self::Customization => "Customization",
            Self::CustomScript => "Custom Script",
        }
    }

    /// All sections in emission order
    pub fn ordered() -> impl Iterator<Item = Section> {
        Section::iter()
    }
}

/// Global console verbosity of a generated script.
///
/// Modes differ only in whether command output reaches the console;
/// error detection and logging are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RenderMode {
    Quiet,
    #[default]
    Verbose,
}
