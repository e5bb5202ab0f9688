//! Predefined selection profiles.
//!
//! A profile is a named starting point: a list of selections (some pinned to
//! a variant) plus an optional custom script. Lists live in Rust rather than
//! in the catalog file so a typo is caught by the tests below.
//!
//! | Profile     | Contents |
//! |-------------|----------|
//! | Recommended | Upgrade, DNF tuning, RPM Fusion, everyday apps, fonts and icons |
//! | Minimal     | Upgrade, DNF tuning and Git |

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Result;
use crate::selection::SelectionSet;

/// Named selection preset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Sensible defaults for a fresh desktop install
    #[default]
    Recommended,

    /// Only the essentials
    Minimal,
}

impl Profile {
    /// Selections in `id` / `id=variant` form.
    pub fn selections(&self) -> &'static [&'static str] {
        match self {
            Profile::Recommended => &[
                "system-upgrade",
                "configure-dnf",
                "enable-rpmfusion",
                "enable-dnf-autoupdate",
                "firmware-updates",
                "install-git",
                "install-wget",
                "install-fastfetch",
                "install-gnome-tweaks",
                "install-vivaldi=dnf",
                "install-vlc=dnf",
                "install-gimp=dnf",
                "install-windows-fonts=core",
                "install-tela-icon-theme",
            ],
            Profile::Minimal => &["system-upgrade", "configure-dnf", "install-git"],
        }
    }

    pub fn custom_script(&self) -> Option<&'static str> {
        match self {
            Profile::Recommended => Some("echo Created with \u{2764}\u{fe0f} for Open Source"),
            Profile::Minimal => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Profile::Recommended => "Sensible defaults for a fresh Fedora Workstation",
            Profile::Minimal => "System upgrade, faster DNF and Git",
        }
    }

    /// Parse the profile's selections into a set.
    pub fn to_selection_set(&self) -> Result<SelectionSet> {
        SelectionSet::parse(self.selections())
    }
}
