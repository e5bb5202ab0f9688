use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::profiles::Profile;
use crate::types::{RenderMode, Section};

/// NATTD - Not Another "Things To Do" for Fedora Workstation
#[derive(Parser, Debug)]
#[command(name = "nattd")]
#[command(about = "Compose a Fedora Workstation setup script from selectable options")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Catalog and template overrides shared by every command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Catalog JSON file to use instead of the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Base template to use instead of the built-in one
    #[arg(long)]
    pub template: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a setup script
    Generate {
        #[command(flatten)]
        sources: SourceArgs,

        /// Load the request from a saved configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Start from a predefined profile
        #[arg(short, long)]
        profile: Option<Profile>,

        /// Option to include, as ID or ID=VARIANT (repeatable)
        #[arg(short, long = "select", value_name = "ID[=VARIANT]")]
        select: Vec<String>,

        /// Console verbosity of the generated script
        #[arg(short, long)]
        mode: Option<RenderMode>,

        /// Hostname used by the set-hostname option
        #[arg(long)]
        hostname: Option<String>,

        /// File whose contents are appended as custom commands
        #[arg(long)]
        custom_script: Option<PathBuf>,

        /// Write the script to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print only the generated sections
        #[arg(long)]
        preview: bool,

        /// Save the effective request to a configuration file
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Check catalog and template integrity
    Validate {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// List catalog options or profiles
    List {
        #[command(flatten)]
        sources: SourceArgs,

        /// Only list options of this section
        #[arg(long)]
        section: Option<Section>,

        /// List profiles instead of options
        #[arg(long)]
        profiles: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
