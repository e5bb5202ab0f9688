//! NATTD - Main entry point
//!
//! Thin command line front end over the `nattd` library: it loads the
//! catalog and template, builds a request from flags and config files, and
//! writes the generated script.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nattd::catalog::Catalog;
use nattd::cli::{Cli, Commands, SourceArgs};
use nattd::config_file::GenerationConfig;
use nattd::engine::template::ScriptTemplate;
use nattd::engine::ScriptGenerator;
use nattd::profiles::Profile;
use nattd::types::Section;

/// Initialize logging on stderr so a script written to stdout stays clean
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Generate {
            sources,
            config,
            profile,
            select,
            mode,
            hostname,
            custom_script,
            output,
            preview,
            save_config,
        } => {
            let mut request_config = match config {
                Some(path) => {
                    info!("Loading generation config: {:?}", path);
                    GenerationConfig::load_from_file(&path)?
                }
                None => GenerationConfig::new(),
            };
            if profile.is_some() {
                request_config.profile = profile;
            }
            request_config.selections.extend(select);
            if let Some(mode) = mode {
                request_config.mode = mode;
            }
            if hostname.is_some() {
                request_config.hostname = hostname;
            }
            if let Some(path) = custom_script {
                let script = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read custom script from {:?}", path))?;
                request_config.custom_script = Some(script);
            }

            let request = request_config.to_request()?;
            if let Some(path) = save_config {
                request_config.save_to_file(&path)?;
                info!("Configuration saved to {:?}", path);
            }

            let generator = load_generator(&sources)?;
            if preview {
                write_output(&generator.preview(&request)?, output.as_deref())?;
                return Ok(());
            }

            let script = generator.generate_request(&request)?;
            for inclusion in &script.implicit {
                eprintln!("Note: {}", generator.notice(inclusion));
            }
            write_output(&script.text, output.as_deref())?;
        }
        Commands::Validate { sources } => {
            let generator = load_generator(&sources)?;
            println!(
                "✓ Catalog is valid: {} options, {} shared actions",
                generator.catalog().all_options().len(),
                generator.catalog().shared_actions().len()
            );
            println!("✓ Template is valid");
        }
        Commands::List {
            sources,
            section,
            profiles,
        } => {
            if profiles {
                list_profiles();
            } else {
                let generator = load_generator(&sources)?;
                list_options(generator.catalog(), section);
            }
        }
    }

    Ok(())
}

/// Load and validate catalog and template, built-in unless overridden
fn load_generator(sources: &SourceArgs) -> Result<ScriptGenerator> {
    let catalog = match &sources.catalog {
        Some(path) => Catalog::load_from_file(path)
            .with_context(|| format!("Failed to load catalog from {:?}", path))?,
        None => Catalog::builtin().context("Built-in catalog is invalid")?,
    };
    let template = match &sources.template {
        Some(path) => ScriptTemplate::load_from_file(path)
            .with_context(|| format!("Failed to load template from {:?}", path))?,
        None => ScriptTemplate::builtin().context("Built-in template is invalid")?,
    };
    Ok(ScriptGenerator::new(Arc::new(catalog), Arc::new(template)))
}

/// Write to a file marked executable, or to stdout
fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        print!("{}", text);
        return Ok(());
    };

    fs::write(path, text).with_context(|| format!("Failed to write script to {:?}", path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to make {:?} executable", path))?;
    }

    info!("Script written to {:?}", path);
    Ok(())
}

fn list_profiles() {
    for profile in Profile::iter() {
        println!("{} - {}", profile, profile.description());
        for selection in profile.selections() {
            println!("    {}", selection);
        }
    }
}

fn list_options(catalog: &Catalog, only: Option<Section>) {
    for section in Section::ordered().filter(|s| only.is_none_or(|o| o == *s)) {
        println!("[{}]", section);
        for option in catalog.options_in(section) {
            let variants: Vec<&str> = option.variants.iter().map(|v| v.name.as_str()).collect();
            if variants.is_empty() {
                println!("    {:<28} {}", option.id, option.label);
            } else {
                println!(
                    "    {:<28} {} (variants: {})",
                    option.id,
                    option.label,
                    variants.join(", ")
                );
            }
        }
    }
}
