//! Engine modules: turn a validated selection into a complete setup script.
//!
//! The engine sits between the catalog/resolver layer (what must run, in
//! which order) and the caller (what text to write). [`ScriptGenerator`]
//! drives the pipeline:
//!
//! ```text
//! SelectionSet ─► resolve ─► deduplicate ─► ModeRenderer ─► ScriptTemplate
//! ```
//!
//! A generator holds the catalog and template behind `Arc`s and keeps no
//! per-request state, so one instance can serve concurrent requests.

pub mod render;
pub mod template;

use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{NattdError, Result};
use crate::logic::dedup::{deduplicate, ImplicitInclusion, Plan};
use crate::logic::resolver::resolve;
use crate::selection::SelectionSet;
use crate::types::{RenderMode, Section};
use render::ModeRenderer;
use template::{ScriptTemplate, SectionBlocks};

/// Hostname used when a request does not set one
pub const DEFAULT_HOSTNAME: &str = "fedora-workstation";

/// Heading placed above free-form user commands
const CUSTOM_SCRIPT_HEADER: &str = "# Custom user-defined commands";

const PREVIEW_HEADER: &str = "(...)  # Script header and initial setup";
const PREVIEW_FOOTER: &str = "(...)  # Script footer";

/// Everything one generation needs besides the catalog and template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub selection: SelectionSet,
    pub mode: RenderMode,
    pub hostname: Option<String>,
    /// Shell text appended verbatim to the custom script section
    pub custom_script: Option<String>,
}

impl GenerationRequest {
    pub fn new(selection: SelectionSet, mode: RenderMode) -> Self {
        Self {
            selection,
            mode,
            ..Self::default()
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_custom_script(mut self, script: impl Into<String>) -> Self {
        self.custom_script = Some(script.into());
        self
    }

    /// Hostname substituted into command text
    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or(DEFAULT_HOSTNAME)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(hostname) = &self.hostname {
            validate_hostname(hostname)?;
        }
        Ok(())
    }
}

/// Check a hostname: 1-63 ASCII letters, digits or hyphens, no hyphen at
/// either end.
pub fn validate_hostname(hostname: &str) -> Result<()> {
    if hostname.is_empty() || hostname.len() > 63 {
        return Err(NattdError::invalid_request(format!(
            "hostname must be 1-63 characters, got {}",
            hostname.len()
        )));
    }
    if !hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(NattdError::invalid_request(format!(
            "hostname '{}' may only contain letters, digits and hyphens",
            hostname
        )));
    }
    if hostname.starts_with('-') || hostname.ends_with('-') {
        return Err(NattdError::invalid_request(format!(
            "hostname '{}' cannot start or end with a hyphen",
            hostname
        )));
    }
    Ok(())
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScript {
    /// Complete script text
    pub text: String,
    /// Nodes added because a selected option needed them, in plan order
    pub implicit: Vec<ImplicitInclusion>,
}

/// Generation entry point shared by every request.
#[derive(Debug, Clone)]
pub struct ScriptGenerator {
    catalog: Arc<Catalog>,
    template: Arc<ScriptTemplate>,
}

impl ScriptGenerator {
    pub fn new(catalog: Arc<Catalog>, template: Arc<ScriptTemplate>) -> Self {
        Self { catalog, template }
    }

    /// Generator over the built-in catalog and template
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(
            Arc::new(Catalog::builtin()?),
            Arc::new(ScriptTemplate::builtin()?),
        ))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn template(&self) -> &ScriptTemplate {
        &self.template
    }

    /// Generate the script text for a selection.
    pub fn generate(&self, selection: &SelectionSet, mode: RenderMode) -> Result<String> {
        let request = GenerationRequest::new(selection.clone(), mode);
        Ok(self.generate_request(&request)?.text)
    }

    /// Generate a script for a full request. Either the whole script is
    /// returned or an error; never partial text.
    pub fn generate_request(&self, request: &GenerationRequest) -> Result<GeneratedScript> {
        request.validate()?;
        debug!(
            "Generating {} script for {} selections",
            request.mode,
            request.selection.len()
        );

        let plan = deduplicate(resolve(&self.catalog, &request.selection)?);
        let blocks = self.render_blocks(&plan, request);
        let text = self.template.assemble(&blocks);

        let implicit = plan.implicit_inclusions();
        for inclusion in &implicit {
            info!("{}", self.notice(inclusion));
        }

        debug!("Generated script: {} nodes, {} bytes", plan.len(), text.len());
        Ok(GeneratedScript { text, implicit })
    }

    /// Render only the generated sections, without the base template.
    pub fn preview(&self, request: &GenerationRequest) -> Result<String> {
        request.validate()?;
        let plan = deduplicate(resolve(&self.catalog, &request.selection)?);
        let blocks = self.render_blocks(&plan, request);

        let mut out = String::new();
        out.push_str(PREVIEW_HEADER);
        out.push_str("\n\n");
        for (section, text) in blocks.non_empty() {
            out.push_str("# ");
            out.push_str(section.title());
            out.push('\n');
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(PREVIEW_FOOTER);
        out.push('\n');
        Ok(out)
    }

    /// Human-readable notice for an implicitly included node, e.g.
    /// "RPM Fusion has been automatically enabled because it's required for NVIDIA CUDA".
    pub fn notice(&self, inclusion: &ImplicitInclusion) -> String {
        let dependents: Vec<&str> = inclusion
            .required_by
            .iter()
            .map(|id| self.catalog.lookup(id).map_or(id.as_str(), |o| o.label.as_str()))
            .collect();
        format!(
            "{} has been automatically enabled because it's required for {}",
            inclusion.label,
            dependents.join(", ")
        )
    }

    fn render_blocks(&self, plan: &Plan<'_>, request: &GenerationRequest) -> SectionBlocks {
        let renderer = ModeRenderer::new(request.mode, request.hostname());
        let mut blocks = SectionBlocks::new();
        for planned in &plan.nodes {
            blocks.push(planned.section, &renderer.render_node(planned));
        }

        let custom = request.custom_script.as_deref().map(str::trim).unwrap_or("");
        if !custom.is_empty() {
            blocks.push(
                Section::CustomScript,
                &format!("{}\n{}\n", CUSTOM_SCRIPT_HEADER, custom),
            );
        }
        blocks
    }
}
