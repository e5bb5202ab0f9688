//! Base template handling.
//!
//! The template is opaque shell text carrying exactly one `{{section}}`
//! marker per section. Marker offsets are located once when the template is
//! parsed, so assembly is a single pass over the original text: inserted
//! blocks are never rescanned for markers and nothing outside the markers is
//! touched.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, TemplateProblem};
use crate::types::Section;

const BUILTIN_TEMPLATE: &str = include_str!("../../data/template.sh");

/// Helper every rendered block calls; must be defined by the template
pub const LOG_HELPER: &str = "log_message";

/// Rendered text for each section, in section order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionBlocks {
    blocks: [String; Section::COUNT],
}

impl SectionBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rendered text to a section
    pub fn push(&mut self, section: Section, text: &str) {
        self.blocks[section.rank()].push_str(text);
    }

    pub fn get(&self, section: Section) -> &str {
        &self.blocks[section.rank()]
    }

    /// Non-empty sections in order
    pub fn non_empty(&self) -> impl Iterator<Item = (Section, &str)> {
        Section::ordered()
            .map(move |s| (s, self.get(s)))
            .filter(|(_, text)| !text.trim().is_empty())
    }
}

/// A validated base template.
#[derive(Debug, Clone)]
pub struct ScriptTemplate {
    text: String,
    /// Byte offset of each marker, sorted by offset
    markers: Vec<(usize, Section)>,
}

impl ScriptTemplate {
    /// The template shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_TEMPLATE)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        debug!("Loading template from {:?}", path.as_ref());
        Self::parse(&content)
    }

    /// Validate a template: every marker exactly once, logging helper defined.
    pub fn parse(text: &str) -> Result<Self> {
        let mut markers = Vec::with_capacity(Section::COUNT);
        for section in Section::ordered() {
            let placeholder = section.placeholder();
            let found: Vec<usize> = text.match_indices(&placeholder).map(|(i, _)| i).collect();
            match found.as_slice() {
                [offset] => markers.push((*offset, section)),
                [] => {
                    warn!("Template is missing placeholder {}", placeholder);
                    return Err(TemplateProblem::MissingPlaceholder { placeholder }.into());
                }
                many => {
                    return Err(TemplateProblem::DuplicatePlaceholder {
                        placeholder,
                        count: many.len(),
                    }
                    .into());
                }
            }
        }

        if !defines_function(text, LOG_HELPER) {
            return Err(TemplateProblem::MissingHelper {
                helper: LOG_HELPER.to_string(),
            }
            .into());
        }

        markers.sort();
        Ok(Self {
            text: text.to_string(),
            markers,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace each marker with its section's text (empty when unused).
    pub fn assemble(&self, blocks: &SectionBlocks) -> String {
        let extra: usize = Section::ordered().map(|s| blocks.get(s).len()).sum();
        let mut out = String::with_capacity(self.text.len() + extra);
        let mut cursor = 0;
        for &(offset, section) in &self.markers {
            out.push_str(&self.text[cursor..offset]);
            out.push_str(blocks.get(section));
            cursor = offset + section.placeholder().len();
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

/// Match `name()` or `function name` at the start of a line.
fn defines_function(text: &str, name: &str) -> bool {
    text.lines().map(str::trim_start).any(|line| {
        let (keyword, rest) = match line.strip_prefix("function ") {
            Some(rest) => (true, rest.trim_start()),
            None => (false, line),
        };
        let Some(after) = rest.strip_prefix(name) else {
            return false;
        };
        let after = after.trim_start();
        after.starts_with("()") || (keyword && (after.is_empty() || after.starts_with('{')))
    })
}
