//! Mode renderer
//!
//! Converts plan nodes into shell text. Every command goes through the same
//! strategy regardless of mode:
//!
//! ```text
//! log_message "Installing CUDA..."
//! dnf install -y cuda            <- quiet mode appends " > /dev/null 2>&1"
//! step_status=$?
//! if [ "$step_status" -ne 0 ]; then
//!     log_message "ERROR: Installing CUDA failed with exit status $step_status"
//!     exit "$step_status"
//! fi
//! log_message "Installing CUDA completed."
//! ```
//!
//! The redirect token is the only thing the mode changes, so quiet and
//! verbose output share the same status capture, logging and abort logic.
//!
//! Commands spanning several lines, or using pipes, lists or comments, run
//! in a subshell with `set -eo pipefail`, so the captured status is that of
//! the first failing step and the redirect sits on its own line.
//! `log_message` is provided by the base template: it timestamps the line,
//! prints it and appends it to the script's log file.

use std::fmt::Write;

use crate::catalog::CommandSpec;
use crate::logic::dedup::PlannedNode;
use crate::logic::resolver::NodeRef;
use crate::types::RenderMode;

/// Appended to a command in quiet mode
pub const QUIET_REDIRECT: &str = " > /dev/null 2>&1";

/// Token in command text replaced by the request's hostname
pub const HOSTNAME_TOKEN: &str = "{hostname}";

/// Commands that only talk to the operator; never silenced
const CONSOLE_COMMANDS: &[&str] = &["echo", "printf", "read", "log_message", "color_echo"];

/// Renders plan nodes for one mode.
#[derive(Debug, Clone, Copy)]
pub struct ModeRenderer<'a> {
    mode: RenderMode,
    hostname: &'a str,
}

impl<'a> ModeRenderer<'a> {
    pub fn new(mode: RenderMode, hostname: &'a str) -> Self {
        Self { mode, hostname }
    }

    /// Render a node's commands under a comment header. A node without
    /// commands (a pure producer) renders to nothing.
    pub fn render_node(&self, planned: &PlannedNode<'_>) -> String {
        let (heading, description, commands): (String, &str, Vec<&CommandSpec>) =
            match planned.node {
                NodeRef::Setup { option, variant } => {
                    let heading = match variant {
                        Some(v) => format!(
                            "{} ({})",
                            option.label,
                            v.label.as_deref().unwrap_or(&v.name)
                        ),
                        None => option.label.clone(),
                    };
                    (
                        heading,
                        option.description.as_str(),
                        option.effective_commands(variant).collect(),
                    )
                }
                NodeRef::Shared(action) => {
                    (action.label.clone(), "", action.commands.iter().collect())
                }
            };

        if commands.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        let _ = writeln!(out, "# {}", heading);
        if !description.trim().is_empty() {
            let _ = writeln!(out, "# {}", description.trim());
        }
        for command in commands {
            out.push_str(&self.render_command(command));
        }
        out.push('\n');
        out
    }

    /// Render one command with its status capture and failure policy.
    pub fn render_command(&self, command: &CommandSpec) -> String {
        let text = command.text.trim_end().replace(HOSTNAME_TOKEN, self.hostname);
        let description = escape_double_quoted(command.description.trim());

        let mut out = String::new();
        let _ = writeln!(out, "log_message \"{}...\"", description);
        out.push_str(&self.invocation(&text));
        out.push_str("step_status=$?\n");
        out.push_str("if [ \"$step_status\" -ne 0 ]; then\n");
        if command.tolerable {
            let _ = writeln!(
                out,
                "    log_message \"WARNING: {} failed with exit status $step_status, continuing\"",
                description
            );
            out.push_str("else\n");
            let _ = writeln!(out, "    log_message \"{} completed.\"", description);
            out.push_str("fi\n");
        } else {
            let _ = writeln!(
                out,
                "    log_message \"ERROR: {} failed with exit status $step_status\"",
                description
            );
            out.push_str("    exit \"$step_status\"\n");
            out.push_str("fi\n");
            let _ = writeln!(out, "log_message \"{} completed.\"", description);
        }
        out
    }

    /// The command itself, run in a fail-fast subshell when a trailing
    /// redirect or status check would only reach part of it.
    fn invocation(&self, text: &str) -> String {
        let redirect = match self.mode {
            RenderMode::Quiet if !is_console_command(text) => QUIET_REDIRECT,
            _ => "",
        };
        if needs_grouping(text) {
            format!("(\nset -eo pipefail\n{}\n){}\n", text, redirect)
        } else {
            format!("{}{}\n", text, redirect)
        }
    }
}

/// Operator-facing output such as prompts and banners.
pub fn is_console_command(text: &str) -> bool {
    let trimmed = text.trim_start();
    let first = trimmed.split_whitespace().next().unwrap_or("");
    CONSOLE_COMMANDS.contains(&first) && !trimmed.contains('|') && !trimmed.contains('\n')
}

fn needs_grouping(text: &str) -> bool {
    text.contains(['\n', '|', ';', '&', '#'])
}

/// Escape text for use inside a double-quoted shell string.
pub fn escape_double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
