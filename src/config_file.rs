//! Configuration file handling for saving and loading generation requests.
//!
//! A saved config names an optional profile, extra selections, the render
//! mode, the hostname and a custom script. Loading it back and generating
//! yields the same script, provided the catalog has not changed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::{validate_hostname, GenerationRequest};
use crate::profiles::Profile;
use crate::selection::{Selection, SelectionSet};
use crate::types::RenderMode;

/// Generation request that can be saved/loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Profile whose selections come first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// Extra selections, `id` or `id=variant`
    #[serde(default)]
    pub selections: Vec<String>,
    #[serde(default)]
    pub mode: RenderMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Overrides the profile's custom script when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_script: Option<String>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a request. Selections are written in id order.
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            profile: None,
            selections: request.selection.iter().map(|s| s.to_string()).collect(),
            mode: request.mode,
            hostname: request.hostname.clone(),
            custom_script: request.custom_script.clone(),
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration without consulting the catalog
    pub fn validate(&self) -> Result<()> {
        for item in &self.selections {
            item.parse::<Selection>()
                .with_context(|| format!("Invalid selection {:?} in configuration", item))?;
        }

        if let Some(hostname) = &self.hostname {
            validate_hostname(hostname.trim()).context("Invalid hostname in configuration")?;
        }

        Ok(())
    }

    /// Merge profile and explicit selections into a generation request.
    pub fn to_request(&self) -> Result<GenerationRequest> {
        self.validate()?;

        let mut selection = match self.profile {
            Some(profile) => profile.to_selection_set()?,
            None => SelectionSet::new(),
        };
        for item in &self.selections {
            selection.insert(item.parse::<Selection>()?)?;
        }

        let custom_script = self
            .custom_script
            .clone()
            .or_else(|| self.profile.and_then(|p| p.custom_script()).map(str::to_string));

        Ok(GenerationRequest {
            selection,
            mode: self.mode,
            hostname: self.hostname.as_ref().map(|h| h.trim().to_string()),
            custom_script,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_config() -> GenerationConfig {
        GenerationConfig {
            profile: Some(Profile::Minimal),
            selections: vec!["install-cuda".to_string(), "install-gimp=flatpak".to_string()],
            mode: RenderMode::Quiet,
            hostname: Some("devbox".to_string()),
            custom_script: None,
        }
    }

    #[test]
    fn test_generation_config_default() {
        let config = GenerationConfig::new();
        assert!(config.profile.is_none());
        assert!(config.selections.is_empty());
        assert_eq!(config.mode, RenderMode::Verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip_save_load() {
        let config = create_test_config();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();
        let loaded = GenerationConfig::load_from_file(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_minimal_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{ "selections": ["install-git"], "mode": "quiet" }"#)
            .unwrap();
        temp_file.flush().unwrap();

        let loaded = GenerationConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.selections, vec!["install-git"]);
        assert_eq!(loaded.mode, RenderMode::Quiet);
        assert!(loaded.hostname.is_none());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = GenerationConfig::load_from_file(std::path::Path::new("/nonexistent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ invalid json }").unwrap();
        temp_file.flush().unwrap();

        let result = GenerationConfig::load_from_file(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_json_wrong_mode_fails() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{ "mode": "silent" }"#).unwrap();
        temp_file.flush().unwrap();

        assert!(GenerationConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_json_unknown_field_fails() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{ "install_disk": "/dev/sda" }"#).unwrap();
        temp_file.flush().unwrap();

        assert!(GenerationConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_validation_invalid_hostname() {
        let mut config = create_test_config();
        config.hostname = Some("-bad".to_string());
        assert!(config.validate().is_err());

        config.hostname = Some("a".repeat(64));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_selection() {
        let mut config = create_test_config();
        config.selections.push("install-gimp=".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_request_merges_profile_and_selections() {
        let request = create_test_config().to_request().unwrap();
        assert!(request.selection.contains("system-upgrade"));
        assert!(request.selection.contains("install-cuda"));
        assert_eq!(request.selection.variant_of("install-gimp"), Some("flatpak"));
        assert_eq!(request.mode, RenderMode::Quiet);
        assert_eq!(request.hostname(), "devbox");
        assert!(request.custom_script.is_none());
    }

    #[test]
    fn test_profile_custom_script_used_unless_overridden() {
        let mut config = GenerationConfig {
            profile: Some(Profile::Recommended),
            ..GenerationConfig::default()
        };
        let request = config.to_request().unwrap();
        assert!(request.custom_script.unwrap().starts_with("echo Created with"));

        config.custom_script = Some("echo mine".to_string());
        assert_eq!(config.to_request().unwrap().custom_script.as_deref(), Some("echo mine"));
    }

    #[test]
    fn test_conflicting_variant_with_profile_fails() {
        let config = GenerationConfig {
            profile: Some(Profile::Recommended),
            selections: vec!["install-gimp=flatpak".to_string()],
            ..GenerationConfig::default()
        };
        assert!(config.to_request().is_err());
    }

    #[test]
    fn test_from_request_roundtrip() {
        let request = create_test_config().to_request().unwrap();
        let saved = GenerationConfig::from_request(&request);
        assert!(saved.profile.is_none());
        assert_eq!(saved.to_request().unwrap(), request);
    }
}
