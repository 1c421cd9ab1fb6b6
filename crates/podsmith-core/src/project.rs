//! Build project model
//!
//! A JSON snapshot of the pods project produced by the package manager:
//! project-level configurations plus one entry per target, each with
//! per-configuration build settings. The post-install patcher mutates it in
//! place and writes it back.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{ProjectError, Result};

/// Value inherited from the enclosing level in list settings
pub const INHERITED: &str = "$(inherited)";

/// A build setting value: either a single string or a list of tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    List(Vec<String>),
    Scalar(String),
}

impl SettingValue {
    /// Tokens of the value; scalars split on whitespace
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Scalar(s) => s.split_whitespace().map(String::from).collect(),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }
}

/// Build settings of one configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildSettings(BTreeMap<String, SettingValue>);

impl BuildSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SettingValue::as_scalar)
    }

    pub fn contains_token(&self, key: &str, token: &str) -> bool {
        self.get(key)
            .map(|v| v.tokens().iter().any(|t| t == token))
            .unwrap_or(false)
    }

    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), SettingValue::Scalar(value.into()));
    }

    /// Append tokens that are not present yet. Absent settings start from
    /// `$(inherited)`; scalar values become lists of their tokens.
    pub fn append_unique<S: AsRef<str>>(&mut self, key: &str, tokens: &[S]) {
        let mut current = match self.0.get(key) {
            Some(value) => value.tokens(),
            None => vec![INHERITED.to_string()],
        };
        for token in tokens {
            let token = token.as_ref();
            if !current.iter().any(|t| t == token) {
                current.push(token.to_string());
            }
        }
        self.0.insert(key.to_string(), SettingValue::List(current));
    }

    /// Remove every occurrence of a token from a list setting
    pub fn remove_token(&mut self, key: &str, token: &str) {
        if let Some(value) = self.0.get(key) {
            let remaining: Vec<String> = value.tokens().into_iter().filter(|t| t != token).collect();
            self.0.insert(key.to_string(), SettingValue::List(remaining));
        }
    }
}

/// A named configuration (Debug, Release, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XcodeConfiguration {
    pub name: String,
    #[serde(default)]
    pub settings: BuildSettings,
}

impl XcodeConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: BuildSettings::new(),
        }
    }

    pub fn is_release(&self) -> bool {
        self.name.to_lowercase().contains("release")
    }

    pub fn is_debug(&self) -> bool {
        self.name.to_lowercase().contains("debug")
    }
}

/// Kind of target in the pods project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// Target built from a pod
    #[default]
    Pod,
    /// Aggregate target linking the pods into an app target
    Aggregate,
    /// Resource bundle produced by a pod
    ResourceBundle,
}

/// A target and its configurations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(default)]
    pub kind: TargetKind,
    #[serde(default)]
    pub configurations: Vec<XcodeConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_bundles: Vec<String>,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            configurations: vec![
                XcodeConfiguration::new("Debug"),
                XcodeConfiguration::new("Release"),
            ],
            resource_bundles: Vec::new(),
        }
    }
}

/// Snapshot of the generated pods project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProject {
    /// Project-level configurations
    #[serde(default)]
    pub configurations: Vec<XcodeConfiguration>,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl BuildProject {
    /// Load a snapshot from disk
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProjectError::NotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)?;
        let project: Self =
            serde_json::from_str(&content).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(targets = project.targets.len(), "loaded build project");
        Ok(project)
    }

    /// Write the snapshot back as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn target_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.name == name)
    }

    /// Every configuration of every target
    pub fn target_configurations_mut(&mut self) -> impl Iterator<Item = &mut XcodeConfiguration> {
        self.targets
            .iter_mut()
            .flat_map(|t| t.configurations.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_unique() {
        let mut settings = BuildSettings::new();
        settings.append_unique("OTHER_CFLAGS", &["-DFOO=1"]);
        settings.append_unique("OTHER_CFLAGS", &["-DFOO=1", "-DBAR=1"]);
        assert_eq!(
            settings.get("OTHER_CFLAGS"),
            Some(&SettingValue::List(vec![
                INHERITED.to_string(),
                "-DFOO=1".to_string(),
                "-DBAR=1".to_string()
            ]))
        );
    }

    #[test]
    fn test_append_to_scalar() {
        let mut settings = BuildSettings::new();
        settings.set_scalar("OTHER_CFLAGS", "$(inherited) -DFOO=1");
        settings.append_unique("OTHER_CFLAGS", &["-DFOO=1"]);
        assert_eq!(settings.get("OTHER_CFLAGS").unwrap().tokens().len(), 2);
        assert!(settings.contains_token("OTHER_CFLAGS", "-DFOO=1"));
    }

    #[test]
    fn test_remove_token() {
        let mut settings = BuildSettings::new();
        settings.append_unique("LIBRARY_SEARCH_PATHS", &["a", "b"]);
        settings.remove_token("LIBRARY_SEARCH_PATHS", "a");
        assert!(!settings.contains_token("LIBRARY_SEARCH_PATHS", "a"));
        assert!(settings.contains_token("LIBRARY_SEARCH_PATHS", "b"));
    }

    #[test]
    fn test_load_and_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("project.json");
        std::fs::write(
            &path,
            r#"{
                "configurations": [{"name": "Debug", "settings": {"USE_HERMES": "true"}}],
                "targets": [
                    {"name": "React-Core", "configurations": [
                        {"name": "Release", "settings": {"OTHER_CFLAGS": ["$(inherited)", "-DX"]}}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let project = BuildProject::load(&path).unwrap();
        assert_eq!(project.targets[0].kind, TargetKind::Pod);
        assert_eq!(
            project.configurations[0].settings.scalar("USE_HERMES"),
            Some("true")
        );

        project.save(&path).unwrap();
        assert_eq!(BuildProject::load(&path).unwrap(), project);
    }

    #[test]
    fn test_load_missing() {
        let temp = TempDir::new().unwrap();
        assert!(BuildProject::load(&temp.path().join("nope.json")).is_err());
    }
}
