//! Local podspec change detection
//!
//! Pods declared from an explicit podspec are cached by the package manager
//! under `Pods/Local Podspecs`. When the source podspec's version moves on,
//! the cached copy must be refreshed or the install keeps the stale build.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::declarations::{DependencyDeclaration, PodSource};
use crate::error::Result;

/// Package-manager capability to refresh changed local podspecs itself.
///
/// Collaborators that cannot do this keep the default, and the run falls
/// back to telling the operator what to update.
pub trait LockfileCapability {
    /// Whether changed pods can be handed to the package manager
    fn supports_change_detection(&self) -> bool {
        false
    }

    /// Register pods whose local podspec changed
    fn mark_changed(&mut self, _names: &[String]) -> Result<()> {
        Ok(())
    }
}

/// Package manager without lockfile change detection
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLockfileSupport;

impl LockfileCapability for NoLockfileSupport {}

/// Result of the podspec check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PodspecUpdate {
    UpToDate,
    /// The package manager took the changed names
    HandedOff { names: Vec<String> },
    /// The operator has to refresh these pods by hand
    ManualUpdateRequired { names: Vec<String>, message: String },
}

impl PodspecUpdate {
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::ManualUpdateRequired { message, .. } => Some(message),
            _ => None,
        }
    }
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*\w+\.version\s*=\s*['"]([^'"]+)['"]"#).expect("valid regex")
    })
}

/// Literal version declared in a podspec, if any
pub fn podspec_version(content: &str) -> Option<String> {
    version_regex()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn cached_version(ios_dir: &Path, name: &str) -> Option<String> {
    let path = ios_dir
        .join("Pods")
        .join("Local Podspecs")
        .join(format!("{}.podspec.json", name));
    let content = std::fs::read_to_string(path).ok()?;
    let json: serde_json::Value = serde_json::from_str(&content).ok()?;
    json.get("version")?.as_str().map(String::from)
}

/// Names of podspec-sourced pods whose source version differs from the cache.
/// Pods never installed, or whose podspec computes its version, are skipped.
pub fn changed_local_podspecs(ios_dir: &Path, decls: &[DependencyDeclaration]) -> Vec<String> {
    let mut changed: Vec<String> = Vec::new();
    for decl in decls {
        let PodSource::Podspec(location) = &decl.source else {
            continue;
        };
        let Ok(content) = std::fs::read_to_string(ios_dir.join(location)) else {
            debug!(pod = %decl.name, "podspec not readable, skipping");
            continue;
        };
        let Some(source) = podspec_version(&content) else {
            continue;
        };
        // subspecs share their parent's cached podspec
        let name = decl.name.split('/').next().unwrap_or(&decl.name);
        let Some(cached) = cached_version(ios_dir, name) else {
            continue;
        };
        if source != cached && !changed.iter().any(|c| c == name) {
            debug!(pod = %name, %source, %cached, "local podspec changed");
            changed.push(name.to_string());
        }
    }
    changed
}

/// Detect changed local podspecs and route them to the package manager, or
/// produce the manual instruction when it lacks the capability.
#[instrument(skip_all, fields(ios_dir = %ios_dir.display()))]
pub fn check_local_podspecs<C: LockfileCapability>(
    ios_dir: &Path,
    decls: &[DependencyDeclaration],
    capability: &mut C,
) -> Result<PodspecUpdate> {
    let names = changed_local_podspecs(ios_dir, decls);
    if names.is_empty() {
        return Ok(PodspecUpdate::UpToDate);
    }

    if capability.supports_change_detection() {
        capability.mark_changed(&names)?;
        info!(pods = ?names, "changed local podspecs handed to the package manager");
        return Ok(PodspecUpdate::HandedOff { names });
    }

    let message = format!(
        "Local podspecs changed for {}; run `pod update {} --no-repo-update`",
        names.join(", "),
        names.join(" ")
    );
    warn!("{}", message);
    Ok(PodspecUpdate::ManualUpdateRequired { names, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::{DeclarationGroup, PodOptions};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingManager {
        marked: Vec<String>,
    }

    impl LockfileCapability for RecordingManager {
        fn supports_change_detection(&self) -> bool {
            true
        }

        fn mark_changed(&mut self, names: &[String]) -> Result<()> {
            self.marked.extend_from_slice(names);
            Ok(())
        }
    }

    fn podspec_decl(name: &str, location: &str) -> DependencyDeclaration {
        DependencyDeclaration {
            name: name.to_string(),
            source: PodSource::Podspec(location.to_string()),
            options: PodOptions::default(),
            group: DeclarationGroup::ThirdParty,
        }
    }

    fn setup(source_version: &str, cached_version: &str) -> (TempDir, Vec<DependencyDeclaration>) {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("glog.podspec"),
            format!("Pod::Spec.new do |spec|\n  spec.name = 'glog'\n  spec.version = '{}'\nend\n", source_version),
        )
        .unwrap();
        let cache = temp.path().join("Pods/Local Podspecs");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(
            cache.join("glog.podspec.json"),
            format!(r#"{{"name": "glog", "version": "{}"}}"#, cached_version),
        )
        .unwrap();
        (temp, vec![podspec_decl("glog", "glog.podspec")])
    }

    #[test]
    fn test_subspec_reported_once_under_parent() {
        let (temp, mut decls) = setup("0.3.6", "0.3.5");
        decls.push(podspec_decl("glog/Core", "glog.podspec"));
        assert_eq!(changed_local_podspecs(temp.path(), &decls), vec!["glog".to_string()]);
    }

    #[test]
    fn test_podspec_version() {
        assert_eq!(podspec_version("  s.version = \"1.2.3\""), Some("1.2.3".to_string()));
        assert_eq!(podspec_version("spec.version = version"), None);
    }

    #[test]
    fn test_unchanged() {
        let (temp, decls) = setup("0.3.5", "0.3.5");
        let result = check_local_podspecs(temp.path(), &decls, &mut NoLockfileSupport).unwrap();
        assert_eq!(result, PodspecUpdate::UpToDate);
    }

    #[test]
    fn test_changed_without_capability_warns() {
        let (temp, decls) = setup("0.3.6", "0.3.5");
        let result = check_local_podspecs(temp.path(), &decls, &mut NoLockfileSupport).unwrap();
        let warning = result.warning().unwrap();
        assert!(warning.contains("pod update glog --no-repo-update"));
    }

    #[test]
    fn test_changed_with_capability_hands_off() {
        let (temp, decls) = setup("0.3.6", "0.3.5");
        let mut manager = RecordingManager::default();
        let result = check_local_podspecs(temp.path(), &decls, &mut manager).unwrap();
        assert_eq!(
            result,
            PodspecUpdate::HandedOff {
                names: vec!["glog".to_string()]
            }
        );
        assert_eq!(manager.marked, vec!["glog".to_string()]);
    }

    #[test]
    fn test_never_installed_is_not_changed() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("glog.podspec"), "spec.version = '1.0'").unwrap();
        let decls = vec![podspec_decl("glog", "glog.podspec")];
        assert!(changed_local_podspecs(temp.path(), &decls).is_empty());
    }
}
