//! Host and project probes
//!
//! Small checks against the machine running the install: the `.xcode.env`
//! file, Rosetta translation, ccache and the Xcode version. None of the
//! probes fail the run; they report what they find.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, instrument, warn};

use crate::error::{PackageManagerError, Result};
use crate::podspecs::LockfileCapability;

/// File sourced by the build phases to locate node
pub const XCODE_ENV_FILE: &str = ".xcode.env";

const XCODE_ENV_TEMPLATE: &str = "\
# This file is sourced by the React Native build phases.
# Customize NODE_BINARY here, or in .xcode.env.local for machine-specific paths.
export NODE_BINARY=$(command -v node)
";

/// Create `<ios>/.xcode.env` when missing. Returns whether it was written.
#[instrument(skip_all, fields(ios_dir = %ios_dir.display()))]
pub fn prepare_project(ios_dir: &Path) -> Result<bool> {
    let path = ios_dir.join(XCODE_ENV_FILE);
    if path.exists() {
        debug!("{} already present", XCODE_ENV_FILE);
        return Ok(false);
    }
    std::fs::write(&path, XCODE_ENV_TEMPLATE)?;
    info!(path = %path.display(), "created {}", XCODE_ENV_FILE);
    Ok(true)
}

/// Whether this process runs translated under Rosetta
pub fn running_under_rosetta() -> bool {
    if !cfg!(target_os = "macos") {
        return false;
    }
    Command::new("sysctl")
        .args(["-in", "sysctl.proc_translated"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).trim() == "1")
        .unwrap_or(false)
}

/// Host warnings worth surfacing before an install
pub fn host_warnings() -> Vec<String> {
    let mut warnings = Vec::new();
    if running_under_rosetta() {
        let message = "Running under Rosetta; native builds may be slow or fail. \
                       Use an arm64 terminal and toolchain."
            .to_string();
        warn!("{}", message);
        warnings.push(message);
    }
    warnings
}

/// Whether `ccache` is on PATH
pub fn ccache_available() -> bool {
    which::which("ccache").is_ok()
}

/// Version from `xcodebuild -version` output (`Xcode 15.0.1`)
pub fn parse_xcode_version(output: &str) -> Option<semver::Version> {
    let line = output.lines().find(|l| l.starts_with("Xcode "))?;
    let raw = line.trim_start_matches("Xcode ").trim();
    let mut parts = raw.split('.').map(|p| p.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().unwrap_or(Ok(0)).ok()?;
    let patch = parts.next().unwrap_or(Ok(0)).ok()?;
    Some(semver::Version::new(major, minor, patch))
}

/// Installed Xcode version, `None` when xcodebuild is unavailable
pub fn xcode_version() -> Option<semver::Version> {
    let output = Command::new("xcodebuild").arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let version = parse_xcode_version(&String::from_utf8_lossy(&output.stdout));
    debug!(version = ?version, "detected Xcode");
    version
}

/// The CocoaPods command line.
///
/// It has no hook for marking local podspecs as changed, so it keeps the
/// default [`LockfileCapability`].
#[derive(Debug, Clone)]
pub struct PodCommand {
    binary: PathBuf,
    repo_update: bool,
}

impl Default for PodCommand {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pod"),
            repo_update: false,
        }
    }
}

impl PodCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_repo_update(mut self, repo_update: bool) -> Self {
        self.repo_update = repo_update;
        self
    }

    fn ensure_installed(&self) -> Result<PathBuf> {
        which::which(&self.binary).map_err(|_| {
            PackageManagerError::NotInstalled {
                tool: self.binary.display().to_string(),
                install_hint: "Install CocoaPods with `gem install cocoapods` or `brew install cocoapods`"
                    .to_string(),
            }
            .into()
        })
    }

    /// Run `pod install` in `ios_dir` with the published variables
    #[instrument(skip_all, fields(ios_dir = %ios_dir.display()))]
    pub fn install(&self, ios_dir: &Path, env: &BTreeMap<String, String>) -> Result<()> {
        let binary = self.ensure_installed()?;
        let mut cmd = Command::new(&binary);
        cmd.arg("install").current_dir(ios_dir).envs(env);
        if self.repo_update {
            cmd.arg("--repo-update");
        }

        let command_line = format!("{} install", binary.display());
        info!(command = %command_line, "running package manager");
        let output = cmd.output().map_err(|e| PackageManagerError::CommandFailed {
            command: command_line.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(PackageManagerError::CommandFailed {
                command: command_line,
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl LockfileCapability for PodCommand {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PodsmithError;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_project_creates_once() {
        let temp = TempDir::new().unwrap();
        assert!(prepare_project(temp.path()).unwrap());

        let path = temp.path().join(XCODE_ENV_FILE);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("export NODE_BINARY=$(command -v node)"));

        std::fs::write(&path, "export NODE_BINARY=/opt/node\n").unwrap();
        assert!(!prepare_project(temp.path()).unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "export NODE_BINARY=/opt/node\n"
        );
    }

    #[test]
    fn test_parse_xcode_version() {
        assert_eq!(
            parse_xcode_version("Xcode 15.0.1\nBuild version 15A507\n"),
            Some(semver::Version::new(15, 0, 1))
        );
        assert_eq!(
            parse_xcode_version("Xcode 16.2\nBuild version 16C5032a"),
            Some(semver::Version::new(16, 2, 0))
        );
        assert_eq!(parse_xcode_version("xcode-select: error"), None);
    }

    #[test]
    fn test_pod_command_has_no_change_detection() {
        assert!(!PodCommand::new().supports_change_detection());
    }

    #[test]
    fn test_missing_pod_binary() {
        let temp = TempDir::new().unwrap();
        let pod = PodCommand::new().with_binary("podsmith-test-missing-pod");
        let err = pod.install(temp.path(), &BTreeMap::new()).unwrap_err();
        assert!(matches!(
            err,
            PodsmithError::PackageManager(PackageManagerError::NotInstalled { .. })
        ));
        assert_eq!(err.exit_code(), 5);
    }
}
