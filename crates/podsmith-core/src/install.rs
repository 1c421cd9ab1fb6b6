//! Installation run
//!
//! Sequences one full install: prepare the project, detect the framework
//! version, resolve flags once, declare pods (running codegen at its slot in
//! the sequence), write the plan and the resolved configuration, check local
//! podspecs and optionally hand over to the package manager.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::codegen::{CodeGenerator, CodegenOutcome, CodegenTrigger};
use crate::declarations::{declare_with, fingerprint, render_podfile, DependencyDeclaration};
use crate::env::EnvironmentOverrides;
use crate::error::Result;
use crate::flags::{resolve, BuildConfiguration, FlagInputs};
use crate::host::{host_warnings, prepare_project, PodCommand};
use crate::podspecs::{check_local_podspecs, LockfileCapability, PodspecUpdate};
use crate::version::detect_version;

/// File the rendered plan is written to, inside the `ios/` directory
pub const PLAN_FILE: &str = "Podfile.podsmith";

/// Resolved configuration of the last run, next to the plan
pub const CONFIGURATION_FILE: &str = "Podfile.podsmith.json";

/// Package manager the run hands over to
pub trait PackageManager: LockfileCapability {
    fn install(&self, ios_dir: &Path, env: &BTreeMap<String, String>) -> Result<()>;
}

impl PackageManager for PodCommand {
    fn install(&self, ios_dir: &Path, env: &BTreeMap<String, String>) -> Result<()> {
        PodCommand::install(self, ios_dir, env)
    }
}

/// Summary of an installation run
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub configuration: BuildConfiguration,
    pub env: BTreeMap<String, String>,
    pub declarations: Vec<DependencyDeclaration>,
    pub plan_path: PathBuf,
    pub configuration_path: PathBuf,
    pub fingerprint: String,
    pub codegen: CodegenOutcome,
    pub podspecs: PodspecUpdate,
    pub xcode_env_created: bool,
    pub package_manager_ran: bool,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

/// One installation run over an `ios/` directory
#[derive(Debug, Clone)]
pub struct InstallRun {
    ios_dir: PathBuf,
    inputs: FlagInputs,
    env: EnvironmentOverrides,
    run_package_manager: bool,
}

impl InstallRun {
    pub fn new(ios_dir: impl Into<PathBuf>, inputs: FlagInputs, env: EnvironmentOverrides) -> Self {
        Self {
            ios_dir: ios_dir.into(),
            inputs,
            env,
            run_package_manager: false,
        }
    }

    /// Run the package manager after writing the plan
    pub fn with_package_manager(mut self, enabled: bool) -> Self {
        self.run_package_manager = enabled;
        self
    }

    /// Resolve the configuration for this run without side effects
    pub fn resolve(&self) -> Result<BuildConfiguration> {
        let version = detect_version(&self.ios_dir.join(&self.inputs.react_native_path));
        resolve(&self.inputs, version, &self.env)
    }

    #[instrument(skip_all, fields(ios_dir = %self.ios_dir.display()))]
    pub fn execute<G, M>(&self, generator: G, manager: &mut M) -> Result<InstallReport>
    where
        G: CodeGenerator,
        M: PackageManager,
    {
        let started = Instant::now();
        let mut warnings = host_warnings();
        let xcode_env_created = prepare_project(&self.ios_dir)?;

        let config = self.resolve()?;
        info!(
            version = %config.react_native_version(),
            new_arch = config.new_arch_enabled(),
            hermes = config.hermes_enabled(),
            "configuration resolved"
        );

        let mut trigger = CodegenTrigger::new(&self.ios_dir, generator);
        let mut codegen = CodegenOutcome::Skipped;
        let declarations = declare_with(&config, &mut |_: &[DependencyDeclaration]| {
            codegen = trigger.run(&config)?;
            Ok(())
        })?;

        let fingerprint = fingerprint(&declarations);
        let plan_path = self.ios_dir.join(PLAN_FILE);
        std::fs::write(&plan_path, render_podfile(&declarations))?;
        info!(path = %plan_path.display(), %fingerprint, count = declarations.len(), "plan written");

        let configuration_path = self.ios_dir.join(CONFIGURATION_FILE);
        std::fs::write(&configuration_path, serde_json::to_string_pretty(&config)?)?;
        debug!(path = %configuration_path.display(), "configuration written");

        let podspecs = check_local_podspecs(&self.ios_dir, &declarations, manager)?;
        if let Some(warning) = podspecs.warning() {
            warnings.push(warning.to_string());
        }

        let env = config.to_env();
        if self.run_package_manager {
            manager.install(&self.ios_dir, &env)?;
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(elapsed_ms, "install finished");

        Ok(InstallReport {
            configuration: config,
            env,
            declarations,
            plan_path,
            configuration_path,
            fingerprint,
            codegen,
            podspecs,
            xcode_env_created,
            package_manager_ran: self.run_package_manager,
            warnings,
            elapsed_ms,
        })
    }
}

/// Configuration written by the last install run in `ios_dir`, if any.
///
/// Steps run after the package manager (the post-install patcher) read the
/// decision from here instead of resolving the flags again.
pub fn load_resolved_configuration(ios_dir: &Path) -> Result<Option<BuildConfiguration>> {
    let path = ios_dir.join(CONFIGURATION_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "no resolved configuration");
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    let config = serde_json::from_str(&content)?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use tempfile::TempDir;

    use crate::codegen::CodegenRequest;

    #[derive(Default)]
    struct CountingGenerator {
        calls: Cell<usize>,
    }

    impl CodeGenerator for &CountingGenerator {
        fn generate(&self, request: &CodegenRequest) -> Result<()> {
            std::fs::create_dir_all(&request.output_dir)?;
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeManager {
        installs: RefCell<Vec<BTreeMap<String, String>>>,
    }

    impl LockfileCapability for FakeManager {}

    impl PackageManager for FakeManager {
        fn install(&self, _ios_dir: &Path, env: &BTreeMap<String, String>) -> Result<()> {
            self.installs.borrow_mut().push(env.clone());
            Ok(())
        }
    }

    fn ios_project(version: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let rn = temp.path().join("node_modules/react-native");
        std::fs::create_dir_all(&rn).unwrap();
        std::fs::write(
            rn.join("package.json"),
            format!(r#"{{"name": "react-native", "version": "{}"}}"#, version),
        )
        .unwrap();
        temp
    }

    fn inputs() -> FlagInputs {
        FlagInputs {
            react_native_path: "node_modules/react-native".into(),
            ..FlagInputs::default()
        }
    }

    #[test]
    fn test_full_run() {
        let temp = ios_project("0.74.1");
        let generator = CountingGenerator::default();
        let mut manager = FakeManager::default();

        let report = InstallRun::new(temp.path(), inputs(), EnvironmentOverrides::default())
            .with_package_manager(true)
            .execute(&generator, &mut manager)
            .unwrap();

        assert_eq!(generator.calls.get(), 1);
        assert_eq!(report.codegen, CodegenOutcome::Generated);
        assert!(report.xcode_env_created);
        assert!(temp.path().join(".xcode.env").exists());
        assert_eq!(report.podspecs, PodspecUpdate::UpToDate);

        let plan = std::fs::read_to_string(&report.plan_path).unwrap();
        assert_eq!(plan, render_podfile(&report.declarations));
        assert_eq!(report.fingerprint.len(), 64);

        let installs = manager.installs.borrow();
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0]["USE_HERMES"], "1");
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let temp = ios_project("0.74.1");
        let run = InstallRun::new(temp.path(), inputs(), EnvironmentOverrides::default());
        let generator = CountingGenerator::default();

        let first = run.execute(&generator, &mut FakeManager::default()).unwrap();
        let second = run.execute(&generator, &mut FakeManager::default()).unwrap();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.declarations, second.declarations);
        assert!(!second.xcode_env_created);
    }

    #[test]
    fn test_stable_release_forces_new_arch() {
        let temp = ios_project("1.2.0");
        let run = InstallRun::new(
            temp.path(),
            inputs(),
            EnvironmentOverrides::from_map([("RCT_NEW_ARCH_ENABLED", "0")]),
        );
        let report = run
            .execute(&CountingGenerator::default(), &mut FakeManager::default())
            .unwrap();
        assert!(report.configuration.new_arch_enabled());
        assert!(report.configuration.fabric_enabled());
        assert_eq!(report.env["RCT_NEW_ARCH_ENABLED"], "1");
    }

    #[test]
    fn test_disabled_codegen_is_skipped() {
        let temp = ios_project("0.74.1");
        let generator = CountingGenerator::default();
        let run = InstallRun::new(
            temp.path(),
            inputs(),
            EnvironmentOverrides::from_map([("DISABLE_CODEGEN", "1")]),
        );
        let report = run.execute(&generator, &mut FakeManager::default()).unwrap();
        assert_eq!(report.codegen, CodegenOutcome::Skipped);
        assert_eq!(generator.calls.get(), 0);
        assert!(!report.package_manager_ran);
        assert!(report.declarations.iter().any(|d| d.name == "ReactCodegen"));
    }

    #[test]
    fn test_resolved_configuration_persisted() {
        let temp = ios_project("0.74.1");
        assert_eq!(load_resolved_configuration(temp.path()).unwrap(), None);

        let run_inputs = FlagInputs {
            ccache_enabled: Some(true),
            hermes_enabled: Some(false),
            fabric_enabled: Some(true),
            ..inputs()
        };
        let report = InstallRun::new(temp.path(), run_inputs, EnvironmentOverrides::default())
            .execute(&CountingGenerator::default(), &mut FakeManager::default())
            .unwrap();

        assert_eq!(report.configuration_path, temp.path().join(CONFIGURATION_FILE));
        let loaded = load_resolved_configuration(temp.path()).unwrap().unwrap();
        assert_eq!(loaded, report.configuration);
        assert!(loaded.ccache_enabled());
        assert!(loaded.fabric_enabled());
    }
}
