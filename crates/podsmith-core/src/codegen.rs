//! Codegen trigger
//!
//! Invokes the external code generator at most once per installation run,
//! with the resolved configuration. The generator itself sits behind the
//! [`CodeGenerator`] trait; [`NodeCodegen`] drives the framework's node script.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::constants::FOLLY_VERSION;
use crate::error::{CodegenError, Result};
use crate::flags::BuildConfiguration;

/// Everything the generator needs for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodegenRequest {
    pub app_path: PathBuf,
    pub config_file_dir: PathBuf,
    pub react_native_path: PathBuf,
    pub new_arch_enabled: bool,
    pub fabric_enabled: bool,
    pub hermes_enabled: bool,
    pub output_dir: PathBuf,
    pub package_json: PathBuf,
    pub react_native_version: Option<String>,
    pub folly_version: String,
    pub env: BTreeMap<String, String>,
}

impl CodegenRequest {
    /// Build a request; relative paths in `config` are anchored at `ios_dir`
    pub fn new(ios_dir: &Path, config: &BuildConfiguration) -> Self {
        let react_native_path = ios_dir.join(config.react_native_path());
        Self {
            app_path: ios_dir.join(config.app_path()),
            config_file_dir: config.config_file_dir().to_path_buf(),
            package_json: react_native_path.join("package.json"),
            react_native_path,
            new_arch_enabled: config.new_arch_enabled(),
            fabric_enabled: config.fabric_enabled(),
            hermes_enabled: config.hermes_enabled(),
            output_dir: ios_dir.join(config.codegen_output_dir()),
            react_native_version: config.react_native_version().as_str().map(String::from),
            folly_version: FOLLY_VERSION.to_string(),
            env: config.to_env(),
        }
    }
}

/// External code generator
pub trait CodeGenerator {
    /// Make sure the generator is runnable. Called once before `generate`.
    fn prepare(&self, _request: &CodegenRequest) -> Result<()> {
        Ok(())
    }

    /// Emit sources into `request.output_dir`
    fn generate(&self, request: &CodegenRequest) -> Result<()>;
}

/// What the trigger did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodegenOutcome {
    /// Generator ran
    Generated,
    /// Disabled by override; previous output is reused as-is
    Skipped,
    /// Already ran earlier in this run
    AlreadyRan,
}

/// Runs the generator exactly once per installation
pub struct CodegenTrigger<G: CodeGenerator> {
    ios_dir: PathBuf,
    generator: G,
    invoked: bool,
}

impl<G: CodeGenerator> CodegenTrigger<G> {
    pub fn new(ios_dir: impl Into<PathBuf>, generator: G) -> Self {
        Self {
            ios_dir: ios_dir.into(),
            generator,
            invoked: false,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn has_run(&self) -> bool {
        self.invoked
    }

    /// Run the generator unless disabled or already run
    #[instrument(skip_all, fields(disabled = config.codegen_disabled()))]
    pub fn run(&mut self, config: &BuildConfiguration) -> Result<CodegenOutcome> {
        let request = CodegenRequest::new(&self.ios_dir, config);

        if config.codegen_disabled() {
            if request.output_dir.is_dir() {
                info!(output = %request.output_dir.display(), "codegen disabled, reusing existing output");
            } else {
                warn!(
                    output = %request.output_dir.display(),
                    "codegen disabled and no previous output exists; the codegen pod will be empty"
                );
            }
            return Ok(CodegenOutcome::Skipped);
        }

        if self.invoked {
            debug!("codegen already ran for this installation");
            return Ok(CodegenOutcome::AlreadyRan);
        }

        clean_output_dir(&request.output_dir)?;
        self.generator.prepare(&request)?;
        // Mark before generating: a failed run aborts the whole install anyway.
        self.invoked = true;
        self.generator.generate(&request)?;

        info!(output = %request.output_dir.display(), "codegen finished");
        Ok(CodegenOutcome::Generated)
    }
}

/// Remove stale generator output
pub fn clean_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        debug!(path = %output_dir.display(), "removing stale codegen output");
        std::fs::remove_dir_all(output_dir)?;
    }
    Ok(())
}

/// Generator backed by the framework's `generate-codegen-artifacts.js`
#[derive(Debug, Clone, Default)]
pub struct NodeCodegen {
    node: Option<PathBuf>,
}

impl NodeCodegen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific node binary instead of looking it up on PATH
    pub fn with_node(mut self, node: impl Into<PathBuf>) -> Self {
        self.node = Some(node.into());
        self
    }

    fn node_binary(&self) -> Result<PathBuf> {
        if let Some(node) = &self.node {
            return Ok(node.clone());
        }
        which::which("node").map_err(|_| {
            CodegenError::ToolNotFound {
                tool: "node".to_string(),
                install_hint: "Install Node.js and make sure it is on PATH (see .xcode.env)".to_string(),
            }
            .into()
        })
    }

    /// Script that emits the artifacts
    pub fn script_path(react_native_path: &Path) -> PathBuf {
        react_native_path
            .join("scripts")
            .join("generate-codegen-artifacts.js")
    }

    /// The codegen package sits next to the framework in `node_modules`
    pub fn codegen_package_path(react_native_path: &Path) -> PathBuf {
        react_native_path
            .join("..")
            .join("@react-native")
            .join("codegen")
    }
}

impl CodeGenerator for NodeCodegen {
    /// Build the codegen package when it is a source checkout without `lib/`
    fn prepare(&self, request: &CodegenRequest) -> Result<()> {
        let package = Self::codegen_package_path(&request.react_native_path);
        if !package.is_dir() || package.join("lib").is_dir() {
            return Ok(());
        }

        let build_script = package.join("scripts").join("oss").join("build.sh");
        if !build_script.exists() {
            debug!(path = %package.display(), "codegen package has no build script, skipping bootstrap");
            return Ok(());
        }

        info!(path = %package.display(), "building codegen package");
        run(
            Command::new("bash")
                .arg(&build_script)
                .current_dir(&package)
                .envs(&request.env),
            format!("bash {}", build_script.display()),
        )
    }

    fn generate(&self, request: &CodegenRequest) -> Result<()> {
        let script = Self::script_path(&request.react_native_path);
        if !script.exists() {
            return Err(CodegenError::ScriptNotFound(script).into());
        }

        let node = self.node_binary()?;
        let mut cmd = Command::new(&node);
        cmd.arg(&script)
            .arg("-p")
            .arg(&request.app_path)
            .arg("-o")
            .arg(&request.output_dir)
            .arg("-t")
            .arg("ios")
            .envs(&request.env);
        if !request.config_file_dir.as_os_str().is_empty() {
            cmd.env("RCT_CONFIG_FILE_DIR", &request.config_file_dir);
        }

        info!(script = %script.display(), output = %request.output_dir.display(), "running codegen");
        run(
            &mut cmd,
            format!(
                "{} {} -p {} -o {} -t ios",
                node.display(),
                script.display(),
                request.app_path.display(),
                request.output_dir.display()
            ),
        )
    }
}

fn run(cmd: &mut Command, display: String) -> Result<()> {
    let output = cmd.output().map_err(|e| CodegenError::CommandFailed {
        command: display.clone(),
        exit_code: None,
        stdout: String::new(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(CodegenError::CommandFailed {
            command: display,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
        .into());
    }
    Ok(())
}
