//! Arguments shared by the commands that resolve a configuration

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use podsmith_core::config::load_config_or_default;
use podsmith_core::{Config, EnvironmentOverrides, FlagInputs, UseFrameworks};

/// Project location and flag overrides
#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    /// Directory containing the Podfile
    #[arg(long, default_value = ".")]
    pub ios_dir: PathBuf,

    /// Enable or disable the new architecture
    #[arg(long)]
    pub new_arch: Option<bool>,

    /// Enable or disable the Fabric renderer
    #[arg(long)]
    pub fabric: Option<bool>,

    /// Use Hermes (true) or JavaScriptCore (false)
    #[arg(long)]
    pub hermes: Option<bool>,

    /// Link pods as static or dynamic frameworks
    #[arg(long, value_parser = parse_use_frameworks)]
    pub use_frameworks: Option<UseFrameworks>,

    /// Skip the code generator
    #[arg(long)]
    pub disable_codegen: bool,

    /// Route compilers through ccache
    #[arg(long)]
    pub ccache: Option<bool>,

    /// Path to react-native, relative to the ios directory
    #[arg(long)]
    pub react_native_path: Option<PathBuf>,

    /// Reject malformed environment overrides
    #[arg(long)]
    pub strict_env: bool,
}

fn parse_use_frameworks(s: &str) -> Result<UseFrameworks, String> {
    UseFrameworks::parse(s).ok_or_else(|| format!("expected 'none', 'static' or 'dynamic', got '{}'", s))
}

/// Everything a command needs to resolve a configuration
pub struct ProjectContext {
    pub ios_dir: PathBuf,
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub inputs: FlagInputs,
    pub env: EnvironmentOverrides,
}

impl ProjectArgs {
    /// Load the config file and layer the command-line overrides on top
    pub fn load(&self) -> anyhow::Result<ProjectContext> {
        let ios_dir = std::env::current_dir()?.join(&self.ios_dir);
        let (config, config_path) = load_config_or_default(&ios_dir)?;
        let inputs = self.apply(FlagInputs::from_config(&config));
        debug!(config = ?config_path, "project context loaded");

        Ok(ProjectContext {
            ios_dir,
            config,
            config_path,
            inputs,
            env: EnvironmentOverrides::from_process_env(),
        })
    }

    fn apply(&self, mut inputs: FlagInputs) -> FlagInputs {
        if self.new_arch.is_some() {
            inputs.new_arch_enabled = self.new_arch;
        }
        if self.fabric.is_some() {
            inputs.fabric_enabled = self.fabric;
        }
        if self.hermes.is_some() {
            inputs.hermes_enabled = self.hermes;
        }
        if self.use_frameworks.is_some() {
            inputs.use_frameworks = self.use_frameworks;
        }
        if self.disable_codegen {
            inputs.disable_codegen = Some(true);
        }
        if self.ccache.is_some() {
            inputs.ccache_enabled = self.ccache;
        }
        if let Some(path) = &self.react_native_path {
            inputs.react_native_path = path.clone();
        }
        inputs.strict_env |= self.strict_env;
        inputs
    }
}
