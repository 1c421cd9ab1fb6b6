//! Module dependencies command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use podsmith_core::constants::folly_config;
use podsmith_core::flags::resolve;
use podsmith_core::{detect_version, module_dependencies, ModuleSpec};

use super::args::ProjectArgs;
use crate::cli::output::{header, key_value};
use crate::cli::{Cli, OutputFormat};

/// Print what a third-party native module needs to build
#[derive(Debug, Args)]
pub struct ModuleDepsCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// JSON file with the module's current `compiler_flags` and `pod_target_xcconfig`
    #[arg(long)]
    pub spec: Option<PathBuf>,
}

impl ModuleDepsCommand {
    /// Execute the module-deps command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(spec = ?self.spec, "executing module-deps command");
        let ctx = self.project.load()?;
        let version = detect_version(&ctx.ios_dir.join(&ctx.inputs.react_native_path));
        let config = resolve(&ctx.inputs, version, &ctx.env)?;

        let existing: ModuleSpec = match &self.spec {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => ModuleSpec::default(),
        };
        let merged = module_dependencies(&existing, &config, &ctx.config.platforms);

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&merged)?);
            }
            OutputFormat::Text => {
                let folly = folly_config();
                println!("{}", header("Compiler flags"));
                println!("  {}", merged.spec.compiler_flags);
                println!();
                println!("{}", header("pod_target_xcconfig"));
                for (key, value) in &merged.spec.pod_target_xcconfig {
                    println!("{}", key_value(key, value));
                }
                println!();
                println!("{}", header("Dependencies"));
                for dep in &merged.dependencies {
                    match &dep.version {
                        Some(version) => println!("  s.dependency '{}', '{}'", dep.name, version),
                        None => println!("  s.dependency '{}'", dep.name),
                    }
                }
                println!();
                println!("{}", key_value("Folly", folly.version));
            }
        }

        Ok(())
    }
}
