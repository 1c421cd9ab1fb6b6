//! Resolve command

use clap::Args;
use tracing::info;

use podsmith_core::detect_version;
use podsmith_core::flags::resolve;

use super::args::ProjectArgs;
use crate::cli::output::{flag, header, key_value, path_style};
use crate::cli::{Cli, OutputFormat};

/// Show the resolved build configuration
#[derive(Debug, Args)]
pub struct ResolveCommand {
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl ResolveCommand {
    /// Execute the resolve command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing resolve command");
        let ctx = self.project.load()?;
        let version = detect_version(&ctx.ios_dir.join(&ctx.inputs.react_native_path));
        let config = resolve(&ctx.inputs, version, &ctx.env)?;
        let env = config.to_env();

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "config_path": ctx.config_path.map(|p| p.to_string_lossy().to_string()),
                    "configuration": config,
                    "env": env,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                println!("{}", header("Build configuration"));
                match &ctx.config_path {
                    Some(path) => println!(
                        "{}",
                        key_value("Config file", &path_style().apply_to(path.display()).to_string())
                    ),
                    None => println!("{}", key_value("Config file", "none (using defaults)")),
                }
                println!("{}", key_value("React Native", &config.react_native_version().to_string()));
                println!("{}", key_value("New architecture", &flag(config.new_arch_enabled())));
                println!("{}", key_value("Fabric", &flag(config.fabric_enabled())));
                println!("{}", key_value("Hermes", &flag(config.hermes_enabled())));
                println!("{}", key_value("Frameworks", config.use_frameworks().as_str()));
                println!("{}", key_value("Codegen", &flag(!config.codegen_disabled())));
                println!("{}", key_value("ccache", &flag(config.ccache_enabled())));
                println!();
                println!("{}", header("Published environment"));
                for (name, value) in &env {
                    println!("{}", key_value(name, value));
                }
            }
        }

        Ok(())
    }
}
