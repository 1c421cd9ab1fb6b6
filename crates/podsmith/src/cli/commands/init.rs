//! Init command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use podsmith_core::config::{Config, DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};

use crate::cli::Cli;

/// Initialize a new Podsmith configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Write YAML instead of TOML
    #[arg(long)]
    pub yaml: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, yaml = self.yaml, "executing init command");
        let cwd = std::env::current_dir()?;
        let default_name = if self.yaml { DEFAULT_CONFIG_YAML } else { DEFAULT_CONFIG_TOML };
        let config_path = self.output.clone().unwrap_or_else(|| cwd.join(default_name));

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration file already exists at {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, self.render()?)?;

        if !cli.quiet {
            println!(
                "{} Created configuration at {}",
                style("✓").green().bold(),
                style(config_path.display()).cyan()
            );
            println!();
            println!("Next steps:");
            println!("  1. Edit {} to pin your flags", config_path.display());
            println!("  2. Run {} to check the resolved flags", style("podsmith resolve").cyan());
            println!("  3. Run {} to set up your pods", style("podsmith install").cyan());
        }

        Ok(())
    }

    fn render(&self) -> anyhow::Result<String> {
        if !self.yaml {
            return Ok(DEFAULT_CONFIG_TEMPLATE.to_string());
        }
        // Convert the TOML template to YAML
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE)?;
        Ok(serde_yaml::to_string(&config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_template_round_trips() {
        let cmd = InitCommand {
            force: false,
            yaml: true,
            output: None,
        };
        let content = cmd.render().unwrap();
        let config: Config = serde_yaml::from_str(&content).unwrap();
        assert_eq!(config, Config::default());
    }
}
