//! Post-install command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use podsmith_core::flags::resolve;
use podsmith_core::host::{ccache_available, xcode_version};
use podsmith_core::{
    detect_version, load_resolved_configuration, BuildConfiguration, BuildProject, PatchOptions,
    PostInstallPatcher,
};

use super::args::{ProjectArgs, ProjectContext};
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Patch the generated pods project
#[derive(Debug, Args)]
pub struct PostInstallCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// JSON snapshot of the pods project, patched in place
    #[arg(long = "project", value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Print the result without writing the snapshot back
    #[arg(long)]
    pub dry_run: bool,
}

impl PostInstallCommand {
    /// Execute the post-install command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(snapshot = %self.snapshot.display(), dry_run = self.dry_run, "executing post-install command");
        let ctx = self.project.load()?;
        let config = configuration(&ctx)?;

        let options = PatchOptions {
            mac_catalyst_enabled: ctx.config.mac_catalyst_enabled,
            ccache_available: config.ccache_enabled() && ccache_available(),
            xcode_version: xcode_version(),
            platforms: ctx.config.platforms.clone(),
        };

        let mut project = BuildProject::load(&self.snapshot)?;
        let report = PostInstallPatcher::new(&config, options).apply(&mut project);
        if !self.dry_run {
            project.save(&self.snapshot)?;
        }

        match cli.format {
            OutputFormat::Json => {
                let out = serde_json::json!({
                    "snapshot": self.snapshot.to_string_lossy(),
                    "written": !self.dry_run,
                    "applied": report.applied,
                    "warnings": report.warnings,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                for mutation in &report.applied {
                    println!("  {} {}", console::style("•").dim(), mutation.as_str());
                }
                for warning in &report.warnings {
                    output::warning(warning);
                }
                if self.dry_run {
                    output::info(&format!("{} mutations would be applied", report.applied.len()));
                } else {
                    output::success(&format!(
                        "Patched {}",
                        output::path_style().apply_to(self.snapshot.display())
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Configuration of the install run, resolved here only when none was saved
fn configuration(ctx: &ProjectContext) -> anyhow::Result<BuildConfiguration> {
    if let Some(config) = load_resolved_configuration(&ctx.ios_dir)? {
        info!("using configuration saved by the install run");
        return Ok(config);
    }
    let version = detect_version(&ctx.ios_dir.join(&ctx.inputs.react_native_path));
    Ok(resolve(&ctx.inputs, version, &ctx.env)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use podsmith_core::host::PodCommand;
    use podsmith_core::{Config, EnvironmentOverrides, FlagInputs, InstallRun, NodeCodegen, UseFrameworks};
    use tempfile::TempDir;

    fn context(ios_dir: &std::path::Path) -> ProjectContext {
        let config = Config::default();
        ProjectContext {
            ios_dir: ios_dir.to_path_buf(),
            inputs: FlagInputs::from_config(&config),
            config,
            config_path: None,
            env: EnvironmentOverrides::default(),
        }
    }

    #[test]
    fn test_post_install_reuses_install_decision() {
        let temp = TempDir::new().unwrap();
        let inputs = FlagInputs {
            ccache_enabled: Some(true),
            hermes_enabled: Some(false),
            use_frameworks: Some(UseFrameworks::Static),
            disable_codegen: Some(true),
            ..FlagInputs::default()
        };
        let report = InstallRun::new(temp.path(), inputs, EnvironmentOverrides::default())
            .execute(NodeCodegen::new(), &mut PodCommand::new())
            .unwrap();

        let config = configuration(&context(temp.path())).unwrap();
        assert_eq!(config, report.configuration);
        assert!(config.ccache_enabled());
        assert!(!config.hermes_enabled());
        assert_eq!(config.use_frameworks(), UseFrameworks::Static);
    }

    #[test]
    fn test_post_install_resolves_without_saved_configuration() {
        let temp = TempDir::new().unwrap();
        let config = configuration(&context(temp.path())).unwrap();
        assert!(!config.ccache_enabled());
        assert!(config.hermes_enabled());
    }
}
