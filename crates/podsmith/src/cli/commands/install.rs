//! Install command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use podsmith_core::host::PodCommand;
use podsmith_core::podspecs::PodspecUpdate;
use podsmith_core::{CodegenOutcome, InstallRun, NodeCodegen};

use super::args::ProjectArgs;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Run a full installation
#[derive(Debug, Args)]
pub struct InstallCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Run `pod install` after writing the plan
    #[arg(long)]
    pub pod_install: bool,

    /// Pass `--repo-update` to `pod install`
    #[arg(long, requires = "pod_install")]
    pub repo_update: bool,

    /// Node binary to run the generator with
    #[arg(long, env = "NODE_BINARY")]
    pub node: Option<PathBuf>,
}

impl InstallCommand {
    /// Execute the install command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(pod_install = self.pod_install, "executing install command");
        let ctx = self.project.load()?;

        let mut generator = NodeCodegen::new();
        if let Some(node) = &self.node {
            generator = generator.with_node(node);
        }
        let mut pod = PodCommand::new().with_repo_update(self.repo_update);

        let report = InstallRun::new(&ctx.ios_dir, ctx.inputs, ctx.env)
            .with_package_manager(self.pod_install)
            .execute(generator, &mut pod)?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                let config = &report.configuration;
                println!(
                    "{} React Native {} ({} architecture, {})",
                    style("→").blue(),
                    config.react_native_version(),
                    if config.new_arch_enabled() { "new" } else { "old" },
                    if config.hermes_enabled() { "Hermes" } else { "JSC" },
                );
                if report.xcode_env_created {
                    output::info("Created .xcode.env");
                }
                match report.codegen {
                    CodegenOutcome::Generated => output::success("Code generated"),
                    CodegenOutcome::Skipped => output::warning("Codegen skipped"),
                    CodegenOutcome::AlreadyRan => {}
                }
                output::success(&format!(
                    "Declared {} pods in {}",
                    report.declarations.len(),
                    output::path_style().apply_to(report.plan_path.display())
                ));
                println!("{}", output::key_value("Fingerprint", &report.fingerprint));
                if let PodspecUpdate::HandedOff { names } = &report.podspecs {
                    output::info(&format!("Refreshing local podspecs: {}", names.join(", ")));
                }
                for warning in &report.warnings {
                    output::warning(warning);
                }
                if report.package_manager_ran {
                    output::success("pod install finished");
                }
                println!(
                    "{}",
                    style(format!("Done in {:.2}s", report.elapsed_ms as f64 / 1000.0)).dim()
                );
            }
        }

        Ok(())
    }
}
