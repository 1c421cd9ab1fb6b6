//! Codegen command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use podsmith_core::flags::resolve;
use podsmith_core::{detect_version, CodegenOutcome, CodegenRequest, CodegenTrigger, NodeCodegen};

use super::args::ProjectArgs;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Run the code generator
#[derive(Debug, Args)]
pub struct CodegenCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Node binary to run the generator with
    #[arg(long, env = "NODE_BINARY")]
    pub node: Option<PathBuf>,
}

impl CodegenCommand {
    /// Execute the codegen command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing codegen command");
        let ctx = self.project.load()?;
        let version = detect_version(&ctx.ios_dir.join(&ctx.inputs.react_native_path));
        let config = resolve(&ctx.inputs, version, &ctx.env)?;

        let mut generator = NodeCodegen::new();
        if let Some(node) = &self.node {
            generator = generator.with_node(node);
        }
        let output_dir = CodegenRequest::new(&ctx.ios_dir, &config).output_dir;
        let outcome = CodegenTrigger::new(&ctx.ios_dir, generator).run(&config)?;

        match cli.format {
            OutputFormat::Json => {
                let out = serde_json::json!({
                    "outcome": outcome,
                    "output_dir": output_dir.to_string_lossy(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                match outcome {
                    CodegenOutcome::Generated => output::success(&format!(
                        "Generated code in {}",
                        output::path_style().apply_to(output_dir.display())
                    )),
                    CodegenOutcome::Skipped => output::warning("Codegen disabled, existing output kept"),
                    CodegenOutcome::AlreadyRan => output::info("Codegen already ran"),
                }
            }
        }

        Ok(())
    }
}
