//! Declare command

use clap::Args;
use tracing::info;

use podsmith_core::flags::resolve;
use podsmith_core::{declare, detect_version, fingerprint, render_podfile};

use super::args::ProjectArgs;
use crate::cli::{Cli, OutputFormat};

/// Print the ordered pod declarations
#[derive(Debug, Args)]
pub struct DeclareCommand {
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl DeclareCommand {
    /// Execute the declare command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing declare command");
        let ctx = self.project.load()?;
        let version = detect_version(&ctx.ios_dir.join(&ctx.inputs.react_native_path));
        let config = resolve(&ctx.inputs, version, &ctx.env)?;
        let decls = declare(&config);

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "fingerprint": fingerprint(&decls),
                    "declarations": decls,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                print!("{}", render_podfile(&decls));
            }
        }

        Ok(())
    }
}
