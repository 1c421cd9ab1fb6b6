//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{
    CodegenCommand, CompletionsCommand, DeclareCommand, InitCommand, InstallCommand,
    ModuleDepsCommand, PostInstallCommand, ResolveCommand,
};

/// Podsmith - dependency setup for React Native iOS projects
#[derive(Debug, Parser)]
#[command(name = "podsmith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a new Podsmith configuration
    Init(InitCommand),

    /// Show the resolved build configuration
    Resolve(ResolveCommand),

    /// Print the ordered pod declarations
    Declare(DeclareCommand),

    /// Run the code generator
    Codegen(CodegenCommand),

    /// Run a full installation
    Install(InstallCommand),

    /// Patch the generated pods project
    PostInstall(PostInstallCommand),

    /// Print what a third-party native module needs to build
    ModuleDeps(ModuleDepsCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Init(ref cmd) => cmd.execute(&self),
            Commands::Resolve(ref cmd) => cmd.execute(&self),
            Commands::Declare(ref cmd) => cmd.execute(&self),
            Commands::Codegen(ref cmd) => cmd.execute(&self),
            Commands::Install(ref cmd) => cmd.execute(&self),
            Commands::PostInstall(ref cmd) => cmd.execute(&self),
            Commands::ModuleDeps(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }
}
