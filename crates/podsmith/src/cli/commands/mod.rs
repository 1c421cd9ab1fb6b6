//! CLI commands

mod args;
mod codegen;
mod completions;
mod declare;
mod init;
mod install;
mod module_deps;
mod post_install;
mod resolve;

pub use codegen::CodegenCommand;
pub use completions::CompletionsCommand;
pub use declare::DeclareCommand;
pub use init::InitCommand;
pub use install::InstallCommand;
pub use module_deps::ModuleDepsCommand;
pub use post_install::PostInstallCommand;
pub use resolve::ResolveCommand;
