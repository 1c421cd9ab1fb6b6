//! Podsmith Core - dependency setup for React Native iOS projects
//!
//! This crate resolves the build flags of an installation run, declares the
//! ordered set of pods, triggers code generation once and patches the
//! generated pods project afterwards.

pub mod codegen;
pub mod config;
pub mod constants;
pub mod declarations;
pub mod env;
pub mod error;
pub mod flags;
pub mod host;
pub mod install;
pub mod modules;
pub mod patcher;
pub mod podspecs;
pub mod project;
pub mod search_paths;
pub mod version;

pub use codegen::{CodeGenerator, CodegenOutcome, CodegenRequest, CodegenTrigger, NodeCodegen};
pub use config::{load_config, load_config_or_default, Config};
pub use declarations::{declare, declare_with, fingerprint, render_podfile, DependencyDeclaration};
pub use env::EnvironmentOverrides;
pub use error::{CodegenError, ConfigError, PackageManagerError, PodsmithError, ProjectError, Result};
pub use flags::{resolve, BuildConfiguration, FlagInputs, JsEngine, UseFrameworks};
pub use install::{load_resolved_configuration, InstallReport, InstallRun, PackageManager};
pub use modules::{module_dependencies, ModuleDependencies, ModuleSpec};
pub use patcher::{Mutation, PatchOptions, PatchReport, PostInstallPatcher};
pub use podspecs::{check_local_podspecs, LockfileCapability, PodspecUpdate};
pub use project::BuildProject;
pub use version::{detect_version, ReactNativeVersion};
