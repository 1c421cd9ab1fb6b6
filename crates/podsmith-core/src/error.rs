//! Error types for Podsmith

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using PodsmithError
pub type Result<T> = std::result::Result<T, PodsmithError>;

/// Main error type for Podsmith operations
#[derive(Debug, Error)]
pub enum PodsmithError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Code generation errors
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// Build project errors
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Package manager errors
    #[error(transparent)]
    PackageManager(#[from] PackageManagerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while driving the external code generator
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Required tool missing from PATH
    #[error("Required tool '{tool}' not found. {install_hint}")]
    ToolNotFound { tool: String, install_hint: String },

    /// Generator or bootstrap command exited unsuccessfully
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Generator script missing from the framework checkout
    #[error("Codegen script not found at {0}")]
    ScriptNotFound(PathBuf),
}

/// Errors raised while handing over to the package manager
#[derive(Debug, Error)]
pub enum PackageManagerError {
    /// Package manager binary missing from PATH
    #[error("Package manager '{tool}' not found. {install_hint}")]
    NotInstalled { tool: String, install_hint: String },

    /// Package manager exited unsuccessfully
    #[error("Package manager failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

/// Errors raised while loading or patching the build project
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Project snapshot not found
    #[error("Build project not found at {0}")]
    NotFound(PathBuf),

    /// Snapshot could not be parsed
    #[error("Failed to parse build project {path}: {message}")]
    ParseError { path: PathBuf, message: String },
}

impl PodsmithError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Get exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Codegen(_) => 3,
            Self::Project(_) | Self::Json(_) => 4,
            Self::PackageManager(_) => 5,
            Self::Io(_) => 7,
            Self::Other(_) => 1,
        }
    }
}
