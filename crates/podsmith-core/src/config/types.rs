//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{CODEGEN_OUTPUT_DIR, DEFAULT_APP_PATH, DEFAULT_REACT_NATIVE_PATH};
use crate::flags::UseFrameworks;

/// Main configuration for Podsmith
///
/// Every flag is optional: `None` means "fall back to the environment
/// snapshot, then to the built-in default" during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the react-native installation, relative to the `ios/` directory
    pub react_native_path: PathBuf,

    /// Path to the app root, relative to the `ios/` directory
    pub app_path: PathBuf,

    /// Directory holding the app's `package.json`
    pub config_file_dir: PathBuf,

    /// Enable the new architecture
    pub new_arch_enabled: Option<bool>,

    /// Enable the Fabric renderer
    pub fabric_enabled: Option<bool>,

    /// Use Hermes as the JS engine
    pub hermes_enabled: Option<bool>,

    /// Framework linkage requested for pods
    pub use_frameworks: Option<UseFrameworks>,

    /// Codegen output directory, relative to the `ios/` directory
    pub codegen_output_dir: PathBuf,

    /// Whether the app targets Mac Catalyst
    pub mac_catalyst_enabled: bool,

    /// Route compilers through ccache
    pub ccache_enabled: Option<bool>,

    /// Reject unrecognised environment values instead of falling back
    pub strict_env: bool,

    /// Platforms header search paths are generated for
    pub platforms: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            react_native_path: PathBuf::from(DEFAULT_REACT_NATIVE_PATH),
            app_path: PathBuf::from(DEFAULT_APP_PATH),
            config_file_dir: PathBuf::new(),
            new_arch_enabled: None,
            fabric_enabled: None,
            hermes_enabled: None,
            use_frameworks: None,
            codegen_output_dir: PathBuf::from(CODEGEN_OUTPUT_DIR),
            mac_catalyst_enabled: false,
            ccache_enabled: None,
            strict_env: false,
            platforms: Vec::new(),
        }
    }
}
