//! Flag resolution
//!
//! Merges explicit inputs, the environment snapshot and the detected framework
//! version into one [`BuildConfiguration`]. Resolution is a pure function of its
//! arguments; the result is immutable and handed by reference to every later
//! step of the run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::env::{self, EnvironmentOverrides};
use crate::error::Result;
use crate::version::ReactNativeVersion;

/// Framework linkage requested for pods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseFrameworks {
    /// Static libraries (no `use_frameworks!`)
    #[default]
    None,
    /// Static frameworks
    Static,
    /// Dynamic frameworks
    Dynamic,
}

impl UseFrameworks {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }

    /// Parse a `USE_FRAMEWORKS` value. Empty means none.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" => Some(Self::None),
            "static" => Some(Self::Static),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }

    pub fn is_used(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for UseFrameworks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JS engine backing the runtime. Exactly one is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsEngine {
    Hermes,
    /// The platform's JavaScriptCore
    Jsc,
}

/// Explicitly requested values. `None` falls back to the environment snapshot
/// and then to the documented default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagInputs {
    pub new_arch_enabled: Option<bool>,
    pub fabric_enabled: Option<bool>,
    pub hermes_enabled: Option<bool>,
    pub use_frameworks: Option<UseFrameworks>,
    pub disable_codegen: Option<bool>,
    pub ccache_enabled: Option<bool>,
    pub react_native_path: PathBuf,
    pub app_path: PathBuf,
    pub config_file_dir: PathBuf,
    pub codegen_output_dir: PathBuf,
    pub strict_env: bool,
}

impl Default for FlagInputs {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl FlagInputs {
    /// Seed inputs from a file configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            new_arch_enabled: config.new_arch_enabled,
            fabric_enabled: config.fabric_enabled,
            hermes_enabled: config.hermes_enabled,
            use_frameworks: config.use_frameworks,
            disable_codegen: None,
            ccache_enabled: config.ccache_enabled,
            react_native_path: config.react_native_path.clone(),
            app_path: config.app_path.clone(),
            config_file_dir: config.config_file_dir.clone(),
            codegen_output_dir: config.codegen_output_dir.clone(),
            strict_env: config.strict_env,
        }
    }
}

/// The resolved, immutable set of flags governing one installation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    new_arch_enabled: bool,
    fabric_enabled: bool,
    hermes_enabled: bool,
    use_frameworks: UseFrameworks,
    codegen_disabled: bool,
    ccache_enabled: bool,
    react_native_version: ReactNativeVersion,
    react_native_path: PathBuf,
    app_path: PathBuf,
    config_file_dir: PathBuf,
    codegen_output_dir: PathBuf,
}

impl BuildConfiguration {
    pub fn new_arch_enabled(&self) -> bool {
        self.new_arch_enabled
    }

    pub fn fabric_enabled(&self) -> bool {
        self.fabric_enabled
    }

    pub fn hermes_enabled(&self) -> bool {
        self.hermes_enabled
    }

    pub fn js_engine(&self) -> JsEngine {
        if self.hermes_enabled {
            JsEngine::Hermes
        } else {
            JsEngine::Jsc
        }
    }

    pub fn use_frameworks(&self) -> UseFrameworks {
        self.use_frameworks
    }

    pub fn codegen_disabled(&self) -> bool {
        self.codegen_disabled
    }

    pub fn ccache_enabled(&self) -> bool {
        self.ccache_enabled
    }

    pub fn react_native_version(&self) -> &ReactNativeVersion {
        &self.react_native_version
    }

    pub fn react_native_path(&self) -> &Path {
        &self.react_native_path
    }

    pub fn app_path(&self) -> &Path {
        &self.app_path
    }

    pub fn config_file_dir(&self) -> &Path {
        &self.config_file_dir
    }

    pub fn codegen_output_dir(&self) -> &Path {
        &self.codegen_output_dir
    }

    /// Variables handed to every child process of the run, so that collaborators
    /// observe the same decision instead of recomputing it
    pub fn to_env(&self) -> BTreeMap<String, String> {
        let flag = |b: bool| if b { "1" } else { "0" }.to_string();

        let mut vars = BTreeMap::new();
        vars.insert(env::RCT_NEW_ARCH_ENABLED.to_string(), flag(self.new_arch_enabled));
        vars.insert(env::RCT_FABRIC_ENABLED.to_string(), flag(self.fabric_enabled));
        vars.insert(env::USE_HERMES.to_string(), flag(self.hermes_enabled));
        vars.insert(env::DISABLE_CODEGEN.to_string(), flag(self.codegen_disabled));
        vars.insert(env::USE_CCACHE.to_string(), flag(self.ccache_enabled));
        if self.use_frameworks.is_used() {
            vars.insert(
                env::USE_FRAMEWORKS.to_string(),
                self.use_frameworks.as_str().to_string(),
            );
        }
        vars.insert(
            env::APP_PATH.to_string(),
            self.app_path.to_string_lossy().to_string(),
        );
        vars.insert(
            env::REACT_NATIVE_PATH.to_string(),
            self.react_native_path.to_string_lossy().to_string(),
        );
        vars
    }
}

/// Resolve the final configuration.
///
/// Fabric is forced on whenever the new architecture is on; an explicit
/// `fabric_enabled = false` is reconciled silently rather than rejected.
#[instrument(skip_all, fields(version = %version))]
pub fn resolve(
    inputs: &FlagInputs,
    version: ReactNativeVersion,
    env: &EnvironmentOverrides,
) -> Result<BuildConfiguration> {
    env.check_values(inputs.strict_env)?;

    let requested_new_arch = inputs
        .new_arch_enabled
        .unwrap_or_else(|| env.is_set(env::RCT_NEW_ARCH_ENABLED));
    let new_arch_enabled = compute_new_arch_enabled(requested_new_arch, &version);
    if new_arch_enabled != requested_new_arch {
        info!(version = %version, "new architecture enforced by react-native version");
    }

    let requested_fabric = inputs
        .fabric_enabled
        .unwrap_or_else(|| env.is_set(env::RCT_FABRIC_ENABLED));
    let fabric_enabled = requested_fabric || new_arch_enabled;
    if inputs.fabric_enabled == Some(false) && new_arch_enabled {
        info!("fabric_enabled=false overridden: the new architecture requires fabric");
    }

    let hermes_enabled = inputs
        .hermes_enabled
        .unwrap_or_else(|| !env.is_disabled(env::USE_HERMES));

    let use_frameworks = inputs.use_frameworks.unwrap_or_else(|| {
        env.get(env::USE_FRAMEWORKS)
            .and_then(UseFrameworks::parse)
            .unwrap_or_default()
    });

    let codegen_disabled = inputs
        .disable_codegen
        .unwrap_or_else(|| env.codegen_disabled());
    let ccache_enabled = inputs
        .ccache_enabled
        .unwrap_or_else(|| env.ccache_enabled());

    let config = BuildConfiguration {
        new_arch_enabled,
        fabric_enabled,
        hermes_enabled,
        use_frameworks,
        codegen_disabled,
        ccache_enabled,
        react_native_version: version,
        react_native_path: inputs.react_native_path.clone(),
        app_path: inputs.app_path.clone(),
        config_file_dir: inputs.config_file_dir.clone(),
        codegen_output_dir: inputs.codegen_output_dir.clone(),
    };

    debug!(
        new_arch = config.new_arch_enabled,
        fabric = config.fabric_enabled,
        hermes = config.hermes_enabled,
        use_frameworks = %config.use_frameworks,
        codegen_disabled = config.codegen_disabled,
        "resolved build configuration"
    );
    Ok(config)
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // <major>.<minor>.<patch>[-<prerelease>[.-]k]
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-(\w+(?:[-.]\d+)?))?$").expect("valid regex")
    })
}

/// Stable releases from 1.0.0 onward always run the new architecture.
/// Major 1000 is the development branch and prealpha builds are nightlies;
/// both keep the requested value, as does an unknown version.
pub fn compute_new_arch_enabled(requested: bool, version: &ReactNativeVersion) -> bool {
    let Some(raw) = version.as_str() else {
        return requested;
    };
    let Some(captures) = version_regex().captures(raw) else {
        return requested;
    };

    let prerelease = captures.get(4).map(|m| m.as_str()).unwrap_or("");
    if prerelease.contains("prealpha") {
        return requested;
    }

    let major: u64 = captures[1].parse().unwrap_or(0);
    if major > 0 && major < 1000 {
        return true;
    }
    requested
}
