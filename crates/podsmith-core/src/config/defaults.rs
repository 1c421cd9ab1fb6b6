//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "podsmith.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "podsmith.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".podsmith.toml",
        ".podsmith.yaml",
    ]
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Podsmith configuration
# Paths are relative to the ios/ directory.

react_native_path = "../node_modules/react-native"
app_path = ".."
config_file_dir = ""
codegen_output_dir = "build/generated/ios"

# Leave a flag commented out to fall back to the environment
# (RCT_NEW_ARCH_ENABLED, USE_HERMES, USE_FRAMEWORKS, USE_CCACHE).
# new_arch_enabled = true
# fabric_enabled = false
# hermes_enabled = true
# use_frameworks = "static"
# ccache_enabled = false

mac_catalyst_enabled = false

# Fail on environment values other than "0"/"1" instead of ignoring them.
strict_env = false

# Generate framework header search paths for several platforms.
platforms = []
"#;
