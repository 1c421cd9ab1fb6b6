//! Environment override snapshot
//!
//! The recognised variables are read exactly once at the start of a run.
//! Nothing downstream consults the process environment again: the resolved
//! [`BuildConfiguration`](crate::flags::BuildConfiguration) is passed
//! explicitly instead.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{ConfigError, Result};

pub const USE_HERMES: &str = "USE_HERMES";
pub const RCT_NEW_ARCH_ENABLED: &str = "RCT_NEW_ARCH_ENABLED";
pub const RCT_FABRIC_ENABLED: &str = "RCT_FABRIC_ENABLED";
pub const DISABLE_CODEGEN: &str = "DISABLE_CODEGEN";
pub const USE_CCACHE: &str = "USE_CCACHE";
pub const USE_FRAMEWORKS: &str = "USE_FRAMEWORKS";
pub const APP_PATH: &str = "APP_PATH";
pub const REACT_NATIVE_PATH: &str = "REACT_NATIVE_PATH";

const RECOGNISED: &[&str] = &[
    USE_HERMES,
    RCT_NEW_ARCH_ENABLED,
    RCT_FABRIC_ENABLED,
    DISABLE_CODEGEN,
    USE_CCACHE,
    USE_FRAMEWORKS,
];

/// Immutable snapshot of the override variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverrides {
    vars: BTreeMap<String, String>,
}

impl EnvironmentOverrides {
    /// Capture the recognised variables from the process environment
    pub fn from_process_env() -> Self {
        let vars = RECOGNISED
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit pairs
    pub fn from_map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value of a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// `true` only when the variable is exactly `"1"`
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name) == Some("1")
    }

    /// `true` only when the variable is exactly `"0"`
    pub fn is_disabled(&self, name: &str) -> bool {
        self.get(name) == Some("0")
    }

    /// `DISABLE_CODEGEN == "1"`
    pub fn codegen_disabled(&self) -> bool {
        self.is_set(DISABLE_CODEGEN)
    }

    /// `USE_CCACHE == "1"`
    pub fn ccache_enabled(&self) -> bool {
        self.is_set(USE_CCACHE)
    }

    /// Check that every boolean variable holds `""`, `"0"` or `"1"`.
    ///
    /// In strict mode an unrecognised value aborts the run; otherwise it is
    /// logged and treated like an unset variable.
    pub fn check_values(&self, strict: bool) -> Result<()> {
        for (name, value) in &self.vars {
            if !RECOGNISED.contains(&name.as_str()) {
                continue;
            }
            let valid = if name == USE_FRAMEWORKS {
                matches!(value.to_lowercase().as_str(), "" | "static" | "dynamic")
            } else {
                matches!(value.as_str(), "" | "0" | "1")
            };
            if valid {
                continue;
            }

            if strict {
                return Err(ConfigError::InvalidValue {
                    field: name.clone(),
                    message: format!("unrecognised value '{}'", value),
                }
                .into());
            }
            warn!(variable = %name, value = %value, "ignoring unrecognised environment value");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_helpers() {
        let env = EnvironmentOverrides::from_map([
            (USE_HERMES, "0"),
            (DISABLE_CODEGEN, "1"),
            (USE_CCACHE, "true"),
        ]);
        assert!(env.is_disabled(USE_HERMES));
        assert!(env.codegen_disabled());
        assert!(!env.ccache_enabled());
        assert_eq!(env.get(RCT_NEW_ARCH_ENABLED), None);
    }

    #[test]
    fn test_check_values_lenient() {
        let env = EnvironmentOverrides::from_map([(USE_HERMES, "yes")]);
        assert!(env.check_values(false).is_ok());
    }

    #[test]
    fn test_check_values_strict() {
        let env = EnvironmentOverrides::from_map([(USE_HERMES, "yes")]);
        assert!(env.check_values(true).is_err());

        let env = EnvironmentOverrides::from_map([(USE_FRAMEWORKS, "Dynamic"), (USE_CCACHE, "1")]);
        assert!(env.check_values(true).is_ok());

        let env = EnvironmentOverrides::from_map([
            (APP_PATH, ".."),
            (REACT_NATIVE_PATH, "../node_modules/react-native"),
        ]);
        assert!(env.check_values(true).is_ok());
    }
}
