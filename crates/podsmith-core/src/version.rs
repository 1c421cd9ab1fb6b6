//! React Native version detection
//!
//! Reads the `version` field of the framework's `package.json`. Detection never
//! fails the run: anything unreadable becomes [`ReactNativeVersion::Unknown`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Version of the installed framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "version", rename_all = "lowercase")]
pub enum ReactNativeVersion {
    /// Declared version string, verbatim
    Known(String),
    /// No version marker found
    Unknown,
}

impl ReactNativeVersion {
    /// Parsed semantic version, if the declared string is valid semver
    pub fn semver(&self) -> Option<semver::Version> {
        match self {
            Self::Known(raw) => semver::Version::parse(raw).ok(),
            Self::Unknown => None,
        }
    }

    /// Raw version string, `None` when unknown
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Known(raw) => Some(raw),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ReactNativeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(raw) => write!(f, "{}", raw),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Detect the version of the framework installed at `react_native_path`
#[instrument(skip_all, fields(path = %react_native_path.display()))]
pub fn detect_version(react_native_path: &Path) -> ReactNativeVersion {
    let manifest = react_native_path.join("package.json");

    let content = match std::fs::read_to_string(&manifest) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %manifest.display(), error = %e, "package.json not readable");
            return ReactNativeVersion::Unknown;
        }
    };

    let json: serde_json::Value = match serde_json::from_str(&content) {
        Ok(json) => json,
        Err(e) => {
            warn!(path = %manifest.display(), error = %e, "package.json is not valid JSON");
            return ReactNativeVersion::Unknown;
        }
    };

    match json.get("version").and_then(|v| v.as_str()) {
        Some(version) if !version.trim().is_empty() => {
            debug!(version, "detected react-native version");
            ReactNativeVersion::Known(version.trim().to_string())
        }
        _ => {
            debug!(path = %manifest.display(), "package.json has no version field");
            ReactNativeVersion::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_version() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"name": "react-native", "version": "0.74.1"}"#,
        )
        .unwrap();

        let version = detect_version(temp.path());
        assert_eq!(version, ReactNativeVersion::Known("0.74.1".to_string()));
        assert_eq!(version.semver(), Some(semver::Version::new(0, 74, 1)));
    }

    #[test]
    fn test_missing_manifest_is_unknown() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_version(temp.path()), ReactNativeVersion::Unknown);
    }

    #[test]
    fn test_garbage_manifest_is_unknown() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "not json").unwrap();
        assert_eq!(detect_version(temp.path()), ReactNativeVersion::Unknown);

        std::fs::write(temp.path().join("package.json"), r#"{"name": "x"}"#).unwrap();
        assert_eq!(detect_version(temp.path()), ReactNativeVersion::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(ReactNativeVersion::Unknown.to_string(), "unknown");
        assert_eq!(
            ReactNativeVersion::Known("1000.0.0".to_string()).to_string(),
            "1000.0.0"
        );
    }
}
