//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");

    if config.react_native_path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "react_native_path".to_string(),
            message: "path cannot be empty".to_string(),
        }
        .into());
    }

    if config.app_path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "app_path".to_string(),
            message: "path cannot be empty".to_string(),
        }
        .into());
    }

    if config.codegen_output_dir.as_os_str().is_empty() || config.codegen_output_dir.is_absolute() {
        return Err(ConfigError::InvalidValue {
            field: "codegen_output_dir".to_string(),
            message: "must be a non-empty relative path".to_string(),
        }
        .into());
    }

    for (i, platform) in config.platforms.iter().enumerate() {
        if platform.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("platforms[{}]", i),
                message: "platform name cannot be empty".to_string(),
            }
            .into());
        }
    }

    debug!("configuration validation passed");
    Ok(())
}
