use std::path::{Path, PathBuf};

use crate::config::schema::ServiceConfig;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Location of the per-user config file, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scanpipe").join("config.json"))
}

fn validate_config(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.output_directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "output_directory must not be empty".to_string(),
        });
    }

    if config.assembly_queue_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "assembly_queue_capacity must be at least 1".to_string(),
        });
    }

    if config.requester_buffer == 0 {
        return Err(ConfigError::Validation {
            message: "requester_buffer must be at least 1".to_string(),
        });
    }

    let tools = [
        ("scanner", &config.tools.scanner),
        ("cleaner", &config.tools.cleaner),
        ("assembler", &config.tools.assembler),
        ("ocr", &config.tools.ocr),
    ];
    for (name, program) in tools {
        if program.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("tools.{} must name a program", name),
            });
        }
    }

    if config.defaults.resolution <= 0 {
        return Err(ConfigError::Validation {
            message: format!(
                "defaults.resolution must be positive, got {}",
                config.defaults.resolution
            ),
        });
    }

    Ok(())
}
