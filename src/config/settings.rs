//! Application settings loaded from `config.toml`.
//!
//! Every section has defaults, so a missing file only produces a log line.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Whole contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP server settings
    pub server: ServerSettings,
    /// Activity logger settings
    pub activity: ActivitySettings,
    /// Admin session settings
    pub admin: AdminSettings,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the admin API listens on
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// `[activity]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivitySettings {
    /// How many failed activity writes are kept in memory
    pub buffer_capacity: usize,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 50,
        }
    }
}

/// `[admin]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Lifetime of an admin session token
    pub session_ttl_hours: i64,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            session_ttl_hours: 8,
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `APP_CONFIG` (default `config.toml`), using defaults
/// when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        info!("No config file at {}, using default settings.", path);
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [server]
            bind_address = "0.0.0.0:9000"

            [activity]
            buffer_capacity = 10

            [admin]
            session_ttl_hours = 2
        "#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.server.bind_address, "0.0.0.0:9000");
        assert_eq!(settings.activity.buffer_capacity, 10);
        assert_eq!(settings.admin.session_ttl_hours, 2);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings: Settings = toml::from_str("[admin]\nsession_ttl_hours = 1\n").unwrap();
        assert_eq!(settings.server.bind_address, "127.0.0.1:8080");
        assert_eq!(settings.activity.buffer_capacity, 50);
        assert_eq!(settings.admin.session_ttl_hours, 1);
    }

    #[test]
    fn test_load_settings_missing_file_is_config_error() {
        let result = load_settings("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
