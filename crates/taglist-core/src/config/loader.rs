//! Layered settings loader
//!
//! Loads settings from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Settings file (`--config <path>`, or ~/.taglist.yaml when present)
//! 3. Environment variables (TAGLIST_* prefix)
//! 4. CLI flags (applied by the caller via [`Settings::merge`])

use crate::error::{Error, Result};
use crate::types::{OutputFormat, Settings, SettingsOverrides};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// File name looked up in the home directory when no path is given
pub const DEFAULT_CONFIG_FILE_NAME: &str = ".taglist.yaml";

/// Prefix shared by all environment overrides
pub const ENV_PREFIX: &str = "TAGLIST_";

/// Settings together with the file they were read from, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub config_file: Option<Utf8PathBuf>,
}

/// Merges defaults, the settings file and the environment into [`Settings`]
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    /// Settings file used when the caller does not name one
    default_path: Option<Utf8PathBuf>,
}

impl SettingsLoader {
    /// Create a loader that falls back to ~/.taglist.yaml
    pub fn new() -> Self {
        let default_path = dirs::home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| home.join(DEFAULT_CONFIG_FILE_NAME));

        Self { default_path }
    }

    /// Create a loader with a custom fallback settings file
    pub fn with_default_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            default_path: Some(path.into()),
        }
    }

    /// Load settings, reading overrides from the process environment
    pub fn load(&self, explicit: Option<&Utf8Path>) -> Result<LoadedSettings> {
        self.load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Load settings with a caller-supplied environment lookup
    pub fn load_with_env<F>(&self, explicit: Option<&Utf8Path>, env: F) -> Result<LoadedSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let mut config_file = None;

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config_not_found(path.as_str()));
                }
                settings = settings.merge(Self::load_yaml_file(path)?);
                config_file = Some(path.to_owned());
            }
            None => {
                if let Some(path) = self.default_path.as_deref().filter(|p| p.is_file()) {
                    settings = settings.merge(Self::load_yaml_file(path)?);
                    config_file = Some(path.to_owned());
                }
            }
        }

        settings = settings.merge(Self::env_overrides(env)?);

        debug!(
            "Resolved settings (config file: {})",
            config_file.as_deref().map(Utf8Path::as_str).unwrap_or("none")
        );

        Ok(LoadedSettings {
            settings,
            config_file,
        })
    }

    /// Load a YAML settings file and parse it
    fn load_yaml_file(path: &Utf8Path) -> Result<SettingsOverrides> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(SettingsOverrides::default());
        }
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Collect TAGLIST_* environment overrides
    fn env_overrides<F>(env: F) -> Result<SettingsOverrides>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(&format!("{ENV_PREFIX}{name}"));

        let mut overrides = SettingsOverrides {
            repository: var("REPOSITORY"),
            output: var("OUTPUT").map(OutputFormat::from),
            constraint: var("CONSTRAINT"),
            ..SettingsOverrides::default()
        };

        if let Some(val) = var("LATEST") {
            overrides.latest = Some(parse_bool("TAGLIST_LATEST", &val)?);
        }

        if let Some(val) = var("PLAIN_HTTP") {
            overrides.plain_http = Some(parse_bool("TAGLIST_PLAIN_HTTP", &val)?);
        }

        if let Some(val) = var("HTTP_TIMEOUT_SECS") {
            overrides.http_timeout_secs = Some(val.trim().parse().map_err(|_| {
                Error::invalid_config("TAGLIST_HTTP_TIMEOUT_SECS must be a valid number")
            })?);
        }

        Ok(overrides)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::invalid_config(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}
