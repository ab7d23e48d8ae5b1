//! Settings types shared by the taglist crates

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default timeout for a single registry HTTP request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// How a tag listing is rendered on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputFormat {
    /// `tags: a, b, c`
    #[default]
    Text,
    /// JSON array of tag strings
    Json,
}

impl From<&str> for OutputFormat {
    /// Only `json` selects JSON; every other value falls back to text.
    fn from(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

impl From<String> for OutputFormat {
    fn from(value: String) -> Self {
        OutputFormat::from(value.as_str())
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Fully merged settings for one invocation.
///
/// Built once by [`crate::SettingsLoader`] and passed by value into the
/// commands; nothing downstream reads the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Repository to list tags from, as typed by the user
    pub repository: Option<String>,
    /// Output format for tag listings
    pub output: OutputFormat,
    /// Version-range constraint applied before output
    pub constraint: Option<String>,
    /// Only print the highest version
    pub latest: bool,
    /// Talk to the registry over plain HTTP
    pub plain_http: bool,
    /// Per-request timeout for registry calls
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository: None,
            output: OutputFormat::default(),
            constraint: None,
            latest: false,
            plain_http: false,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// The repository to query, which every source may leave unset
    pub fn repository(&self) -> Result<&str> {
        self.repository
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| Error::missing_field("repository"))
    }

    /// Constraint expression, treating an empty string as absent
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Overlay values from a higher-precedence source
    pub fn merge(mut self, overlay: SettingsOverrides) -> Self {
        if overlay.repository.is_some() {
            self.repository = overlay.repository;
        }
        if let Some(output) = overlay.output {
            self.output = output;
        }
        if overlay.constraint.is_some() {
            self.constraint = overlay.constraint;
        }
        if let Some(latest) = overlay.latest {
            self.latest = latest;
        }
        if let Some(plain_http) = overlay.plain_http {
            self.plain_http = plain_http;
        }
        if let Some(timeout) = overlay.http_timeout_secs {
            self.http_timeout_secs = timeout;
        }
        self
    }
}

/// A partial set of settings; unset fields leave lower layers untouched.
///
/// Used for the settings file, the environment and CLI flags alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsOverrides {
    pub repository: Option<String>,
    pub output: Option<OutputFormat>,
    pub constraint: Option<String>,
    pub latest: Option<bool>,
    pub plain_http: Option<bool>,
    pub http_timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("string"), OutputFormat::Text);
        assert_eq!(OutputFormat::from(""), OutputFormat::Text);
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Text);
    }

    #[test]
    fn test_repository_required() {
        let settings = Settings::default();
        assert!(matches!(
            settings.repository(),
            Err(Error::MissingField { ref field }) if field == "repository"
        ));

        let blank = Settings {
            repository: Some("  ".to_string()),
            ..Settings::default()
        };
        assert!(blank.repository().is_err());
    }

    #[test]
    fn test_empty_constraint_is_absent() {
        let settings = Settings {
            constraint: Some(String::new()),
            ..Settings::default()
        };
        assert_eq!(settings.constraint(), None);
    }

    #[test]
    fn test_merge_only_overrides_set_fields() {
        let base = Settings {
            repository: Some("nginx".to_string()),
            constraint: Some("^1".to_string()),
            ..Settings::default()
        };

        let merged = base.merge(SettingsOverrides {
            output: Some(OutputFormat::Json),
            latest: Some(true),
            ..SettingsOverrides::default()
        });

        assert_eq!(merged.repository.as_deref(), Some("nginx"));
        assert_eq!(merged.constraint.as_deref(), Some("^1"));
        assert_eq!(merged.output, OutputFormat::Json);
        assert!(merged.latest);
        assert_eq!(merged.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
    }

    #[test]
    fn test_overrides_from_yaml() {
        let yaml = "repository: library/redis\noutput: json\nlatest: true\n";
        let overrides: SettingsOverrides = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(overrides.repository.as_deref(), Some("library/redis"));
        assert_eq!(overrides.output, Some(OutputFormat::Json));
        assert_eq!(overrides.latest, Some(true));
        assert_eq!(overrides.constraint, None);
    }
}
