//! Store configuration loaded from TOML.
//!
//! # Invariants
//! - Every field has a default, so an empty file is a valid configuration.
//! - Unknown keys are rejected instead of silently ignored.
//! - A configuration is only handed out after `validate()` succeeds.

use crate::env::ModeSetting;
use crate::service::feedback_store::ReadPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROJECT_ID: &str = "dashboard-write-db";
pub const DEFAULT_DATABASE_FILE: &str = "feedback_store.sqlite3";
const DEFAULT_CATEGORIES_PATH: &str = "feedback_site/data/categories";
const DEFAULT_FEEDBACK_ITEMS_PATH: &str = "feedback_site/data/feedback_items";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, .. } => write!(f, "failed to read config `{}`", path.display()),
            Self::Parse(_) => write!(f, "failed to parse config"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Collection paths of the two logical collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionPaths {
    pub categories: String,
    pub feedback_items: String,
}

impl Default for CollectionPaths {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES_PATH.to_string(),
            feedback_items: DEFAULT_FEEDBACK_ITEMS_PATH.to_string(),
        }
    }
}

impl CollectionPaths {
    /// Checks both paths are well-formed collection paths.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_collection_path("collections.categories", &self.categories)?;
        validate_collection_path("collections.feedback_items", &self.feedback_items)?;
        if self.categories == self.feedback_items {
            return Err(ConfigError::Invalid(
                "categories and feedback_items must be different collections".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection and behavior settings for the feedback store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Target database project.
    pub project_id: String,
    pub mode: ModeSetting,
    pub read_policy: ReadPolicy,
    /// SQLite file backing the document repository.
    pub database_path: PathBuf,
    /// Reference to administrative service-identity material. Carried for
    /// the admin commands; never opened by this crate.
    pub credential: Option<PathBuf>,
    pub collections: CollectionPaths,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            mode: ModeSetting::default(),
            read_policy: ReadPolicy::default(),
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            credential: None,
            collections: CollectionPaths::default(),
        }
    }
}

impl StoreConfig {
    /// Reads, parses and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("project_id cannot be empty".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database_path cannot be empty".to_string(),
            ));
        }
        self.collections.validate()
    }
}

/// Collection paths alternate collection/document segments, so a valid path
/// has an odd number of non-empty segments.
fn validate_collection_path(key: &str, path: &str) -> ConfigResult<()> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|segment| segment.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!(
            "{key} `{path}` contains an empty segment"
        )));
    }
    if segments.len() % 2 == 0 {
        return Err(ConfigError::Invalid(format!(
            "{key} `{path}` names a document, not a collection"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DEFAULT_PROJECT_ID};
    use crate::env::ModeSetting;
    use crate::service::feedback_store::ReadPolicy;
    use std::error::Error;

    #[test]
    fn empty_file_yields_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.project_id, DEFAULT_PROJECT_ID);
        assert_eq!(config.mode, ModeSetting::Auto);
        assert_eq!(config.collections.categories, "feedback_site/data/categories");
    }

    #[test]
    fn parses_full_file() {
        let config = StoreConfig::from_toml_str(
            r#"
            project_id = "staging"
            mode = "remote"
            read_policy = "fallback_on_error"
            database_path = "/tmp/store.sqlite3"
            credential = "/secrets/admin.json"

            [collections]
            categories = "site/data/cats"
            feedback_items = "site/data/items"
            "#,
        )
        .unwrap();

        assert_eq!(config.project_id, "staging");
        assert_eq!(config.mode, ModeSetting::Remote);
        assert_eq!(config.read_policy, ReadPolicy::FallbackOnError);
        assert_eq!(config.collections.feedback_items, "site/data/items");
        assert!(config.credential.is_some());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = StoreConfig::from_toml_str("projectid = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(err.to_string(), "failed to parse config");
        assert!(err.source().unwrap().to_string().contains("projectid"));
    }

    #[test]
    fn rejects_document_paths_and_empty_segments() {
        let even = StoreConfig::from_toml_str("[collections]\ncategories = \"site/data\"")
            .unwrap_err();
        assert!(even.to_string().contains("names a document"));

        let empty = StoreConfig::from_toml_str("[collections]\ncategories = \"site//cats\"")
            .unwrap_err();
        assert!(empty.to_string().contains("empty segment"));
    }

    #[test]
    fn rejects_blank_project_id() {
        let err = StoreConfig::from_toml_str("project_id = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
