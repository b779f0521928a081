//! ORM generation settings

use std::path::{Path, PathBuf};

use qsa_core::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};

const PYTHON_PATH_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$";

/// Where models are written and what they derive from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrmConfig {
    /// Models go to `<cache-root>/models/`
    #[serde(rename = "cache-root")]
    pub cache_root: PathBuf,

    /// Import line that brings the base class into scope
    #[serde(rename = "base-import")]
    pub base_import: String,

    #[serde(rename = "base-class")]
    pub base_class: String,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("cache"),
            base_import: "from pineboolib.application.database.orm import basemodel".to_string(),
            base_class: "basemodel.BaseModel".to_string(),
        }
    }
}

impl OrmConfig {
    /// Settings with the default base class, caching below `cache_root`
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            ..Self::default()
        }
    }

    /// Load a configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cache-root must not be empty".into()));
        }
        let path = Regex::new(PYTHON_PATH_PATTERN).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !path.is_match(&self.base_class) {
            return Err(ConfigError::Invalid(format!(
                "base-class '{}' is not a Python name",
                self.base_class
            )));
        }
        if !self.base_import.starts_with("import ") && !self.base_import.starts_with("from ") {
            return Err(ConfigError::Invalid(format!(
                "base-import '{}' is not an import statement",
                self.base_import
            )));
        }
        Ok(())
    }

    /// Cache path of the model for `table`
    pub fn model_path(&self, table: &str) -> PathBuf {
        self.cache_root.join("models").join(format!("{table}_model.py"))
    }
}
