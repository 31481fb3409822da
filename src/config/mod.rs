//! Configuration module for massact
//!
//! Manages database locations, engine settings and the built-in policy.
//! Configuration is stored in the user's config directory.

mod setup;

pub use setup::first_time_setup;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::auth::{Capability, StaticAuthorization};
use crate::bulk::BulkSettings;
use crate::course::SectionNum;

/// Default ceiling on section numbers a course may reach
pub const DEFAULT_MAX_SECTIONS: SectionNum = 52;

/// Default principal recorded on notification tasks
pub const DEFAULT_ACTING_USER: u64 = 2;

const fn default_max_sections() -> SectionNum {
    DEFAULT_MAX_SECTIONS
}

const fn default_acting_user() -> u64 {
    DEFAULT_ACTING_USER
}

const fn default_true() -> bool {
    true
}

/// Built-in policy applied through the hook registry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Section numbers excluded from every bulk move or duplicate
    #[serde(default)]
    pub restricted_sections: Vec<SectionNum>,

    /// Allow duplicates into another course to keep their section number
    #[serde(default = "default_true")]
    pub keep_origin_section: bool,

    /// Allow bulk actions to create sections in a target course
    #[serde(default = "default_true")]
    pub allow_section_creation: bool,

    /// Module kinds that cannot be selected for bulk actions
    #[serde(default)]
    pub unselectable_kinds: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            restricted_sections: Vec::new(),
            keep_origin_section: true,
            allow_section_creation: true,
            unselectable_kinds: Vec::new(),
        }
    }
}

/// Capabilities withheld from the acting user
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationConfig {
    #[serde(default)]
    pub denied: Vec<Capability>,
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MassactConfig {
    /// Map of database names to their filesystem paths
    #[serde(default)]
    pub databases: HashMap<String, PathBuf>,

    /// The default database to use when none is specified
    #[serde(default)]
    pub default_database: Option<String>,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,

    /// Site-wide switch for "available but not shown on course page"
    #[serde(default)]
    pub allow_stealth: bool,

    /// Highest section number bulk actions may create
    #[serde(default = "default_max_sections")]
    pub max_sections: SectionNum,

    /// User id recorded as sender of content notifications
    #[serde(default = "default_acting_user")]
    pub acting_user: u64,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub authorization: AuthorizationConfig,
}

impl Default for MassactConfig {
    fn default() -> Self {
        Self {
            databases: HashMap::new(),
            default_database: None,
            quiet: false,
            allow_stealth: false,
            max_sections: DEFAULT_MAX_SECTIONS,
            acting_user: DEFAULT_ACTING_USER,
            policy: PolicyConfig::default(),
            authorization: AuthorizationConfig::default(),
        }
    }
}

impl MassactConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("massact").join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::from_toml_file(config_path)
    }

    /// Parse configuration from a specific TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or deserialized.
    pub fn from_toml_file(path: PathBuf) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text cannot be deserialized.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Add a database to the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if saving the configuration fails.
    pub fn add_database(&mut self, name: String, path: PathBuf) -> Result<(), ConfigError> {
        self.databases.insert(name, path);
        self.save()
    }

    /// Remove a database from the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if saving the configuration fails.
    pub fn remove_database(&mut self, name: &str) -> Result<Option<PathBuf>, ConfigError> {
        let removed = self.databases.remove(name);
        if self.default_database.as_deref() == Some(name) {
            self.default_database = None;
        }
        self.save()?;
        Ok(removed)
    }

    /// Get a database path by name
    #[must_use]
    pub fn get_database(&self, name: &str) -> Option<&PathBuf> {
        self.databases.get(name)
    }

    /// List all database names, sorted
    #[must_use]
    pub fn list_databases(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.databases.keys().collect();
        names.sort();
        names
    }

    /// Set the default database
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database name doesn't exist in the configuration
    /// or if saving the configuration fails.
    pub fn set_default_database(&mut self, name: String) -> Result<(), ConfigError> {
        if !self.databases.contains_key(&name) {
            return Err(ConfigError::Message(format!(
                "Database '{name}' does not exist in configuration"
            )));
        }
        self.default_database = Some(name);
        self.save()
    }

    /// Resolve the database path to use, preferring an explicit name
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the name is unknown or no default is configured.
    pub fn resolve_database(&self, name: Option<&str>) -> Result<&PathBuf, ConfigError> {
        let name = name
            .or(self.default_database.as_deref())
            .ok_or_else(|| ConfigError::Message("No default database configured".to_string()))?;
        self.get_database(name)
            .ok_or_else(|| ConfigError::Message(format!("Database '{name}' not found in configuration")))
    }

    /// Set a scalar setting from a `key=value` pair
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the key is unknown or the value does not parse.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |e: &dyn std::fmt::Display| {
            ConfigError::Message(format!("Invalid value '{value}' for '{key}': {e}"))
        };
        match key {
            "quiet" => self.quiet = value.parse().map_err(|e| invalid(&e))?,
            "allow_stealth" => self.allow_stealth = value.parse().map_err(|e| invalid(&e))?,
            "max_sections" => self.max_sections = value.parse().map_err(|e| invalid(&e))?,
            "acting_user" => self.acting_user = value.parse().map_err(|e| invalid(&e))?,
            _ => return Err(ConfigError::NotFound(key.to_string())),
        }
        Ok(())
    }

    /// Read a scalar setting as text
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "quiet" => Some(self.quiet.to_string()),
            "allow_stealth" => Some(self.allow_stealth.to_string()),
            "max_sections" => Some(self.max_sections.to_string()),
            "acting_user" => Some(self.acting_user.to_string()),
            "default_database" => self.default_database.clone(),
            _ => None,
        }
    }

    /// Engine settings derived from this configuration
    #[must_use]
    pub const fn bulk_settings(&self) -> BulkSettings {
        BulkSettings {
            allow_stealth: self.allow_stealth,
            max_sections: self.max_sections,
            acting_user: self.acting_user,
        }
    }

    /// Authorization oracle withholding the configured capabilities
    #[must_use]
    pub fn authorization(&self) -> StaticAuthorization {
        StaticAuthorization::with_denied(self.authorization.denied.iter().copied())
    }

    /// Load configuration, running first-time setup if config doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if loading or creating the configuration fails.
    pub fn load_or_setup() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load()
        } else {
            first_time_setup()
        }
    }
}
