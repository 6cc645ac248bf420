//! Configuration management for jvmbudget
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.jvmbudget/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::budget::{BudgetOverrides, DEFAULT_METASPACE_SIZE_MB, DEFAULT_OVERHEAD_SIZE_MB, FIXED_OVERHEAD_MB};
use crate::errors::{BudgetError, Result};
use crate::oom::{OomClassifier, DEFAULT_OOM_EXIT_CODE, OOM_MARKER};

/// Complete configuration for jvmbudget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub budget: BudgetSection,
    pub oom: OomSection,
    pub reclaim: ReclaimSection,
    pub logging: LoggingSection,
}

/// Region base sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSection {
    pub overhead_size: i64,
    pub metaspace_size: i64,
    /// Overhead subtracted by the heap-only calculator
    pub fixed_overhead: i64,
}

/// Out-of-memory exit classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OomSection {
    pub exit_code: i32,
    pub marker: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimSection {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level name or `EnvFilter` directive string
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            budget: BudgetSection::default(),
            oom: OomSection::default(),
            reclaim: ReclaimSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self {
            overhead_size: DEFAULT_OVERHEAD_SIZE_MB,
            metaspace_size: DEFAULT_METASPACE_SIZE_MB,
            fixed_overhead: FIXED_OVERHEAD_MB,
        }
    }
}

impl Default for OomSection {
    fn default() -> Self {
        Self {
            exit_code: DEFAULT_OOM_EXIT_CODE,
            marker: OOM_MARKER.to_string(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BudgetError::ConfigError(format!("Failed to read config {}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| BudgetError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard configuration location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".jvmbudget").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.budget.fixed_overhead < 0 {
            return Err(BudgetError::ConfigError(
                "fixed_overhead must not be negative".to_string()
            ));
        }

        if !(0..=255).contains(&self.oom.exit_code) {
            return Err(BudgetError::ConfigError(
                format!("oom exit_code must be between 0 and 255, got {}", self.oom.exit_code)
            ));
        }

        if self.oom.marker.is_empty() {
            return Err(BudgetError::ConfigError(
                "oom marker must not be empty".to_string()
            ));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(BudgetError::ConfigError(
                format!("Invalid logging level: {}", self.logging.level)
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BudgetError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| BudgetError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| BudgetError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Region base sizes as calculator overrides
    pub fn budget_overrides(&self) -> BudgetOverrides {
        BudgetOverrides::new()
            .with_overhead_size(self.budget.overhead_size)
            .with_metaspace_size(self.budget.metaspace_size)
    }

    /// Classifier configured from the `[oom]` section
    pub fn oom_classifier(&self) -> OomClassifier {
        OomClassifier {
            marker: self.oom.marker.clone(),
            exit_code: self.oom.exit_code,
        }
    }
}
