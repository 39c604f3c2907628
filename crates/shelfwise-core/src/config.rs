use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfwiseError};

/// Root application configuration, loaded from `~/.config/shelfwise/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub lending: LendingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Catalog file; relative names resolve under `data_dir`.
    pub book_file: String,
    /// Loan ledger file; relative names resolve under `data_dir`.
    pub loan_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    pub loan_period_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

// ─── Defaults ──────────────────────────────────────────────

pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 15;

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("shelfwise");

        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
            book_file: "library_books.json".to_string(),
            loan_file: "issued_books.json".to_string(),
        }
    }
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/shelfwise/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SHELFWISE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("shelfwise")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.book_file.trim().is_empty() || self.storage.loan_file.trim().is_empty() {
            return Err(ShelfwiseError::Config(
                "storage.book_file and storage.loan_file must not be empty".to_string(),
            ));
        }
        if self.book_file_path() == self.loan_file_path() {
            return Err(ShelfwiseError::Config(
                "catalog and loan ledger cannot share a file".to_string(),
            ));
        }
        Ok(())
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.storage.data_dir = dir.to_string_lossy().to_string();
    }

    // ─── Derived paths ─────────────────────────────────────

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    /// Path to the catalog file.
    pub fn book_file_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.book_file)
    }

    /// Path to the issued-loan file.
    pub fn loan_file_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.loan_file)
    }
}
