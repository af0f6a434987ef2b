use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_DB_PATH, DEFAULT_MAX_RECORDS, DEFAULT_PAGE_ROWS, OPENDATA_BASE_URL,
    OPENDATA_DATASET, OPENDATA_FACETS, OPENDATA_SORT, RAW_EVENTS_FILE,
};
use crate::error::{EventsError, Result};
use crate::normalize::{KeywordBucket, KeywordClassifier};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub dataset: String,
    pub rows: u32,
    pub max_records: usize,
    pub sort: String,
    pub facets: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: OPENDATA_BASE_URL.to_string(),
            dataset: OPENDATA_DATASET.to_string(),
            rows: DEFAULT_PAGE_ROWS,
            max_records: DEFAULT_MAX_RECORDS,
            sort: OPENDATA_SORT.to_string(),
            facets: OPENDATA_FACETS.iter().map(|f| f.to_string()).collect(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl StorageConfig {
    pub fn raw_events_path(&self) -> PathBuf {
        self.data_dir.join(RAW_EVENTS_FILE)
    }
}

/// Keyword table for the display-time classifier. Empty means the built-in table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub categories: Vec<KeywordBucket>,
}

impl ClassifierConfig {
    pub fn build(&self) -> KeywordClassifier {
        if self.categories.is_empty() {
            KeywordClassifier::default()
        } else {
            KeywordClassifier::new(self.categories.clone())
        }
    }
}

impl Config {
    /// Load `config.toml` if present, then apply environment overrides
    /// (`.env` is read first). A missing file means all defaults.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let path = Path::new(DEFAULT_CONFIG_PATH);
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load an explicitly requested config file; it must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EventsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api.rows == 0 {
            return Err(EventsError::Config("api.rows must be at least 1".to_string()));
        }
        if let Some(bucket) = self.classifier.categories.iter().find(|b| b.keywords.is_empty()) {
            return Err(EventsError::Config(format!(
                "classifier category '{}' has no keywords",
                bucket.name
            )));
        }
        Ok(())
    }

    /// `DB_PATH` and `DATA_DIR` win over the file
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("DB_PATH").filter(|v| !v.trim().is_empty()) {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Some(data_dir) = lookup("DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
    }
}
