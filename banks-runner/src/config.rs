//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file named by
//! [`CONFIG_ENV_VAR`], then per-run overrides (the CLI flags). Missing keys in
//! the TOML file keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable pointing at an optional TOML config file.
pub const CONFIG_ENV_VAR: &str = "BANKS_ETL_CONFIG";

pub const DEFAULT_LOCATOR: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_RATES_PATH: &str = "./exchange_rate.csv";
pub const DEFAULT_DB_PATH: &str = "./Banks.db";
pub const DEFAULT_TABLE_NAME: &str = "Largest_banks";
pub const DEFAULT_OUTPUT_CSV_PATH: &str = "./Largest_banks_data.csv";
pub const DEFAULT_LOG_PATH: &str = "./code_log.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a run needs to know about its inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    /// URL or filesystem path of the page holding the ranking.
    pub locator: String,
    /// `Currency,Rate` CSV file.
    pub rates_path: PathBuf,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Table replaced on every load.
    pub table_name: String,
    /// CSV export destination.
    pub output_csv_path: PathBuf,
    /// Append-only progress log.
    pub log_path: PathBuf,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            locator: DEFAULT_LOCATOR.to_string(),
            rates_path: PathBuf::from(DEFAULT_RATES_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            output_csv_path: PathBuf::from(DEFAULT_OUTPUT_CSV_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

/// Per-run replacements for the four path/URL settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub locator: Option<String>,
    pub rates_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub output_csv_path: Option<PathBuf>,
}

impl EtlConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Defaults, or the file named by [`CONFIG_ENV_VAR`] when it is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Apply overrides on top of this config.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(locator) = overrides.locator {
            self.locator = locator;
        }
        if let Some(p) = overrides.rates_path {
            self.rates_path = p;
        }
        if let Some(p) = overrides.db_path {
            self.db_path = p;
        }
        if let Some(p) = overrides.output_csv_path {
            self.output_csv_path = p;
        }
        self
    }

    /// Reject empty settings before anything touches the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locator.trim().is_empty() {
            return Err(ConfigError::Invalid("locator is empty".into()));
        }
        if self.table_name.trim().is_empty() {
            return Err(ConfigError::Invalid("table_name is empty".into()));
        }
        for (field, path) in [
            ("rates_path", &self.rates_path),
            ("db_path", &self.db_path),
            ("output_csv_path", &self.output_csv_path),
            ("log_path", &self.log_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} is empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = EtlConfig::default();
        assert!(cfg.locator.ends_with("List_of_largest_banks"));
        assert_eq!(cfg.table_name, "Largest_banks");
        assert_eq!(cfg.db_path, PathBuf::from("./Banks.db"));
        assert_eq!(cfg.log_path, PathBuf::from("./code_log.txt"));
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = EtlConfig::from_toml("table_name = \"banks_2023\"\nlog_path = \"/tmp/etl.log\"\n")
            .unwrap();
        assert_eq!(cfg.table_name, "banks_2023");
        assert_eq!(cfg.log_path, PathBuf::from("/tmp/etl.log"));
        assert_eq!(cfg.rates_path, PathBuf::from(DEFAULT_RATES_PATH));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EtlConfig::from_toml("tabel_name = \"typo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let cfg = EtlConfig::default().with_overrides(ConfigOverrides {
            locator: Some("page.html".into()),
            db_path: Some("other.db".into()),
            ..Default::default()
        });
        assert_eq!(cfg.locator, "page.html");
        assert_eq!(cfg.db_path, PathBuf::from("other.db"));
        assert_eq!(cfg.output_csv_path, PathBuf::from(DEFAULT_OUTPUT_CSV_PATH));
    }

    #[test]
    fn empty_values_fail_validation() {
        let cfg = EtlConfig {
            table_name: " ".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let cfg = EtlConfig {
            output_csv_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.toml");
        std::fs::write(&path, "locator = \"./page.html\"\n").unwrap();
        let cfg = EtlConfig::from_file(&path).unwrap();
        assert_eq!(cfg.locator, "./page.html");
    }
}
