//! Configuration for the reconciliation engine

use serde::{Deserialize, Serialize};

/// Reconciliation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Ingestion configuration
    pub ingest: IngestConfig,

    /// Matching configuration
    pub matching: MatchingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "recon-engine".to_string(),
            ingest: IngestConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

/// How a run treats settlement rows from previous runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Clear the full settlement ledger at the start of the run
    ///
    /// Prior runs' rows are discarded. The historical behavior; duplicate
    /// detection then only applies within the batch itself.
    Replace,

    /// Keep the existing ledger
    ///
    /// Settlement ids already persisted by earlier runs count as
    /// already-existing.
    Append,
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Replace or append semantics per run (default: replace)
    pub mode: IngestMode,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            mode: IngestMode::Replace,
        }
    }
}

/// Matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Calendar-day window for fuzzy date matching (default: 1)
    pub fuzzy_window_days: i64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_window_days: 1,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(mode) = std::env::var("RECON_INGEST_MODE") {
            config.ingest.mode = match mode.to_lowercase().as_str() {
                "replace" => IngestMode::Replace,
                "append" => IngestMode::Append,
                other => {
                    return Err(crate::Error::Config(format!(
                        "RECON_INGEST_MODE must be replace or append, got {}",
                        other
                    )))
                }
            };
        }

        if let Ok(days) = std::env::var("RECON_FUZZY_WINDOW_DAYS") {
            config.matching.fuzzy_window_days = days.parse().map_err(|_| {
                crate::Error::Config(format!(
                    "RECON_FUZZY_WINDOW_DAYS must be an integer, got {}",
                    days
                ))
            })?;
        }

        Ok(config)
    }
}
