//! Service configuration loaded from an optional TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serp_extract::{ExtractConfig, HttpConfig, StoreConfig};

use crate::error::{LookupError, Result};

/// Default tracing filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "serp_lookup=info,serp_extract=info";

/// Full service configuration.
///
/// Every section is optional in the file; missing sections and fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Results returned by `search` when the request does not say.
    pub default_num_results: usize,
    /// Fallback tracing filter directive.
    pub log_filter: String,
    /// Extraction pipeline settings.
    pub extract: ExtractConfig,
    /// Result store bounds.
    pub store: StoreConfig,
    /// Markup fetching.
    pub http: HttpConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            default_num_results: 5,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            extract: ExtractConfig::default(),
            store: StoreConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl LookupConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LookupError::Config(e.to_string()))
    }

    /// Load from `path` if given, otherwise use defaults. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or a value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        self.extract.validate()?;
        self.store.validate()?;
        self.http.validate()?;
        if self.default_num_results == 0 {
            return Err(LookupError::Config(
                "default_num_results must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
