//! Runtime configuration.
//!
//! Values come from an optional JSON file, then environment variables, then
//! CLI flags (applied by the binary). Stored on disk as:
//! ```json
//! {
//!   "source": "https://api.example.com/v1/orders",
//!   "sample_count": 120,
//!   "sample_seed": 42
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;

use crate::sample::{DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_MONTHS};

pub const DEFAULT_LOG_FILE_PATH: &str = "logs/order_insights.log";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// URL or file path of the order history. `None` means demo mode.
    pub source: Option<String>,
    /// Bearer token sent to an HTTP source.
    pub api_token: Option<String>,
    pub sample_count: usize,
    pub sample_seed: Option<u64>,
    pub sample_months: u32,
    pub log_file_path: String,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            source: None,
            api_token: None,
            sample_count: DEFAULT_SAMPLE_COUNT,
            sample_seed: None,
            sample_months: DEFAULT_SAMPLE_MONTHS,
            log_file_path: DEFAULT_LOG_FILE_PATH.to_string(),
        }
    }
}

impl InsightsConfig {
    /// Loads the config from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {path}"))?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `ORDERS_SOURCE`, `ORDERS_API_TOKEN`, `SAMPLE_ORDER_COUNT`,
    /// `SAMPLE_SEED`, `SAMPLE_MONTHS`, and `LOG_FILE_PATH` from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(source) = get("ORDERS_SOURCE") {
            self.source = Some(source);
        }
        if let Some(token) = get("ORDERS_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(count) = get("SAMPLE_ORDER_COUNT") {
            self.sample_count = parse_var("SAMPLE_ORDER_COUNT", &count)?;
        }
        if let Some(seed) = get("SAMPLE_SEED") {
            self.sample_seed = Some(parse_var("SAMPLE_SEED", &seed)?);
        }
        if let Some(months) = get("SAMPLE_MONTHS") {
            self.sample_months = parse_var("SAMPLE_MONTHS", &months)?;
        }
        if let Some(path) = get("LOG_FILE_PATH") {
            self.log_file_path = path;
        }
        Ok(self)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    #[test]
    fn test_load_fills_missing_keys_with_defaults() {
        let path = format!("{}/order_insights_config_test.json", env::temp_dir().display());
        fs::write(&path, r#"{"source": "orders.json", "sample_seed": 9}"#).unwrap();

        let config = InsightsConfig::load(&path).unwrap();
        assert_eq!(config.source.as_deref(), Some("orders.json"));
        assert_eq!(config.sample_seed, Some(9));
        assert_eq!(config.sample_count, DEFAULT_SAMPLE_COUNT);
        assert_eq!(config.log_file_path, DEFAULT_LOG_FILE_PATH);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(InsightsConfig::load("/nonexistent/order_insights.json").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            ("ORDERS_SOURCE", "https://api.example.com/orders"),
            ("SAMPLE_ORDER_COUNT", "250"),
            ("SAMPLE_SEED", " 7 "),
            ("LOG_FILE_PATH", ""),
        ]);
        let config = InsightsConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.source.as_deref(), Some("https://api.example.com/orders"));
        assert_eq!(config.sample_count, 250);
        assert_eq!(config.sample_seed, Some(7));
        // blank values are ignored
        assert_eq!(config.log_file_path, DEFAULT_LOG_FILE_PATH);
    }

    #[test]
    fn test_invalid_env_value_is_an_error() {
        let result = InsightsConfig::default().with_overrides(|k| {
            (k == "SAMPLE_ORDER_COUNT").then(|| "lots".to_string())
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains("SAMPLE_ORDER_COUNT"));
    }
}
