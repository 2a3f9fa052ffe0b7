//! Dashboard settings, loaded from an optional JSON file.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//! ```json
//! { "default_countries": ["USA", "CHN"], "locale": "de" }
//! ```

use crate::models::{GDP_INDICATOR, YearRange};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Root of the World Bank API.
    pub base_url: String,
    /// Indicator to fetch; GDP in current US$ unless overridden.
    pub indicator: String,
    /// Optional numeric source id (e.g., 2 for WDI).
    pub source: Option<u32>,
    pub default_countries: Vec<String>,
    /// Range used when none is given. `None` means "all years the source has".
    pub default_range: Option<YearRange>,
    /// Locale tag for number formatting (`en`, `de`, `fr`, ...).
    pub locale: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldbank.org/v2".into(),
            indicator: GDP_INDICATOR.into(),
            source: None,
            default_countries: ["DEU", "FRA", "GBR", "BRA", "MEX", "JPN"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_range: None,
            locale: "en".into(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DashboardConfig> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: DashboardConfig = serde_json::from_str(&content)
        .with_context(|| format!("parse config {}", path.display()))?;
    log::debug!("loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("cfg.json");
        fs::write(
            &p,
            r#"{"locale":"de","default_range":{"start":1990,"end":2000}}"#,
        )
        .unwrap();
        let cfg = load_config(&p).unwrap();
        assert_eq!(cfg.locale, "de");
        assert_eq!(cfg.default_range, Some(YearRange::new(1990, 2000)));
        assert_eq!(cfg.indicator, GDP_INDICATOR);
        assert_eq!(cfg.default_countries.len(), 6);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = load_config("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("read config"));
    }
}
