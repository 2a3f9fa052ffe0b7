//! Synchronous client for the **World Bank Indicators API (v2)**.
//!
//! Only the `country/{codes}/indicator/{code}` endpoint is used. Results are
//! returned as tidy [`Observation`] rows; pagination is handled automatically and
//! entries without a value (missing years) are dropped.
//!
//! Typical usage:
//! ```no_run
//! # use gdp_dashboard::{Client, YearRange};
//! # use gdp_dashboard::config::DashboardConfig;
//! let client = Client::from_config(&DashboardConfig::default())?;
//! let rows = client.fetch(
//!     &["DEU".into(), "FRA".into()],
//!     "NY.GDP.MKTP.CD",
//!     Some(YearRange::new(2000, 2020)),
//!     None,
//! )?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::DashboardConfig;
use crate::models::{Entry, Meta, Observation, YearRange};
use anyhow::{Context, Result, anyhow, bail};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

/// Safety cap to avoid pathological jobs.
const MAX_PAGES: u32 = 1000;

/// Backoff schedule for transient failures (5xx / network errors).
const BACKOFF_MS: [u64; 3] = [100, 300, 700];

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

// Allow -, _, . unescaped in codes (common for indicator ids)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|s| percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Split one API page into its metadata and entries.
///
/// The API returns `[Meta, [Entry, ...]]`, or a `message` object in position 0 on error.
pub fn parse_page(v: &Value) -> Result<(Meta, Vec<Entry>)> {
    let arr = v
        .as_array()
        .ok_or_else(|| anyhow!("unexpected response shape: not a top-level array"))?;
    if arr.is_empty() {
        bail!("unexpected response: empty array");
    }
    if arr[0].get("message").is_some() {
        bail!("world bank api error: {}", arr[0]);
    }

    let meta: Meta = serde_json::from_value(arr[0].clone()).context("parse meta")?;
    // Pages past the end carry `null` instead of an array.
    let entries: Vec<Entry> = match arr.get(1) {
        Some(Value::Null) | None => vec![],
        Some(list) => serde_json::from_value(list.clone()).context("parse entries")?,
    };
    Ok((meta, entries))
}

impl Client {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let base_url: String = base_url.into();
        let http = HttpClient::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(Policy::limited(5))
            .user_agent(concat!("gdp_dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &DashboardConfig) -> Result<Self> {
        Self::new(
            cfg.base_url.clone(),
            Duration::from_secs(cfg.timeout_secs),
            Duration::from_secs(cfg.connect_timeout_secs),
        )
    }

    /// GET a JSON document, retrying server errors and network failures.
    fn get_json(&self, url: &str) -> Result<Value> {
        let mut last_err: Option<anyhow::Error> = None;
        for backoff_ms in BACKOFF_MS {
            match self.http.get(url).send() {
                Ok(r) if r.status().is_success() => {
                    return r.json().context("decode json");
                }
                Ok(r) if r.status().is_server_error() => {
                    log::warn!("GET {} returned HTTP {}, retrying", url, r.status());
                    last_err = Some(anyhow!("HTTP {}", r.status()));
                }
                Ok(r) => bail!("request failed with HTTP {}", r.status()),
                Err(e) => {
                    log::warn!("GET {} failed: {}, retrying", url, e);
                    last_err = Some(e.into());
                }
            }
            std::thread::sleep(Duration::from_millis(backoff_ms));
        }
        bail!("network error: {:?}", last_err);
    }

    /// Fetch observations of one indicator.
    ///
    /// - `countries`: ISO2 (e.g., "DE") or ISO3 (e.g., "DEU") or aggregates (e.g., "EUU").
    ///   Rows are keyed by the code as requested, upper-cased.
    /// - `indicator`: e.g., "NY.GDP.MKTP.CD".
    /// - `range`: inclusive year range; `None` lets the API pick its default.
    /// - `source`: optional numeric source id (e.g., 2 for WDI).
    pub fn fetch(
        &self,
        countries: &[String],
        indicator: &str,
        range: Option<YearRange>,
        source: Option<u32>,
    ) -> Result<Vec<Observation>> {
        if countries.is_empty() {
            bail!("at least one country/region code required");
        }
        if indicator.trim().is_empty() {
            bail!("indicator code required");
        }

        let country_spec = enc_join(countries.iter().map(|s| s.as_str()));
        let indicator_spec = enc_join([indicator]);

        let mut url = format!(
            "{}/country/{}/indicator/{}?format=json&per_page=1000",
            self.base_url, country_spec, indicator_spec
        );
        if let Some(r) = range {
            url.push_str(&format!("&date={}", r.to_query_param()));
        }
        if let Some(s) = source {
            url.push_str(&format!("&source={}", s));
        }

        let mut page = 1u32;
        let mut out: Vec<Observation> = Vec::new();
        let mut missing = 0usize;
        loop {
            if page > MAX_PAGES {
                bail!("page limit exceeded ({})", MAX_PAGES);
            }
            let page_url = format!("{}&page={}", url, page);
            log::debug!("GET {}", page_url);
            let v = self
                .get_json(&page_url)
                .with_context(|| format!("GET {}", page_url))?;
            let (meta, entries) = parse_page(&v)?;

            for e in &entries {
                match e.to_observation_for(countries) {
                    Some(o) => out.push(o),
                    None => missing += 1,
                }
            }

            if page >= meta.pages {
                break;
            }
            page += 1;
        }

        log::info!(
            "fetched {} observations of {} ({} missing values skipped)",
            out.len(),
            indicator,
            missing
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_joined() {
        assert_eq!(enc_join(["DEU", " FRA "]), "DEU;FRA");
        assert_eq!(enc_join(["NY.GDP.MKTP.CD"]), "NY.GDP.MKTP.CD");
        assert_eq!(enc_join(["a b"]), "a%20b");
    }

    #[test]
    fn api_error_payload_is_surfaced() {
        let v: Value = serde_json::from_str(
            r#"[{"message":[{"id":"120","key":"Invalid value","value":"The provided parameter value is not valid"}]}]"#,
        )
        .unwrap();
        let err = parse_page(&v).unwrap_err();
        assert!(err.to_string().contains("world bank api error"));
    }

    #[test]
    fn page_without_entries_is_empty() {
        let v: Value =
            serde_json::from_str(r#"[{"page":1,"pages":0,"per_page":"1000","total":0},null]"#)
                .unwrap();
        let (meta, entries) = parse_page(&v).unwrap();
        assert_eq!(meta.pages, 0);
        assert!(entries.is_empty());
    }
}
