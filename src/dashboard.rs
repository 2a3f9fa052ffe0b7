//! The dashboard view model: everything one render pass shows, derived from a
//! [`Selection`] and a [`DataProvider`].
//!
//! Per-country failures (no data in range, zero base value, ...) stay on that
//! country's card; only an empty result for the whole selection is an error.

use crate::error::TransformError;
use crate::models::{ChartKind, DisplayMode, Indicator, Observation, Series, YearRange};
use crate::provider::DataProvider;
use crate::storage;
use crate::transform::{self, ChartData};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the user picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub countries: Vec<String>,
    pub range: YearRange,
    pub mode: DisplayMode,
    pub chart: ChartKind,
}

impl Selection {
    /// Country codes upper-cased, trimmed and deduplicated, in the order given.
    pub fn normalized_countries(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for c in &self.countries {
            let c = c.trim().to_ascii_uppercase();
            if !c.is_empty() && !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }
}

/// Summary shown for one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorCard {
    pub country: String,
    /// First observation inside the range.
    pub first: Option<Observation>,
    /// Last observation inside the range.
    pub last: Option<Observation>,
    /// `last / first`.
    pub growth_multiple: Option<f64>,
    pub cagr: Option<f64>,
    /// Why `cagr` (and possibly the rest) is unavailable.
    pub error: Option<TransformError>,
}

impl IndicatorCard {
    fn from_series(series: &Series) -> Self {
        let (cagr, error) = match transform::indicator(series) {
            Ok(ind) => (Some(ind.cagr), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            country: series.country().to_string(),
            first: series.first().cloned(),
            last: series.last().cloned(),
            growth_multiple: transform::growth_multiple(series).ok(),
            cagr,
            error,
        }
    }

    fn failed(country: &str, error: TransformError) -> Self {
        Self {
            country: country.to_string(),
            first: None,
            last: None,
            growth_multiple: None,
            cagr: None,
            error: Some(error),
        }
    }

    /// GDP of the last year in range, in billions of US$.
    pub fn latest_gdp_billions(&self) -> Option<f64> {
        self.last.as_ref().map(|o| o.gdp / 1e9)
    }

    pub fn indicator(&self) -> Option<Indicator> {
        self.cagr.map(|cagr| Indicator {
            country: self.country.clone(),
            cagr,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub selection: Selection,
    pub provider: String,
    pub generated_at: DateTime<Utc>,
    /// Tidy in-range rows, grouped by country in selection order, by year within a country.
    pub table: Vec<Observation>,
    pub chart: ChartData,
    pub cards: Vec<IndicatorCard>,
}

impl Dashboard {
    /// Query `provider` and derive every view of `selection`.
    pub fn build(provider: &dyn DataProvider, selection: &Selection) -> Result<Self> {
        let range = selection.range;
        if range.start > range.end {
            return Err(TransformError::EmptyRange {
                start: range.start,
                end: range.end,
            }
            .into());
        }
        let countries = selection.normalized_countries();
        if countries.is_empty() {
            anyhow::bail!("no country selected");
        }

        let rows = provider.observations(&countries, Some(range))?;
        log::debug!("{} returned {} rows", provider.name(), rows.len());
        let mut groups = transform::group_by_country(&rows);

        let mut in_range: Vec<Series> = Vec::new();
        let mut cards = Vec::new();
        for code in &countries {
            let filtered = match groups.remove(code) {
                Some(Ok(s)) => transform::filter_range(&s, range.start, range.end),
                Some(Err(e)) => Err(e),
                None => Err(TransformError::EmptyRange {
                    start: range.start,
                    end: range.end,
                }),
            };
            match filtered {
                Ok(s) => {
                    cards.push(IndicatorCard::from_series(&s));
                    in_range.push(s);
                }
                Err(e) => {
                    log::warn!("{}: {}", code, e);
                    cards.push(IndicatorCard::failed(code, e));
                }
            }
        }
        if !groups.is_empty() {
            log::debug!(
                "ignoring unselected countries from {}: {:?}",
                provider.name(),
                groups.keys().collect::<Vec<_>>()
            );
        }

        if in_range.is_empty() {
            return Err(TransformError::EmptyRange {
                start: range.start,
                end: range.end,
            }
            .into());
        }

        let chart = transform::pivot(&in_range, selection.mode);
        let table = in_range
            .into_iter()
            .flat_map(Series::into_points)
            .collect();

        Ok(Self {
            selection: selection.clone(),
            provider: provider.name().to_string(),
            generated_at: Utc::now(),
            table,
            chart,
            cards,
        })
    }

    /// The raw table as CSV (`country,year,gdp`).
    pub fn csv(&self) -> Result<Vec<u8>> {
        storage::to_csv(&self.table)
    }

    /// CAGR of every country that has one.
    pub fn indicators(&self) -> Vec<Indicator> {
        self.cards.iter().filter_map(IndicatorCard::indicator).collect()
    }
}
