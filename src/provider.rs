//! Sources of GDP observations.
//!
//! The dashboard only needs `(country, year, value)` rows for a set of countries
//! and a year range; [`DataProvider`] is that contract. Three sources implement it:
//! - [`WorldBankProvider`]: the live World Bank API
//! - [`WideCsvProvider`]: a bulk-download CSV with one column per year
//! - [`StaticProvider`]: rows held in memory

use crate::api::Client;
use crate::models::{Observation, YearRange};
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// Name of the country column in World Bank bulk files.
pub const COUNTRY_CODE_COLUMN: &str = "Country Code";

pub trait DataProvider {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Observations for `countries`, restricted to `range` when given.
    fn observations(
        &self,
        countries: &[String],
        range: Option<YearRange>,
    ) -> Result<Vec<Observation>>;

    /// Years covered by the source, when known without a query.
    fn available_range(&self) -> Option<YearRange> {
        None
    }
}

/// Live data from the World Bank Indicators API.
#[derive(Debug, Clone)]
pub struct WorldBankProvider {
    client: Client,
    indicator: String,
    source: Option<u32>,
}

impl WorldBankProvider {
    pub fn new(client: Client, indicator: impl Into<String>, source: Option<u32>) -> Self {
        Self {
            client,
            indicator: indicator.into(),
            source,
        }
    }
}

impl DataProvider for WorldBankProvider {
    fn name(&self) -> &str {
        "world bank api"
    }

    fn observations(
        &self,
        countries: &[String],
        range: Option<YearRange>,
    ) -> Result<Vec<Observation>> {
        self.client
            .fetch(countries, &self.indicator, range, self.source)
    }
}

/// Rows kept in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    rows: Vec<Observation>,
}

impl StaticProvider {
    pub fn new(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }
}

impl DataProvider for StaticProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn observations(
        &self,
        countries: &[String],
        range: Option<YearRange>,
    ) -> Result<Vec<Observation>> {
        Ok(select(&self.rows, countries, range))
    }

    fn available_range(&self) -> Option<YearRange> {
        year_span(&self.rows)
    }
}

/// A World Bank bulk-download CSV melted into tidy rows.
///
/// The file has a `Country Code` column and one column per year (`1960`, `1961`, ...).
/// Preamble lines before the header row are skipped, and empty cells are missing values.
#[derive(Debug, Clone)]
pub struct WideCsvProvider {
    rows: Vec<Observation>,
}

impl WideCsvProvider {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::from_reader(f).with_context(|| format!("load {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = rdr.records();

        let header = loop {
            match records.next() {
                Some(rec) => {
                    let rec = rec.context("read csv")?;
                    if rec.iter().any(|c| c.trim() == COUNTRY_CODE_COLUMN) {
                        break rec;
                    }
                }
                None => bail!("no header row with a '{}' column", COUNTRY_CODE_COLUMN),
            }
        };
        let (code_idx, year_cols) = header_layout(&header)?;

        let mut rows = Vec::new();
        for rec in records {
            let rec = rec.context("read csv")?;
            let Some(code) = rec.get(code_idx).map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };
            for &(idx, year) in &year_cols {
                let cell = rec.get(idx).map(str::trim).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                let gdp: f64 = cell
                    .parse()
                    .with_context(|| format!("bad value '{}' for {} in {}", cell, code, year))?;
                rows.push(Observation::new(code, year, gdp));
            }
        }
        log::info!(
            "loaded {} observations for {} years from wide csv",
            rows.len(),
            year_cols.len()
        );
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }
}

/// Locate the country column and the `(index, year)` of every year column.
fn header_layout(header: &StringRecord) -> Result<(usize, Vec<(usize, i32)>)> {
    let year_re = Regex::new(r"^\d{4}$")?;
    let code_idx = header
        .iter()
        .position(|h| h.trim() == COUNTRY_CODE_COLUMN)
        .with_context(|| format!("missing '{}' column", COUNTRY_CODE_COLUMN))?;
    let year_cols: Vec<(usize, i32)> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| year_re.is_match(h.trim()))
        .filter_map(|(i, h)| h.trim().parse::<i32>().ok().map(|y| (i, y)))
        .collect();
    if year_cols.is_empty() {
        bail!("no year columns found in csv header");
    }
    Ok((code_idx, year_cols))
}

impl DataProvider for WideCsvProvider {
    fn name(&self) -> &str {
        "wide csv"
    }

    fn observations(
        &self,
        countries: &[String],
        range: Option<YearRange>,
    ) -> Result<Vec<Observation>> {
        Ok(select(&self.rows, countries, range))
    }

    fn available_range(&self) -> Option<YearRange> {
        year_span(&self.rows)
    }
}

/// Rows of the wanted countries (case-insensitive codes) inside `range`.
fn select(rows: &[Observation], countries: &[String], range: Option<YearRange>) -> Vec<Observation> {
    let wanted: BTreeSet<String> = countries.iter().map(|c| c.trim().to_ascii_uppercase()).collect();
    rows.iter()
        .filter(|o| wanted.contains(&o.country.to_ascii_uppercase()))
        .filter(|o| range.is_none_or(|r| r.contains(o.year)))
        .cloned()
        .collect()
}

fn year_span(rows: &[Observation]) -> Option<YearRange> {
    let start = rows.iter().map(|o| o.year).min()?;
    let end = rows.iter().map(|o| o.year).max()?;
    Some(YearRange { start, end })
}
