//! gdp_dashboard
//!
//! A small Rust library for exploring GDP series from World Bank data. Pairs with
//! the `gdp-dash` CLI.
//!
//! ### Features
//! - Fetch GDP for one or more countries from the World Bank API, or load a bulk CSV
//! - Filter to a year range, rescale to an index (first year = 100)
//! - Compound annual growth rate (CAGR) and growth multiple per country
//! - Export the tidy table as CSV (`country,year,gdp`) or JSON
//! - Line or grouped-bar SVG charts
//!
//! ### Example
//! ```no_run
//! use gdp_dashboard::{Client, Dashboard, Selection, WorldBankProvider, YearRange};
//! use gdp_dashboard::config::DashboardConfig;
//! use gdp_dashboard::models::{ChartKind, DisplayMode, GDP_INDICATOR};
//!
//! let cfg = DashboardConfig::default();
//! let provider = WorldBankProvider::new(Client::from_config(&cfg)?, GDP_INDICATOR, None);
//! let selection = Selection {
//!     countries: vec!["DEU".into(), "FRA".into()],
//!     range: YearRange::new(2000, 2020),
//!     mode: DisplayMode::Index,
//!     chart: ChartKind::Line,
//! };
//! let dash = Dashboard::build(&provider, &selection)?;
//! for ind in dash.indicators() {
//!     println!("{}: {:.2}%", ind.country, ind.cagr * 100.0);
//! }
//! gdp_dashboard::chart::render_svg(&dash.chart, selection.chart, "gdp.svg", 1000, 600, "GDP")?;
//! std::fs::write("gdp.csv", dash.csv()?)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod present;
pub mod provider;
pub mod storage;
pub mod transform;

pub use api::Client;
pub use dashboard::{Dashboard, IndicatorCard, Selection};
pub use error::TransformError;
pub use models::{IndexedSeries, Indicator, Observation, Series, YearRange};
pub use provider::{DataProvider, StaticProvider, WideCsvProvider, WorldBankProvider};
pub use transform::{compute_cagr, filter_range, to_index};
