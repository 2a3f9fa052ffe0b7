//! Plain-text rendering of the dashboard: indicator cards and the raw table.
//!
//! Numbers use locale-aware separators (`1,234.5` vs `1.234,5`); missing values print as `n/a`.

use crate::dashboard::{Dashboard, IndicatorCard};
use crate::models::{DisplayMode, Observation};
use num_format::{Locale, ToFormattedString};
use std::fmt::Write;

const NA: &str = "n/a";

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// Format with grouped thousands and `decimals` fraction digits.
pub fn format_number(v: f64, decimals: usize, locale_tag: &str) -> String {
    if !v.is_finite() {
        return NA.to_string();
    }
    let (locale, dec_sep) = map_locale(locale_tag);
    let fixed = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = int_part
        .parse::<u64>()
        .map(|n| n.to_formatted_string(locale))
        .unwrap_or_else(|_| int_part.to_string());
    let sign = if v < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}{dec_sep}{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// CAGR as a percentage with two decimals, e.g. `7.18%`.
pub fn format_cagr(cagr: Option<f64>, locale_tag: &str) -> String {
    match cagr {
        Some(c) => format!("{}%", format_number(c * 100.0, 2, locale_tag)),
        None => NA.to_string(),
    }
}

/// Growth multiple with two decimals, e.g. `1.52x`.
pub fn format_multiple(m: Option<f64>, locale_tag: &str) -> String {
    match m {
        Some(m) => format!("{}x", format_number(m, 2, locale_tag)),
        None => NA.to_string(),
    }
}

fn card_row(card: &IndicatorCard, locale_tag: &str) -> [String; 5] {
    let gdp = card
        .latest_gdp_billions()
        .map(|b| format!("${} bn", format_number(b, 0, locale_tag)))
        .unwrap_or_else(|| NA.to_string());
    let year = card
        .last
        .as_ref()
        .map(|o| o.year.to_string())
        .unwrap_or_else(|| NA.to_string());
    let note = card.error.as_ref().map(|e| e.to_string()).unwrap_or_default();
    [
        card.country.clone(),
        format!("{gdp} ({year})"),
        format_multiple(card.growth_multiple, locale_tag),
        format_cagr(card.cagr, locale_tag),
        note,
    ]
}

/// Render rows as left-aligned columns separated by two spaces.
fn render_columns(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let mut out = String::new();
    let mut line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };
    line(header.to_vec());
    for row in rows {
        line(row.iter().map(String::as_str).collect());
    }
    out
}

/// Indicator cards for the selected period.
pub fn render_indicators(dashboard: &Dashboard, locale_tag: &str) -> String {
    let range = dashboard.selection.range;
    let rows: Vec<Vec<String>> = dashboard
        .cards
        .iter()
        .map(|c| card_row(c, locale_tag).to_vec())
        .collect();
    let mut out = format!("Indicators {}-{}\n", range.start, range.end);
    out.push_str(&render_columns(
        &["country", "gdp (last year)", "growth", "cagr", "note"],
        &rows,
    ));
    if dashboard.selection.mode == DisplayMode::Index {
        let _ = writeln!(
            out,
            "Chart values are an index (100 = first year of each country in range)."
        );
    }
    for s in &dashboard.chart.skipped {
        let _ = writeln!(out, "Not charted: {} ({})", s.country, s.reason);
    }
    out
}

/// The raw tidy table, GDP in whole US$.
pub fn render_table(rows: &[Observation], locale_tag: &str) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|o| {
            vec![
                o.country.clone(),
                o.year.to_string(),
                format_number(o.gdp, 0, locale_tag),
            ]
        })
        .collect();
    render_columns(&["country", "year", "gdp"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_follow_locale() {
        assert_eq!(format_number(1234567.891, 2, "en"), "1,234,567.89");
        assert_eq!(format_number(1234567.891, 2, "de"), "1.234.567,89");
        assert_eq!(format_number(-1500.0, 0, "en"), "-1,500");
        assert_eq!(format_number(-0.001, 2, "en"), "0.00");
        assert_eq!(format_number(f64::NAN, 2, "en"), "n/a");
    }

    #[test]
    fn cagr_and_multiple_formatting() {
        assert_eq!(format_cagr(Some(0.0717734625), "en"), "7.18%");
        assert_eq!(format_cagr(Some(-0.05), "fr"), "-5,00%");
        assert_eq!(format_cagr(None, "en"), "n/a");
        assert_eq!(format_multiple(Some(1.5), "en"), "1.50x");
    }

    #[test]
    fn table_is_aligned() {
        let out = render_table(
            &[
                Observation::new("DEU", 2000, 1.9e12),
                Observation::new("FRA", 2001, 1.0),
            ],
            "en",
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "country  year  gdp");
        assert_eq!(lines[1], "DEU      2000  1,900,000,000,000");
        assert_eq!(lines[2], "FRA      2001  1");
    }
}
