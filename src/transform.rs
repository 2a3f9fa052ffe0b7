//! Pure transformations over GDP series: range filtering, base-100 indexing,
//! compound annual growth rate and the year × country pivot used for charts.
//!
//! Gaps inside a range are kept as they are. Nothing is interpolated, and growth
//! rates use the actual years of the first and last observation.

use crate::error::TransformError;
use crate::models::{
    DisplayMode, IndexedPoint, IndexedSeries, Indicator, Observation, Series,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Keep the observations whose year lies in `year_start..=year_end`.
pub fn filter_range(
    series: &Series,
    year_start: i32,
    year_end: i32,
) -> Result<Series, TransformError> {
    let empty = TransformError::EmptyRange {
        start: year_start,
        end: year_end,
    };
    if year_start > year_end {
        return Err(empty);
    }
    let points: Vec<Observation> = series
        .points()
        .iter()
        .filter(|p| year_start <= p.year && p.year <= year_end)
        .cloned()
        .collect();
    if points.is_empty() {
        return Err(empty);
    }
    Series::new(series.country(), points)
}

/// Rescale so the first observation equals exactly 100.
pub fn to_index(series: &Series) -> Result<IndexedSeries, TransformError> {
    let base = series.first().ok_or_else(|| TransformError::InsufficientData {
        country: series.country().to_string(),
        found: 0,
    })?;
    if base.gdp == 0.0 {
        return Err(TransformError::DivisionByZero {
            country: series.country().to_string(),
            year: base.year,
            value: base.gdp,
        });
    }
    let points = series
        .points()
        .iter()
        .map(|p| IndexedPoint {
            year: p.year,
            value: p.gdp / base.gdp * 100.0,
        })
        .collect();
    Ok(IndexedSeries {
        country: series.country().to_string(),
        base_year: base.year,
        base_value: base.gdp,
        points,
    })
}

/// First and last observation of a series usable as a growth period.
fn growth_endpoints(series: &Series) -> Result<(&Observation, &Observation), TransformError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(f), Some(l)) if series.len() >= 2 => (f, l),
        _ => {
            return Err(TransformError::InsufficientData {
                country: series.country().to_string(),
                found: series.len(),
            });
        }
    };
    if first.gdp <= 0.0 {
        return Err(TransformError::DivisionByZero {
            country: series.country().to_string(),
            year: first.year,
            value: first.gdp,
        });
    }
    if last.gdp < 0.0 {
        return Err(TransformError::NegativeValue {
            country: series.country().to_string(),
            year: last.year,
            value: last.gdp,
        });
    }
    Ok((first, last))
}

/// Compound annual growth rate between the first and last observation:
/// `(v1 / v0)^(1 / (y1 - y0)) - 1`.
///
/// Evaluated as `exp_m1(ln(v1 / v0) / years)`, so growth too small for `powf`
/// to see keeps its sign and `v1 == 0` gives exactly `-1`. The result is always
/// finite; a rate that overflows is a [`TransformError::GrowthOverflow`].
pub fn compute_cagr(series: &Series) -> Result<f64, TransformError> {
    let (first, last) = growth_endpoints(series)?;
    // Years are strictly increasing, so the period is at least one year.
    let years = f64::from(last.year - first.year);
    let ratio = last.gdp / first.gdp;
    // The ratio itself may overflow or underflow; the log difference does not.
    let log_ratio = if ratio.is_normal() {
        ratio.ln()
    } else {
        last.gdp.ln() - first.gdp.ln()
    };
    let cagr = (log_ratio / years).exp_m1();
    if !cagr.is_finite() {
        return Err(overflow(series.country(), first, last));
    }
    Ok(cagr)
}

fn overflow(country: &str, first: &Observation, last: &Observation) -> TransformError {
    TransformError::GrowthOverflow {
        country: country.to_string(),
        start: first.year,
        end: last.year,
    }
}

/// CAGR packaged with its country.
pub fn indicator(series: &Series) -> Result<Indicator, TransformError> {
    Ok(Indicator {
        country: series.country().to_string(),
        cagr: compute_cagr(series)?,
    })
}

/// Ratio of the last to the first value (`2.0` means the economy doubled).
pub fn growth_multiple(series: &Series) -> Result<f64, TransformError> {
    let (first, last) = growth_endpoints(series)?;
    let multiple = last.gdp / first.gdp;
    if !multiple.is_finite() {
        return Err(overflow(series.country(), first, last));
    }
    Ok(multiple)
}

/// Split a tidy table into one validated series per country.
///
/// Country codes are compared case-insensitively and come out upper-cased. A
/// country whose rows do not form a valid series (duplicate year, non-finite
/// value) carries its own error; the other countries are unaffected.
pub fn group_by_country(
    observations: &[Observation],
) -> BTreeMap<String, Result<Series, TransformError>> {
    let mut groups: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for o in observations {
        let country = o.country.trim().to_ascii_uppercase();
        groups.entry(country.clone()).or_default().push(Observation {
            country,
            ..o.clone()
        });
    }
    groups
        .into_iter()
        .map(|(country, points)| {
            let series = Series::from_unsorted(country.clone(), points);
            (country, series)
        })
        .collect()
}

/// One chart column: the values of a country aligned with `ChartData::years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartColumn {
    pub country: String,
    pub values: Vec<Option<f64>>,
}

/// A country left out of the chart and the reason why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSeries {
    pub country: String,
    pub reason: String,
}

/// Year × country table ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub mode: DisplayMode,
    pub years: Vec<i32>,
    pub columns: Vec<ChartColumn>,
    pub skipped: Vec<SkippedSeries>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.years.is_empty()
    }

    /// Smallest and largest plotted value.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let mut it = self.columns.iter().flat_map(|c| c.values.iter().flatten().copied());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Pivot series into chart columns, expressed in `mode`.
///
/// In index mode a series that cannot be indexed is reported in `skipped`
/// instead of failing the whole chart.
pub fn pivot<'a, I>(series: I, mode: DisplayMode) -> ChartData
where
    I: IntoIterator<Item = &'a Series>,
{
    let mut rows: Vec<(String, Vec<(i32, f64)>)> = Vec::new();
    let mut skipped = Vec::new();
    for s in series {
        match mode {
            DisplayMode::Absolute => rows.push((
                s.country().to_string(),
                s.points().iter().map(|p| (p.year, p.gdp)).collect(),
            )),
            DisplayMode::Index => match to_index(s) {
                Ok(idx) => rows.push((
                    idx.country,
                    idx.points.iter().map(|p| (p.year, p.value)).collect(),
                )),
                Err(e) => {
                    log::warn!("leaving {} out of the indexed chart: {}", s.country(), e);
                    skipped.push(SkippedSeries {
                        country: s.country().to_string(),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    let years: Vec<i32> = rows
        .iter()
        .flat_map(|(_, pts)| pts.iter().map(|(y, _)| *y))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = rows
        .into_iter()
        .map(|(country, pts)| {
            let by_year: BTreeMap<i32, f64> = pts.into_iter().collect();
            ChartColumn {
                country,
                values: years.iter().map(|y| by_year.get(y).copied()).collect(),
            }
        })
        .collect();

    ChartData {
        mode,
        years,
        columns,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(country: &str, pts: &[(i32, f64)]) -> Series {
        Series::new(
            country,
            pts.iter()
                .map(|&(y, v)| Observation::new(country, y, v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn cagr_doubling_over_ten_years() {
        let s = series("AAA", &[(2000, 100.0), (2010, 200.0)]);
        let cagr = compute_cagr(&s).unwrap();
        assert!((cagr - 0.071773).abs() < 1e-6, "got {cagr}");
    }

    #[test]
    fn cagr_uses_endpoints_across_gaps() {
        // 2001 and 2002 are missing; the period is still 2000..2003.
        let s = series("AAA", &[(2000, 100.0), (2003, 133.1)]);
        let cagr = compute_cagr(&s).unwrap();
        assert!((cagr - 0.1).abs() < 1e-9);
    }

    #[test]
    fn cagr_rejects_short_and_non_positive_series() {
        let one = series("AAA", &[(2000, 100.0)]);
        assert!(matches!(
            compute_cagr(&one),
            Err(TransformError::InsufficientData { found: 1, .. })
        ));
        let zero = series("AAA", &[(2000, 0.0), (2001, 5.0)]);
        assert!(matches!(
            compute_cagr(&zero),
            Err(TransformError::DivisionByZero { year: 2000, .. })
        ));
        let neg = series("AAA", &[(2000, -3.0), (2001, 5.0)]);
        assert!(matches!(
            compute_cagr(&neg),
            Err(TransformError::DivisionByZero { .. })
        ));
        let neg_end = series("AAA", &[(2000, 3.0), (2001, -5.0)]);
        assert!(matches!(
            compute_cagr(&neg_end),
            Err(TransformError::NegativeValue { year: 2001, .. })
        ));
    }

    #[test]
    fn cagr_of_collapse_to_zero_is_minus_one() {
        let s = series("AAA", &[(2000, 10.0), (2005, 0.0)]);
        assert_eq!(compute_cagr(&s).unwrap(), -1.0);
    }

    #[test]
    fn cagr_keeps_the_sign_of_tiny_growth() {
        let up = series("AAA", &[(2000, 1.0), (2010, 1.0 + f64::EPSILON)]);
        assert!(compute_cagr(&up).unwrap() > 0.0);

        let big = 3.0e12;
        let down = series("AAA", &[(2000, big), (2001, big - big * f64::EPSILON)]);
        assert!(compute_cagr(&down).unwrap() < 0.0);

        let flat = series("AAA", &[(2000, 7.0), (2004, 7.0)]);
        assert_eq!(compute_cagr(&flat).unwrap(), 0.0);
    }

    #[test]
    fn cagr_with_extreme_magnitudes() {
        // The ratio overflows but the yearly rate over a century does not.
        let s = series("AAA", &[(1900, 1e-300), (2000, 1e300)]);
        let cagr = compute_cagr(&s).unwrap();
        assert!(cagr.is_finite());
        assert!((cagr - (1e6f64.ln()).exp_m1()).abs() / cagr < 1e-9);

        let s = series("AAA", &[(2000, 1e-300), (2001, 1e300)]);
        assert_eq!(
            compute_cagr(&s),
            Err(TransformError::GrowthOverflow {
                country: "AAA".into(),
                start: 2000,
                end: 2001
            })
        );
        assert!(matches!(
            growth_multiple(&s),
            Err(TransformError::GrowthOverflow { .. })
        ));

        let s = series("AAA", &[(2000, 1e300), (2001, 1e-300)]);
        let cagr = compute_cagr(&s).unwrap();
        assert!(cagr > -1.0 - 1e-12 && cagr < 0.0);
    }

    #[test]
    fn filter_range_is_inclusive() {
        let s = series("AAA", &[(1999, 1.0), (2000, 2.0), (2001, 3.0), (2002, 4.0)]);
        let f = filter_range(&s, 2000, 2001).unwrap();
        assert_eq!(f.years().collect::<Vec<_>>(), vec![2000, 2001]);
        assert_eq!(f.country(), "AAA");
    }

    #[test]
    fn filter_range_fails_on_inverted_or_empty_range() {
        let s = series("AAA", &[(2000, 1.0)]);
        assert_eq!(
            filter_range(&s, 2001, 2000),
            Err(TransformError::EmptyRange {
                start: 2001,
                end: 2000
            })
        );
        assert!(matches!(
            filter_range(&s, 2010, 2020),
            Err(TransformError::EmptyRange { .. })
        ));
    }

    #[test]
    fn index_starts_at_one_hundred() {
        let s = series("AAA", &[(2000, 50.0), (2001, 75.0), (2002, 25.0)]);
        let idx = to_index(&s).unwrap();
        assert_eq!(idx.base_year, 2000);
        let values: Vec<f64> = idx.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 150.0, 50.0]);
    }

    #[test]
    fn index_rejects_zero_base() {
        let s = series("AAA", &[(2000, 0.0), (2001, 75.0)]);
        assert!(matches!(
            to_index(&s),
            Err(TransformError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn growth_multiple_is_last_over_first() {
        let s = series("AAA", &[(2000, 40.0), (2001, 50.0), (2002, 60.0)]);
        assert!((growth_multiple(&s).unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn group_by_country_sorts_and_isolates_bad_series() {
        let rows = vec![
            Observation::new("BBB", 2001, 2.0),
            Observation::new("aaa", 2001, 2.0),
            Observation::new("bbb", 2000, 1.0),
            Observation::new("CCC", 2001, 2.0),
            Observation::new("CCC", 2001, 3.0),
            Observation::new("DDD", 2000, f64::NAN),
        ];
        let g = group_by_country(&rows);
        assert_eq!(
            g.keys().cloned().collect::<Vec<_>>(),
            vec!["AAA", "BBB", "CCC", "DDD"]
        );
        let bbb = g["BBB"].as_ref().unwrap();
        assert_eq!(bbb.years().collect::<Vec<_>>(), vec![2000, 2001]);
        assert!(bbb.points().iter().all(|p| p.country == "BBB"));
        assert_eq!(g["AAA"].as_ref().unwrap().country(), "AAA");
        assert!(matches!(
            g["CCC"],
            Err(TransformError::DuplicateYear { year: 2001, .. })
        ));
        assert!(matches!(
            g["DDD"],
            Err(TransformError::NonFiniteValue { year: 2000, .. })
        ));
    }

    #[test]
    fn pivot_aligns_years_and_reports_skipped() {
        let a = series("AAA", &[(2000, 10.0), (2002, 20.0)]);
        let b = series("BBB", &[(2001, 0.0), (2002, 1.0)]);

        let abs = pivot([&a, &b], DisplayMode::Absolute);
        assert_eq!(abs.years, vec![2000, 2001, 2002]);
        assert_eq!(abs.columns[0].values, vec![Some(10.0), None, Some(20.0)]);
        assert_eq!(abs.columns[1].values, vec![None, Some(0.0), Some(1.0)]);
        assert_eq!(abs.value_bounds(), Some((0.0, 20.0)));

        let idx = pivot([&a, &b], DisplayMode::Index);
        assert_eq!(idx.columns.len(), 1);
        assert_eq!(idx.years, vec![2000, 2002]);
        assert_eq!(idx.columns[0].values, vec![Some(100.0), Some(200.0)]);
        assert_eq!(idx.skipped.len(), 1);
        assert_eq!(idx.skipped[0].country, "BBB");
    }
}
