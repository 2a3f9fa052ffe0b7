//! Property checks for the transformation core.

use gdp_dashboard::models::{Observation, Series};
use gdp_dashboard::storage::{from_csv, to_csv};
use gdp_dashboard::transform::{compute_cagr, filter_range, to_index};
use gdp_dashboard::TransformError;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

/// Build a valid series from (gap, value) pairs: years advance by 1..=5 from 1960.
fn series_from(raw: &[(u8, u16)]) -> Series {
    let mut year = 1960;
    let points = raw
        .iter()
        .map(|&(gap, v)| {
            year += i32::from(gap % 5) + 1;
            Observation::new("AAA", year, f64::from(v))
        })
        .collect();
    Series::new("AAA", points).unwrap()
}

#[quickcheck]
fn cagr_is_finite_and_follows_direction(raw: Vec<(u8, u16)>) -> TestResult {
    let s = series_from(&raw);
    let (Some(first), Some(last)) = (s.first(), s.last()) else {
        return TestResult::discard();
    };
    if s.len() < 2 || first.gdp <= 0.0 {
        return TestResult::discard();
    }
    let cagr = compute_cagr(&s).unwrap();
    let expected = (last.gdp - first.gdp).signum();
    let got = if cagr == 0.0 { 0.0 } else { cagr.signum() };
    let expected = if last.gdp == first.gdp { 0.0 } else { expected };
    TestResult::from_bool(cagr.is_finite() && got == expected)
}

fn sign_of(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v.signum() }
}

fn pair(v0: f64, v1: f64, years: i32) -> Series {
    Series::new(
        "AAA",
        vec![
            Observation::new("AAA", 2000, v0),
            Observation::new("AAA", 2000 + years, v1),
        ],
    )
    .unwrap()
}

#[quickcheck]
fn tiny_growth_keeps_its_sign(ulps: i16, gap: u8) -> bool {
    let v0 = 1.0;
    let v1 = 1.0 + f64::from(ulps) * f64::EPSILON / 2.0;
    let cagr = compute_cagr(&pair(v0, v1, i32::from(gap % 60) + 1)).unwrap();
    cagr.is_finite() && sign_of(cagr) == sign_of(v1 - v0)
}

#[quickcheck]
fn cagr_is_finite_across_magnitudes(e0: i16, e1: i16, gap: u8) -> bool {
    let v0 = 10f64.powi(i32::from(e0 % 300));
    let v1 = 10f64.powi(i32::from(e1 % 300));
    match compute_cagr(&pair(v0, v1, i32::from(gap % 50) + 1)) {
        Ok(cagr) => cagr.is_finite() && sign_of(cagr) == sign_of(v1 - v0),
        Err(TransformError::GrowthOverflow { .. }) => v1 > v0,
        Err(_) => false,
    }
}

#[quickcheck]
fn index_starts_at_exactly_one_hundred(raw: Vec<(u8, u16)>) -> TestResult {
    let s = series_from(&raw);
    match s.first() {
        Some(f) if f.gdp != 0.0 => {
            let idx = to_index(&s).unwrap();
            TestResult::from_bool(idx.points[0].value == 100.0 && idx.points.len() == s.len())
        }
        _ => TestResult::discard(),
    }
}

#[quickcheck]
fn filter_range_is_idempotent(raw: Vec<(u8, u16)>, a: u8, b: u8) -> bool {
    let s = series_from(&raw);
    let (start, end) = (1960 + i32::from(a), 1960 + i32::from(b));
    match filter_range(&s, start, end) {
        Ok(once) => filter_range(&once, start, end) == Ok(once.clone()),
        Err(e) => matches!(e, TransformError::EmptyRange { .. }),
    }
}

#[quickcheck]
fn csv_round_trip_preserves_rows(rows: Vec<(String, i16, i32)>) -> bool {
    let obs: Vec<Observation> = rows
        .into_iter()
        .map(|(c, y, v)| Observation::new(c, i32::from(y), f64::from(v) / 8.0))
        .collect();
    let bytes = to_csv(&obs).unwrap();
    let back = from_csv(&bytes).unwrap();
    back == obs && to_csv(&back).unwrap() == bytes
}

#[test]
fn doubling_in_ten_years() {
    let s = Series::new(
        "AAA",
        vec![
            Observation::new("AAA", 2000, 100.0),
            Observation::new("AAA", 2010, 200.0),
        ],
    )
    .unwrap();
    assert!((compute_cagr(&s).unwrap() - 0.0718).abs() < 1e-4);
}

#[test]
fn empty_filter_returns_error_only() {
    let s = Series::new("AAA", vec![Observation::new("AAA", 2000, 1.0)]).unwrap();
    let res = filter_range(&s, 2001, 2005);
    assert_eq!(
        res,
        Err(TransformError::EmptyRange {
            start: 2001,
            end: 2005
        })
    );
}
