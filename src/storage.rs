use crate::models::Observation;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column order of the exported table.
pub const CSV_HEADER: [&str; 3] = ["country", "year", "gdp"];

/// Spreadsheet apps treat cells starting with these as formulas.
const FORMULA_TRIGGERS: [char; 6] = ['=', '+', '-', '@', '\t', '\r'];

/// A cell spreadsheets would evaluate, possibly behind earlier guard quotes.
fn needs_guard(s: &str) -> bool {
    s.starts_with(FORMULA_TRIGGERS)
        || s.strip_prefix('\'').is_some_and(needs_guard)
}

/// Prefix risky text cells with `'` so spreadsheets show them as text.
fn guard_cell(s: &str) -> String {
    if needs_guard(s) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

/// Inverse of `guard_cell`.
fn unguard_cell(s: &str) -> &str {
    match s.strip_prefix('\'') {
        Some(rest) if needs_guard(rest) => rest,
        _ => s,
    }
}

/// Encode observations as CSV bytes with header `country,year,gdp`.
pub fn to_csv(points: &[Observation]) -> Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    for p in points {
        wtr.serialize((guard_cell(&p.country), p.year, p.gdp))?;
    }
    wtr.into_inner().context("flush csv buffer")
}

/// Decode bytes produced by [`to_csv`]. Row order is preserved.
pub fn from_csv(bytes: &[u8]) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new().from_reader(bytes);
    let headers = rdr.headers().context("read csv header")?.clone();
    if headers.iter().map(str::trim).ne(CSV_HEADER) {
        anyhow::bail!(
            "unexpected csv header {:?}, expected {}",
            headers,
            CSV_HEADER.join(",")
        );
    }
    let mut out = Vec::new();
    for (i, rec) in rdr.deserialize::<(String, i32, f64)>().enumerate() {
        // Line 1 is the header.
        let (country, year, gdp) = rec.with_context(|| format!("parse csv line {}", i + 2))?;
        out.push(Observation {
            country: unguard_cell(&country).to_string(),
            year,
            gdp,
        });
    }
    Ok(out)
}

/// Save observations as CSV with header.
pub fn save_csv<P: AsRef<Path>>(points: &[Observation], path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_csv(points)?;
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    f.write_all(&bytes)?;
    Ok(())
}

/// Save any serializable value as pretty JSON.
pub fn save_json<T, P>(value: &T, path: P) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let pts = vec![Observation::new("DEU", 2000, 1.23e12)];
        save_csv(&pts, &csvp).unwrap();
        save_json(&pts, &jsonp).unwrap();
        assert!(csvp.exists());
        assert!(jsonp.exists());
    }

    #[test]
    fn header_and_column_order() {
        let bytes = to_csv(&[Observation::new("FRA", 2001, 1.5)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "country,year,gdp\nFRA,2001,1.5\n");
    }

    #[test]
    fn quoting_and_formula_guard_are_reversible() {
        let pts = vec![
            Observation::new("Korea, Rep.", 2000, 1.0),
            Observation::new("=cmd", 2001, 2.0),
            Observation::new("'plain", 2002, 3.0),
            Observation::new("'=quoted", 2003, 4.0),
        ];
        let bytes = to_csv(&pts).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"Korea, Rep.\""));
        assert!(text.contains("'=cmd"));
        assert!(text.contains("''=quoted"));
        assert_eq!(from_csv(&bytes).unwrap(), pts);
    }

    #[test]
    fn from_csv_rejects_foreign_header() {
        let err = from_csv(b"a,b,c\nx,1,2\n").unwrap_err();
        assert!(err.to_string().contains("unexpected csv header"));
    }
}
