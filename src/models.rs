use crate::error::TransformError;
use serde::{Deserialize, Serialize};

/// World Bank indicator for GDP in current US$.
pub const GDP_INDICATOR: &str = "NY.GDP.MKTP.CD";

/// Inclusive year range like 2000..=2020.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// `start:end`, the form the World Bank API expects for `date=`.
    pub fn to_query_param(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }

    /// Parse `YYYY` or `YYYY:YYYY`.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some((a, b)) = s.split_once(':') {
            let start = a.trim().parse::<i32>().ok()?;
            let end = b.trim().parse::<i32>().ok()?;
            Some(Self { start, end })
        } else {
            s.trim().parse::<i32>().ok().map(|y| Self { start: y, end: y })
        }
    }
}

/// How chart values are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Raw GDP in US$.
    #[default]
    Absolute,
    /// Base 100 at the first year in range.
    Index,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
}

/// One GDP observation (one row of the tidy table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: String,
    pub year: i32,
    /// GDP in US$.
    pub gdp: f64,
}

impl Observation {
    pub fn new(country: impl Into<String>, year: i32, gdp: f64) -> Self {
        Self {
            country: country.into(),
            year,
            gdp,
        }
    }
}

/// Observations of a single country with strictly increasing years.
///
/// The invariant is checked on construction, so every `Series` in the crate is
/// ordered, duplicate-free and finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    country: String,
    points: Vec<Observation>,
}

impl Series {
    /// Build from observations already ordered by year.
    pub fn new(country: impl Into<String>, points: Vec<Observation>) -> Result<Self, TransformError> {
        let country = country.into();
        let mut prev: Option<i32> = None;
        for p in &points {
            if p.country != country {
                return Err(TransformError::MixedCountries {
                    expected: country,
                    found: p.country.clone(),
                });
            }
            if !p.gdp.is_finite() {
                return Err(TransformError::NonFiniteValue {
                    country,
                    year: p.year,
                });
            }
            match prev {
                Some(y) if y == p.year => {
                    return Err(TransformError::DuplicateYear {
                        country,
                        year: p.year,
                    });
                }
                Some(y) if y > p.year => {
                    return Err(TransformError::UnorderedYears {
                        country,
                        year: p.year,
                    });
                }
                _ => {}
            }
            prev = Some(p.year);
        }
        Ok(Self { country, points })
    }

    /// Sort by year, then validate.
    pub fn from_unsorted(
        country: impl Into<String>,
        mut points: Vec<Observation>,
    ) -> Result<Self, TransformError> {
        points.sort_by_key(|p| p.year);
        Self::new(country, points)
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().map(|p| p.year)
    }

    pub fn into_points(self) -> Vec<Observation> {
        self.points
    }
}

/// A single indexed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexedPoint {
    pub year: i32,
    pub value: f64,
}

/// A series rescaled so that its first year equals 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedSeries {
    pub country: String,
    pub base_year: i32,
    pub base_value: f64,
    pub points: Vec<IndexedPoint>,
}

/// Growth summary for one country over the selected range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub country: String,
    pub cagr: f64,
}

/// Metadata section returned by the API (position 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub page: u32,
    pub pages: u32,
    /// Some responses encode `per_page` as a string, others as a number.
    #[serde(deserialize_with = "de_u32_from_string_or_number")]
    pub per_page: u32,
    pub total: u32,
}

/// Serde helper: parse `u32` from either a JSON number or a string.
fn de_u32_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U32Visitor;

    impl Visitor<'_> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer representing a non-negative number")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(v).map_err(E::custom)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(v).map_err(|_| E::custom("value out of range for u32"))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim().parse::<u32>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U32Visitor)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeName {
    pub id: String,
    pub value: String,
}

/// Raw entry from the API (position 1 array).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub indicator: CodeName,
    pub country: CodeName,
    #[serde(default)]
    pub countryiso3code: String,
    pub date: String,
    pub value: Option<f64>,
}

impl Entry {
    /// Convert to a tidy observation. Entries without a value or a numeric year
    /// are missing data and yield `None`.
    pub fn to_observation(&self) -> Option<Observation> {
        self.to_observation_for(&[])
    }

    /// Like [`Entry::to_observation`], keyed by the code the caller asked for.
    ///
    /// The API answers ISO2 requests ("DE") with ISO3 rows ("DEU"); when only the
    /// API's own id was requested, that id is kept so the row matches the request.
    pub fn to_observation_for(&self, requested: &[String]) -> Option<Observation> {
        let year = self.date.trim().parse::<i32>().ok()?;
        let gdp = self.value?;
        Some(Observation {
            country: self.country_code(requested),
            year,
            gdp,
        })
    }

    fn country_code(&self, requested: &[String]) -> String {
        let asked = |code: &str| requested.iter().any(|r| r.trim().eq_ignore_ascii_case(code));
        let iso3 = self.countryiso3code.trim();
        let id = self.country.id.trim();
        if !iso3.is_empty() && asked(iso3) {
            iso3.to_string()
        } else if !id.is_empty() && asked(id) {
            id.to_ascii_uppercase()
        } else if iso3.is_empty() {
            // Some aggregates come back without an ISO3 code.
            id.to_string()
        } else {
            iso3.to_string()
        }
    }
}
