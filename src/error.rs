//! Errors raised by the transformation core.
//!
//! Every variant is a local computation failure. The `Display` text is what the
//! dashboard shows to the user in place of a value.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum TransformError {
    /// The requested range is inverted or no observation falls inside it.
    #[error("no data in range {start}-{end}")]
    EmptyRange { start: i32, end: i32 },

    /// The base (first) value of a series is zero, or not positive where a ratio is taken.
    #[error("base value for {country} in {year} is {value}, cannot divide by it")]
    DivisionByZero {
        country: String,
        year: i32,
        value: f64,
    },

    /// A growth rate needs at least two observations.
    #[error("need at least 2 observations for {country}, got {found}")]
    InsufficientData { country: String, found: usize },

    /// The end value of a growth computation is negative.
    #[error("end value for {country} in {year} is negative ({value})")]
    NegativeValue {
        country: String,
        year: i32,
        value: f64,
    },

    /// The growth between two finite values does not fit in an `f64`.
    #[error("growth for {country} from {start} to {end} is too large to represent")]
    GrowthOverflow {
        country: String,
        start: i32,
        end: i32,
    },

    #[error("duplicate year {year} for {country}")]
    DuplicateYear { country: String, year: i32 },

    #[error("years for {country} are not increasing at {year}")]
    UnorderedYears { country: String, year: i32 },

    #[error("series for {expected} contains an observation for {found}")]
    MixedCountries { expected: String, found: String },

    #[error("value for {country} in {year} is not a finite number")]
    NonFiniteValue { country: String, year: i32 },
}
