//! Salary record entities
//!
//! A `SalaryRecord` is the unit of output: one job title at one location with
//! up to five reported salary percentiles. Every sink writes the same fixed
//! column order, see [`SINK_HEADERS`].

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Marker written for any field the source page did not provide
pub const MISSING_FIELD_MARKER: &str = "N/A";

/// Column headers shared by the delimited, spreadsheet and structured-text sinks
pub const SINK_HEADERS: [&str; 8] = [
    "Title",
    "Location",
    "Description",
    "nTile10",
    "nTile25",
    "nTile50",
    "nTile75",
    "nTile90",
];

/// Normalize a free-text job title into the slug used in profile URLs.
///
/// Whitespace runs become single hyphens and the result is lowercased,
/// e.g. `"Senior Accountant"` -> `"senior-accountant"`.
pub fn job_slug(job_title: &str) -> String {
    job_title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Resolved association between a job title and its canonical profile page.
///
/// Transient: produced once per job title per run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileReference {
    pub job_title: String,
    pub url: String,
}

impl ProfileReference {
    pub fn new(job_title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            job_title: job_title.into(),
            url: url.into(),
        }
    }
}

/// A single salary percentile value; `None` when the source omitted it.
///
/// File sinks render an absent value as [`MISSING_FIELD_MARKER`]; on the way
/// back in, the marker (or any non-numeric text) reads as absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Percentile(pub Option<f64>);

impl Percentile {
    pub const fn absent() -> Self {
        Self(None)
    }

    pub const fn value(self) -> Option<f64> {
        self.0
    }

    pub const fn is_present(self) -> bool {
        self.0.is_some()
    }
}

impl From<Option<f64>> for Percentile {
    fn from(value: Option<f64>) -> Self {
        Self(value)
    }
}

impl From<f64> for Percentile {
    fn from(value: f64) -> Self {
        Self(Some(value))
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str(MISSING_FIELD_MARKER),
        }
    }
}

impl Serialize for Percentile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(v) => serializer.serialize_f64(v),
            None => serializer.serialize_str(MISSING_FIELD_MARKER),
        }
    }
}

struct PercentileVisitor;

impl Visitor<'_> for PercentileVisitor {
    type Value = Percentile;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number or the '{MISSING_FIELD_MARKER}' marker")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Percentile, E> {
        Ok(Percentile(Some(v)))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Percentile, E> {
        Ok(Percentile(Some(v as f64)))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Percentile, E> {
        Ok(Percentile(Some(v as f64)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Percentile, E> {
        Ok(Percentile(parse_numeric_text(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Percentile, E> {
        Ok(Percentile(None))
    }

    fn visit_none<E: de::Error>(self) -> Result<Percentile, E> {
        Ok(Percentile(None))
    }
}

impl<'de> Deserialize<'de> for Percentile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PercentileVisitor)
    }
}

/// Parse a numeric string such as `"85,210.50"`; the marker and other text read as absent.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case(MISSING_FIELD_MARKER) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalized salary data for one job title at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRecord {
    #[serde(rename = "Title")]
    pub job_title: String,
    #[serde(rename = "Location")]
    pub job_location: String,
    #[serde(rename = "Description")]
    pub job_description: String,
    #[serde(rename = "nTile10")]
    pub n_tile_10: Percentile,
    #[serde(rename = "nTile25")]
    pub n_tile_25: Percentile,
    #[serde(rename = "nTile50")]
    pub n_tile_50: Percentile,
    #[serde(rename = "nTile75")]
    pub n_tile_75: Percentile,
    #[serde(rename = "nTile90")]
    pub n_tile_90: Percentile,
}

impl Default for SalaryRecord {
    fn default() -> Self {
        Self {
            job_title: MISSING_FIELD_MARKER.to_string(),
            job_location: MISSING_FIELD_MARKER.to_string(),
            job_description: MISSING_FIELD_MARKER.to_string(),
            n_tile_10: Percentile::absent(),
            n_tile_25: Percentile::absent(),
            n_tile_50: Percentile::absent(),
            n_tile_75: Percentile::absent(),
            n_tile_90: Percentile::absent(),
        }
    }
}

impl SalaryRecord {
    /// Percentiles in column order: 10, 25, 50, 75, 90
    pub const fn percentiles(&self) -> [Percentile; 5] {
        [
            self.n_tile_10,
            self.n_tile_25,
            self.n_tile_50,
            self.n_tile_75,
            self.n_tile_90,
        ]
    }

    /// True when the source provided none of the five percentiles
    pub fn has_no_percentiles(&self) -> bool {
        self.percentiles().iter().all(|p| !p.is_present())
    }

    /// Whether the present percentiles are non-decreasing.
    ///
    /// Absent values are ignored. This is a property to check, never a
    /// precondition: the extractor does not enforce it.
    pub fn percentiles_ordered(&self) -> bool {
        let present: Vec<f64> = self.percentiles().iter().filter_map(|p| p.value()).collect();
        present.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Ordered records produced within one run
pub type OutputBatch = Vec<SalaryRecord>;
