//! Structured-data extraction for salary profile pages
//!
//! Profile pages embed an `application/ld+json` block describing the
//! occupation. The first block matching the occupation marker is parsed and
//! mapped field by field; a missing field falls back to the `N/A` marker
//! instead of failing the record.

#![allow(clippy::uninlined_format_args)]

use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

use super::config::ParsingConfig;
use super::error::{ExtractionError, ExtractionResult, SelectorError};
use crate::domain::salary_record::{parse_numeric_text, Percentile, SalaryRecord, MISSING_FIELD_MARKER};

/// Extracts a [`SalaryRecord`] from a profile page
pub struct StructuredDataExtractor {
    script_selector: Selector,
    occupation_marker: Regex,
}

impl StructuredDataExtractor {
    /// Create an extractor with default selectors
    pub fn new() -> Result<Self, SelectorError> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> Result<Self, SelectorError> {
        let script_selector =
            Selector::parse(&config.structured_data_script).map_err(|e| SelectorError {
                selector: config.structured_data_script.clone(),
                reason: e.to_string(),
            })?;
        let occupation_marker = RegexBuilder::new(&regex::escape(&config.occupation_marker))
            .case_insensitive(true)
            .build()
            .map_err(|e| SelectorError {
                selector: config.occupation_marker.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            script_selector,
            occupation_marker,
        })
    }

    /// Text of the first structured-data block mentioning the occupation marker
    pub fn find_block(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.script_selector)
            .map(|script| script.text().collect::<String>())
            .find(|text| self.occupation_marker.is_match(text))
    }

    pub fn extract(&self, html: &str) -> ExtractionResult<SalaryRecord> {
        let block = self.find_block(html).ok_or(ExtractionError::NoStructuredData)?;

        let payload: Value = serde_json::from_str(block.trim())
            .map_err(|e| ExtractionError::MalformedPayload(e.to_string()))?;
        let occupation = self.select_occupation(&payload).ok_or_else(|| {
            ExtractionError::MalformedPayload("expected a JSON object".to_string())
        })?;

        let record = map_occupation(occupation);
        debug!(
            "Extracted '{}' @ '{}' ({} of 5 percentiles)",
            record.job_title,
            record.job_location,
            record.percentiles().iter().filter(|p| p.is_present()).count()
        );
        Ok(record)
    }

    /// The payload is usually one object; for an array, prefer the element typed as an occupation
    fn select_occupation<'a>(&self, payload: &'a Value) -> Option<&'a Map<String, Value>> {
        match payload {
            Value::Object(object) => Some(object),
            Value::Array(items) => {
                let objects = items.iter().filter_map(Value::as_object);
                let mut fallback = None;
                for object in objects {
                    let typed = object
                        .get("@type")
                        .and_then(Value::as_str)
                        .is_some_and(|t| self.occupation_marker.is_match(t));
                    if typed {
                        return Some(object);
                    }
                    if fallback.is_none() {
                        fallback = Some(object);
                    }
                }
                fallback
            }
            _ => None,
        }
    }
}

/// Map an occupation object to a record, defaulting each field independently
fn map_occupation(occupation: &Map<String, Value>) -> SalaryRecord {
    let location = first_entry(occupation.get("occupationLocation"));
    let salary = first_entry(occupation.get("estimatedSalary"));
    let percentile = |key: &str| -> Percentile {
        Percentile(salary.and_then(|s| s.get(key)).and_then(numeric_value))
    };

    SalaryRecord {
        job_title: text_or_marker(occupation.get("name")),
        job_location: text_or_marker(location.and_then(|l| l.get("name"))),
        job_description: text_or_marker(occupation.get("description")),
        n_tile_10: percentile("percentile10"),
        n_tile_25: percentile("percentile25"),
        n_tile_50: percentile("median"),
        n_tile_75: percentile("percentile75"),
        n_tile_90: percentile("percentile90"),
    }
}

/// First element of a list, or the value itself when it is a single object
fn first_entry(value: Option<&Value>) -> Option<&Map<String, Value>> {
    match value? {
        Value::Array(items) => items.first().and_then(Value::as_object),
        Value::Object(object) => Some(object),
        _ => None,
    }
}

/// Present text is kept verbatim, even when empty; only absent or null fields get the marker
fn text_or_marker(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => MISSING_FIELD_MARKER.to_string(),
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_text(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn page(block: &str) -> String {
        format!(
            r#"<html><head>
            <script type="application/ld+json">{{"@context":"https://schema.org","@type":"WebSite","name":"Salary"}}</script>
            <script type="application/ld+json">{block}</script>
            </head><body><p>profile</p></body></html>"#
        )
    }

    const FULL_BLOCK: &str = r#"{
        "@context": "http://schema.org/",
        "@type": "Occupation",
        "name": "Senior Accountant",
        "description": "Prepares and analyzes financial statements.",
        "occupationLocation": [{"@type": "City", "name": "Columbus, OH"}],
        "estimatedSalary": [{
            "@type": "MonetaryAmountDistribution",
            "name": "base",
            "currency": "USD",
            "percentile10": 70123,
            "percentile25": 76000.5,
            "median": 83250,
            "percentile75": 91000,
            "percentile90": 98765
        }]
    }"#;

    #[test]
    fn test_extracts_all_fields() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let record = extractor.extract(&page(FULL_BLOCK)).unwrap();

        assert_eq!(record.job_title, "Senior Accountant");
        assert_eq!(record.job_location, "Columbus, OH");
        assert_eq!(record.job_description, "Prepares and analyzes financial statements.");
        assert_eq!(record.n_tile_10.value(), Some(70123.0));
        assert_eq!(record.n_tile_25.value(), Some(76000.5));
        assert_eq!(record.n_tile_50.value(), Some(83250.0));
        assert_eq!(record.n_tile_75.value(), Some(91000.0));
        assert_eq!(record.n_tile_90.value(), Some(98765.0));
        assert!(record.percentiles_ordered());
    }

    #[test]
    fn test_missing_block_is_reported() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let html = r#"<html><script type="application/ld+json">{"@type":"WebSite"}</script></html>"#;
        assert_eq!(extractor.extract(html), Err(ExtractionError::NoStructuredData));
        assert_eq!(
            extractor.extract(html).unwrap_err().to_string(),
            "no structured data block"
        );
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let block = r#"{"@type":"OCCUPATION","name":"Nurse"}"#;
        let record = extractor.extract(&page(block)).unwrap();
        assert_eq!(record.job_title, "Nurse");
    }

    #[test]
    fn test_malformed_payload_is_reported() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let err = extractor
            .extract(&page(r#"{"@type": "Occupation", "name": "#))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedPayload(_)));
        assert!(err.to_string().starts_with("malformed payload"));
    }

    #[test]
    fn test_scalar_payload_is_malformed() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let err = extractor.extract(&page(r#""Occupation""#)).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedPayload(_)));
    }

    #[test]
    fn test_empty_object_defaults_everything() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let record = extractor.extract(&page(r#"{"@type":"Occupation"}"#)).unwrap();
        assert_eq!(record, SalaryRecord::default());
        assert!(record.has_no_percentiles());
    }

    #[test]
    fn test_present_text_is_kept_verbatim() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let block = r#"{
            "@type": "Occupation",
            "name": "  Line Cook ",
            "description": "",
            "occupationLocation": [{"name": null}]
        }"#;
        let record = extractor.extract(&page(block)).unwrap();
        assert_eq!(record.job_title, "  Line Cook ");
        assert_eq!(record.job_description, "");
        assert_eq!(record.job_location, MISSING_FIELD_MARKER);
    }

    #[test]
    fn test_numeric_strings_and_single_objects_are_accepted() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let block = r#"{
            "@type": "Occupation",
            "occupationLocation": {"name": "Springfield, IL"},
            "estimatedSalary": {"percentile10": "50,000", "median": "61000.25", "percentile90": "n/a"}
        }"#;
        let record = extractor.extract(&page(block)).unwrap();
        assert_eq!(record.job_location, "Springfield, IL");
        assert_eq!(record.n_tile_10.value(), Some(50000.0));
        assert_eq!(record.n_tile_50.value(), Some(61000.25));
        assert_eq!(record.n_tile_90.value(), None);
    }

    #[test]
    fn test_array_payload_prefers_occupation_entry() {
        let extractor = StructuredDataExtractor::new().unwrap();
        let block = r#"[{"@type":"BreadcrumbList","name":"crumbs"},{"@type":"Occupation","name":"Welder"}]"#;
        let record = extractor.extract(&page(block)).unwrap();
        assert_eq!(record.job_title, "Welder");
    }

    #[rstest]
    #[case("percentile10")]
    #[case("percentile25")]
    #[case("median")]
    #[case("percentile75")]
    #[case("percentile90")]
    fn test_each_percentile_defaults_independently(#[case] dropped: &str) {
        let mut payload: Value = serde_json::from_str(FULL_BLOCK).unwrap();
        payload["estimatedSalary"][0]
            .as_object_mut()
            .unwrap()
            .remove(dropped);

        let extractor = StructuredDataExtractor::new().unwrap();
        let record = extractor.extract(&page(&payload.to_string())).unwrap();

        let keys = ["percentile10", "percentile25", "median", "percentile75", "percentile90"];
        for (key, value) in keys.iter().zip(record.percentiles()) {
            assert_eq!(value.is_present(), *key != dropped, "field {key}");
        }
        assert_eq!(record.job_title, "Senior Accountant");
    }
}
