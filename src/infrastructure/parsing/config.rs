//! Parsing configuration for HTML extraction
//!
//! Centralized selectors and markers for the search listing and the
//! structured-data block.

use serde::{Deserialize, Serialize};

/// Main parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Listing container on the search results page
    pub listing_container: String,

    /// Link inside a listing container
    pub listing_anchor: String,

    /// Script elements carrying structured data
    pub structured_data_script: String,

    /// Case-insensitive pattern a structured-data block must contain
    pub occupation_marker: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            listing_container: "div.margin-bottom5.font-semibold".to_string(),
            listing_anchor: "a[href]".to_string(),
            structured_data_script: r#"script[type="application/ld+json"]"#.to_string(),
            occupation_marker: "Occupation".to_string(),
        }
    }
}
