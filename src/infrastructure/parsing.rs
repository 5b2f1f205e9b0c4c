//! HTML parsing for salary pages
//!
//! Two parsers live here: one picks the first listing from a keyword search
//! page, the other pulls the occupation record out of a profile page's
//! structured-data block. Selectors come from [`ParsingConfig`].

pub mod config;
pub mod error;
pub mod search_results;
pub mod structured_data;

// Re-export public types
pub use config::ParsingConfig;
pub use error::{ExtractionError, ExtractionResult, ResolutionError, SelectorError};
pub use search_results::SearchResultParser;
pub use structured_data::StructuredDataExtractor;
