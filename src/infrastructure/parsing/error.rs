//! Parsing error types
//!
//! Resolution and extraction failures are per-unit: the orchestrator logs
//! them and moves on to the next job title or city.

use thiserror::Error;

use crate::infrastructure::http_client::FetchError;

/// A job title could not be mapped to a profile page
#[derive(Error, Debug, Clone)]
pub enum ResolutionError {
    #[error("search request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("no listing container on search page {url}")]
    NoListing { url: String },

    #[error("first listing on {url} has no link")]
    NoAnchor { url: String },

    #[error("cannot build URL from '{input}': {reason}")]
    InvalidLink { input: String, reason: String },

    #[error("empty job title")]
    EmptyJobTitle,

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// A fetched page did not yield a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no structured data block")]
    NoStructuredData,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Failure of a parser's own setup, e.g. an invalid selector in configuration
#[derive(Error, Debug, Clone)]
#[error("Invalid CSS selector '{selector}': {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
