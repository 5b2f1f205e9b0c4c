//! Search results page parser
//!
//! Picks the first listing on a keyword search page and returns its link
//! as an absolute URL.

use scraper::{Html, Selector};
use url::Url;

use super::config::ParsingConfig;
use super::error::{ResolutionError, SelectorError};

pub struct SearchResultParser {
    container: Selector,
    anchor: Selector,
}

impl SearchResultParser {
    pub fn new() -> Result<Self, SelectorError> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> Result<Self, SelectorError> {
        let parse = |selector: &str| {
            Selector::parse(selector).map_err(|e| SelectorError {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
        };

        Ok(Self {
            container: parse(&config.listing_container)?,
            anchor: parse(&config.listing_anchor)?,
        })
    }

    /// Absolute URL of the first listing on `page_url`.
    ///
    /// Relative links are resolved against the search page itself.
    pub fn first_listing_url(&self, html: &str, page_url: &str) -> Result<String, ResolutionError> {
        let href = {
            let document = Html::parse_document(html);
            let container = document
                .select(&self.container)
                .next()
                .ok_or_else(|| ResolutionError::NoListing {
                    url: page_url.to_string(),
                })?;
            container
                .select(&self.anchor)
                .find_map(|a| a.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(ToString::to_string)
                .ok_or_else(|| ResolutionError::NoAnchor {
                    url: page_url.to_string(),
                })?
        };

        let base = Url::parse(page_url).map_err(|e| ResolutionError::InvalidLink {
            input: page_url.to_string(),
            reason: e.to_string(),
        })?;
        let resolved = base.join(&href).map_err(|e| ResolutionError::InvalidLink {
            input: href.clone(),
            reason: e.to_string(),
        })?;

        Ok(resolved.to_string())
    }
}
