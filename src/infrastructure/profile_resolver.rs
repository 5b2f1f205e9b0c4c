//! Job title to profile page resolution
//!
//! Two strategies: build the profile URL from the title slug, or ask the
//! site's search and take the first listing. Both produce a
//! [`ProfileReference`]; city pages hang off the profile URL.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::domain::salary_record::{job_slug, ProfileReference};
use crate::infrastructure::config::{ResolutionStrategy, SiteConfig};
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::parsing::{ParsingConfig, ResolutionError, SearchResultParser};

#[async_trait]
pub trait ProfileResolver: Send + Sync {
    async fn resolve(&self, job_title: &str) -> Result<ProfileReference, ResolutionError>;

    /// Whether `resolve` sends a request, so callers can pace it
    fn issues_request(&self) -> bool;
}

/// Builds `{base}{profile_path}/{slug}-salary` without touching the network
#[derive(Debug, Clone)]
pub struct DirectTemplateResolver {
    base_url: String,
    profile_path: String,
}

impl DirectTemplateResolver {
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            base_url: site.base_url.trim_end_matches('/').to_string(),
            profile_path: site.profile_path.trim_end_matches('/').to_string(),
        }
    }

    /// The slug goes in as a single percent-encoded path segment
    pub fn profile_url(&self, job_title: &str) -> Result<String, ResolutionError> {
        let slug = job_slug(job_title);
        if slug.is_empty() {
            return Err(ResolutionError::EmptyJobTitle);
        }
        let raw = format!("{}{}", self.base_url, self.profile_path);
        let mut url = Url::parse(&raw).map_err(|e| ResolutionError::InvalidLink {
            input: raw.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| ResolutionError::InvalidLink {
                input: raw.clone(),
                reason: "URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .push(&format!("{slug}-salary"));
        Ok(url.to_string())
    }
}

#[async_trait]
impl ProfileResolver for DirectTemplateResolver {
    async fn resolve(&self, job_title: &str) -> Result<ProfileReference, ResolutionError> {
        let url = self.profile_url(job_title)?;
        debug!("Direct profile URL for '{}': {}", job_title, url);
        Ok(ProfileReference::new(job_title.trim(), url))
    }

    fn issues_request(&self) -> bool {
        false
    }
}

/// Queries the site search once per job title; no retry
pub struct SearchResolver {
    search_url: Url,
    fetcher: Arc<dyn PageFetcher>,
    parser: SearchResultParser,
}

impl SearchResolver {
    pub fn new(
        site: &SiteConfig,
        fetcher: Arc<dyn PageFetcher>,
        parser: SearchResultParser,
    ) -> Result<Self, ResolutionError> {
        let raw = format!("{}{}", site.base_url.trim_end_matches('/'), site.search_path);
        let search_url = Url::parse(&raw).map_err(|e| ResolutionError::InvalidLink {
            input: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            search_url,
            fetcher,
            parser,
        })
    }

    /// `?type=job&page=1&keyword=<title>`, spaces as `%20` the way the site's own search links are built
    pub fn search_url(&self, job_title: &str) -> String {
        let mut url = self.search_url.clone();
        let query = format!(
            "type=job&page=1&keyword={}",
            urlencoding::encode(job_title.trim())
        );
        url.set_query(Some(&query));
        url.to_string()
    }
}

#[async_trait]
impl ProfileResolver for SearchResolver {
    async fn resolve(&self, job_title: &str) -> Result<ProfileReference, ResolutionError> {
        if job_title.trim().is_empty() {
            return Err(ResolutionError::EmptyJobTitle);
        }

        let search_url = self.search_url(job_title);
        let html = self.fetcher.fetch(&search_url).await?;
        let url = self.parser.first_listing_url(&html, &search_url)?;
        debug!("Search resolved '{}' to {}", job_title, url);
        Ok(ProfileReference::new(job_title.trim(), url))
    }

    fn issues_request(&self) -> bool {
        true
    }
}

/// Resolver for the configured strategy
pub fn resolver_for(
    strategy: ResolutionStrategy,
    site: &SiteConfig,
    parsing: &ParsingConfig,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<Box<dyn ProfileResolver>, ResolutionError> {
    match strategy {
        ResolutionStrategy::Direct => Ok(Box::new(DirectTemplateResolver::new(site))),
        ResolutionStrategy::Search => {
            let parser = SearchResultParser::with_config(parsing)?;
            Ok(Box::new(SearchResolver::new(site, fetcher, parser)?))
        }
    }
}

/// City page under a profile: the city becomes one percent-encoded path segment
pub fn city_url(profile: &ProfileReference, city: &str) -> Result<String, ResolutionError> {
    let mut url = Url::parse(&profile.url).map_err(|e| ResolutionError::InvalidLink {
        input: profile.url.clone(),
        reason: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|()| ResolutionError::InvalidLink {
            input: profile.url.clone(),
            reason: "URL cannot have path segments".to_string(),
        })?
        .pop_if_empty()
        .push(city.trim());
    Ok(url.to_string())
}
