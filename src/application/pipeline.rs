//! Pipeline assembly
//!
//! Turns an [`AppConfig`] into a wired [`CrawlOrchestrator`] plus
//! [`RecordStore`] and runs it. Inputs are loaded before anything touches
//! the network, so a missing input file aborts the run with no requests.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::orchestrator::{CrawlOrchestrator, RunReport};
use crate::domain::events::{RunObserver, TracingObserver};
use crate::infrastructure::config::{AppConfig, ConfigError};
use crate::infrastructure::http_client::{FetchError, HttpClient, PageFetcher};
use crate::infrastructure::input::{load_tokens, InputError};
use crate::infrastructure::pacing::PacingController;
use crate::infrastructure::parsing::{ResolutionError, SelectorError, StructuredDataExtractor};
use crate::infrastructure::profile_resolver::resolver_for;
use crate::infrastructure::retry::RetryPolicy;
use crate::infrastructure::storage::RecordStore;

/// Errors that stop a run before the first request
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] FetchError),

    #[error("Resolver setup failed: {0}")]
    Resolver(#[from] ResolutionError),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

pub struct SalaryPipeline {
    config: AppConfig,
    observer: Arc<dyn RunObserver>,
}

impl SalaryPipeline {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Job titles from the configured file if any, else the inline list; then cities
    pub async fn load_inputs(&self) -> Result<(Vec<String>, Vec<String>), PipelineError> {
        let input = &self.config.input;
        let job_titles = match &input.job_titles_file {
            Some(path) => load_tokens(path).await?,
            None => input
                .job_titles
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        };
        let cities = load_tokens(&input.cities_file).await?;
        Ok((job_titles, cities))
    }

    /// Run against the live site
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        self.config.validate()?;
        let (job_titles, cities) = self.load_inputs().await?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpClient::with_config(self.config.http.clone())?);
        self.execute(fetcher, &job_titles, &cities).await
    }

    /// Run with a caller-supplied fetcher
    pub async fn run_with_fetcher(&self, fetcher: Arc<dyn PageFetcher>) -> Result<RunReport, PipelineError> {
        self.config.validate()?;
        let (job_titles, cities) = self.load_inputs().await?;
        self.execute(fetcher, &job_titles, &cities).await
    }

    async fn execute(
        &self,
        fetcher: Arc<dyn PageFetcher>,
        job_titles: &[String],
        cities: &[String],
    ) -> Result<RunReport, PipelineError> {
        let config = &self.config;
        let store = RecordStore::from_config(&config.output);
        let resolver = resolver_for(
            config.resolution.strategy,
            &config.site,
            &config.parsing,
            fetcher.clone(),
        )?;
        let extractor = StructuredDataExtractor::with_config(&config.parsing)?;

        let orchestrator = CrawlOrchestrator::new(resolver, fetcher, extractor)
            .with_pacing(PacingController::from_config(&config.pacing))
            .with_retry(RetryPolicy::from_config(&config.retry))
            .with_empty_record_policy(config.extraction.empty_record_policy)
            .with_observer(self.observer.clone());

        info!(
            "🚀 Starting run: {} job titles × {} cities, {:?} resolution, sinks {:?}",
            job_titles.len(),
            cities.len(),
            config.resolution.strategy,
            config.output.sinks
        );
        Ok(orchestrator.run(job_titles, cities, &store).await)
    }
}
