//! # Crawl Orchestrator
//!
//! Drives the (job title × city) loop strictly in input order. Every
//! per-record failure becomes a skip event; only the caller decides what a
//! failed persist means.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::events::{PipelineEvent, PipelineStage, RunObserver, TracingObserver};
use crate::domain::salary_record::{OutputBatch, ProfileReference};
use crate::infrastructure::config::EmptyRecordPolicy;
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::pacing::PacingController;
use crate::infrastructure::parsing::StructuredDataExtractor;
use crate::infrastructure::profile_resolver::{city_url, ProfileResolver};
use crate::infrastructure::retry::{fetch_with_retry, RetryPolicy};
use crate::infrastructure::storage::{PersistReport, RecordStore};

/// Records gathered by [`CrawlOrchestrator::collect`]
#[derive(Debug, Default)]
pub struct Collection {
    pub batch: OutputBatch,
    /// (job title, city) pairs that produced no record
    pub skipped: usize,
}

/// Outcome of a full run
#[derive(Debug)]
pub struct RunReport {
    pub batch: OutputBatch,
    pub persist: PersistReport,
    pub skipped: usize,
}

impl RunReport {
    /// False when any sink failed; the batch is still available for a retry
    pub fn is_success(&self) -> bool {
        self.persist.is_success()
    }
}

pub struct CrawlOrchestrator {
    resolver: Box<dyn ProfileResolver>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: StructuredDataExtractor,
    pacing: PacingController,
    retry: RetryPolicy,
    empty_record_policy: EmptyRecordPolicy,
    observer: Arc<dyn RunObserver>,
}

/// Position of the current pair within the run, for progress events
struct Progress {
    position: usize,
    total: usize,
    requests: u64,
}

impl CrawlOrchestrator {
    pub fn new(
        resolver: Box<dyn ProfileResolver>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: StructuredDataExtractor,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            extractor,
            pacing: PacingController::default(),
            retry: RetryPolicy::default(),
            empty_record_policy: EmptyRecordPolicy::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: PacingController) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_empty_record_policy(mut self, policy: EmptyRecordPolicy) -> Self {
        self.empty_record_policy = policy;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Collect, then hand the whole batch to `store` once
    pub async fn run(&self, job_titles: &[String], cities: &[String], store: &RecordStore) -> RunReport {
        let Collection { batch, skipped } = self.collect(job_titles, cities).await;

        let persist = store.persist(&batch, self.observer.as_ref()).await;
        self.observer.on_event(&PipelineEvent::RunFinished {
            records: batch.len(),
            skipped,
        });

        RunReport {
            batch,
            persist,
            skipped,
        }
    }

    /// Resolve every job title and fetch every city under it, in input order
    pub async fn collect(&self, job_titles: &[String], cities: &[String]) -> Collection {
        let observer = self.observer.as_ref();
        observer.on_event(&PipelineEvent::RunStarted {
            job_titles: job_titles.len(),
            cities: cities.len(),
        });

        let mut collection = Collection::default();
        let mut progress = Progress {
            position: 0,
            total: job_titles.len() * cities.len(),
            requests: 0,
        };

        for job_title in job_titles {
            let Some(profile) = self.resolve_profile(job_title, &mut progress).await else {
                collection.skipped += cities.len();
                progress.position += cities.len();
                continue;
            };

            for city in cities {
                progress.position += 1;
                self.collect_city(&profile, city, &mut progress, &mut collection).await;
            }
        }

        info!(
            "Collected {} records, skipped {} of {} pairs after {} requests",
            collection.batch.len(),
            collection.skipped,
            progress.total,
            progress.requests
        );
        collection
    }

    async fn resolve_profile(&self, job_title: &str, progress: &mut Progress) -> Option<ProfileReference> {
        let observer = self.observer.as_ref();
        if job_title.trim().is_empty() {
            observer.on_event(&PipelineEvent::ProfileSkipped {
                job_title: job_title.to_string(),
                reason: "empty job title".to_string(),
            });
            return None;
        }

        let resolved = self.resolver.resolve(job_title).await;
        if self.resolver.issues_request() {
            progress.requests += 1;
            self.pacing.wait(progress.requests, observer).await;
        }

        match resolved {
            Ok(profile) => {
                observer.on_event(&PipelineEvent::ProfileResolved {
                    job_title: job_title.to_string(),
                    url: profile.url.clone(),
                });
                Some(profile)
            }
            Err(e) => {
                observer.on_event(&PipelineEvent::ProfileSkipped {
                    job_title: job_title.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    async fn collect_city(
        &self,
        profile: &ProfileReference,
        city: &str,
        progress: &mut Progress,
        collection: &mut Collection,
    ) {
        let observer = self.observer.as_ref();
        let skip = |stage: PipelineStage, reason: String| PipelineEvent::RecordSkipped {
            job_title: profile.job_title.clone(),
            city: city.to_string(),
            stage,
            reason,
        };

        if city.trim().is_empty() {
            observer.on_event(&skip(PipelineStage::Fetch, "empty city".to_string()));
            collection.skipped += 1;
            return;
        }

        let url = match city_url(profile, city) {
            Ok(url) => url,
            Err(e) => {
                observer.on_event(&skip(PipelineStage::Resolution, e.to_string()));
                collection.skipped += 1;
                return;
            }
        };

        let fetched = fetch_with_retry(self.fetcher.as_ref(), &url, &self.retry, observer).await;
        progress.requests += 1;

        let outcome = fetched
            .map_err(|e| (PipelineStage::Fetch, e.to_string()))
            .and_then(|html| {
                self.extractor
                    .extract(&html)
                    .map_err(|e| (PipelineStage::Extraction, e.to_string()))
            });

        match outcome {
            Ok(record)
                if record.has_no_percentiles()
                    && self.empty_record_policy == EmptyRecordPolicy::Discard =>
            {
                observer.on_event(&skip(
                    PipelineStage::Extraction,
                    "no salary percentiles on page".to_string(),
                ));
                collection.skipped += 1;
            }
            Ok(record) => {
                if !record.percentiles_ordered() {
                    debug!("Percentiles out of order for {} @ {}: {:?}", profile.job_title, city, record.percentiles());
                }
                collection.batch.push(record);
                observer.on_event(&PipelineEvent::RecordCollected {
                    job_title: profile.job_title.clone(),
                    city: city.to_string(),
                    position: progress.position,
                    total: progress.total,
                });
            }
            Err((stage, reason)) => {
                observer.on_event(&skip(stage, reason));
                collection.skipped += 1;
            }
        }

        self.pacing.wait(progress.requests, observer).await;
    }
}
