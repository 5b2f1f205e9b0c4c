//! Pipeline events
//!
//! The orchestrator reports progress, skips and failures through these events
//! instead of printing. Rendering is left to a [`RunObserver`].

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Stage of the acquisition pipeline an event or failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Resolving a job title to its profile page
    Resolution,
    /// Fetching a city page
    Fetch,
    /// Reading the structured-data block of a fetched page
    Extraction,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Resolution => "resolution",
            Self::Fetch => "fetch",
            Self::Extraction => "extraction",
        };
        f.write_str(name)
    }
}

/// Events emitted while a run progresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    RunStarted {
        job_titles: usize,
        cities: usize,
    },
    ProfileResolved {
        job_title: String,
        url: String,
    },
    /// Job title dropped for this run; none of its cities are requested
    ProfileSkipped {
        job_title: String,
        reason: String,
    },
    RequestRetry {
        url: String,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },
    /// Longer pause after every Nth request
    Cooldown {
        after_requests: u64,
        delay_ms: u64,
    },
    RecordCollected {
        job_title: String,
        city: String,
        position: usize,
        total: usize,
    },
    RecordSkipped {
        job_title: String,
        city: String,
        stage: PipelineStage,
        reason: String,
    },
    SinkPersisted {
        sink: String,
        target: String,
        rows: usize,
    },
    SinkFailed {
        sink: String,
        target: String,
        reason: String,
    },
    RunFinished {
        records: usize,
        skipped: usize,
    },
}

impl PipelineEvent {
    /// Stable event name, e.g. for filtering
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run-started",
            Self::ProfileResolved { .. } => "profile-resolved",
            Self::ProfileSkipped { .. } => "profile-skipped",
            Self::RequestRetry { .. } => "request-retry",
            Self::Cooldown { .. } => "cooldown",
            Self::RecordCollected { .. } => "record-collected",
            Self::RecordSkipped { .. } => "record-skipped",
            Self::SinkPersisted { .. } => "sink-persisted",
            Self::SinkFailed { .. } => "sink-failed",
            Self::RunFinished { .. } => "run-finished",
        }
    }
}

/// Receives pipeline events. Implementations must not block for long;
/// the pipeline is sequential and waits for each call.
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Renders events as `tracing` log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted { job_titles, cities } => {
                info!("🚀 Processing {} job title(s) across {} cities", job_titles, cities);
            }
            PipelineEvent::ProfileResolved { job_title, url } => {
                info!("🔗 Resolved '{}' -> {}", job_title, url);
            }
            PipelineEvent::ProfileSkipped { job_title, reason } => {
                warn!("⏭️ Skipping job title '{}': {}", job_title, reason);
            }
            PipelineEvent::RequestRetry { url, attempt, delay_ms, reason } => {
                warn!(
                    "🔄 Attempt {} failed for {} ({}), retrying in {}ms",
                    attempt, url, reason, delay_ms
                );
            }
            PipelineEvent::Cooldown { after_requests, delay_ms } => {
                info!("😴 Cooling down for {}ms after {} requests", delay_ms, after_requests);
            }
            PipelineEvent::RecordCollected { job_title, city, position, total } => {
                info!("✅ [{}/{}] {} @ {}", position, total, job_title, city);
            }
            PipelineEvent::RecordSkipped { job_title, city, stage, reason } => {
                warn!("⏭️ Skipping {} @ {} ({}): {}", job_title, city, stage, reason);
            }
            PipelineEvent::SinkPersisted { sink, target, rows } => {
                info!("💾 {} sink wrote {} rows to {}", sink, rows, target);
            }
            PipelineEvent::SinkFailed { sink, target, reason } => {
                warn!("❌ {} sink failed for {}: {}", sink, target, reason);
            }
            PipelineEvent::RunFinished { records, skipped } => {
                info!("🏁 Run finished: {} records collected, {} skipped", records, skipped);
            }
        }
        debug!(event = event.event_name(), "pipeline event");
    }
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, event_name: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_name() == event_name)
            .count()
    }
}

impl RunObserver for CollectingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
