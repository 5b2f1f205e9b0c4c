//! Domain module - salary records and pipeline events
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod events;
pub mod salary_record;

pub use events::{CollectingObserver, PipelineEvent, PipelineStage, RunObserver, TracingObserver};
pub use salary_record::{
    job_slug, OutputBatch, Percentile, ProfileReference, SalaryRecord, MISSING_FIELD_MARKER,
    SINK_HEADERS,
};
