//! Salary Crawler - compensation percentile acquisition
//!
//! Resolves job titles to salary profile pages, fetches one page per city,
//! extracts the embedded occupation data and writes the batch to every
//! configured sink.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CrawlOrchestrator, PipelineError, RunReport, SalaryPipeline};
pub use domain::{OutputBatch, PipelineEvent, RunObserver, SalaryRecord};
pub use infrastructure::AppConfig;
