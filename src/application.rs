//! Application layer module
//!
//! The orchestrator runs the acquisition loop; the pipeline wires it from
//! configuration.

pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::{Collection, CrawlOrchestrator, RunReport};
pub use pipeline::{PipelineError, SalaryPipeline};
