//! Infrastructure layer for HTTP, parsing, persistence and configuration
//!
//! Everything that talks to the outside world lives here: the page fetcher
//! and its retry wrapper, request pacing, HTML parsing, input files and
//! output sinks.

pub mod config;
pub mod http_client;
pub mod input;
pub mod logging;
pub mod pacing;
pub mod parsing;
pub mod profile_resolver;
pub mod retry;
pub mod storage;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, EmptyRecordPolicy, ResolutionStrategy, SinkKind};
pub use http_client::{FetchError, HttpClient, PageFetcher, TransportKind};
pub use input::{load_tokens, InputError};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use pacing::PacingController;
pub use parsing::{ExtractionError, ParsingConfig, ResolutionError, SearchResultParser, StructuredDataExtractor};
pub use profile_resolver::{city_url, resolver_for, DirectTemplateResolver, ProfileResolver, SearchResolver};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use storage::{PersistReport, PersistenceError, RecordSink, RecordStore, SinkOutcome};
