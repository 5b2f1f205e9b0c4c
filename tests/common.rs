//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use salary_crawler_lib::infrastructure::config::{
    AppConfig, InputConfig, OutputConfig, PacingConfig, RetryConfig, SinkKind,
};
use salary_crawler_lib::infrastructure::http_client::{FetchError, PageFetcher, TransportKind};

pub const PROFILE_BASE: &str = "https://www.salary.com/research/salary/alternate";

/// Canned responses by URL; unknown URLs answer 404
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), Ok(html));
        self
    }

    /// Every request to `url` times out
    pub fn unreachable(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Err(FetchError::transport(TransportKind::Timeout, url, "operation timed out")),
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requested.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
        })
    }
}

/// Profile page with an occupation block; `None` percentiles are left out of the payload
pub fn occupation_page(title: &str, location: &str, percentiles: [Option<f64>; 5]) -> String {
    let keys = ["percentile10", "percentile25", "median", "percentile75", "percentile90"];
    let salary: serde_json::Map<String, serde_json::Value> = keys
        .iter()
        .zip(percentiles)
        .filter_map(|(key, value)| value.map(|v| ((*key).to_string(), serde_json::json!(v))))
        .collect();
    let block = serde_json::json!({
        "@context": "http://schema.org/",
        "@type": "Occupation",
        "name": title,
        "description": format!("{title} duties"),
        "occupationLocation": [{"@type": "City", "name": location}],
        "estimatedSalary": [salary],
    });
    format!(
        r#"<!DOCTYPE html><html><head><title>{title}</title>
        <script type="application/ld+json">{block}</script>
        </head><body><h1>{title}</h1></body></html>"#
    )
}

pub fn full_percentiles(median: f64) -> [Option<f64>; 5] {
    [
        Some(median * 0.8),
        Some(median * 0.9),
        Some(median),
        Some(median * 1.1),
        Some(median * 1.2),
    ]
}

/// Search results page whose first listing links to `href`
pub fn search_page(href: &str) -> String {
    format!(
        r#"<html><body><div class="sa-layout">
        <div class="margin-bottom5 font-semibold"><a href="{href}">First</a></div>
        <div class="margin-bottom5 font-semibold"><a href="/elsewhere">Second</a></div>
        </div></body></html>"#
    )
}

pub fn search_url(keyword: &str) -> String {
    format!(
        "https://www.salary.com/research/search?type=job&page=1&keyword={}",
        keyword.replace(' ', "%20")
    )
}

pub fn write_cities(dir: &Path, cities: &[&str]) -> std::path::PathBuf {
    let path = dir.join("cities.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", cities.join(",")).unwrap();
    path
}

/// Instant pacing and retries, CSV output in `dir`
pub fn test_config(dir: &Path, job_titles: &[&str], cities_file: &Path) -> AppConfig {
    AppConfig {
        input: InputConfig {
            cities_file: cities_file.to_path_buf(),
            job_titles_file: None,
            job_titles: job_titles.iter().map(ToString::to_string).collect(),
        },
        output: OutputConfig {
            directory: dir.to_path_buf(),
            sinks: vec![SinkKind::Csv],
            ..OutputConfig::default()
        },
        pacing: PacingConfig {
            request_delay_ms: 0,
            cooldown_delay_ms: 0,
            cooldown_every: 10,
        },
        retry: RetryConfig {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 2.0,
        },
        ..AppConfig::default()
    }
}
