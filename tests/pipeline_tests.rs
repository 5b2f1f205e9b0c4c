//! End-to-end runs against canned pages
mod common;

use rstest::rstest;
use std::sync::Arc;

use common::{
    full_percentiles, occupation_page, search_page, search_url, test_config, write_cities,
    StubFetcher, PROFILE_BASE,
};
use salary_crawler_lib::domain::events::{CollectingObserver, PipelineEvent, PipelineStage};
use salary_crawler_lib::infrastructure::config::{EmptyRecordPolicy, ResolutionStrategy, SinkKind};
use salary_crawler_lib::infrastructure::input::InputError;
use salary_crawler_lib::{PipelineError, SalaryPipeline, SalaryRecord};

fn city_page_url(slug: &str, city: &str) -> String {
    format!("{PROFILE_BASE}/{slug}-salary/{}", city.replace(' ', "%20"))
}

#[tokio::test]
async fn three_cities_produce_three_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let cities = write_cities(dir.path(), &["Springfield", "Dayton", "Columbus"]);
    let config = test_config(dir.path(), &["senior accountant"], &cities);

    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                &city_page_url("senior-accountant", "Springfield"),
                occupation_page("Senior Accountant", "Springfield, IL", full_percentiles(70000.0)),
            )
            .page(
                &city_page_url("senior-accountant", "Dayton"),
                occupation_page("Senior Accountant", "Dayton, OH", full_percentiles(72000.0)),
            )
            .page(
                &city_page_url("senior-accountant", "Columbus"),
                occupation_page("Senior Accountant", "Columbus, OH", full_percentiles(75000.0)),
            ),
    );

    let report = SalaryPipeline::new(config)
        .run_with_fetcher(fetcher.clone())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.skipped, 0);
    let locations: Vec<&str> = report.batch.iter().map(|r| r.job_location.as_str()).collect();
    assert_eq!(locations, vec!["Springfield, IL", "Dayton, OH", "Columbus, OH"]);
    assert_eq!(report.batch[2].n_tile_50.value(), Some(75000.0));
    assert_eq!(report.batch[2].n_tile_90.value(), Some(75000.0 * 1.2));
    assert_eq!(fetcher.requested().len(), 3);

    let written: Vec<SalaryRecord> = csv::Reader::from_path(dir.path().join("salary_results.csv"))
        .unwrap()
        .deserialize()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(written, report.batch);
}

#[tokio::test]
async fn unreachable_city_is_skipped_after_bounded_retries() {
    let dir = tempfile::tempdir().unwrap();
    let cities = write_cities(dir.path(), &["Springfield", "Unreachable-Host-Sim", "Columbus"]);
    let config = test_config(dir.path(), &["senior accountant"], &cities);
    let unreachable = city_page_url("senior-accountant", "Unreachable-Host-Sim");

    let fetcher = Arc::new(
        StubFetcher::new()
            .page(
                &city_page_url("senior-accountant", "Springfield"),
                occupation_page("Senior Accountant", "Springfield", full_percentiles(70000.0)),
            )
            .unreachable(&unreachable)
            .page(
                &city_page_url("senior-accountant", "Columbus"),
                occupation_page("Senior Accountant", "Columbus", full_percentiles(75000.0)),
            ),
    );
    let observer = Arc::new(CollectingObserver::new());

    let report = SalaryPipeline::new(config)
        .with_observer(observer.clone())
        .run_with_fetcher(fetcher.clone())
        .await
        .unwrap();

    let locations: Vec<&str> = report.batch.iter().map(|r| r.job_location.as_str()).collect();
    assert_eq!(locations, vec!["Springfield", "Columbus"]);
    assert_eq!(report.skipped, 1);
    assert_eq!(fetcher.request_count(&unreachable), 3);
    assert_eq!(observer.count("request-retry"), 2);

    let skipped: Vec<PipelineEvent> = observer
        .events()
        .into_iter()
        .filter(|e| e.event_name() == "record-skipped")
        .collect();
    assert_eq!(skipped.len(), 1);
    assert!(matches!(
        &skipped[0],
        PipelineEvent::RecordSkipped { city, stage: PipelineStage::Fetch, .. } if city == "Unreachable-Host-Sim"
    ));
}

#[tokio::test]
async fn status_errors_and_missing_blocks_skip_one_record_each() {
    let dir = tempfile::tempdir().unwrap();
    let cities = write_cities(dir.path(), &["Gone", "Plain", "Toledo"]);
    let config = test_config(dir.path(), &["welder"], &cities);

    // "Gone" is not registered and answers 404
    let fetcher = Arc::new(
        StubFetcher::new()
            .page(&city_page_url("welder", "Plain"), "<html><body>no data</body></html>".to_string())
            .page(
                &city_page_url("welder", "Toledo"),
                occupation_page("Welder", "Toledo, OH", full_percentiles(50000.0)),
            ),
    );
    let observer = Arc::new(CollectingObserver::new());

    let report = SalaryPipeline::new(config)
        .with_observer(observer.clone())
        .run_with_fetcher(fetcher.clone())
        .await
        .unwrap();

    assert_eq!(report.batch.len(), 1);
    assert_eq!(report.skipped, 2);
    // Status errors are not retried
    assert_eq!(fetcher.request_count(&city_page_url("welder", "Gone")), 1);
    assert_eq!(observer.count("request-retry"), 0);

    let stages: Vec<PipelineStage> = observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PipelineEvent::RecordSkipped { stage, .. } => Some(stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages, vec![PipelineStage::Fetch, PipelineStage::Extraction]);
}

#[tokio::test]
async fn search_without_listing_skips_only_that_job_title() {
    let dir = tempfile::tempdir().unwrap();
    let cities = write_cities(dir.path(), &["Akron"]);
    let mut config = test_config(dir.path(), &["astronaut chef", "registered nurse"], &cities);
    config.resolution.strategy = ResolutionStrategy::Search;

    let nurse_profile = format!("{PROFILE_BASE}/registered-nurse-salary");
    let fetcher = Arc::new(
        StubFetcher::new()
            .page(&search_url("astronaut chef"), "<html><body><p>No results</p></body></html>".to_string())
            .page(&search_url("registered nurse"), search_page("/research/salary/alternate/registered-nurse-salary"))
            .page(
                &format!("{nurse_profile}/Akron"),
                occupation_page("Registered Nurse", "Akron, OH", full_percentiles(68000.0)),
            ),
    );
    let observer = Arc::new(CollectingObserver::new());

    let report = SalaryPipeline::new(config)
        .with_observer(observer.clone())
        .run_with_fetcher(fetcher.clone())
        .await
        .unwrap();

    assert_eq!(report.batch.len(), 1);
    assert_eq!(report.batch[0].job_title, "Registered Nurse");
    assert_eq!(report.skipped, 1);
    assert_eq!(observer.count("profile-skipped"), 1);
    assert_eq!(observer.count("profile-resolved"), 1);
    assert_eq!(
        fetcher.requested(),
        vec![
            search_url("astronaut chef"),
            search_url("registered nurse"),
            format!("{nurse_profile}/Akron"),
        ]
    );
}

#[rstest]
#[case(EmptyRecordPolicy::Keep, 2, 0)]
#[case(EmptyRecordPolicy::Discard, 1, 1)]
#[tokio::test]
async fn empty_record_policy_decides_persistence(
    #[case] policy: EmptyRecordPolicy,
    #[case] expected_records: usize,
    #[case] expected_skipped: usize,
) {
    let dir = tempfile::tempdir().unwrap();
    let cities = write_cities(dir.path(), &["Reno", "Boise"]);
    let mut config = test_config(dir.path(), &["nurse"], &cities);
    config.extraction.empty_record_policy = policy;

    let fetcher = Arc::new(
        StubFetcher::new()
            .page(&city_page_url("nurse", "Reno"), occupation_page("Nurse", "Reno, NV", [None; 5]))
            .page(
                &city_page_url("nurse", "Boise"),
                occupation_page("Nurse", "Boise, ID", full_percentiles(66000.0)),
            ),
    );

    let report = SalaryPipeline::new(config)
        .run_with_fetcher(fetcher)
        .await
        .unwrap();

    assert_eq!(report.batch.len(), expected_records);
    assert_eq!(report.skipped, expected_skipped);
    assert_eq!(report.batch.last().unwrap().job_location, "Boise, ID");
    if policy == EmptyRecordPolicy::Keep {
        assert!(report.batch[0].has_no_percentiles());
        assert_eq!(report.batch[0].job_title, "Nurse");
    }
}

#[tokio::test]
async fn missing_input_file_aborts_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &["nurse"], &dir.path().join("missing.csv"));
    let fetcher = Arc::new(StubFetcher::new());

    let err = SalaryPipeline::new(config)
        .run_with_fetcher(fetcher.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Input(InputError::NotFound { .. })));
    assert!(fetcher.requested().is_empty());
    assert!(!dir.path().join("salary_results.csv").exists());
}

#[tokio::test]
async fn sink_failure_still_returns_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let cities = write_cities(dir.path(), &["Reno"]);
    let mut config = test_config(dir.path(), &["nurse"], &cities);
    // A regular file where the output directory should be
    let blocker = dir.path().join("blocked");
    std::fs::write(&blocker, b"").unwrap();
    config.output.directory = blocker;

    let fetcher = Arc::new(StubFetcher::new().page(
        &city_page_url("nurse", "Reno"),
        occupation_page("Nurse", "Reno, NV", full_percentiles(60000.0)),
    ));

    let report = SalaryPipeline::new(config)
        .run_with_fetcher(fetcher)
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.batch.len(), 1);
    assert_eq!(report.persist.failures().count(), 1);
}

#[tokio::test]
async fn hyphenated_table_name_does_not_block_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let cities = write_cities(dir.path(), &["Reno"]);
    let mut config = test_config(dir.path(), &["nurse"], &cities);
    config.output.sinks = vec![SinkKind::Csv, SinkKind::Sqlite];
    config.output.table_name = "salary-2024".to_string();

    let fetcher = Arc::new(StubFetcher::new().page(
        &city_page_url("nurse", "Reno"),
        occupation_page("Nurse", "Reno, NV", full_percentiles(60000.0)),
    ));

    let report = SalaryPipeline::new(config)
        .run_with_fetcher(fetcher.clone())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(fetcher.requested().len(), 1);
    assert!(dir.path().join("salary_results.csv").exists());
    let target = &report.persist.outcome(SinkKind::Sqlite).unwrap().target;
    assert!(target.ends_with("salary_results.db#salary-2024"), "{target}");
}
