//! Integration tests for the sweeper
//!
//! These tests use wiremock to stand in for the score endpoint and run
//! whole sweeps over real HTTP, then merge and sample the resulting tables.

use sbd_sweep::config::{parse_config, Config};
use sbd_sweep::crawler::Coordinator;
use sbd_sweep::output::{merge_tables, sample_table};
use sbd_sweep::state::StopReason;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration pointing at the mock server with near-zero delays
fn create_test_config(base_url: &str, out_dir: &Path, regions: &[u32]) -> Config {
    let regions = regions
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let toml = format!(
        r#"
[crawler]
concurrency = 4
batch-size = 5
max-consecutive-misses = 10
inter-batch-delay-ms = 1
cooldown-ms = 5
regions = [{regions}]

[retry]
max-attempts = 3
rate-limit-step-ms = 2
rate-limit-jitter-ms = 0
http-error-delay-ms = 1
timeout-delay-ms = 1
network-delay-ms = 1
jitter-ms = 0

[endpoint]
base-url = "{base_url}/api/diem-thi-thpt.htm"
year = 2025
request-timeout-ms = 2000

[output]
directory = "{dir}"
"#,
        dir = out_dir.display().to_string().replace('\\', "/"),
    );
    parse_config(&toml).expect("test config should parse")
}

fn found(region: u32, math: f64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "total": 1,
        "data": [{"TinhId": region, "TOAN": math, "VAN": 7.5}]
    }))
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": false, "total": 0, "data": []}))
}

/// Mounts a record for `sbd` answered from `region`
async fn mount_record(server: &MockServer, sbd: &str, region: u32, math: f64) {
    Mock::given(method("GET"))
        .and(query_param("sbd", sbd))
        .and(query_param("year", "2025"))
        .respond_with(found(region, math))
        .mount(server)
        .await;
}

/// Everything not mounted explicitly has no record
async fn mount_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(not_found())
        .with_priority(u8::MAX)
        .mount(server)
        .await;
}

/// Number of requests the server received for `sbd`
async fn requests_for(server: &MockServer, sbd: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| {
            request
                .url
                .query_pairs()
                .any(|(key, value)| key == "sbd" && value == sbd)
        })
        .count()
}

fn read_rows(path: &Path) -> Vec<String> {
    let text = std::fs::read_to_string(path).expect("table should exist");
    text.trim_start_matches('\u{feff}')
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_full_sweep_writes_region_tables() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_record(&mock_server, "01000001", 1, 8.0).await;
    mount_record(&mock_server, "01000004", 1, 6.25).await;
    mount_record(&mock_server, "01000012", 1, 9.5).await;
    mount_record(&mock_server, "02000003", 2, 5.0).await;
    mount_fallback(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), &[1, 2]);
    let coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await.unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.total_records(), 4);
    assert_eq!(report.regions[0].records, 3);
    assert_eq!(report.regions[1].records, 1);
    assert!(report
        .regions
        .iter()
        .all(|r| r.stop_reason == StopReason::MissStreak));

    let region_one = read_rows(&dir.path().join("01.csv"));
    assert_eq!(region_one.len(), 3);
    assert!(region_one[0].starts_with("01000001,1,8,7.5,-1"));
    assert!(region_one[1].starts_with("01000004,1,6.25,7.5,-1"));
    assert!(region_one[2].starts_with("01000012,1,9.5,7.5,-1"));

    let region_two = read_rows(&dir.path().join("02.csv"));
    assert_eq!(region_two, vec![format!("02000003,2,5,7.5{}", ",-1".repeat(12))]);
}

#[tokio::test]
async fn test_sweep_stops_after_miss_streak() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_fallback(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), &[7]);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    // Two empty batches of five reach the streak of ten
    assert_eq!(report.regions[0].batches, 2);
    assert_eq!(report.regions[0].last_serial, 10);
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 10);
    assert!(read_rows(&dir.path().join("07.csv")).is_empty());
}

#[tokio::test]
async fn test_rate_limited_identifier_is_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // First two attempts are throttled, the third one succeeds
    Mock::given(method("GET"))
        .and(query_param("sbd", "03000002"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_record(&mock_server, "03000002", 3, 4.0).await;
    mount_fallback(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), &[3]);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.total_records(), 1);
    let rows = read_rows(&dir.path().join("03.csv"));
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("03000002,3,4,"));
}

#[tokio::test]
async fn test_persistent_server_errors_count_as_misses() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path(), &[4]);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.regions[0].records, 0);
    assert_eq!(report.regions[0].stop_reason, StopReason::MissStreak);
    // Every identifier used all of its attempts
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 10 * 3);
}

#[tokio::test]
async fn test_slow_responses_time_out_and_are_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(query_param("sbd", "09000002"))
        .respond_with(found(9, 8.0).set_delay(Duration::from_millis(1500)))
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let mut config = create_test_config(&mock_server.uri(), dir.path(), &[9]);
    config.endpoint.request_timeout_ms = 200;
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    // Every attempt timed out, so the record was never seen
    assert_eq!(requests_for(&mock_server, "09000002").await, 3);
    assert_eq!(report.regions[0].records, 0);
    assert_eq!(report.regions[0].stop_reason, StopReason::MissStreak);
    assert!(read_rows(&dir.path().join("09.csv")).is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_retried_then_counted_as_miss() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(query_param("sbd", "10000003"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Service unavailable</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), &[10]);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(requests_for(&mock_server, "10000003").await, 3);
    // Identifiers answered with JSON are not retried
    assert_eq!(requests_for(&mock_server, "10000004").await, 1);
    assert_eq!(report.regions[0].records, 0);
    assert_eq!(report.regions[0].batches, 2);
    assert!(read_rows(&dir.path().join("10.csv")).is_empty());
}

#[tokio::test]
async fn test_rerun_appends_to_existing_tables() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_record(&mock_server, "05000002", 5, 7.0).await;
    mount_fallback(&mock_server).await;

    for _ in 0..2 {
        let config = create_test_config(&mock_server.uri(), dir.path(), &[5]);
        Coordinator::new(config).unwrap().run().await.unwrap();
    }

    // No uniqueness at write time; the header is written once
    let text = std::fs::read_to_string(dir.path().join("05.csv")).unwrap();
    assert_eq!(text.matches("SBD,TinhId").count(), 1);
    assert_eq!(read_rows(&dir.path().join("05.csv")).len(), 2);
}

#[tokio::test]
async fn test_sweep_then_merge_and_sample() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    for serial in 1..=4 {
        mount_record(&mock_server, &format!("06{:06}", serial), 6, 6.0).await;
    }
    // Region 8 answers one identifier with a foreign region id
    Mock::given(method("GET"))
        .and(query_param("sbd", "08000001"))
        .respond_with(found(6, 6.0))
        .mount(&mock_server)
        .await;
    mount_record(&mock_server, "08000002", 8, 3.0).await;
    mount_fallback(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), &[6, 8]);
    let merged_path = config.output.merged_path();
    Coordinator::new(config).unwrap().run().await.unwrap();

    // Duplicate a region table row to force a merge-time duplicate
    let table = dir.path().join("06.csv");
    let mut text = std::fs::read_to_string(&table).unwrap();
    let first_row = read_rows(&table)[0].clone();
    text.push_str(&first_row);
    text.push_str("\r\n");
    std::fs::write(&table, text).unwrap();

    let merge = merge_tables(dir.path(), &merged_path).unwrap();
    assert_eq!(merge.tables, 2);
    assert_eq!(merge.rows_read, 7);
    assert_eq!(merge.rows_written, 6);
    assert_eq!(merge.duplicates, 1);

    let sample_path = dir.path().join("sample.csv");
    let written = sample_table(&merged_path, &sample_path, 3, 42).unwrap();
    assert_eq!(written, 3);

    let again = dir.path().join("sample_again.csv");
    sample_table(&merged_path, &again, 3, 42).unwrap();
    assert_eq!(
        std::fs::read_to_string(&sample_path).unwrap(),
        std::fs::read_to_string(&again).unwrap()
    );
}
