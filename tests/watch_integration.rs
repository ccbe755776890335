//! End-to-end tests: HTTP fetch through the engine to the audit log.

use tempfile::TempDir;
use valwatch::commands::WatchCommand;
use valwatch::config::Config;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn audit_events(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            record["event"].as_str().unwrap().to_string()
        })
        .collect()
}

fn test_config(dir: &TempDir, max_cycles: u64) -> Config {
    let mut config = Config::default();
    config.audit_log = dir.path().join("audit.log");
    config.max_cycles = Some(max_cycles);
    config.interval_secs = 1;
    config.retry_delay_ms = 0;
    config.retry_jitter_ms = 0;
    config
}

#[tokio::test]
async fn test_watch_session_end_to_end() {
    let mock_server = MockServer::start().await;

    let html = "<html><body><div><span>1.234,56</span></div></body></html>";
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, 2);
    config.operator = Some("Integration Tester".to_string());

    let cmd = WatchCommand::new(config.clone());
    let summary = cmd
        .execute_until(&mock_server.uri(), "1.234,56", std::future::pending())
        .await
        .unwrap();

    assert_eq!(summary.cycles, 2);
    assert_eq!(summary.changes, 0);
    assert!(!summary.cancelled);

    let events = audit_events(&config.audit_log);
    assert_eq!(events, vec!["session_start", "baseline", "session_end"]);
}

#[tokio::test]
async fn test_watch_logs_every_failed_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, 3);

    let cmd = WatchCommand::new(config.clone());
    let summary =
        cmd.execute_until(&mock_server.uri(), "42", std::future::pending()).await.unwrap();

    assert_eq!(summary.cycles, 3);

    let events = audit_events(&config.audit_log);
    assert_eq!(events.iter().filter(|e| *e == "fetch_error").count(), 3);
    assert_eq!(events.last().map(String::as_str), Some("session_end"));
}
