//! Integration tests for the execution lifecycle.
//!
//! These tests use wiremock to simulate the watch service and verify the
//! start/end reporting discipline of tracked executions.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use pipewatch::{
    ChildExecution, ClientConfig, Error, ExecutionResult, RetryPolicy, TrackedPipeline,
    TrackedResult, WatchClient, Watermark,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(uri: &str) -> WatchClient {
    let retry = RetryPolicy {
        max_attempts: 2,
        base_delay_ms: 10,
        max_delay_ms: 20,
        retryable_statuses: None,
    };
    WatchClient::new(ClientConfig::new(uri).with_retry(retry)).unwrap()
}

async fn mount_start(server: &MockServer, execution_id: i64) {
    Mock::given(method("POST"))
        .and(path("/start_pipeline_execution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": execution_id})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_end(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_inactive_pipeline_skips_without_service_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/start_pipeline_execution"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42).with_active(false);
    let ran = AtomicBool::new(false);

    let outcome = client
        .track_execution(&pipeline, |_context| async {
            ran.store(true, Ordering::SeqCst);
            Ok(ExecutionResult::success())
        })
        .await
        .unwrap();

    assert!(outcome.is_none());
    assert!(!ran.load(Ordering::SeqCst), "work must not run when inactive");
}

#[tokio::test]
async fn test_success_reports_one_start_and_one_end() {
    let mock_server = MockServer::start().await;
    mount_start(&mock_server, 123).await;

    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .and(body_partial_json(json!({
            "id": 123,
            "completed_successfully": true,
            "inserts": 100
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42);

    let outcome = client
        .track_execution(&pipeline, |_context| async {
            Ok(ExecutionResult::success().with_inserts(100))
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.execution_id, 123);
    assert_eq!(outcome.result.inserts, Some(100));
}

#[tokio::test]
async fn test_work_receives_the_execution_context() {
    let mock_server = MockServer::start().await;
    mount_start(&mock_server, 55).await;
    mount_end(&mock_server).await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42)
        .with_watermark("2024-01-01")
        .with_next_watermark("2024-01-02");

    client
        .track_execution(&pipeline, |context| async move {
            assert_eq!(context.execution_id, 55);
            assert_eq!(context.pipeline_id, 42);
            assert_eq!(context.watermark, Some(Watermark::Text("2024-01-01".into())));
            assert_eq!(
                context.next_watermark,
                Some(Watermark::Text("2024-01-02".into()))
            );
            Ok(ExecutionResult::success())
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_watermarks_go_out_with_the_start_report() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/start_pipeline_execution"))
        .and(body_partial_json(json!({
            "pipeline_id": 42,
            "watermark": "2024-01-01",
            "next_watermark": "2024-01-02"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_end(&mock_server).await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42)
        .with_watermark("2024-01-01")
        .with_next_watermark("2024-01-02");

    client
        .track_execution(&pipeline, |_context| async {
            Ok(ExecutionResult::success())
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failure_is_reported_then_propagated() {
    let mock_server = MockServer::start().await;
    mount_start(&mock_server, 9).await;

    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .and(body_partial_json(json!({
            "id": 9,
            "completed_successfully": false
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42);

    let result = client
        .track_execution::<_, _, ExecutionResult>(&pipeline, |_context| async {
            Err(anyhow!("source table is locked"))
        })
        .await;

    match result {
        Err(Error::Work { source }) => {
            assert!(source.to_string().contains("source table is locked"));
        }
        other => panic!("expected work error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_report_carries_the_error_description() {
    let mock_server = MockServer::start().await;
    mount_start(&mock_server, 9).await;

    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .and(body_partial_json(json!({
            "execution_metadata": {"error": "source table is locked"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42);

    let result = client
        .track_execution::<_, _, ExecutionResult>(&pipeline, |_context| async {
            Err(anyhow!("source table is locked"))
        })
        .await;

    assert!(matches!(result, Err(Error::Work { .. })));
}

#[tokio::test]
async fn test_work_error_wins_over_failed_failure_report() {
    let mock_server = MockServer::start().await;
    mount_start(&mock_server, 9).await;

    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42);

    let result = client
        .track_execution::<_, _, ExecutionResult>(&pipeline, |_context| async {
            Err(anyhow!("source table is locked"))
        })
        .await;

    // The original failure comes back even though reporting it failed.
    match result {
        Err(Error::Work { source }) => {
            assert!(source.to_string().contains("source table is locked"));
        }
        other => panic!("expected work error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_end_report_surfaces_the_result() {
    let mock_server = MockServer::start().await;
    mount_start(&mock_server, 33).await;

    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42);

    let result = client
        .track_execution(&pipeline, |_context| async {
            Ok(ExecutionResult::success().with_inserts(10))
        })
        .await;

    match result {
        Err(Error::EndReport {
            execution_id,
            result,
            ..
        }) => {
            assert_eq!(execution_id, 33);
            assert!(result.completed_successfully);
            assert_eq!(result.inserts, Some(10));
        }
        other => panic!("expected end-report error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_child_execution_reports_its_parent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/start_pipeline_execution"))
        .and(body_partial_json(json!({
            "pipeline_id": 5,
            "parent_id": 99
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 100})))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_end(&mock_server).await;

    let client = client(&mock_server.uri());
    let child = ChildExecution::new(5, 99);

    let outcome = client
        .track_child_execution(&child, |_context| async {
            Ok(ExecutionResult::success().with_total_rows(12))
        })
        .await
        .unwrap();

    assert_eq!(outcome.execution_id, 100);
    assert_eq!(outcome.result.total_rows, Some(12));
}

#[tokio::test]
async fn test_custom_result_carrier_round_trips_through_tracking() {
    #[derive(Debug)]
    struct IngestStats {
        base: ExecutionResult,
        skipped_files: Vec<String>,
    }

    impl TrackedResult for IngestStats {
        fn execution_result(&self) -> &ExecutionResult {
            &self.base
        }
        fn execution_result_mut(&mut self) -> &mut ExecutionResult {
            &mut self.base
        }
    }

    let mock_server = MockServer::start().await;
    mount_start(&mock_server, 7).await;

    Mock::given(method("POST"))
        .and(path("/end_pipeline_execution"))
        .and(body_partial_json(json!({
            "id": 7,
            "completed_successfully": true,
            "inserts": 3
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42);

    let outcome = client
        .track_execution(&pipeline, |_context| async {
            Ok(IngestStats {
                base: ExecutionResult::success().with_inserts(3),
                skipped_files: vec!["2024-01-01.csv".to_string()],
            })
        })
        .await
        .unwrap()
        .unwrap();

    // Carrier fields survive on the caller's side.
    assert_eq!(outcome.result.skipped_files, vec!["2024-01-01.csv"]);
}

#[tokio::test]
async fn test_transient_start_failure_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/start_pipeline_execution"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/start_pipeline_execution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 64})))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_end(&mock_server).await;

    let client = client(&mock_server.uri());
    let pipeline = TrackedPipeline::new(42);

    let outcome = client
        .track_execution(&pipeline, |_context| async {
            Ok(ExecutionResult::success())
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.execution_id, 64);
}
