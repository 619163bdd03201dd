//! Integration tests for DatabricksClient against a mock workspace.

use harvest_databricks::{
  Connection, DatabricksClient, DatabricksError, JobsApi, LifeCycleState, ResultState,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> DatabricksClient {
  let connection = Connection::new(&server.uri(), "dapi-test").expect("valid connection");
  DatabricksClient::new(connection)
}

#[tokio::test]
async fn test_run_now_posts_job_id() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/2.1/jobs/run-now"))
    .and(header("authorization", "Bearer dapi-test"))
    .and(body_json(json!({ "job_id": 616190703118881u64 })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "run_id": 455644833,
      "number_in_job": 3
    })))
    .expect(1)
    .mount(&server)
    .await;

  let client = client_for(&server).await;
  let response = client.run_now(616190703118881).await.unwrap();

  assert_eq!(response.run_id, 455644833);
  assert_eq!(response.number_in_job, Some(3));
}

#[tokio::test]
async fn test_get_run_reads_state() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/2.1/jobs/runs/get"))
    .and(query_param("run_id", "455644833"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "run_id": 455644833,
      "run_page_url": "https://example.cloud.databricks.com/#job/1/run/455644833",
      "state": {
        "life_cycle_state": "TERMINATED",
        "result_state": "FAILED",
        "state_message": "Task failed with error"
      }
    })))
    .mount(&server)
    .await;

  let client = client_for(&server).await;
  let run = client.get_run(455644833).await.unwrap();

  assert_eq!(run.state.life_cycle_state, LifeCycleState::Terminated);
  assert_eq!(run.state.result_state, Some(ResultState::Failed));
  assert!(!run.state.is_success());
  assert!(run.run_page_url.is_some());
}

#[tokio::test]
async fn test_cancel_run_posts_run_id() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/2.1/jobs/runs/cancel"))
    .and(body_json(json!({ "run_id": 12 })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    .expect(1)
    .mount(&server)
    .await;

  let client = client_for(&server).await;
  client.cancel_run(12).await.unwrap();
}

#[tokio::test]
async fn test_api_error_is_decoded() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/2.1/jobs/run-now"))
    .respond_with(ResponseTemplate::new(400).set_body_json(json!({
      "error_code": "INVALID_PARAMETER_VALUE",
      "message": "Job 1 does not exist."
    })))
    .mount(&server)
    .await;

  let client = client_for(&server).await;
  let err = client.run_now(1).await.unwrap_err();

  match &err {
    DatabricksError::Api {
      status,
      error_code,
      message,
    } => {
      assert_eq!(*status, 400);
      assert_eq!(error_code, "INVALID_PARAMETER_VALUE");
      assert_eq!(message, "Job 1 does not exist.");
    }
    other => panic!("unexpected error: {other:?}"),
  }
  assert!(!err.is_transient());
}

#[tokio::test]
async fn test_server_error_is_transient() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/2.1/jobs/runs/get"))
    .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
    .mount(&server)
    .await;

  let client = client_for(&server).await;
  let err = client.get_run(5).await.unwrap_err();

  assert!(matches!(
    err,
    DatabricksError::Api { status: 503, ref message, .. } if message == "upstream unavailable"
  ));
  assert!(err.is_transient());
}

#[tokio::test]
async fn test_host_with_path_prefix_reaches_api() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/workspace/api/2.1/jobs/run-now"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "run_id": 7 })))
    .expect(1)
    .mount(&server)
    .await;

  let host = format!("{}/workspace", server.uri());
  let client = DatabricksClient::new(Connection::new(&host, "dapi-test").unwrap());
  let response = client.run_now(616190703118881).await.unwrap();

  assert_eq!(response.run_id, 7);
}

