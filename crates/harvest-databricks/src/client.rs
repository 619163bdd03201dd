use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::connection::Connection;
use crate::error::DatabricksError;
use crate::types::{JobId, Run, RunId, RunNowResponse};

/// The Jobs API calls a run-now trigger makes.
#[async_trait]
pub trait JobsApi: Send + Sync {
  /// Start a run of an existing job.
  async fn run_now(&self, job_id: JobId) -> Result<RunNowResponse, DatabricksError>;

  /// Fetch the current state of a run.
  async fn get_run(&self, run_id: RunId) -> Result<Run, DatabricksError>;

  /// Request cancellation of a run. Returns once the request is accepted,
  /// not once the run has stopped.
  async fn cancel_run(&self, run_id: RunId) -> Result<(), DatabricksError>;
}

/// HTTP client for one Databricks workspace.
#[derive(Debug, Clone)]
pub struct DatabricksClient {
  http: Client,
  connection: Connection,
}

/// Error body returned by the REST API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  #[serde(default)]
  error_code: String,
  #[serde(default)]
  message: String,
}

impl DatabricksClient {
  pub fn new(connection: Connection) -> Self {
    Self::with_http_client(Client::new(), connection)
  }

  pub fn with_http_client(http: Client, connection: Connection) -> Self {
    Self { http, connection }
  }

  pub fn connection(&self) -> &Connection {
    &self.connection
  }

  fn endpoint(&self, path: &str) -> Result<url::Url, DatabricksError> {
    self
      .connection
      .host
      .join(path)
      .map_err(|source| DatabricksError::InvalidHost {
        host: self.connection.host.to_string(),
        source,
      })
  }

  async fn check(response: Response) -> Result<Response, DatabricksError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or(ApiErrorBody {
      error_code: String::new(),
      message: body,
    });

    Err(DatabricksError::Api {
      status: status.as_u16(),
      error_code: parsed.error_code,
      message: parsed.message,
    })
  }
}

#[async_trait]
impl JobsApi for DatabricksClient {
  async fn run_now(&self, job_id: JobId) -> Result<RunNowResponse, DatabricksError> {
    let url = self.endpoint("api/2.1/jobs/run-now")?;
    debug!(job_id, %url, "requesting run-now");

    let response = self
      .http
      .post(url)
      .bearer_auth(&self.connection.token)
      .json(&json!({ "job_id": job_id }))
      .send()
      .await?;

    Ok(Self::check(response).await?.json().await?)
  }

  async fn get_run(&self, run_id: RunId) -> Result<Run, DatabricksError> {
    let url = self.endpoint("api/2.1/jobs/runs/get")?;

    let response = self
      .http
      .get(url)
      .bearer_auth(&self.connection.token)
      .query(&[("run_id", run_id)])
      .send()
      .await?;

    Ok(Self::check(response).await?.json().await?)
  }

  async fn cancel_run(&self, run_id: RunId) -> Result<(), DatabricksError> {
    let url = self.endpoint("api/2.1/jobs/runs/cancel")?;
    debug!(run_id, %url, "requesting run cancellation");

    let response = self
      .http
      .post(url)
      .bearer_auth(&self.connection.token)
      .json(&json!({ "run_id": run_id }))
      .send()
      .await?;

    Self::check(response).await?;
    Ok(())
  }
}
