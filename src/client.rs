use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::dispatch::{self, Transport};
use crate::error::Result;
use crate::request::{self, with_json_body, with_path, RequestOption};
use crate::types::{StartWorkflowRequest, Status};

/// Async client for a hosted ComfyUI generation API.
///
/// Stateless: every call builds a fresh request, sends it once and returns
/// the decoded response. There is no retry, polling or timeout here; wrap
/// calls in `tokio::time::timeout` or inject a `reqwest::Client` configured
/// with one. Cloning is cheap and a single instance can serve concurrent tasks.
///
/// # Example
/// ```no_run
/// use comfyui_api_rs::{start_with_request_id, ComfyApiClient, StartWorkflowRequest};
///
/// # async fn example() -> comfyui_api_rs::Result<()> {
/// let client = ComfyApiClient::new("https://my-worker.example.com/api")
///     .with_api_token("secret");
///
/// let req = StartWorkflowRequest::from_json(
///     std::fs::read_to_string("workflow_api.json").unwrap(),
///     [start_with_request_id("1234")],
/// )?;
/// let started = client.start_workflow(&req).await?;
/// let status = client.workflow_status(&started.id).await?;
/// println!("{}: {}", status.id, status.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ComfyApiClient {
    /// API base URL. Usually ends with `/api`.
    pub base_url: String,
    /// Optional token sent as `Authorization: Bearer <token>`.
    pub api_token: Option<String>,
    /// Optional transport. When `None` a shared default `reqwest::Client` is used.
    pub transport: Option<Arc<dyn Transport>>,
}

impl ComfyApiClient {
    /// Create a client for the given base URL with no token and the default transport.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            transport: None,
        }
    }

    /// Set the bearer token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Use a custom transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom `reqwest::Client` (for connection pooling, timeouts, TLS).
    pub fn with_http_client(self, client: reqwest::Client) -> Self {
        self.with_transport(Arc::new(client))
    }

    fn transport(&self) -> &dyn Transport {
        match &self.transport {
            Some(t) => t.as_ref(),
            None => dispatch::default_transport(),
        }
    }

    // ── Generic pipeline ────────────────────────────────────────────

    /// Build a request from `options`, applied in order against a GET draft
    /// targeting `base_url`. The first failing option aborts the build.
    ///
    /// JSON `Accept`/`Content-Type` headers are always set; `Authorization`
    /// only when a non-empty token is configured.
    pub fn build_request<'a, I>(&self, options: I) -> Result<reqwest::Request>
    where
        I: IntoIterator<Item = RequestOption<'a>>,
    {
        request::build(&self.base_url, self.api_token.as_deref(), options)
    }

    /// Send a built request once and decode the response body as `T`.
    pub async fn execute<T>(&self, request: reqwest::Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        dispatch::dispatch(self.transport(), request).await
    }

    // ── Workflows ───────────────────────────────────────────────────

    /// Submit a workflow via `POST <base>/payload`.
    pub async fn start_workflow(&self, req: &StartWorkflowRequest) -> Result<Status> {
        let request = self.build_request([with_path(["payload"]), with_json_body(req)])?;
        self.execute(request).await
    }

    /// Fetch job status via `GET <base>/result/<id>`.
    pub async fn workflow_status(&self, id: &str) -> Result<Status> {
        let request = self.build_request([with_path(["result", id])])?;
        self.execute(request).await
    }
}
