//! # comfyui-api-rs
//!
//! Async Rust client for hosted [ComfyUI](https://github.com/comfyanonymous/ComfyUI)
//! generation APIs: workers that accept a raw API-format workflow, run it,
//! and upload the outputs to GCS and/or S3.
//!
//! Two calls cover the whole surface: submit a workflow, then poll its
//! status until the output URLs appear. Polling cadence, retries and
//! timeouts are left to the caller.
//!
//! ## Quick Start
//!
//! ```no_run
//! use comfyui_api_rs::{ComfyApiClient, StartWorkflowRequest, StatusType};
//! use std::time::Duration;
//!
//! # async fn example() -> comfyui_api_rs::Result<()> {
//! let client = ComfyApiClient::new("https://my-worker.example.com/api")
//!     .with_api_token("secret");
//!
//! let workflow = serde_json::json!({
//!     "9": {"class_type": "SaveImage", "inputs": {"filename_prefix": "ComfyUI"}}
//! });
//! let req = StartWorkflowRequest::from_value(&workflow, [])?;
//! let mut status = client.start_workflow(&req).await?;
//!
//! while status.status == StatusType::Pending {
//!     tokio::time::sleep(Duration::from_secs(2)).await;
//!     status = client.workflow_status(&status.id).await?;
//! }
//!
//! for item in &status.output {
//!     println!("{:?}", item.preferred_url());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Any response with status >= 400 becomes [`ComfyApiError::Remote`], whose
//! `Display` is the service's raw body. Everything else (bad URLs, transport
//! failures, malformed JSON) is passed through unchanged.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod types;

pub use client::ComfyApiClient;
pub use dispatch::Transport;
pub use error::{ComfyApiError, Result};
pub use request::{with_json_body, with_path, RequestDraft, RequestOption};
pub use types::{
    start_with_request_id, start_with_webhook, FeatureMarker, Handler, Input, OutputItem,
    OutputUrls, StartOption, StartWorkflowRequest, Status, StatusType, Webhook,
};
