use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::error::{ComfyApiError, Result};

/// How the service should interpret the submitted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handler {
    /// The payload is a ComfyUI API-format workflow, run as-is.
    #[default]
    RawWorkflow,
}

/// Empty presence flag sent to the service as `{}`.
///
/// Only whether the field is present matters; the object carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureMarker {}

/// Callback the service invokes once the generation finishes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Webhook {
    pub url: String,
    /// Free-form parameters echoed back to the webhook.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra_params: Map<String, Value>,
}

impl Webhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra_params: Map::new(),
        }
    }

    /// Add one extra parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }
}

/// Job input sent to `/payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
    /// Namespaces the uploaded outputs: with request ID `1234` the files land
    /// under `<bucket>/1234/<filename>`. The service generates a UUID when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub handler: Handler,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<FeatureMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<FeatureMarker>,
    /// Opaque ComfyUI workflow, passed through untouched.
    #[serde(rename = "workflow_json")]
    pub workflow: Box<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Webhook>,
}

/// A configuration step applied to a [`StartWorkflowRequest`] after its defaults.
pub type StartOption = Box<dyn FnOnce(&mut StartWorkflowRequest) + Send>;

/// Set the request ID used to namespace output files.
pub fn start_with_request_id(request_id: impl Into<String>) -> StartOption {
    let request_id = request_id.into();
    Box::new(move |req| req.input.request_id = Some(request_id))
}

/// Attach a completion webhook.
pub fn start_with_webhook(webhook: Webhook) -> StartOption {
    Box::new(move |req| req.input.webhook = Some(webhook))
}

/// Body of a start request. The service expects the input wrapped in `{"input": ...}`.
///
/// # Example
/// ```
/// use comfyui_api_rs::{start_with_request_id, StartWorkflowRequest};
///
/// let req = StartWorkflowRequest::from_json(
///     r#"{"3": {"class_type": "KSampler", "inputs": {}}}"#,
///     [start_with_request_id("1234")],
/// )
/// .unwrap();
///
/// assert_eq!(req.input.request_id.as_deref(), Some("1234"));
/// assert!(req.input.gcp.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartWorkflowRequest {
    pub input: Input,
}

impl StartWorkflowRequest {
    /// Create a raw-workflow request with both feature markers set, then apply
    /// `options` in order.
    pub fn new<I>(workflow: Box<RawValue>, options: I) -> Self
    where
        I: IntoIterator<Item = StartOption>,
    {
        let mut req = Self {
            input: Input {
                request_id: None,
                handler: Handler::RawWorkflow,
                gcp: Some(FeatureMarker::default()),
                modifiers: Some(FeatureMarker::default()),
                workflow,
                webhook: None,
            },
        };
        for option in options {
            option(&mut req);
        }
        req
    }

    /// Like [`new`](Self::new) but takes the workflow as JSON text.
    ///
    /// Fails if the text is not valid JSON.
    pub fn from_json<S, I>(workflow: S, options: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = StartOption>,
    {
        let raw = RawValue::from_string(workflow.into()).map_err(ComfyApiError::Serialize)?;
        Ok(Self::new(raw, options))
    }

    /// Like [`new`](Self::new) but takes an already-built workflow value,
    /// e.g. one produced with `serde_json::json!`.
    pub fn from_value<I>(workflow: &Value, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = StartOption>,
    {
        let raw = serde_json::value::to_raw_value(workflow).map_err(ComfyApiError::Serialize)?;
        Ok(Self::new(raw, options))
    }
}

/// Generation status reported by the service.
///
/// The set is open: unrecognised values decode to `Other` and are sent back
/// unchanged, so new service states never break decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusType {
    Pending,
    Success,
    Other(String),
}

impl StatusType {
    pub fn as_str(&self) -> &str {
        match self {
            StatusType::Pending => "pending",
            StatusType::Success => "success",
            StatusType::Other(s) => s,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, StatusType::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusType::Success)
    }
}

impl Default for StatusType {
    fn default() -> Self {
        StatusType::Other(String::new())
    }
}

impl From<String> for StatusType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => StatusType::Pending,
            "success" => StatusType::Success,
            _ => StatusType::Other(s),
        }
    }
}

impl From<StatusType> for String {
    fn from(status: StatusType) -> Self {
        match status {
            StatusType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed download URLs for one output. Each is a GET URL valid for 7 days and
/// present only when the matching storage backend is configured.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputUrls {
    #[serde(rename = "gcp_url", default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<String>,
    #[serde(rename = "s3_url", default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<String>,
    /// Legacy single URL. Superseded by `s3` and `gcp`; kept so older
    /// deployments still decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputItem {
    /// Path of the file on the worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(flatten)]
    pub urls: OutputUrls,
}

impl OutputItem {
    /// First available download URL: S3, then GCP, then the legacy field.
    pub fn preferred_url(&self) -> Option<&str> {
        self.urls
            .s3
            .as_deref()
            .or(self.urls.gcp.as_deref())
            .or(self.urls.url.as_deref())
    }
}

/// Job status returned by both `/payload` and `/result/<id>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: StatusType,
    /// The worker's own ComfyUI response, passed through untouched.
    #[serde(default)]
    pub comfyui_response: Option<Box<RawValue>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub output: Vec<OutputItem>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<OutputItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<OutputItem>>::deserialize(deserializer)?.unwrap_or_default())
}
