//! Sending built requests and decoding their responses.

use std::fmt;
use std::sync::OnceLock;

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::error::{ComfyApiError, Result};

/// Anything that can execute a `reqwest::Request`.
///
/// Implemented for `reqwest::Client`. Inject a custom implementation to add
/// middleware, record traffic, or serve canned responses in tests.
pub trait Transport: fmt::Debug + Send + Sync {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'_, reqwest::Result<reqwest::Response>>;
}

impl Transport for reqwest::Client {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'_, reqwest::Result<reqwest::Response>> {
        Box::pin(self.execute(request))
    }
}

/// Process-wide client used when none is injected.
pub(crate) fn default_transport() -> &'static reqwest::Client {
    static DEFAULT: OnceLock<reqwest::Client> = OnceLock::new();
    DEFAULT.get_or_init(reqwest::Client::new)
}

/// Send `request` once and decode the JSON body as `T`.
///
/// Any status >= 400 becomes [`ComfyApiError::Remote`] carrying the raw body.
/// The body is read to the end on every path.
pub(crate) async fn dispatch<T>(transport: &dyn Transport, request: reqwest::Request) -> Result<T>
where
    T: DeserializeOwned,
{
    tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
    let resp = transport.send(request).await?;

    let status = resp.status();
    if status.as_u16() >= 400 {
        let details = resp.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        tracing::debug!(status = status.as_u16(), len = details.len(), "request failed");
        return Err(ComfyApiError::Remote {
            code: status.as_u16(),
            details,
        });
    }

    let body = resp.bytes().await?;
    tracing::debug!(status = status.as_u16(), len = body.len(), "response received");
    serde_json::from_slice(&body).map_err(ComfyApiError::Decode)
}
