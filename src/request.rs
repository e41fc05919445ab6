//! Outgoing request construction.
//!
//! A request starts as a [`RequestDraft`] (GET, targeting the base URL, no
//! body). Each [`RequestOption`] edits the draft; options run in the order
//! given and the first one to fail stops the build. New request shapes are
//! added by writing another function that returns a `RequestOption`.

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::error::{ComfyApiError, Result};

/// Mutable state shared by the options of a single build.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub method: Method,
    pub base_url: String,
    pub target: String,
    pub body: Option<Vec<u8>>,
}

impl RequestDraft {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            method: Method::GET,
            target: base_url.clone(),
            base_url,
            body: None,
        }
    }
}

/// One configuration step. Fails the whole build by returning `Err`.
pub type RequestOption<'a> = Box<dyn FnOnce(&mut RequestDraft) -> Result<()> + Send + 'a>;

/// Target `<base>/<segment>/<segment>...`.
///
/// Segments are percent-encoded, so an ID containing `/` stays one segment.
/// Empty, `.` and `..` segments fail the build with
/// [`ComfyApiError::InvalidPathSegment`].
pub fn with_path<I, S>(segments: I) -> RequestOption<'static>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let segments: Vec<String> = segments
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    Box::new(move |draft| {
        draft.target = join_path(&draft.base_url, &segments)?.into();
        Ok(())
    })
}

/// POST `payload` encoded as JSON.
///
/// The payload is encoded when the option is created; an encoding error is
/// reported when the option runs.
pub fn with_json_body<T>(payload: &T) -> RequestOption<'static>
where
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_vec(payload).map_err(ComfyApiError::Serialize);
    Box::new(move |draft| {
        draft.body = Some(encoded?);
        draft.method = Method::POST;
        Ok(())
    })
}

fn join_path(base: &str, segments: &[String]) -> Result<Url> {
    // `PathSegmentsMut::extend` skips these silently, changing the target.
    if let Some(bad) = segments
        .iter()
        .find(|s| matches!(s.as_str(), "" | "." | ".."))
    {
        return Err(ComfyApiError::InvalidPathSegment(bad.clone()));
    }
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| ComfyApiError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Run `options` against a fresh draft and turn the result into a request
/// carrying the standard JSON headers and, if `api_token` is set, a bearer
/// `Authorization` header.
pub(crate) fn build<'a, I>(base_url: &str, api_token: Option<&str>, options: I) -> Result<reqwest::Request>
where
    I: IntoIterator<Item = RequestOption<'a>>,
{
    let mut draft = RequestDraft::new(base_url);
    for option in options {
        option(&mut draft)?;
    }

    let url = Url::parse(&draft.target)?;
    let mut request = reqwest::Request::new(draft.method, url);
    if let Some(body) = draft.body {
        *request.body_mut() = Some(body.into());
    }

    let headers = request.headers_mut();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = api_token.filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    const BASE: &str = "https://worker.example.com/api";

    fn body_json(request: &reqwest::Request) -> serde_json::Value {
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_defaults_without_options() {
        let req = build(BASE, None, []).unwrap();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.url().as_str(), BASE);
        assert!(req.body().is_none());
    }

    #[test]
    fn test_with_path_joins_segments_in_order() {
        let req = build(BASE, None, [with_path(["result", "abc-123"])]).unwrap();
        assert_eq!(
            req.url().as_str(),
            "https://worker.example.com/api/result/abc-123"
        );
    }

    #[test]
    fn test_with_path_trailing_slash_base() {
        let req = build("https://worker.example.com/api/", None, [with_path(["payload"])]).unwrap();
        assert_eq!(req.url().as_str(), "https://worker.example.com/api/payload");
    }

    #[test]
    fn test_with_path_root_base() {
        let req = build("http://127.0.0.1:8000", None, [with_path(["payload"])]).unwrap();
        assert_eq!(req.url().as_str(), "http://127.0.0.1:8000/payload");
    }

    #[test]
    fn test_with_path_encodes_segments() {
        let req = build(BASE, None, [with_path(["result", "a b/c"])]).unwrap();
        assert_eq!(
            req.url().as_str(),
            "https://worker.example.com/api/result/a%20b%2Fc"
        );
    }

    #[test]
    fn test_malformed_base_url_fails() {
        let err = build("not a url", None, [with_path(["payload"])]).unwrap_err();
        assert!(matches!(err, ComfyApiError::Url(_)));
    }

    #[test]
    fn test_malformed_base_url_without_path_fails_at_build() {
        let err = build("::::", None, []).unwrap_err();
        assert!(matches!(err, ComfyApiError::Url(_)));
    }

    #[test]
    fn test_cannot_be_a_base_url_fails() {
        let err = build("mailto:ops@example.com", None, [with_path(["payload"])]).unwrap_err();
        assert!(matches!(err, ComfyApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_dot_and_empty_segments_fail() {
        for bad in ["..", ".", ""] {
            let err = build(BASE, None, [with_path(["result", bad])]).unwrap_err();
            match err {
                ComfyApiError::InvalidPathSegment(s) => assert_eq!(s, bad),
                other => panic!("expected InvalidPathSegment for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_dots_inside_segment_are_kept() {
        let req = build(BASE, None, [with_path(["result", "v1..2"])]).unwrap();
        assert_eq!(req.url().as_str(), "https://worker.example.com/api/result/v1..2");
    }

    #[test]
    fn test_with_json_body_accepts_non_sync_payload() {
        let payload = std::cell::RefCell::new(serde_json::json!({"seed": 42}));
        let req = build(BASE, None, [with_json_body(&payload)]).unwrap();
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(body_json(&req), serde_json::json!({"seed": 42}));
    }

    #[test]
    fn test_with_json_body_sets_post_and_body() {
        let payload = serde_json::json!({"input": {"handler": "RawWorkflow"}});
        let req = build(BASE, None, [with_path(["payload"]), with_json_body(&payload)]).unwrap();
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(body_json(&req), payload);
    }

    #[test]
    fn test_serialization_failure_aborts() {
        // Non-string map keys cannot be encoded as JSON object keys.
        let mut payload = std::collections::HashMap::new();
        payload.insert(vec![1u8], "x");
        let err = build(BASE, None, [with_json_body(&payload)]).unwrap_err();
        assert!(matches!(err, ComfyApiError::Serialize(_)));
    }

    #[test]
    fn test_first_error_stops_later_options() {
        let ran = AtomicBool::new(false);
        let later: RequestOption<'_> = Box::new(|_draft| {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        });
        let err = build("not a url", None, [with_path(["payload"]), later]).unwrap_err();
        assert!(matches!(err, ComfyApiError::Url(_)));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_options_apply_in_order() {
        let req = build(
            BASE,
            None,
            [with_path(["payload"]), with_path(["result", "abc"])],
        )
        .unwrap();
        assert_eq!(req.url().as_str(), "https://worker.example.com/api/result/abc");
    }

    #[test]
    fn test_custom_option() {
        let put: RequestOption<'static> = Box::new(|draft| {
            draft.method = Method::PUT;
            Ok(())
        });
        let req = build(BASE, None, [put]).unwrap();
        assert_eq!(req.method(), &Method::PUT);
    }

    #[test]
    fn test_standard_headers_always_set() {
        let req = build(BASE, None, []).unwrap();
        assert_eq!(req.headers()[ACCEPT], "application/json");
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_bearer_token_header() {
        let req = build(BASE, Some("secret-token"), []).unwrap();
        let auth = req.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(auth, "Bearer secret-token");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn test_empty_token_sends_no_authorization() {
        let req = build(BASE, Some(""), []).unwrap();
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_token_fails() {
        let err = build(BASE, Some("bad\ntoken"), []).unwrap_err();
        assert!(matches!(err, ComfyApiError::InvalidHeader(_)));
    }
}
