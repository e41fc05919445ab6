use thiserror::Error;

/// Errors returned by ComfyUI API operations.
#[derive(Error, Debug)]
pub enum ComfyApiError {
    /// The base URL (or a URL joined from it) failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// The base URL parsed but cannot have path segments appended (e.g. `mailto:`).
    #[error("base URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),

    /// A path segment was empty, `.` or `..`.
    #[error("invalid path segment: {0:?}")]
    InvalidPathSegment(String),

    /// The outgoing payload could not be encoded as JSON.
    #[error(transparent)]
    Serialize(serde_json::Error),

    /// A header value (usually the API token) contained invalid characters.
    #[error(transparent)]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Connection, DNS, TLS or body-read failure from the HTTP transport.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The service answered with HTTP status >= 400. Displays the raw body.
    #[error("{}", String::from_utf8_lossy(.details))]
    Remote { code: u16, details: Vec<u8> },

    /// A success response whose body did not match the expected JSON shape.
    #[error(transparent)]
    Decode(serde_json::Error),
}

impl ComfyApiError {
    /// HTTP status code for `Remote` errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ComfyApiError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Raw response body for `Remote` errors.
    pub fn details(&self) -> Option<&[u8]> {
        match self {
            ComfyApiError::Remote { details, .. } => Some(details),
            _ => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ComfyApiError::Remote { .. })
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ComfyApiError>;
