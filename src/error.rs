use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

/// Network-level failure reported by a [`crate::services::fetcher::Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream connection failed: {0}")]
    Connect(String),

    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("reading upstream body failed: {0}")]
    Body(String),
}

/// The upstream answered, but not with something we can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Non-2xx status.
    #[error("upstream returned status {0}")]
    BadResponse(u16),

    #[error("upstream body is not valid UTF-8")]
    DataDecodingError,

    #[error("menu page has no recognizable weekly menu")]
    MenuUnparseable,

    #[error("servings payload could not be parsed")]
    ServingsUnparseable,

    #[error("user record could not be parsed")]
    UserUnparseable,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid account code: {0:?}")]
    InvalidCode(String),
}

impl FetchError {
    /// Short label used for logs and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Transport(TransportError::Timeout) => "timeout",
            FetchError::Transport(_) => "transport",
            FetchError::Parse(ParseError::BadResponse(_)) => "bad_response",
            FetchError::Parse(ParseError::DataDecodingError) => "decoding",
            FetchError::Parse(_) => "unparseable",
            FetchError::InvalidCode(_) => "invalid_code",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::Transport(TransportError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            FetchError::Transport(_) | FetchError::Parse(_) => StatusCode::BAD_GATEWAY,
            FetchError::InvalidCode(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<FetchError> for (StatusCode, Json<Value>) {
    fn from(e: FetchError) -> Self {
        (e.status_code(), Json(json!({ "error": e.to_string() })))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}
