//! Error types for the image relay

use axum::http::StatusCode;
use file_image_cache::IngestError;
use std::fmt;

/// Failure classes of a relayed request.
///
/// Every variant is answered with a placeholder image; the `Display` text
/// doubles as the reason rendered into the placeholder.
#[derive(Debug)]
pub enum RelayError {
    /// The request target could not be turned into an upstream URL.
    InvalidRequest(String),
    /// Upstream answered with a non-200 status.
    UpstreamStatus(u16),
    /// Upstream answered with a non-image content type.
    UpstreamType(String),
    /// The declared content length already exceeds the per-object ceiling.
    OversizeDeclared { declared: u64, limit: u64 },
    /// The body outgrew the per-object ceiling mid-download.
    OversizeActual { limit: u64 },
    /// Network-level failure talking to upstream.
    UpstreamTransport(Box<dyn std::error::Error + Send + Sync>),
    /// Local cache failure.
    Cache(Box<std::io::Error>),
    /// Startup configuration failure.
    Config(String),
}

impl RelayError {
    /// HTTP status for the failure response.
    ///
    /// Upstream statuses are mirrored back to the caller, except statuses
    /// that forbid a response body; transport failures map to 502, local
    /// failures to 500, and everything else to the default 413.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::UpstreamStatus(code) => {
                let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY);
                // 1xx, 204 and 304 forbid a body, which the placeholder needs
                if status.is_informational()
                    || status == StatusCode::NO_CONTENT
                    || status == StatusCode::NOT_MODIFIED
                {
                    StatusCode::BAD_GATEWAY
                } else {
                    status
                }
            }
            RelayError::UpstreamTransport(_) => StatusCode::BAD_GATEWAY,
            RelayError::Cache(_) | RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            RelayError::UpstreamStatus(code) => write!(f, "Upstream returned status {}", code),
            RelayError::UpstreamType(content_type) => {
                write!(f, "Upstream returned non-image content type: {}", content_type)
            }
            RelayError::OversizeDeclared { declared, limit } => {
                write!(f, "Declared size {} exceeds limit of {} bytes", declared, limit)
            }
            RelayError::OversizeActual { limit } => {
                write!(f, "Download exceeded limit of {} bytes", limit)
            }
            RelayError::UpstreamTransport(err) => write!(f, "Upstream request failed: {}", err),
            RelayError::Cache(err) => write!(f, "Cache error: {}", err),
            RelayError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::UpstreamTransport(err) => Some(err.as_ref()),
            RelayError::Cache(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<IngestError> for RelayError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::OversizeDeclared { declared, limit } => {
                RelayError::OversizeDeclared { declared, limit }
            }
            IngestError::OversizeActual { limit } => RelayError::OversizeActual { limit },
            IngestError::Transport(cause) => RelayError::UpstreamTransport(cause),
            IngestError::Io(err) => RelayError::Cache(err),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Cache(Box::new(err))
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::UpstreamTransport(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for RelayError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        RelayError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
