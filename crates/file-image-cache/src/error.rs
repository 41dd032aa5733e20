//! Error types for the image cache

use std::fmt;

/// Failure modes of a single streaming ingestion.
#[derive(Debug)]
pub enum IngestError {
    /// The declared content length already exceeds the per-object ceiling.
    OversizeDeclared { declared: u64, limit: u64 },
    /// The body outgrew the per-object ceiling mid-stream.
    OversizeActual { limit: u64 },
    /// The upstream byte stream failed.
    Transport(Box<dyn std::error::Error + Send + Sync>),
    /// Local filesystem failure while staging or publishing.
    Io(Box<std::io::Error>),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::OversizeDeclared { declared, limit } => {
                write!(f, "Declared size {} exceeds limit of {} bytes", declared, limit)
            }
            IngestError::OversizeActual { limit } => {
                write!(f, "Download exceeded limit of {} bytes", limit)
            }
            IngestError::Transport(err) => write!(f, "Upstream transfer failed: {}", err),
            IngestError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Transport(err) => Some(err.as_ref()),
            IngestError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversize_declared_display() {
        let err = IngestError::OversizeDeclared {
            declared: 50_000_000,
            limit: 10_485_760,
        };
        assert_eq!(
            format!("{}", err),
            "Declared size 50000000 exceeds limit of 10485760 bytes"
        );
    }

    #[test]
    fn test_oversize_actual_display() {
        let err = IngestError::OversizeActual { limit: 1024 };
        assert_eq!(format!("{}", err), "Download exceeded limit of 1024 bytes");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = IngestError::from(io);
        assert!(matches!(err, IngestError::Io(_)));
        assert!(format!("{}", err).contains("denied"));
    }
}
