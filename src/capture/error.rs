//! Capture failure kinds

use std::io;
use thiserror::Error;

/// Why a capture session stopped early.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The endpoint could not be opened. Nothing was read or written.
    #[error("Failed to open serial port {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Anything that went wrong after the endpoint was open.
    #[error("Unexpected error while {action} ({lines_written} lines saved): {source}")]
    Unexpected {
        action: String,
        lines_written: usize,
        #[source]
        source: io::Error,
    },
}

impl CaptureError {
    pub(crate) fn unexpected(action: impl Into<String>, lines_written: usize, source: io::Error) -> Self {
        CaptureError::Unexpected {
            action: action.into(),
            lines_written,
            source,
        }
    }

    /// Lines that made it to the output file before the failure
    pub fn lines_written(&self) -> usize {
        match self {
            CaptureError::Connection { .. } => 0,
            CaptureError::Unexpected { lines_written, .. } => *lines_written,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_message() {
        let err = CaptureError::Connection {
            endpoint: "COM3".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such device"),
        };
        assert_eq!(err.to_string(), "Failed to open serial port COM3: no such device");
        assert_eq!(err.lines_written(), 0);
    }

    #[test]
    fn test_unexpected_error_keeps_count() {
        let err = CaptureError::unexpected(
            "decoding line",
            3,
            io::Error::new(io::ErrorKind::InvalidData, "bad utf-8"),
        );
        assert_eq!(err.lines_written(), 3);
        assert!(err.to_string().contains("decoding line"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
