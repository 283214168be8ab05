use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{io, path::PathBuf};
use thiserror::Error;

use crate::led::LedColor;

/// Failures of the device control substrate (motord files, GPIO, network).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to read status file {path:?}: {source}")]
    StatusRead { path: PathBuf, source: io::Error },

    #[error("status file {0:?} is empty")]
    StatusEmpty(PathBuf),

    #[error("status file {path:?} starts with byte {found:#04x}, expected a decimal digit")]
    StatusNotDigit { path: PathBuf, found: u8 },

    #[error("failed to write {color} led ({path:?}): {source}")]
    LedWrite {
        color: LedColor,
        path: PathBuf,
        source: io::Error,
    },

    #[error("{0:?} file not found")]
    EventFileMissing(PathBuf),

    #[error("failed to enumerate network interfaces: {0}")]
    Interfaces(io::Error),
}

impl GatewayError {
    /// Whether the error means the control substrate is unusable and the
    /// gateway has to stop. A timed-out read or write is reported but
    /// survivable.
    pub fn is_fatal(&self) -> bool {
        match self {
            GatewayError::StatusRead { source, .. } | GatewayError::LedWrite { source, .. } => {
                !is_transient(source.kind())
            }
            _ => true,
        }
    }
}

// tokio::fs already retries EINTR, and regular files never return EAGAIN.
fn is_transient(kind: io::ErrorKind) -> bool {
    kind == io::ErrorKind::TimedOut
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_fatal() {
        let err = GatewayError::StatusRead {
            path: PathBuf::from("status"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_timed_out_is_transient() {
        let err = GatewayError::LedWrite {
            color: LedColor::Blue,
            path: PathBuf::from("value"),
            source: io::Error::from(io::ErrorKind::TimedOut),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_would_block_is_fatal() {
        let err = GatewayError::StatusRead {
            path: PathBuf::from("status"),
            source: io::Error::from(io::ErrorKind::WouldBlock),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_decode_errors_are_fatal() {
        assert!(GatewayError::StatusEmpty(PathBuf::from("status")).is_fatal());
        let err = GatewayError::StatusNotDigit {
            path: PathBuf::from("status"),
            found: b'x',
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("0x78"));
    }
}
