//! Crate-wide error taxonomy.
//!
//! Module-local errors (`CodecError`, `StorageError`) convert into
//! `SnapError`. When an error crosses a context boundary it travels as a
//! failed `Response` carrying an `ErrorKind`, and is rebuilt on the other side.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::codec::CodecError;
use crate::protocol::Response;
use crate::store::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapError {
    #[error("No active tab found")]
    NoActiveTarget,

    #[error("Cannot capture on this page: {0}")]
    TargetNotCapturable(String),

    #[error("Page is not reachable, please refresh the page and try again: {0}")]
    TargetUnreachable(String),

    #[error("Failed to capture screenshot: {0}")]
    CaptureFailed(String),

    #[error("Invalid image data: {0}")]
    Decode(String),

    #[error("Capture timed out after {}ms. Please try again.", .0.as_millis())]
    TimedOut(Duration),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Validation(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Wire-stable discriminant of a `SnapError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoActiveTarget,
    TargetNotCapturable,
    TargetUnreachable,
    CaptureFailed,
    DecodeError,
    CaptureTimedOut,
    StorageError,
    ValidationError,
    ClipboardError,
    ConfigError,
}

impl SnapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnapError::NoActiveTarget => ErrorKind::NoActiveTarget,
            SnapError::TargetNotCapturable(_) => ErrorKind::TargetNotCapturable,
            SnapError::TargetUnreachable(_) => ErrorKind::TargetUnreachable,
            SnapError::CaptureFailed(_) => ErrorKind::CaptureFailed,
            SnapError::Decode(_) => ErrorKind::DecodeError,
            SnapError::TimedOut(_) => ErrorKind::CaptureTimedOut,
            SnapError::Storage(_) => ErrorKind::StorageError,
            SnapError::Validation(_) => ErrorKind::ValidationError,
            SnapError::Clipboard(_) => ErrorKind::ClipboardError,
            SnapError::Config(_) => ErrorKind::ConfigError,
        }
    }

    /// The payload of the variant, used to rebuild it on the far side.
    pub fn detail(&self) -> Option<String> {
        match self {
            SnapError::NoActiveTarget => None,
            SnapError::TimedOut(after) => Some(after.as_millis().to_string()),
            SnapError::TargetNotCapturable(detail)
            | SnapError::TargetUnreachable(detail)
            | SnapError::CaptureFailed(detail)
            | SnapError::Decode(detail)
            | SnapError::Storage(detail)
            | SnapError::Validation(detail)
            | SnapError::Clipboard(detail)
            | SnapError::Config(detail) => Some(detail.clone()),
        }
    }

    /// Rebuilds the error carried by a failed response.
    ///
    /// Responses without a recognised kind (a plain `{success: false, error}`
    /// envelope) become `CaptureFailed` with the error string.
    pub fn from_response(response: &Response) -> Self {
        let data = response.data.as_ref();
        let kind = data
            .and_then(|data| data.get("kind"))
            .and_then(|kind| serde_json::from_value::<ErrorKind>(kind.clone()).ok());
        let detail = data
            .and_then(|data| data.get("detail"))
            .and_then(|detail| detail.as_str())
            .map(str::to_string)
            .or_else(|| response.error.clone())
            .unwrap_or_else(|| "Capture failed".to_string());

        match kind {
            Some(ErrorKind::NoActiveTarget) => SnapError::NoActiveTarget,
            Some(ErrorKind::TargetNotCapturable) => SnapError::TargetNotCapturable(detail),
            Some(ErrorKind::TargetUnreachable) => SnapError::TargetUnreachable(detail),
            Some(ErrorKind::DecodeError) => SnapError::Decode(detail),
            Some(ErrorKind::StorageError) => SnapError::Storage(detail),
            Some(ErrorKind::ValidationError) => SnapError::Validation(detail),
            Some(ErrorKind::ClipboardError) => SnapError::Clipboard(detail),
            Some(ErrorKind::ConfigError) => SnapError::Config(detail),
            Some(ErrorKind::CaptureTimedOut) => match detail.parse::<u64>() {
                Ok(ms) => SnapError::TimedOut(Duration::from_millis(ms)),
                Err(_) => SnapError::CaptureFailed(detail),
            },
            Some(ErrorKind::CaptureFailed) | None => SnapError::CaptureFailed(detail),
        }
    }
}

impl From<CodecError> for SnapError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::ZeroDimension | CodecError::OutOfBounds { .. } => {
                SnapError::Validation(err.to_string())
            }
            other => SnapError::Decode(other.to_string()),
        }
    }
}

impl From<StorageError> for SnapError {
    fn from(err: StorageError) -> Self {
        SnapError::Storage(err.to_string())
    }
}
