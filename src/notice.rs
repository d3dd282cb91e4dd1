//! Transient notifications for presentation surfaces.

use std::time::Duration;

use crate::error::SnapError;

pub const SUCCESS_DISMISS: Duration = Duration::from_secs(2);
pub const ERROR_DISMISS: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub dismiss_after: Duration,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            dismiss_after: SUCCESS_DISMISS,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            dismiss_after: ERROR_DISMISS,
        }
    }

    pub fn from_result<T>(result: &Result<T, SnapError>, success: &str) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
