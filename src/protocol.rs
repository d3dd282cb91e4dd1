//! Cross-context message vocabulary.
//!
//! Every request produces exactly one `Response`. The envelope matches what
//! the extension contexts exchange: `{success, data?, error?, type?}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SnapError;
use crate::model::{ScreenshotInput, Selection};

/// `type` of a response carrying a screenshot.
pub const SCREENSHOT_CAPTURED: &str = "screenshot_captured";
/// `type` of a response carrying an error.
pub const CAPTURE_ERROR: &str = "capture_error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Request {
    CaptureVisible,
    /// Reserved; hosts answer it as unsupported.
    CaptureFullPage,
    CaptureSelection { selection: Selection },
    InitSelectionMode,
    TestConnection,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::CaptureVisible => "capture_visible",
            Request::CaptureFullPage => "capture_full_page",
            Request::CaptureSelection { .. } => "capture_selection",
            Request::InitSelectionMode => "init_selection_mode",
            Request::TestConnection => "test_connection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            kind: None,
        }
    }

    pub fn with_data(data: impl Into<Value>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::ok()
        }
    }

    pub fn captured(screenshot: &ScreenshotInput) -> Self {
        match serde_json::to_value(screenshot) {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                kind: Some(SCREENSHOT_CAPTURED.to_string()),
            },
            Err(e) => Self::failure(&SnapError::CaptureFailed(e.to_string())),
        }
    }

    pub fn failure(err: &SnapError) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("kind".into(), serde_json::json!(err.kind()));
        if let Some(detail) = err.detail() {
            data.insert("detail".into(), Value::String(detail));
        }
        Self {
            success: false,
            data: Some(Value::Object(data)),
            error: Some(err.to_string()),
            kind: Some(CAPTURE_ERROR.to_string()),
        }
    }

    /// An untyped failure, as answered for unknown requests.
    pub fn error_message(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
            kind: None,
        }
    }

    pub fn into_result(self) -> Result<Response, SnapError> {
        if self.success {
            Ok(self)
        } else {
            Err(SnapError::from_response(&self))
        }
    }

    /// Extracts the screenshot from a `screenshot_captured` response.
    pub fn into_screenshot(self) -> Result<ScreenshotInput, SnapError> {
        let response = self.into_result()?;
        let data = response
            .data
            .ok_or_else(|| SnapError::CaptureFailed("Response carried no screenshot".into()))?;
        serde_json::from_value(data)
            .map_err(|e| SnapError::CaptureFailed(format!("Malformed screenshot payload: {}", e)))
    }
}

impl From<Result<Response, SnapError>> for Response {
    fn from(result: Result<Response, SnapError>) -> Self {
        result.unwrap_or_else(|err| Response::failure(&err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CaptureType, Dimensions};

    #[test]
    fn requests_use_extension_message_names() {
        let json = serde_json::to_value(Request::CaptureVisible).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "capture_visible" }));

        let json = serde_json::to_value(Request::CaptureSelection {
            selection: Selection { x: 1, y: 2, width: 30, height: 40 },
        })
        .unwrap();
        assert_eq!(json["type"], "capture_selection");
        assert_eq!(json["data"]["selection"]["width"], 30);
    }

    #[test]
    fn parses_request_from_page_context() {
        let raw = r#"{"type":"capture_selection","data":{"selection":{"x":100,"y":50,"width":200,"height":150}}}"#;
        let request: Request = serde_json::from_str(raw).unwrap();
        assert_eq!(
            request,
            Request::CaptureSelection {
                selection: Selection { x: 100, y: 50, width: 200, height: 150 }
            }
        );
    }

    #[test]
    fn ok_response_omits_empty_fields() {
        let json = serde_json::to_string(&Response::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[test]
    fn captured_response_yields_screenshot() {
        let input = ScreenshotInput {
            image_data: "data:image/png;base64,AA==".into(),
            url: "https://example.com".into(),
            title: "Example".into(),
            capture_type: CaptureType::Visible,
            dimensions: Dimensions::default(),
            timestamp: 1,
        };
        let response = Response::captured(&input);
        assert_eq!(response.kind.as_deref(), Some(SCREENSHOT_CAPTURED));
        assert_eq!(response.into_screenshot().unwrap(), input);
    }

    #[test]
    fn failed_response_yields_error() {
        let response = Response::failure(&SnapError::NoActiveTarget);
        assert_eq!(response.kind.as_deref(), Some(CAPTURE_ERROR));
        assert_eq!(response.into_screenshot(), Err(SnapError::NoActiveTarget));
    }
}
