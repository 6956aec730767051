use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Main error type for chrome-verify
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("CDP connection error: {0}")]
    CdpConnection(String),

    #[error("CDP protocol error: {0}")]
    CdpProtocol(String),

    #[error("JavaScript evaluation error: {0}")]
    JavaScriptError(String),

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("Element not interactable: {element}")]
    ElementNotInteractable { element: String },

    #[error("Invalid element state: {reason} ({element})")]
    InvalidElementState { element: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The collection resolved to nothing at all.
    #[error(
        "Element not found {{{locator}}}\nExpected: {expected}\nTimeout: {}{}",
        timeout_text(.timeout_ms),
        caused_by(.cause)
    )]
    ElementNotFound {
        locator: String,
        expected: String,
        timeout_ms: u64,
        #[source]
        cause: Option<Box<VerifyError>>,
    },

    /// The collection has the wrong number of elements.
    #[error(
        "List size mismatch: expected: {operator} {expected}{}, actual: {actual}, collection: {locator}\nTimeout: {}{}",
        because(.explanation),
        timeout_text(.timeout_ms),
        caused_by(.cause)
    )]
    ListSizeMismatch {
        operator: String,
        expected: usize,
        actual: usize,
        explanation: Option<String>,
        locator: String,
        timeout_ms: u64,
        #[source]
        cause: Option<Box<VerifyError>>,
    },

    /// The collection has the right size but the attribute values differ.
    #[error(
        "{message}\nActual: {}\nExpected: {}{}\nCollection: {locator}\nTimeout: {}{}",
        format_actual(.actual),
        format_expected(.expected),
        because(.explanation),
        timeout_text(.timeout_ms),
        caused_by(.cause)
    )]
    AttributesMismatch {
        message: String,
        locator: String,
        expected: Vec<String>,
        actual: Vec<Option<String>>,
        explanation: Option<String>,
        timeout_ms: u64,
        #[source]
        cause: Option<Box<VerifyError>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Timeout: operation timed out after {timeout}ms")]
    Timeout { timeout: u64 },
}

pub type Result<T> = std::result::Result<T, VerifyError>;

/// Machine-readable view of a failure, for runners that re-format errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl VerifyError {
    pub fn cdp_connection(msg: impl Into<String>) -> Self {
        Self::CdpConnection(msg.into())
    }

    pub fn cdp_protocol(msg: impl Into<String>) -> Self {
        Self::CdpProtocol(msg.into())
    }

    pub fn javascript_error(msg: impl Into<String>) -> Self {
        Self::JavaScriptError(msg.into())
    }

    pub fn stale_element(msg: impl Into<String>) -> Self {
        Self::StaleElement(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn tab_not_found(msg: impl Into<String>) -> Self {
        Self::TabNotFound(msg.into())
    }

    /// Faults a poll loop may swallow and retry until its timeout runs out.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::CdpConnection(_)
                | Self::CdpProtocol(_)
                | Self::JavaScriptError(_)
                | Self::StaleElement(_)
                | Self::WebSocket(_)
                | Self::Http(_)
                | Self::Timeout { .. }
        )
    }

    /// Errors meaning "the target is not in the DOM (any more)".
    pub fn is_missing_element(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. } | Self::StaleElement(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CdpConnection(_) => "CdpConnection",
            Self::CdpProtocol(_) => "CdpProtocol",
            Self::JavaScriptError(_) => "JavaScriptError",
            Self::StaleElement(_) => "StaleElement",
            Self::ElementNotInteractable { .. } => "ElementNotInteractable",
            Self::InvalidElementState { .. } => "InvalidElementState",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::ElementNotFound { .. } => "ElementNotFound",
            Self::ListSizeMismatch { .. } => "ListSizeMismatch",
            Self::AttributesMismatch { .. } => "AttributesMismatch",
            Self::Io(_) => "Io",
            Self::WebSocket(_) => "WebSocket",
            Self::Http(_) => "Http",
            Self::Json(_) => "Json",
            Self::Url(_) => "Url",
            Self::TabNotFound(_) => "TabNotFound",
            Self::Timeout { .. } => "Timeout",
        }
    }

    pub fn report(&self) -> FailureReport {
        let mut report = FailureReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
            locator: None,
            expected: None,
            actual: None,
            timeout_ms: None,
        };

        match self {
            Self::ElementNotFound {
                locator,
                expected,
                timeout_ms,
                ..
            } => {
                report.locator = Some(locator.clone());
                report.expected = Some(json!(expected));
                report.timeout_ms = Some(*timeout_ms);
            }
            Self::ListSizeMismatch {
                operator,
                expected,
                actual,
                locator,
                timeout_ms,
                ..
            } => {
                report.locator = Some(locator.clone());
                report.expected = Some(json!({ "operator": operator, "size": expected }));
                report.actual = Some(json!(actual));
                report.timeout_ms = Some(*timeout_ms);
            }
            Self::AttributesMismatch {
                locator,
                expected,
                actual,
                timeout_ms,
                ..
            } => {
                report.locator = Some(locator.clone());
                report.expected = Some(json!(expected));
                report.actual = Some(json!(actual));
                report.timeout_ms = Some(*timeout_ms);
            }
            Self::ElementNotInteractable { element } | Self::InvalidElementState { element, .. } => {
                report.locator = Some(element.clone());
            }
            Self::Timeout { timeout } => {
                report.timeout_ms = Some(*timeout);
            }
            _ => {}
        }

        report
    }
}

/// `4 s.` for whole seconds, `1500 ms.` otherwise.
pub fn format_timeout(timeout_ms: u64) -> String {
    if timeout_ms > 0 && timeout_ms % 1000 == 0 {
        format!("{} s.", timeout_ms / 1000)
    } else {
        format!("{} ms.", timeout_ms)
    }
}

fn timeout_text(timeout_ms: &u64) -> String {
    format_timeout(*timeout_ms)
}

pub(crate) fn format_expected(values: &[String]) -> String {
    format!("[{}]", values.join(", "))
}

pub(crate) fn format_actual(values: &[Option<String>]) -> String {
    let rendered: Vec<&str> = values
        .iter()
        .map(|value| value.as_deref().unwrap_or("null"))
        .collect();
    format!("[{}]", rendered.join(", "))
}

fn because(explanation: &Option<String>) -> String {
    match explanation {
        Some(reason) => format!(" (because {})", reason),
        None => String::new(),
    }
}

fn caused_by(cause: &Option<Box<VerifyError>>) -> String {
    match cause {
        Some(cause) => format!("\nCaused by: {}", cause),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_error_creation_methods() {
        let error = VerifyError::cdp_connection("connection failed");
        assert!(matches!(error, VerifyError::CdpConnection(_)));
        assert_eq!(format!("{}", error), "CDP connection error: connection failed");

        let error = VerifyError::cdp_protocol("invalid response");
        assert!(matches!(error, VerifyError::CdpProtocol(_)));

        let error = VerifyError::stale_element("node 42");
        assert!(matches!(error, VerifyError::StaleElement(_)));

        let error = VerifyError::invalid_argument("no values");
        assert!(matches!(error, VerifyError::InvalidArgument(_)));
    }

    #[test]
    fn test_timeout_error() {
        let error = VerifyError::Timeout { timeout: 5000 };
        assert_eq!(format!("{}", error), "Timeout: operation timed out after 5000ms");
        assert!(error.is_transient());
    }

    #[test]
    fn test_format_timeout() {
        assert_eq!(format_timeout(4000), "4 s.");
        assert_eq!(format_timeout(1500), "1500 ms.");
        assert_eq!(format_timeout(0), "0 ms.");
    }

    #[test]
    fn test_list_size_mismatch_display() {
        let error = VerifyError::ListSizeMismatch {
            operator: "=".to_string(),
            expected: 3,
            actual: 5,
            explanation: Some("menu has three entries".to_string()),
            locator: "li.item".to_string(),
            timeout_ms: 4000,
            cause: None,
        };
        assert_eq!(
            error.to_string(),
            "List size mismatch: expected: = 3 (because menu has three entries), actual: 5, collection: li.item\nTimeout: 4 s."
        );
    }

    #[test]
    fn test_attributes_mismatch_display_renders_null() {
        let error = VerifyError::AttributesMismatch {
            message: "Attribute 'href' values mismatch".to_string(),
            locator: "a".to_string(),
            expected: vec!["/a".to_string(), "/b".to_string()],
            actual: vec![Some("/a".to_string()), None],
            explanation: None,
            timeout_ms: 100,
            cause: None,
        };
        let text = error.to_string();
        assert!(text.contains("Actual: [/a, null]"));
        assert!(text.contains("Expected: [/a, /b]"));
        assert!(text.contains("Collection: a"));
        assert!(text.ends_with("Timeout: 100 ms."));
    }

    #[test]
    fn test_element_not_found_exposes_cause() {
        let error = VerifyError::ElementNotFound {
            locator: "ul > li".to_string(),
            expected: "Attribute: 'id' values [x]".to_string(),
            timeout_ms: 4000,
            cause: Some(Box::new(VerifyError::stale_element("gone"))),
        };
        assert!(error.to_string().starts_with("Element not found {ul > li}"));
        assert!(error.to_string().contains("Caused by: Stale element reference: gone"));
        let source = error.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Stale element reference: gone"));
        assert!(error.is_missing_element());
        assert!(!error.is_transient());
    }

    #[test]
    fn test_report_carries_structured_fields() {
        let error = VerifyError::AttributesMismatch {
            message: "mismatch".to_string(),
            locator: "input".to_string(),
            expected: vec!["a".to_string()],
            actual: vec![None],
            explanation: None,
            timeout_ms: 4000,
            cause: None,
        };
        let report = error.report();
        assert_eq!(report.kind, "AttributesMismatch");
        assert_eq!(report.locator.as_deref(), Some("input"));
        assert_eq!(report.expected, Some(json!(["a"])));
        assert_eq!(report.actual, Some(json!([null])));
        assert_eq!(report.timeout_ms, Some(4000));

        let json_str = serde_json::to_string(&report).unwrap();
        let parsed: FailureReport = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_error_from_conversions() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: VerifyError = io_error.into();
        assert!(matches!(error, VerifyError::Io(_)));

        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: VerifyError = json_error.into();
        assert!(matches!(error, VerifyError::Json(_)));

        let url_error = url::Url::parse("not_a_url").unwrap_err();
        let error: VerifyError = url_error.into();
        assert!(matches!(error, VerifyError::Url(_)));
    }
}
