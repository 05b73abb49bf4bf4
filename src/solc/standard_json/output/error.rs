//!
//! The `solc --standard-json` output error.
//!

use serde::Deserialize;
use serde::Serialize;

///
/// The `solc --standard-json` output error.
///
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    /// The component type.
    #[serde(default)]
    pub component: String,
    /// The error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// The formatted error message.
    #[serde(default)]
    pub formatted_message: String,
    /// The non-formatted error message.
    #[serde(default)]
    pub message: String,
    /// The error severity.
    pub severity: String,
    /// The error type.
    #[serde(rename = "type", default)]
    pub r#type: String,
}

impl Error {
    ///
    /// Whether the message is an error rather than a warning or an info.
    ///
    pub fn is_error(&self) -> bool {
        self.severity.as_str() == "error"
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.formatted_message.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}", self.formatted_message)
        }
    }
}
