//!
//! The `solc --standard-json` input source.
//!

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

///
/// The `solc --standard-json` input source.
///
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// The source file URLs to be resolved by the compiler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    /// The source code file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Source {
    ///
    /// A shortcut constructor.
    ///
    pub fn from_url(url: String) -> Self {
        Self {
            urls: Some(vec![url]),
            content: None,
        }
    }
}

impl From<String> for Source {
    fn from(content: String) -> Self {
        Self {
            urls: None,
            content: Some(content),
        }
    }
}

impl TryFrom<&Path> for Source {
    type Error = anyhow::Error;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|error| anyhow::anyhow!("Source file {:?} reading error: {}", path, error))?;
        Ok(Self::from(content))
    }
}
