//!
//! The `solc --standard-json` output source.
//!

use serde::Deserialize;
use serde::Serialize;

///
/// The `solc --standard-json` output source.
///
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Source {
    /// The source code ID.
    #[serde(default)]
    pub id: usize,
    /// The source code AST.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<serde_json::Value>,
}
