//!
//! The contract ABI entry parameter.
//!

use serde::Deserialize;
use serde::Serialize;

///
/// The contract ABI entry parameter.
///
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// The parameter name.
    #[serde(default)]
    pub name: String,
    /// The external parameter type.
    #[serde(rename = "type")]
    pub r#type: String,
    /// The internal parameter type, which keeps user-defined names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    /// The tuple components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Parameter>>,
}
