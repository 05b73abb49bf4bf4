//!
//! The `solc --standard-json` input settings optimizer.
//!

use serde::Deserialize;
use serde::Serialize;

///
/// The `solc --standard-json` input settings optimizer.
///
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Optimizer {
    /// Whether the optimizer is enabled.
    pub enabled: bool,
    /// The expected number of contract runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u64>,
}

impl Optimizer {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(runs: Option<u64>) -> Self {
        Self {
            enabled: true,
            runs,
        }
    }
}
