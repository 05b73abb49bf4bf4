//!
//! The `solc --standard-json` output contract EVM data.
//!

pub mod bytecode;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use self::bytecode::Bytecode;

///
/// The `solc --standard-json` output contract EVM data.
///
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EVM {
    /// The contract text assembly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    /// The contract deploy bytecode.
    #[serde(rename = "bytecode", default, skip_serializing_if = "Option::is_none")]
    pub deploy_bytecode: Option<Bytecode>,
    /// The contract runtime bytecode.
    #[serde(
        rename = "deployedBytecode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub runtime_bytecode: Option<Bytecode>,
    /// The contract function signatures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_identifiers: Option<BTreeMap<String, String>>,
}
