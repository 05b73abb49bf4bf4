//!
//! The `solc --standard-json` output contract.
//!

pub mod abi;
pub mod evm;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use self::abi::entry::Entry as AbiEntry;
use self::evm::EVM;

///
/// The `solc --standard-json` output contract.
///
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// The contract ABI.
    #[serde(default)]
    pub abi: Vec<AbiEntry>,
    /// The contract storage layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_layout: Option<serde_json::Value>,
    /// The contract EVM data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm: Option<EVM>,
}

impl Contract {
    ///
    /// Returns the `methodIdentifiers` map, which is empty if not requested.
    ///
    pub fn method_identifiers(&self) -> BTreeMap<String, String> {
        self.evm
            .as_ref()
            .and_then(|evm| evm.method_identifiers.clone())
            .unwrap_or_default()
    }

    ///
    /// Returns the source code signatures of the ABI functions and the constructor.
    ///
    /// Internal types are preferred over the external ones, so user-defined types keep
    /// their names.
    ///
    pub fn abi_source_code_signatures(&self) -> Vec<String> {
        self.abi
            .iter()
            .filter(|entry| entry.is_function() || entry.is_constructor())
            .map(|entry| entry.source_code_signature())
            .collect()
    }
}
