//!
//! The contract ABI entry.
//!

use serde::Deserialize;
use serde::Serialize;

use super::parameter::Parameter;

///
/// The contract ABI entry.
///
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// The entry type, e.g. `function`, `constructor`, `event`.
    #[serde(rename = "type")]
    pub r#type: String,
    /// The entry name. Absent for constructors, fallback and receive functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The input parameters.
    #[serde(default)]
    pub inputs: Vec<Parameter>,
    /// The output parameters.
    #[serde(default)]
    pub outputs: Vec<Parameter>,
    /// The state mutability keyword.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
    /// The legacy payability flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
}

impl Entry {
    /// The constructor entry type and name.
    pub const CONSTRUCTOR: &'static str = "constructor";

    /// The function entry type.
    pub const FUNCTION: &'static str = "function";

    ///
    /// Whether the entry is a function.
    ///
    pub fn is_function(&self) -> bool {
        self.r#type.as_str() == Self::FUNCTION
    }

    ///
    /// Whether the entry is the constructor.
    ///
    pub fn is_constructor(&self) -> bool {
        self.r#type.as_str() == Self::CONSTRUCTOR
    }

    ///
    /// The entry name as used in signatures.
    ///
    pub fn signature_name(&self) -> &str {
        if self.is_constructor() {
            Self::CONSTRUCTOR
        } else {
            self.name.as_deref().unwrap_or_default()
        }
    }

    ///
    /// The signature built from the internal parameter types.
    ///
    pub fn source_code_signature(&self) -> String {
        let inputs: Vec<&str> = self
            .inputs
            .iter()
            .map(|input| input.internal_type.as_deref().unwrap_or(input.r#type.as_str()))
            .collect();
        format!("{}({})", self.signature_name(), inputs.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::Entry;

    #[test]
    fn source_code_signature_prefers_internal_types() {
        let input = r#"{
    "type": "function",
    "name": "transfer",
    "inputs": [
        { "name": "to", "type": "address", "internalType": "contract IERC20" },
        { "name": "amount", "type": "uint256", "internalType": "uint256" }
    ],
    "outputs": [],
    "stateMutability": "nonpayable"
}"#;
        let entry: Entry = serde_json::from_str(input).expect("Always valid");
        assert_eq!(
            entry.source_code_signature(),
            "transfer(contract IERC20,uint256)".to_owned()
        );
    }

    #[test]
    fn constructor_is_named() {
        let input = r#"{ "type": "constructor", "inputs": [ { "name": "x", "type": "uint8" } ] }"#;
        let entry: Entry = serde_json::from_str(input).expect("Always valid");
        assert_eq!(entry.source_code_signature(), "constructor(uint8)".to_owned());
    }
}
