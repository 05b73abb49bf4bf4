//!
//! The smart contract language.
//!

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

///
/// The smart contract language.
///
/// Also serves as the `language` field of the `--standard-json` input.
///
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilerLang {
    /// The Solidity language.
    Solidity,
    /// The Vyper language.
    Vyper,
}

impl CompilerLang {
    /// The Vyper source file extension.
    pub const VYPER_EXTENSION: &'static str = "vy";

    ///
    /// Detects the language by the source file extension.
    ///
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(Self::VYPER_EXTENSION) => Self::Vyper,
            _ => Self::Solidity,
        }
    }

    ///
    /// The default compiler executable name.
    ///
    pub fn default_executable(&self) -> &'static str {
        match self {
            Self::Solidity => "solc",
            Self::Vyper => "vyper",
        }
    }

    ///
    /// The compiler name reported in the build model.
    ///
    pub fn compiler_name(&self) -> &'static str {
        match self {
            Self::Solidity => "solc",
            Self::Vyper => "vyper",
        }
    }

    ///
    /// Whether the language has an import graph visible in the AST.
    ///
    pub fn supports_imports(&self) -> bool {
        matches!(self, Self::Solidity)
    }

    ///
    /// Normalizes a computed selector to the form reported in `methodIdentifiers`.
    ///
    pub fn normalize_func_hash(&self, hash: &str) -> String {
        match self {
            Self::Solidity => hash.to_owned(),
            Self::Vyper => match u32::from_str_radix(hash, 16) {
                Ok(value) => format!("0x{:x}", value),
                Err(_) => hash.to_owned(),
            },
        }
    }

    ///
    /// Normalizes the bytecode hex string to the un-prefixed form.
    ///
    pub fn normalize_deployed_bytecode(&self, bytecode: String) -> String {
        match self {
            Self::Solidity => bytecode,
            Self::Vyper => match bytecode.strip_prefix("0x") {
                Some(stripped) => stripped.to_owned(),
                None => bytecode,
            },
        }
    }

    ///
    /// The AST node identifier attribute name.
    ///
    pub fn node_id_key(&self) -> &'static str {
        match self {
            Self::Solidity => "id",
            Self::Vyper => "node_id",
        }
    }

    ///
    /// The AST node type attribute name.
    ///
    pub fn node_type_key(&self) -> &'static str {
        match self {
            Self::Solidity => "nodeType",
            Self::Vyper => "ast_type",
        }
    }

    ///
    /// The AST node type of a contract definition.
    ///
    pub fn contract_definition_kind(&self) -> &'static str {
        match self {
            Self::Solidity => "ContractDefinition",
            Self::Vyper => "Module",
        }
    }

    ///
    /// The per-contract output selection.
    ///
    pub fn contract_output_selection(&self) -> Vec<&'static str> {
        match self {
            Self::Solidity => vec![
                "storageLayout",
                "abi",
                "evm.bytecode",
                "evm.deployedBytecode",
                "evm.methodIdentifiers",
                "evm.assembly",
            ],
            Self::Vyper => vec![
                "abi",
                "evm.bytecode",
                "evm.deployedBytecode",
                "evm.methodIdentifiers",
            ],
        }
    }

    ///
    /// The per-source output selection.
    ///
    pub fn source_output_selection(&self) -> Vec<&'static str> {
        match self {
            Self::Solidity => vec!["id", "ast"],
            Self::Vyper => vec!["ast"],
        }
    }

    ///
    /// The full `outputSelection` value of the `--standard-json` input.
    ///
    pub fn output_selection(&self) -> serde_json::Value {
        serde_json::json!({
            "*": {
                "*": self.contract_output_selection(),
                "": self.source_output_selection(),
            }
        })
    }
}

impl std::fmt::Display for CompilerLang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solidity => write!(f, "Solidity"),
            Self::Vyper => write!(f, "Vyper"),
        }
    }
}
