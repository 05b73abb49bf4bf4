//!
//! The `solc --standard-json` output representation.
//!

pub mod contract;
pub mod error;
pub mod source;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use self::contract::Contract;
use self::error::Error as SolcStandardJsonOutputError;
use self::source::Source;

///
/// The `solc --standard-json` output representation.
///
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Output {
    /// The file-contract hashmap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts: Option<BTreeMap<String, BTreeMap<String, Contract>>>,
    /// The source code mapping data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<BTreeMap<String, Source>>,
    /// The compilation errors and warnings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<SolcStandardJsonOutputError>>,
}

impl Output {
    /// The compiler warning codes which are promoted to errors.
    pub const SEVERE_WARNING_CODES: [&'static str; 1] = [
        // Unnamed return variable can remain unassigned.
        "6321",
    ];

    ///
    /// Returns the contracts of the given file, if present.
    ///
    pub fn file_contracts(&self, path: &str) -> Option<&BTreeMap<String, Contract>> {
        self.contracts.as_ref().and_then(|contracts| contracts.get(path))
    }

    ///
    /// Returns the contract data, if present.
    ///
    pub fn contract(&self, path: &str, name: &str) -> Option<&Contract> {
        self.file_contracts(path)
            .and_then(|contracts| contracts.get(name))
    }

    ///
    /// Returns the first error with the `error` severity, if any.
    ///
    pub fn first_error(&self) -> Option<&SolcStandardJsonOutputError> {
        self.errors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|error| error.is_error())
    }

    ///
    /// Returns the warnings which must be fixed before the build may proceed.
    ///
    pub fn severe_warnings(&self) -> Vec<&SolcStandardJsonOutputError> {
        self.errors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|error| {
                error
                    .error_code
                    .as_deref()
                    .map(|code| Self::SEVERE_WARNING_CODES.contains(&code))
                    .unwrap_or_default()
            })
            .collect()
    }
}
