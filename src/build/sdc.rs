//!
//! The single deployed contract build unit.
//!

use std::collections::BTreeMap;

use serde::Serialize;

use crate::solc::collector::CompilerCollector;

use super::contract::ContractInSdc;

///
/// The single deployed contract build unit.
///
/// Built once per compiled file and primary contract. Holds every contract the primary one
/// depends on until the libraries are split out into their own units.
///
#[derive(Debug, Serialize, Clone)]
pub struct Sdc {
    /// The primary contract name.
    pub primary_contract: String,
    /// The primary contract address.
    pub primary_contract_address: String,
    /// The compiled file.
    pub sdc_origin_file: String,
    /// The source list as seen by the compiler: source ID to path.
    pub original_srclist: BTreeMap<usize, String>,
    /// The source list of the report copies: source ID to path.
    #[serde(rename = "srclist")]
    pub report_srclist: BTreeMap<usize, String>,
    /// The unit name.
    pub sdc_name: String,
    /// The contracts of the unit.
    pub contracts: Vec<ContractInSdc>,
    /// The addresses of the linked libraries, without duplicates.
    pub library_addresses: Vec<String>,
    /// The configuration the unit was built with.
    pub generated_with: String,
    /// The linked storage slots: slot to address.
    pub state: BTreeMap<String, String>,
    /// The linked struct fields: field to address.
    #[serde(rename = "structLinkingInfo")]
    pub struct_linking_info: BTreeMap<String, String>,
    /// The linked struct slots: slot to address.
    #[serde(rename = "legacyStructLinking")]
    pub legacy_struct_linking: BTreeMap<String, String>,
    /// The function signatures the primary contract is a prototype for.
    #[serde(rename = "prototypeFor")]
    pub prototypes: Vec<String>,
    /// The compiler attributes.
    #[serde(skip)]
    pub compiler_collector: CompilerCollector,
}

impl Sdc {
    ///
    /// Returns the contract record with the given name.
    ///
    pub fn contract(&self, name: &str) -> Option<&ContractInSdc> {
        self.contracts
            .iter()
            .find(|contract| contract.name.as_str() == name)
    }

    ///
    /// Returns the mutable contract record with the given name.
    ///
    pub fn contract_mut(&mut self, name: &str) -> Option<&mut ContractInSdc> {
        self.contracts
            .iter_mut()
            .find(|contract| contract.name.as_str() == name)
    }

    ///
    /// Creates the unit of a library split out of this unit.
    ///
    pub fn split_library(&self, library: &ContractInSdc) -> Self {
        Self {
            primary_contract: library.name.clone(),
            primary_contract_address: library.address.clone(),
            sdc_origin_file: library.original_file.clone(),
            original_srclist: self.original_srclist.clone(),
            report_srclist: self.report_srclist.clone(),
            sdc_name: format!("{}_{}", self.sdc_name, library.name),
            contracts: vec![library.clone()],
            library_addresses: vec![],
            generated_with: self.generated_with.clone(),
            state: BTreeMap::new(),
            struct_linking_info: BTreeMap::new(),
            legacy_struct_linking: BTreeMap::new(),
            prototypes: vec![],
            compiler_collector: self.compiler_collector.clone(),
        }
    }
}
