//!
//! The build model.
//!

pub mod address;
pub mod contract;
pub mod immutable;
pub mod sdc;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use self::sdc::Sdc;

///
/// The build model: `{contract}_{address}` to the build unit.
///
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Build {
    /// The build units.
    pub sdcs: BTreeMap<String, Sdc>,
}

impl Build {
    ///
    /// Returns the key of the unit of a contract deployed at the address.
    ///
    pub fn key(contract: &str, address: &str) -> String {
        format!("{}_{}", contract, address)
    }

    ///
    /// Inserts the unit under its primary contract key.
    ///
    pub fn insert(&mut self, sdc: Sdc) {
        let key = Self::key(sdc.primary_contract.as_str(), sdc.primary_contract_address.as_str());
        tracing::debug!(target: "build_conf", "adding the build unit {}", key);
        self.sdcs.insert(key, sdc);
    }

    ///
    /// Returns the keys of the units of the contract.
    ///
    pub fn matching_keys(&self, contract: &str) -> Vec<String> {
        self.sdcs
            .iter()
            .filter(|(_, sdc)| sdc.primary_contract.as_str() == contract)
            .map(|(key, _)| key.to_owned())
            .collect()
    }

    ///
    /// Returns the address of the primary contract of one of the units of the contract.
    ///
    pub fn primary_address_of(&self, contract: &str) -> Option<String> {
        self.matching_keys(contract)
            .first()
            .and_then(|key| self.sdcs.get(key))
            .map(|sdc| sdc.primary_contract_address.clone())
    }

    ///
    /// Writes the build model to a JSON file.
    ///
    pub fn write_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        File::create(path)
            .map_err(|error| anyhow::anyhow!("File {:?} creating error: {}", path, error))?
            .write_all(json.as_slice())
            .map_err(|error| anyhow::anyhow!("File {:?} writing error: {}", path, error))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use crate::build::contract::tests::contract;
    use crate::build::sdc::Sdc;
    use crate::build::Build;
    use crate::compiler_lang::CompilerLang;
    use crate::solc::collector::CompilerCollector;

    pub(crate) fn sdc(primary: &str, address: &str) -> Sdc {
        Sdc {
            primary_contract: primary.to_owned(),
            primary_contract_address: address.to_owned(),
            sdc_origin_file: format!("/project/{}.sol", primary),
            original_srclist: BTreeMap::new(),
            report_srclist: BTreeMap::new(),
            sdc_name: format!("{}.sol_0", primary),
            contracts: vec![contract(primary, address)],
            library_addresses: vec![],
            generated_with: String::new(),
            state: BTreeMap::new(),
            struct_linking_info: BTreeMap::new(),
            legacy_struct_linking: BTreeMap::new(),
            prototypes: vec![],
            compiler_collector: CompilerCollector::new(
                CompilerLang::Solidity,
                "solc".to_owned(),
                semver::Version::new(0, 8, 17),
                String::new(),
            ),
        }
    }

    #[test]
    fn keys_match_by_primary_contract() {
        let mut build = Build::default();
        build.insert(sdc("Token", "01"));
        build.insert(sdc("TokenLib", "02"));
        build.insert(sdc("Token_Impl", "03"));

        assert_eq!(build.matching_keys("Token"), vec!["Token_01".to_owned()]);
        assert_eq!(
            build.matching_keys("Token_Impl"),
            vec!["Token_Impl_03".to_owned()]
        );
        assert_eq!(build.primary_address_of("Token").as_deref(), Some("01"));
        assert_eq!(build.primary_address_of("TokenLib").as_deref(), Some("02"));
        assert!(build.matching_keys("Vault").is_empty());
    }

    #[test]
    fn sdc_json_shape() {
        let mut unit = sdc("Token", "01");
        unit.original_srclist.insert(0, "/project/Token.sol".to_owned());
        let mut build = Build::default();
        build.insert(unit);

        let json = serde_json::to_value(&build).expect("Always valid");
        let unit = &json["Token_01"];
        let keys: Vec<&str> = unit
            .as_object()
            .expect("Always valid")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec![
                "primary_contract",
                "primary_contract_address",
                "sdc_origin_file",
                "original_srclist",
                "srclist",
                "sdc_name",
                "contracts",
                "library_addresses",
                "generated_with",
                "state",
                "structLinkingInfo",
                "legacyStructLinking",
                "prototypeFor",
            ]
        );
        assert_eq!(unit["original_srclist"]["0"], "/project/Token.sol");
    }

    #[test]
    fn library_is_split_out() {
        let mut unit = sdc("Token", "01");
        unit.contracts.push(contract("Math", "02"));
        let library = unit.contract("Math").expect("Always exists").clone();

        let split = unit.split_library(&library);
        assert_eq!(split.primary_contract, "Math");
        assert_eq!(split.primary_contract_address, "02");
        assert_eq!(split.sdc_name, "Token.sol_0_Math");
        assert_eq!(split.contracts.len(), 1);
        assert!(split.library_addresses.is_empty());
    }
}
