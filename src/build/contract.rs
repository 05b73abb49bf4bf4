//!
//! The compiled contract record.
//!

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ast::source_range::SourceRange;
use crate::compiler_lang::CompilerLang;
use crate::function::Func;
use crate::types::Type;

use super::immutable::ImmutableReference;

///
/// The compiled contract record of a build unit.
///
#[derive(Debug, Serialize, Clone)]
pub struct ContractInSdc {
    /// The contract name.
    pub name: String,
    /// The compiled file declaring the contract.
    pub original_file: String,
    /// The source language.
    pub lang: CompilerLang,
    /// The report path of the unit primary file.
    #[serde(rename = "file")]
    pub report_source_file: String,
    /// The assigned address.
    pub address: String,
    /// The external and public functions.
    pub methods: Vec<Func>,
    /// The linked deployed bytecode.
    pub bytecode: String,
    /// The linked constructor bytecode.
    #[serde(rename = "constructorBytecode")]
    pub constructor_bytecode: String,
    /// The deployed bytecode source map.
    pub srcmap: String,
    /// The variable map, unused.
    pub varmap: String,
    /// The constructor bytecode source map.
    #[serde(rename = "constructorSrcmap")]
    pub constructor_srcmap: String,
    /// The storage layout reported by the compiler.
    #[serde(rename = "storageLayout")]
    pub storage_layout: Option<serde_json::Value>,
    /// The immutable references.
    pub immutables: Vec<ImmutableReference>,
    /// The function finders: finder symbol to the internal function descriptor.
    #[serde(rename = "internalFunctions")]
    pub function_finders: BTreeMap<String, serde_json::Value>,
    /// The functions of all contracts of the unit, unique by internal signature.
    #[serde(rename = "allMethods")]
    pub all_funcs: Vec<Func>,
    /// The user-defined types visible in the contract.
    pub types: Vec<Type>,
    /// The compiler name.
    #[serde(rename = "compilerName")]
    pub compiler_name: String,
    /// The compiler version.
    #[serde(rename = "compilerVersion")]
    pub compiler_version: String,
    /// The optimization flags.
    #[serde(rename = "optimizationFlags")]
    pub optimization_flags: String,
    /// The internal and private functions.
    #[serde(skip)]
    pub internal_funcs: Vec<Func>,
    /// The public functions.
    #[serde(skip)]
    pub public_funcs: Vec<Func>,
    /// The source range of the contract definition.
    #[serde(skip)]
    pub source_bytes: Option<SourceRange>,
}

impl ContractInSdc {
    ///
    /// Returns the functions which may get an internal function finder, without duplicates.
    ///
    pub fn instrumentable_funcs(&self) -> Vec<&Func> {
        let mut functions: Vec<&Func> = Vec::new();
        for function in self.internal_funcs.iter().chain(self.public_funcs.iter()) {
            if !functions.contains(&function) {
                functions.push(function);
            }
        }
        functions
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use crate::compiler_lang::CompilerLang;
    use crate::function::tests::func;
    use crate::function::visibility::Visibility;

    use super::ContractInSdc;

    pub(crate) fn contract(name: &str, address: &str) -> ContractInSdc {
        ContractInSdc {
            name: name.to_owned(),
            original_file: format!("/project/{}.sol", name),
            lang: CompilerLang::Solidity,
            report_source_file: format!("{}.sol_0/0_{}.sol", name, name),
            address: address.to_owned(),
            methods: vec![],
            bytecode: "6080".to_owned(),
            constructor_bytecode: "6080".to_owned(),
            srcmap: String::new(),
            varmap: String::new(),
            constructor_srcmap: String::new(),
            storage_layout: None,
            immutables: vec![],
            function_finders: BTreeMap::new(),
            all_funcs: vec![],
            types: vec![],
            compiler_name: "solc".to_owned(),
            compiler_version: "0.8.17".to_owned(),
            optimization_flags: String::new(),
            internal_funcs: vec![],
            public_funcs: vec![],
            source_bytes: None,
        }
    }

    #[test]
    fn json_keys_are_ordered() {
        let json = serde_json::to_value(contract("Token", "01")).expect("Always valid");
        let keys: Vec<&str> = json
            .as_object()
            .expect("Always valid")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "original_file",
                "lang",
                "file",
                "address",
                "methods",
                "bytecode",
                "constructorBytecode",
                "srcmap",
                "varmap",
                "constructorSrcmap",
                "storageLayout",
                "immutables",
                "internalFunctions",
                "allMethods",
                "types",
                "compilerName",
                "compilerVersion",
                "optimizationFlags",
            ]
        );
        assert_eq!(json["lang"], "Solidity");
    }

    #[test]
    fn instrumentable_funcs_are_unique() {
        let mut record = contract("Token", "01");
        let shared = func("f", &["uint256"], Visibility::Public);
        record.public_funcs = vec![shared.clone()];
        record.internal_funcs = vec![shared, func("g", &[], Visibility::Internal)];
        let names: Vec<&str> = record
            .instrumentable_funcs()
            .into_iter()
            .map(|function| function.name.as_str())
            .collect();
        assert_eq!(names, vec!["f", "g"]);
    }
}
