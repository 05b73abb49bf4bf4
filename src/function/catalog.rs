//!
//! The contract function catalog.
//!

use std::collections::BTreeSet;

use crate::ast::node::Node;
use crate::ast::AstIndex;
use crate::compiler_lang::CompilerLang;
use crate::error::Error;
use crate::solc::standard_json::output::contract::abi::entry::Entry as AbiEntry;
use crate::solc::standard_json::output::contract::Contract as SolcStandardJsonOutputContract;
use crate::types::abi as abi_types;
use crate::types::ast::TypeResolver;
use crate::types::declarations::Declarations;
use crate::types::solidity_type::SolidityType;
use crate::types::Type;

use super::visibility::Visibility;
use super::Func;
use super::FunctionLocation;
use super::StateMutability;

///
/// Collects the functions visible in a contract from its AST, its ABI and its base contracts.
///
#[derive(Debug)]
pub struct FunctionCatalog<'a> {
    /// The AST index.
    index: &'a AstIndex,
    /// The original file the compilation was made for.
    original_file: &'a str,
    /// The source language.
    lang: CompilerLang,
    /// The compiler output of the contract.
    contract: &'a SolcStandardJsonOutputContract,
    /// The user-defined types visible in the contract.
    types: &'a [Type],
    /// The ABI source code signatures, constructor included.
    abi_signatures: Vec<String>,
}

impl<'a> FunctionCatalog<'a> {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(
        index: &'a AstIndex,
        original_file: &'a str,
        lang: CompilerLang,
        contract: &'a SolcStandardJsonOutputContract,
        types: &'a [Type],
    ) -> Self {
        Self {
            index,
            original_file,
            lang,
            contract,
            types,
            abi_signatures: contract.abi_source_code_signatures(),
        }
    }

    ///
    /// Collects the functions of the contract and its base contracts, including the
    /// generated getters of public state variables.
    ///
    /// Every external function appears once per selector, the most derived definition winning.
    ///
    pub fn collect(&self, compiled_file: &str, contract_name: &str) -> Result<Vec<Func>, Error> {
        let functions = match self.lang {
            CompilerLang::Solidity => self.collect_solidity(compiled_file, contract_name)?,
            CompilerLang::Vyper => self.collect_vyper()?,
        };

        let collected: Vec<String> = functions
            .iter()
            .filter(|function| function.is_abi && function.name.as_str() != AbiEntry::CONSTRUCTOR)
            .map(Func::source_code_signature)
            .collect();
        let expected = self
            .abi_signatures
            .iter()
            .filter(|signature| !signature.starts_with(AbiEntry::CONSTRUCTOR))
            .count();
        if collected.len() != expected {
            return Err(Error::internal(format!(
                "There are functions in the ABI that were not added. Added functions ({}): {:?}. Functions in ABI ({}): {:?}",
                collected.len(),
                collected,
                self.abi_signatures.len(),
                self.abi_signatures
            )));
        }

        Ok(functions)
    }

    fn collect_solidity(&self, compiled_file: &str, contract_name: &str) -> Result<Vec<Func>, Error> {
        let declarations = Declarations::new(self.index, self.original_file);
        let base_contracts =
            self.index
                .base_contracts(self.original_file, compiled_file, contract_name)?;
        tracing::debug!(target: "ast", "base contracts of {} in {}: {:?}", contract_name, compiled_file, base_contracts);

        let mut functions = Vec::new();
        let mut selectors = BTreeSet::new();
        for base in base_contracts.iter() {
            let unit = match self.index.unit(self.original_file, base.file.as_str()) {
                Some(unit) => unit,
                None => continue,
            };
            let resolver = TypeResolver::new(declarations, base.is_library);

            for definition in unit
                .values()
                .filter(|node| Self::is_function_definition(node, base.name.as_str()))
            {
                let function = match self.function_from_definition(
                    &resolver,
                    definition,
                    base.file.as_str(),
                    base.is_library,
                    &mut selectors,
                )? {
                    Some(function) => function,
                    None => continue,
                };
                if function.visibility != Visibility::Private || base.name.as_str() == contract_name {
                    tracing::debug!(target: "ast", "function {} added", function.source_code_signature());
                    functions.push(function);
                }
            }

            for variable in unit
                .values()
                .filter(|node| Self::is_public_state_variable(node, base.name.as_str()))
            {
                if let Some(getter) = self.getter(variable, base.is_library, &mut selectors)? {
                    tracing::debug!(target: "ast", "added the generated getter {}", getter.name);
                    functions.push(getter);
                }
            }
        }

        Ok(functions)
    }

    fn function_from_definition(
        &self,
        resolver: &TypeResolver,
        definition: &Node,
        file: &str,
        from_lib: bool,
        selectors: &mut BTreeSet<String>,
    ) -> Result<Option<Func>, Error> {
        let name = definition.name().unwrap_or_default();
        let visibility: Visibility = definition
            .get_str("visibility")
            .unwrap_or_default()
            .parse()
            .map_err(Error::internal)?;
        let parameters = Self::parameter_list(definition, "parameters");
        let full_args = parameters
            .iter()
            .map(|parameter| resolver.resolve(parameter))
            .collect::<Result<Vec<SolidityType>, Error>>()?;
        let is_constructor = name.is_empty();

        let sighash = if !is_constructor && visibility.is_external() {
            let selector = self.function_selector(Some(definition), name, full_args.as_slice())?;
            if !selectors.insert(selector.clone()) {
                return Ok(None);
            }
            selector
        } else {
            "0".to_owned()
        };
        let name = if is_constructor {
            AbiEntry::CONSTRUCTOR
        } else {
            name
        };

        let returns = Self::parameter_list(definition, "returnParameters")
            .iter()
            .map(|parameter| resolver.resolve(parameter))
            .collect::<Result<Vec<SolidityType>, Error>>()?;

        let is_abi = self.is_abi(is_constructor, name, full_args.as_slice(), returns.as_slice());
        if is_constructor && !is_abi {
            return Ok(None);
        }

        let location = definition
            .child("body")
            .filter(|body| body.is("Block"))
            .and_then(|body| body.src())
            .map(|src| FunctionLocation {
                file: file.to_owned(),
                src,
            });
        let implemented = definition.get_bool("implemented").unwrap_or(location.is_some());
        if location.is_none() && implemented {
            tracing::debug!(target: "ast", "no body for {} but the AST claims it is implemented", name);
        }

        let state_mutability = StateMutability::new(
            definition
                .get_str("stateMutability")
                .unwrap_or(StateMutability::NONPAYABLE),
        );

        Ok(Some(Func {
            name: name.to_owned(),
            full_args,
            param_names: parameters
                .iter()
                .map(|parameter| parameter.name().unwrap_or_default().to_owned())
                .collect(),
            returns,
            sighash,
            notpayable: state_mutability.is_not_payable(),
            is_abi,
            from_lib,
            is_constructor,
            state_mutability,
            visibility,
            implemented,
            overrides: definition.get("overrides").is_some(),
            ast_id: Some(definition.id),
            location,
        }))
    }

    fn getter(
        &self,
        variable: &Node,
        from_lib: bool,
        selectors: &mut BTreeSet<String>,
    ) -> Result<Option<Func>, Error> {
        let name = variable.name().unwrap_or_default();
        let entry = self.getter_abi_entry(name)?;

        let full_args = entry
            .inputs
            .iter()
            .map(|input| abi_types::resolve(input, self.types))
            .collect::<Result<Vec<SolidityType>, Error>>()?;
        let sighash = self.function_selector(Some(variable), name, full_args.as_slice())?;
        if !selectors.insert(sighash.clone()) {
            return Ok(None);
        }
        let returns = entry
            .outputs
            .iter()
            .map(|output| abi_types::resolve(output, self.types))
            .collect::<Result<Vec<SolidityType>, Error>>()?;

        let mut notpayable = entry.payable.map(|payable| !payable).unwrap_or_default();
        let state_mutability = match entry.state_mutability.as_deref() {
            Some(keyword) => {
                let state_mutability = StateMutability::new(keyword);
                notpayable |= state_mutability.is_not_payable();
                state_mutability
            }
            None => StateMutability::new(StateMutability::NONPAYABLE),
        };

        let is_abi = self.is_abi(false, name, full_args.as_slice(), returns.as_slice());
        Ok(Some(Func {
            name: name.to_owned(),
            full_args,
            param_names: vec![],
            returns,
            sighash,
            notpayable,
            is_abi,
            from_lib,
            is_constructor: false,
            state_mutability,
            visibility: Visibility::External,
            implemented: true,
            overrides: variable.get("overrides").is_some(),
            ast_id: None,
            location: None,
        }))
    }

    fn collect_vyper(&self) -> Result<Vec<Func>, Error> {
        let mut functions = Vec::new();
        for entry in self.contract.abi.iter().filter(|entry| entry.is_function()) {
            let name = entry.signature_name();
            let full_args = entry
                .inputs
                .iter()
                .map(|input| abi_types::resolve(input, self.types))
                .collect::<Result<Vec<SolidityType>, Error>>()?;
            let sighash = self.function_selector(None, name, full_args.as_slice())?;
            let returns = entry
                .outputs
                .iter()
                .map(|output| abi_types::resolve(output, self.types))
                .collect::<Result<Vec<SolidityType>, Error>>()?;
            let state_mutability = StateMutability::new(
                entry
                    .state_mutability
                    .as_deref()
                    .unwrap_or(StateMutability::NONPAYABLE),
            );

            functions.push(Func {
                name: name.to_owned(),
                full_args,
                param_names: vec![],
                returns,
                sighash,
                notpayable: state_mutability.is_not_payable(),
                is_abi: true,
                from_lib: false,
                is_constructor: false,
                state_mutability,
                visibility: Visibility::External,
                implemented: true,
                overrides: false,
                ast_id: None,
                location: None,
            });
        }
        Ok(functions)
    }

    ///
    /// Returns the selector reported by the compiler, or computes and cross-checks it.
    ///
    fn function_selector(
        &self,
        node: Option<&Node>,
        name: &str,
        arguments: &[SolidityType],
    ) -> Result<String, Error> {
        if let Some(selector) = node.and_then(|node| node.get_str("functionSelector")) {
            return Ok(selector.to_owned());
        }

        let signature = Func::compute_signature(name, arguments, SolidityType::signature);
        let method_identifiers = self.contract.method_identifiers();
        let expected = method_identifiers.get(signature.as_str()).ok_or_else(|| {
            Error::internal(format!(
                "Was about to compute the sighash of {} based on the signature {}. Expected this signature to appear in \"methodIdentifiers\"",
                name, signature
            ))
        })?;

        let selector = super::selector::selector(signature.as_str());
        if self.lang.normalize_func_hash(selector.as_str()) != *expected {
            return Err(Error::internal(format!(
                "Computed the sighash {} of {} based on the signature {}, but the compiler reports {}",
                selector, name, signature, expected
            )));
        }
        Ok(selector)
    }

    ///
    /// Whether the function is a part of the ABI.
    ///
    /// Storage pointer arguments or returns make a library function internal-only.
    ///
    fn is_abi(
        &self,
        is_constructor: bool,
        name: &str,
        arguments: &[SolidityType],
        returns: &[SolidityType],
    ) -> bool {
        let in_abi = is_constructor || {
            let source_code_signature =
                Func::compute_signature(name, arguments, SolidityType::source_code_signature);
            let signature = Func::compute_signature(name, arguments, SolidityType::signature);
            self.abi_signatures.contains(&source_code_signature)
                || self.abi_signatures.contains(&signature)
        };
        in_abi
            && !arguments
                .iter()
                .chain(returns.iter())
                .any(|r#type| r#type.is_storage)
    }

    fn getter_abi_entry(&self, name: &str) -> Result<&'a AbiEntry, Error> {
        let contract: &'a SolcStandardJsonOutputContract = self.contract;
        let mut candidates = contract
            .abi
            .iter()
            .filter(|entry| entry.is_function() && entry.name.as_deref() == Some(name));
        match (candidates.next(), candidates.next()) {
            (Some(entry), None) => Ok(entry),
            (None, _) => Err(Error::internal(format!(
                "Failed to find a getter function of the state variable {} in the ABI",
                name
            ))),
            (Some(_), Some(_)) => Err(Error::internal(format!(
                "Found multiple candidates for a getter function of the state variable {} in the ABI",
                name
            ))),
        }
    }

    fn parameter_list(definition: &Node, key: &str) -> Vec<Node> {
        definition
            .child(key)
            .map(|list| list.children("parameters"))
            .unwrap_or_default()
    }

    ///
    /// Whether the node is a function or constructor definition of the contract.
    ///
    /// Fallback and receive functions are skipped.
    ///
    fn is_function_definition(node: &Node, contract_name: &str) -> bool {
        if !node.is("FunctionDefinition") || node.contract.as_deref() != Some(contract_name) {
            return false;
        }
        let is_function_kind = match node.get_str("kind") {
            Some(kind) => kind == "function" || kind == AbiEntry::CONSTRUCTOR,
            None => {
                node.get_bool("isConstructor") == Some(false)
                    && !node.name().unwrap_or_default().is_empty()
            }
        };
        is_function_kind
            && matches!(
                node.get_str("visibility"),
                Some("public" | "external" | "private" | "internal")
            )
    }

    fn is_public_state_variable(node: &Node, contract_name: &str) -> bool {
        node.is("VariableDeclaration")
            && node.get_str("visibility") == Some("public")
            && node.get_bool("stateVariable") == Some(true)
            && node.contract.as_deref() == Some(contract_name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::ast::AstIndex;
    use crate::compiler_lang::CompilerLang;
    use crate::function::visibility::Visibility;
    use crate::solc::standard_json::output::contract::Contract;
    use crate::solc::standard_json::output::source::Source;

    use super::FunctionCatalog;

    const AST: &str = r#"{
    "id": 100,
    "nodeType": "SourceUnit",
    "nodes": [
        {
            "id": 1,
            "nodeType": "ContractDefinition",
            "name": "Vault",
            "contractKind": "contract",
            "baseContracts": [],
            "nodes": [
                {
                    "id": 2,
                    "nodeType": "VariableDeclaration",
                    "name": "total",
                    "visibility": "public",
                    "stateVariable": true,
                    "typeName": {
                        "id": 10,
                        "nodeType": "ElementaryTypeName",
                        "name": "uint256",
                        "typeDescriptions": { "typeString": "uint256" }
                    }
                },
                {
                    "id": 3,
                    "nodeType": "FunctionDefinition",
                    "name": "deposit",
                    "kind": "function",
                    "visibility": "external",
                    "stateMutability": "payable",
                    "functionSelector": "b6b55f25",
                    "parameters": {
                        "id": 4,
                        "nodeType": "ParameterList",
                        "parameters": [
                            {
                                "id": 5,
                                "nodeType": "VariableDeclaration",
                                "name": "amount",
                                "typeName": {
                                    "id": 6,
                                    "nodeType": "ElementaryTypeName",
                                    "name": "uint256",
                                    "typeDescriptions": { "typeString": "uint256" }
                                }
                            }
                        ]
                    },
                    "returnParameters": { "id": 7, "nodeType": "ParameterList", "parameters": [] },
                    "body": { "id": 8, "nodeType": "Block", "src": "60:2:0" }
                },
                {
                    "id": 9,
                    "nodeType": "FunctionDefinition",
                    "name": "",
                    "kind": "fallback",
                    "visibility": "external"
                }
            ]
        }
    ]
}"#;

    const CONTRACT: &str = r#"{
    "abi": [
        { "type": "function", "name": "deposit", "inputs": [ { "name": "amount", "type": "uint256", "internalType": "uint256" } ], "outputs": [], "stateMutability": "payable" },
        { "type": "function", "name": "total", "inputs": [], "outputs": [ { "name": "", "type": "uint256", "internalType": "uint256" } ], "stateMutability": "view" },
        { "type": "fallback", "stateMutability": "nonpayable" }
    ],
    "evm": { "methodIdentifiers": { "deposit(uint256)": "b6b55f25", "total()": "2ddbd13a" } }
}"#;

    fn index() -> AstIndex {
        let mut sources = BTreeMap::new();
        sources.insert(
            "/project/Vault.sol".to_owned(),
            Source {
                id: 0,
                ast: Some(serde_json::from_str(AST).expect("Always valid")),
            },
        );
        let mut index = AstIndex::default();
        index
            .insert("/project/Vault.sol", &sources, CompilerLang::Solidity)
            .expect("Always valid");
        index
    }

    #[test]
    fn collects_functions_and_getters() {
        let index = index();
        let contract: Contract = serde_json::from_str(CONTRACT).expect("Always valid");
        let functions = FunctionCatalog::new(
            &index,
            "/project/Vault.sol",
            CompilerLang::Solidity,
            &contract,
            &[],
        )
        .collect("/project/Vault.sol", "Vault")
        .expect("Always valid");

        assert_eq!(functions.len(), 2);
        let deposit = &functions[0];
        assert_eq!(deposit.name, "deposit");
        assert_eq!(deposit.sighash, "b6b55f25");
        assert_eq!(deposit.param_names, vec!["amount".to_owned()]);
        assert!(!deposit.notpayable);
        assert!(deposit.is_abi);
        assert_eq!(deposit.ast_id, Some(3));
        assert_eq!(deposit.location.as_ref().map(|location| location.src.start), Some(60));

        let total = &functions[1];
        assert_eq!(total.name, "total");
        assert_eq!(total.sighash, "2ddbd13a");
        assert_eq!(total.visibility, Visibility::External);
        assert!(total.notpayable);
        assert_eq!(total.returns.len(), 1);
        assert!(total.location.is_none());
    }

    #[test]
    fn error_abi_function_not_collected() {
        let index = index();
        let mut contract: Contract = serde_json::from_str(CONTRACT).expect("Always valid");
        let mut extra = contract.abi[1].clone();
        extra.name = Some("withdraw".to_owned());
        contract.abi.push(extra);

        let result = FunctionCatalog::new(
            &index,
            "/project/Vault.sol",
            CompilerLang::Solidity,
            &contract,
            &[],
        )
        .collect("/project/Vault.sol", "Vault");
        assert!(result.is_err());
    }
}
