//!
//! The flattened compiler AST index.
//!

pub mod cache;
pub mod node;
pub mod source_range;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::compiler_lang::CompilerLang;
use crate::error::Error;
use crate::solc::standard_json::output::source::Source as SolcStandardJsonOutputSource;
use crate::types::Type;

use self::cache::BoundedCache;
use self::node::Node;

///
/// The flattened AST of one compiled file: `node ID -> node`, in breadth-first order.
///
pub type FlatAst = IndexMap<i64, Node>;

///
/// A base contract of an inheritance chain.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseContract {
    /// The compiled file declaring the contract.
    pub file: String,
    /// The contract name.
    pub name: String,
    /// Whether the contract is a library.
    pub is_library: bool,
}

///
/// The flattened compiler AST index.
///
/// Maps `original file -> compiled file -> node ID -> node`. A compiled file may appear under
/// several original files, since each top-level file is compiled with all of its imports.
///
#[derive(Debug)]
pub struct AstIndex {
    /// The flattened ASTs.
    asts: BTreeMap<String, BTreeMap<String, FlatAst>>,
    /// The contract definition node references.
    contract_definitions: RefCell<BoundedCache<(String, String, String), Option<i64>>>,
    /// The file-level user-defined types of imported files.
    imported_types: RefCell<BoundedCache<(String, String), Vec<Type>>>,
}

impl Default for AstIndex {
    fn default() -> Self {
        Self {
            asts: BTreeMap::new(),
            contract_definitions: RefCell::new(BoundedCache::new(
                Self::CONTRACT_DEFINITION_CACHE_SIZE,
            )),
            imported_types: RefCell::new(BoundedCache::new(Self::IMPORTED_TYPES_CACHE_SIZE)),
        }
    }
}

impl AstIndex {
    /// The contract definition reference cache capacity.
    pub const CONTRACT_DEFINITION_CACHE_SIZE: usize = 128;

    /// The imported types cache capacity.
    pub const IMPORTED_TYPES_CACHE_SIZE: usize = 32;

    /// The inline assembly node key which must not be descended into.
    const EXTERNAL_REFERENCES_KEY: &'static str = "externalReferences";

    ///
    /// Flattens and indexes the ASTs of a compilation of `original_file`.
    ///
    /// Replaces the previous compilation of the same original file.
    ///
    pub fn insert(
        &mut self,
        original_file: &str,
        sources: &BTreeMap<String, SolcStandardJsonOutputSource>,
        lang: CompilerLang,
    ) -> Result<(), Error> {
        let mut units = BTreeMap::new();
        for (compiled_file, source) in sources.iter() {
            tracing::debug!(target: "ast", "adding AST of {} for {}", original_file, compiled_file);
            let ast = source.ast.as_ref().ok_or_else(|| {
                Error::internal(format!(
                    "Invalid AST format for original file {}: no AST for {}",
                    original_file, compiled_file
                ))
            })?;
            units.insert(compiled_file.to_owned(), Self::flatten(ast, lang));
        }
        self.asts.insert(original_file.to_owned(), units);
        Ok(())
    }

    ///
    /// Flattens a nested AST in breadth-first order, stamping every node with its contract.
    ///
    pub fn flatten(ast: &serde_json::Value, lang: CompilerLang) -> FlatAst {
        let mut container = FlatAst::new();
        let mut queue: VecDeque<(&serde_json::Value, Option<String>)> = VecDeque::new();
        queue.push_back((ast, None));

        while let Some((value, contract)) = queue.pop_front() {
            let node = match Node::from_json(value, lang, contract) {
                Some(node) => node,
                None => continue,
            };
            let children_contract = node.contract_for_children();
            let is_inline_assembly = node.is("InlineAssembly");

            if let Some(fields) = value.as_object() {
                for (key, child) in fields.iter() {
                    if is_inline_assembly && key.as_str() == Self::EXTERNAL_REFERENCES_KEY {
                        continue;
                    }
                    match child {
                        serde_json::Value::Object(_) => {
                            queue.push_back((child, children_contract.clone()))
                        }
                        serde_json::Value::Array(elements) => {
                            for element in elements.iter() {
                                queue.push_back((element, children_contract.clone()));
                            }
                        }
                        _ => {}
                    }
                }
            }

            container.insert(node.id, node);
        }

        container
    }

    ///
    /// Whether the original file has been indexed.
    ///
    pub fn contains(&self, original_file: &str) -> bool {
        self.asts.contains_key(original_file)
    }

    ///
    /// Returns the flattened ASTs of all files compiled for `original_file`.
    ///
    pub fn units(&self, original_file: &str) -> impl Iterator<Item = (&String, &FlatAst)> {
        self.asts
            .get(original_file)
            .into_iter()
            .flat_map(|units| units.iter())
    }

    ///
    /// Returns the flattened AST of `compiled_file` compiled for `original_file`.
    ///
    pub fn unit(&self, original_file: &str, compiled_file: &str) -> Option<&FlatAst> {
        self.asts
            .get(original_file)
            .and_then(|units| units.get(compiled_file))
    }

    ///
    /// Returns the node from the first compiled unit containing it.
    ///
    pub fn get_node_by_id(&self, original_file: &str, id: i64) -> Option<&Node> {
        let node = self
            .units(original_file)
            .find_map(|(_, unit)| unit.get(&id));
        tracing::trace!(target: "ast", "node {} in {}: found {}", id, original_file, node.is_some());
        node
    }

    ///
    /// Returns the compiled file owning the node.
    ///
    /// # Panics
    /// If no compiled file contains the node, which means the AST is broken.
    ///
    pub fn contract_file_of(&self, original_file: &str, reference: i64) -> &str {
        match self
            .units(original_file)
            .find(|(_, unit)| unit.contains_key(&reference))
        {
            Some((compiled_file, _)) => compiled_file.as_str(),
            None => {
                tracing::error!(target: "ast", "could not find reference AST node {} in {}", reference, original_file);
                panic!(
                    "Could not find reference AST node {} in {}",
                    reference, original_file
                );
            }
        }
    }

    ///
    /// Returns the declaration node the reference points to.
    ///
    /// # Panics
    /// If no compiled file contains the node.
    ///
    pub fn original_def_node(&self, original_file: &str, reference: i64) -> &Node {
        let compiled_file = self.contract_file_of(original_file, reference);
        match self
            .unit(original_file, compiled_file)
            .and_then(|unit| unit.get(&reference))
        {
            Some(node) => node,
            None => panic!(
                "Could not find reference AST node {} in {}",
                reference, compiled_file
            ),
        }
    }

    ///
    /// Returns the contract definition node ID of the contract named `contract_name`.
    ///
    /// Vyper files have exactly one contract, which is the module itself.
    ///
    pub fn contract_def_node_ref(
        &self,
        original_file: &str,
        compiled_file: &str,
        contract_name: &str,
    ) -> Option<i64> {
        let key = (
            original_file.to_owned(),
            compiled_file.to_owned(),
            contract_name.to_owned(),
        );
        if let Some(reference) = self.contract_definitions.borrow_mut().get(&key) {
            return reference;
        }

        let reference = self.unit(original_file, compiled_file).and_then(|unit| {
            unit.values()
                .find(|node| {
                    node.is_contract_definition()
                        && (node.lang == CompilerLang::Vyper || node.name() == Some(contract_name))
                })
                .map(|node| node.id)
        });
        self.contract_definitions
            .borrow_mut()
            .insert(key, reference);
        reference
    }

    ///
    /// Returns the contract definition node of the contract named `contract_name`.
    ///
    pub fn contract_def_node(
        &self,
        original_file: &str,
        compiled_file: &str,
        contract_name: &str,
    ) -> Result<&Node, Error> {
        self.contract_def_node_ref(original_file, compiled_file, contract_name)
            .and_then(|reference| {
                self.unit(original_file, compiled_file)
                    .and_then(|unit| unit.get(&reference))
            })
            .ok_or_else(|| {
                Error::internal(format!(
                    "No definition of contract {} in {} (compiled for {})",
                    contract_name, compiled_file, original_file
                ))
            })
    }

    ///
    /// Whether the contract definition node is a library.
    ///
    pub fn is_library_def_node(&self, original_file: &str, compiled_file: &str, reference: i64) -> bool {
        self.unit(original_file, compiled_file)
            .and_then(|unit| unit.get(&reference))
            .map(Node::is_library)
            .unwrap_or_default()
    }

    ///
    /// Returns the file-level types of an imported file, memoized.
    ///
    pub fn imported_types<F>(
        &self,
        original_file: &str,
        compiled_file: &str,
        collect: F,
    ) -> Result<Vec<Type>, Error>
    where
        F: FnOnce() -> Result<Vec<Type>, Error>,
    {
        let key = (original_file.to_owned(), compiled_file.to_owned());
        if let Some(types) = self.imported_types.borrow_mut().get(&key) {
            return Ok(types);
        }
        let types = collect()?;
        self.imported_types.borrow_mut().insert(key, types.clone());
        Ok(types)
    }

    ///
    /// Returns the transitive imports of `compiled_file`, including itself.
    ///
    pub fn imported_files(&self, original_file: &str, compiled_file: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut worklist = vec![compiled_file.to_owned()];
        while let Some(current) = worklist.pop() {
            if seen.contains(&current) {
                continue;
            }
            match self.unit(original_file, current.as_str()) {
                Some(unit) => {
                    for node in unit.values().filter(|node| node.is("ImportDirective")) {
                        if let Some(path) = node.get_str("absolutePath") {
                            worklist.push(Self::normalize_double_slashes(path));
                        }
                    }
                }
                None => {
                    tracing::debug!(target: "ast", "failed to find {} in the ASTs of {}", current, original_file)
                }
            }
            seen.insert(current);
        }
        seen
    }

    ///
    /// Returns the contract itself followed by its base contracts, breadth-first.
    ///
    pub fn base_contracts(
        &self,
        original_file: &str,
        compiled_file: &str,
        contract_name: &str,
    ) -> Result<Vec<BaseContract>, Error> {
        let contract = self.contract_def_node(original_file, compiled_file, contract_name)?;
        let mut base_contracts = vec![BaseContract {
            file: compiled_file.to_owned(),
            name: contract_name.to_owned(),
            is_library: contract.is_library(),
        }];
        if contract.lang == CompilerLang::Vyper {
            return Ok(base_contracts);
        }

        let mut queue = VecDeque::new();
        queue.push_back(contract);
        while let Some(current) = queue.pop_front() {
            if !current.fields.contains_key("baseContracts") {
                return Err(Error::internal(format!(
                    "Contract definition {} has no `baseContracts`",
                    current.id
                )));
            }
            for specifier in current.get_array("baseContracts").iter() {
                let reference = specifier
                    .get("baseName")
                    .and_then(|base_name| base_name.get("referencedDeclaration"))
                    .and_then(Node::parse_id)
                    .ok_or_else(|| {
                        Error::internal(format!(
                            "Inheritance specifier without a base reference in {}",
                            current.id
                        ))
                    })?;
                let base_file = self.contract_file_of(original_file, reference);
                let base = self.original_def_node(original_file, reference);
                let base_contract = BaseContract {
                    file: base_file.to_owned(),
                    name: base.name().unwrap_or_default().to_owned(),
                    is_library: base.is_library(),
                };
                if !base_contracts.contains(&base_contract) {
                    base_contracts.push(base_contract);
                    queue.push_back(base);
                }
            }
        }

        Ok(base_contracts)
    }

    ///
    /// Returns the declarations referenced by the function calls made in the contract.
    ///
    pub fn function_call_refs(
        &self,
        original_file: &str,
        compiled_file: &str,
        contract_name: &str,
    ) -> Vec<i64> {
        self.unit(original_file, compiled_file)
            .into_iter()
            .flat_map(|unit| unit.values())
            .filter(|node| node.is("FunctionCall") && node.contract.as_deref() == Some(contract_name))
            .filter_map(|node| {
                node.get("expression")
                    .and_then(|expression| expression.get("referencedDeclaration"))
                    .and_then(Node::parse_id)
            })
            .collect()
    }

    ///
    /// Returns the contracts owning the functions called internally by the contract.
    ///
    /// Builtins like `require` have no visible declaration and are skipped.
    ///
    pub fn libraries_referenced_with_internal_functions(
        &self,
        original_file: &str,
        compiled_file: &str,
        contract_name: &str,
    ) -> Vec<String> {
        self.function_call_refs(original_file, compiled_file, contract_name)
            .into_iter()
            .filter_map(|reference| self.get_node_by_id(original_file, reference))
            .filter_map(|node| node.contract.clone())
            .collect()
    }

    fn normalize_double_slashes(path: &str) -> String {
        let mut normalized = String::with_capacity(path.len());
        let mut previous_slash = false;
        for character in path.chars() {
            if character == '/' && previous_slash {
                continue;
            }
            previous_slash = character == '/';
            normalized.push(character);
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::ast::AstIndex;
    use crate::compiler_lang::CompilerLang;
    use crate::solc::standard_json::output::source::Source;

    const BASE: &str = r#"{
    "id": 1,
    "nodeType": "SourceUnit",
    "nodes": [
        {
            "id": 2,
            "nodeType": "ContractDefinition",
            "name": "Base",
            "contractKind": "contract",
            "baseContracts": [],
            "nodes": []
        }
    ]
}"#;

    const MAIN: &str = r#"{
    "id": 10,
    "nodeType": "SourceUnit",
    "nodes": [
        { "id": 11, "nodeType": "ImportDirective", "absolutePath": "base.sol", "src": "0:18:1" },
        {
            "id": 12,
            "nodeType": "ContractDefinition",
            "name": "Main",
            "contractKind": "contract",
            "baseContracts": [
                { "id": 13, "nodeType": "InheritanceSpecifier", "baseName": { "id": 14, "nodeType": "IdentifierPath", "referencedDeclaration": 2 } }
            ],
            "nodes": [
                {
                    "id": 15,
                    "nodeType": "FunctionDefinition",
                    "name": "run",
                    "body": {
                        "id": 16,
                        "nodeType": "Block",
                        "statements": [
                            {
                                "id": 17,
                                "nodeType": "InlineAssembly",
                                "externalReferences": [ { "declaration": 99, "id": 98, "src": "1:1:1" } ]
                            },
                            {
                                "id": 18,
                                "nodeType": "FunctionCall",
                                "expression": { "id": 19, "nodeType": "Identifier", "referencedDeclaration": 21 }
                            }
                        ]
                    }
                }
            ]
        },
        {
            "id": 20,
            "nodeType": "ContractDefinition",
            "name": "Lib",
            "contractKind": "library",
            "baseContracts": [],
            "nodes": [ { "id": 21, "nodeType": "FunctionDefinition", "name": "help" } ]
        }
    ]
}"#;

    fn index() -> AstIndex {
        let mut sources = BTreeMap::new();
        sources.insert(
            "base.sol".to_owned(),
            Source {
                id: 0,
                ast: Some(serde_json::from_str(BASE).expect("Always valid")),
            },
        );
        sources.insert(
            "main.sol".to_owned(),
            Source {
                id: 1,
                ast: Some(serde_json::from_str(MAIN).expect("Always valid")),
            },
        );
        let mut index = AstIndex::default();
        index
            .insert("main.sol", &sources, CompilerLang::Solidity)
            .expect("Always valid");
        index
    }

    #[test]
    fn stamps_nodes_with_contract() {
        let index = index();
        let function = index.get_node_by_id("main.sol", 15).expect("Always exists");
        assert_eq!(function.contract.as_deref(), Some("Main"));
        let contract = index.get_node_by_id("main.sol", 12).expect("Always exists");
        assert_eq!(contract.contract, None);
        let helper = index.get_node_by_id("main.sol", 21).expect("Always exists");
        assert_eq!(helper.contract.as_deref(), Some("Lib"));
    }

    #[test]
    fn skips_inline_assembly_external_references() {
        let index = index();
        assert!(index.get_node_by_id("main.sol", 98).is_none());
        assert!(index.get_node_by_id("main.sol", 17).is_some());
    }

    #[test]
    fn resolves_contract_file_and_bases() {
        let index = index();
        assert_eq!(index.contract_file_of("main.sol", 2), "base.sol");

        let bases = index
            .base_contracts("main.sol", "main.sol", "Main")
            .expect("Always valid");
        let names: Vec<&str> = bases.iter().map(|base| base.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Base"]);
        assert_eq!(bases[1].file, "base.sol");
    }

    #[test]
    fn finds_internally_called_libraries() {
        let index = index();
        assert_eq!(
            index.libraries_referenced_with_internal_functions("main.sol", "main.sol", "Main"),
            vec!["Lib".to_owned()]
        );
        assert!(index.is_library_def_node("main.sol", "main.sol", 20));
    }

    #[test]
    fn collects_transitive_imports() {
        let index = index();
        let imports = index.imported_files("main.sol", "main.sol");
        assert!(imports.contains("base.sol"));
        assert!(imports.contains("main.sol"));
    }

    #[test]
    #[should_panic(expected = "Could not find reference AST node 404")]
    fn panics_on_missing_reference() {
        let index = index();
        index.contract_file_of("main.sol", 404);
    }
}
