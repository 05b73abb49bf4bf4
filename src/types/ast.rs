//!
//! The parameter type resolution from the AST.
//!

use crate::ast::node::Node;
use crate::error::Error;

use super::declarations::Declarations;
use super::solidity_type::SolidityType;
use super::Type;

///
/// Resolves function parameter and return types from their AST declarations.
///
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    /// The declaration lookups of the compilation.
    declarations: Declarations<'a>,
    /// Whether the function is declared in a library.
    enclosing_is_library: bool,
}

impl<'a> TypeResolver<'a> {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(declarations: Declarations<'a>, enclosing_is_library: bool) -> Self {
        Self {
            declarations,
            enclosing_is_library,
        }
    }

    ///
    /// Resolves a `VariableDeclaration` node of a parameter list.
    ///
    pub fn resolve(&self, parameter: &Node) -> Result<SolidityType, Error> {
        self.resolve_with_stack(parameter, &mut Vec::new())
    }

    ///
    /// Returns the array dimensions, outermost first, and the array base type node.
    ///
    /// Dynamic dimensions and non-literal lengths are `-1`.
    ///
    pub fn array_dims(type_name: Node) -> Result<(Vec<i64>, Node), Error> {
        let mut dims = Vec::new();
        let mut current = type_name;
        while current.is("ArrayTypeName") {
            let length = current
                .get("length")
                .and_then(|length| length.get("value"))
                .and_then(|value| match value {
                    serde_json::Value::String(value) => value.parse::<i64>().ok(),
                    value => value.as_i64(),
                })
                .unwrap_or(-1);
            dims.push(length);
            current = current.child("baseType").ok_or_else(|| {
                Error::internal(format!(
                    "Expected an array type with a base type, but got node {}",
                    current.id
                ))
            })?;
        }
        Ok((dims, current))
    }

    fn resolve_with_stack(
        &self,
        parameter: &Node,
        struct_stack: &mut Vec<i64>,
    ) -> Result<SolidityType, Error> {
        let type_name = parameter.child("typeName").ok_or_else(|| {
            Error::internal(format!(
                "Expected a parameter with a type name, but got node {}",
                parameter.id
            ))
        })?;
        let (array_dims, base) = Self::array_dims(type_name)?;
        let base_type = base.type_string().map(str::to_owned).ok_or_else(|| {
            Error::internal(format!("Type name node {} has no type string", base.id))
        })?;

        let is_function = base.is("FunctionTypeName");
        let is_mapping = base.is("Mapping");
        let mut is_struct = false;
        let mut is_contract = false;
        let mut is_enum = false;
        let mut user_defined_name = None;
        let mut lib_canonical_signature = None;
        let mut struct_definition = None;

        if base.is("UserDefinedTypeName") {
            let reference = base.referenced_declaration().ok_or_else(|| {
                Error::internal(format!("Type name node {} has no declaration", base.id))
            })?;
            let definition = self.declarations.resolve(reference);
            is_struct = definition.is("StructDefinition");
            is_contract = definition.is("ContractDefinition");
            is_enum = definition.is("EnumDefinition");
            user_defined_name = definition
                .get_str("canonicalName")
                .or_else(|| definition.name())
                .map(str::to_owned);
            if self.enclosing_is_library {
                lib_canonical_signature = user_defined_name.clone();
            }
            if is_struct {
                struct_definition = Some(definition);
            }
        } else if self.enclosing_is_library
            && is_mapping
            && base
                .child("valueType")
                .map(|value| value.is("UserDefinedTypeName"))
                .unwrap_or_default()
        {
            lib_canonical_signature = Some(base_type.clone());
        }

        let better_type = Type::from_type_name_node(&self.declarations, &base)?;
        let is_payable = !is_function && base.get_str("stateMutability") == Some("payable");

        let mut components = Vec::new();
        if let Some(definition) = struct_definition {
            if struct_stack.contains(&definition.id) {
                tracing::debug!(target: "ast", "struct {} is recursive, not expanding its members again", definition.id);
            } else {
                struct_stack.push(definition.id);
                for member in definition.children("members").iter() {
                    components.push(self.resolve_with_stack(member, struct_stack)?);
                }
                struct_stack.pop();
            }
        }

        let storage_location = parameter.get_str("storageLocation").unwrap_or("default");

        let mut solidity_type = SolidityType {
            base_type,
            better_type,
            components,
            array_dims,
            is_storage: storage_location == "storage",
            is_tuple: is_struct,
            is_address_alias: is_contract || is_payable,
            is_uint8_alias: is_enum,
            is_mapping,
            is_function,
            is_enum,
            is_contract,
            is_calldata: storage_location == "calldata",
            user_defined_name,
            declaration: None,
            lib_canonical_signature,
        };

        let declared_name = base
            .get("pathNode")
            .and_then(|path| path.get("name"))
            .and_then(|name| name.as_str())
            .or_else(|| base.name());
        solidity_type.declaration = declared_name.map(|name| {
            let mut declaration = name.to_owned() + solidity_type.array_dims_signature().as_str();
            if storage_location != "default" {
                declaration.push(' ');
                declaration.push_str(storage_location);
            }
            declaration
        });

        Ok(solidity_type)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::ast::AstIndex;
    use crate::compiler_lang::CompilerLang;
    use crate::solc::standard_json::output::source::Source;
    use crate::types::declarations::Declarations;

    use super::TypeResolver;

    const UNIT: &str = r#"{
    "id": 100,
    "nodeType": "SourceUnit",
    "nodes": [
        {
            "id": 101,
            "nodeType": "ContractDefinition",
            "name": "Lib",
            "contractKind": "library",
            "baseContracts": [],
            "nodes": [
                {
                    "id": 102,
                    "nodeType": "StructDefinition",
                    "name": "Data",
                    "canonicalName": "Lib.Data",
                    "members": [
                        {
                            "id": 103,
                            "nodeType": "VariableDeclaration",
                            "name": "value",
                            "storageLocation": "default",
                            "typeName": {
                                "id": 104,
                                "nodeType": "ElementaryTypeName",
                                "name": "uint256",
                                "typeDescriptions": { "typeString": "uint256" }
                            }
                        },
                        {
                            "id": 105,
                            "nodeType": "VariableDeclaration",
                            "name": "children",
                            "storageLocation": "default",
                            "typeName": {
                                "id": 106,
                                "nodeType": "ArrayTypeName",
                                "typeDescriptions": { "typeString": "struct Lib.Data[]" },
                                "baseType": {
                                    "id": 107,
                                    "nodeType": "UserDefinedTypeName",
                                    "referencedDeclaration": 102,
                                    "pathNode": { "id": 108, "nodeType": "IdentifierPath", "name": "Data" },
                                    "typeDescriptions": { "typeString": "struct Lib.Data" }
                                }
                            }
                        }
                    ]
                },
                {
                    "id": 110,
                    "nodeType": "VariableDeclaration",
                    "name": "self",
                    "storageLocation": "storage",
                    "typeName": {
                        "id": 111,
                        "nodeType": "UserDefinedTypeName",
                        "referencedDeclaration": 102,
                        "pathNode": { "id": 112, "nodeType": "IdentifierPath", "name": "Data" },
                        "typeDescriptions": { "typeString": "struct Lib.Data" }
                    }
                },
                {
                    "id": 120,
                    "nodeType": "VariableDeclaration",
                    "name": "data",
                    "storageLocation": "calldata",
                    "typeName": {
                        "id": 121,
                        "nodeType": "ArrayTypeName",
                        "typeDescriptions": { "typeString": "address payable[][2]" },
                        "length": { "id": 122, "nodeType": "Literal", "value": "2" },
                        "baseType": {
                            "id": 123,
                            "nodeType": "ArrayTypeName",
                            "typeDescriptions": { "typeString": "address payable[]" },
                            "baseType": {
                                "id": 124,
                                "nodeType": "ElementaryTypeName",
                                "name": "address",
                                "stateMutability": "payable",
                                "typeDescriptions": { "typeString": "address payable" }
                            }
                        }
                    }
                }
            ]
        }
    ]
}"#;

    fn index() -> AstIndex {
        let mut sources = BTreeMap::new();
        sources.insert(
            "Lib.sol".to_owned(),
            Source {
                id: 0,
                ast: Some(serde_json::from_str(UNIT).expect("Always valid")),
            },
        );
        let mut index = AstIndex::default();
        index
            .insert("Lib.sol", &sources, CompilerLang::Solidity)
            .expect("Always valid");
        index
    }

    #[test]
    fn library_storage_struct() {
        let index = index();
        let resolver = TypeResolver::new(Declarations::new(&index, "Lib.sol"), true);
        let parameter = index.get_node_by_id("Lib.sol", 110).expect("Always valid");
        let resolved = resolver.resolve(parameter).expect("Always valid");

        assert!(resolved.is_storage);
        assert!(resolved.is_tuple);
        assert_eq!(resolved.lib_canonical_signature.as_deref(), Some("Lib.Data"));
        assert_eq!(resolved.signature(), "Lib.Data storage");
        assert_eq!(resolved.source_code_signature(), "struct Lib.Data storage");
        assert_eq!(resolved.declaration.as_deref(), Some("Data storage"));
        assert_eq!(resolved.components.len(), 2);
        assert!(resolved.components[1].components.is_empty());
    }

    #[test]
    fn payable_address_array() {
        let index = index();
        let resolver = TypeResolver::new(Declarations::new(&index, "Lib.sol"), false);
        let parameter = index.get_node_by_id("Lib.sol", 120).expect("Always valid");
        let resolved = resolver.resolve(parameter).expect("Always valid");

        assert_eq!(resolved.array_dims, vec![2, -1]);
        assert!(resolved.is_address_alias);
        assert!(resolved.is_calldata);
        assert!(!resolved.is_decomposed());
        assert_eq!(resolved.signature(), "address[][2]");
        assert_eq!(resolved.declaration.as_deref(), Some("address[][2] calldata"));
    }
}
