//!
//! The generic compiler AST node.
//!

use crate::compiler_lang::CompilerLang;

use super::source_range::SourceRange;

///
/// The generic compiler AST node.
///
/// Nested nodes stay in `fields` as raw JSON and are wrapped on access, inheriting the
/// owning contract stamp.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The node ID, unique within a compilation.
    pub id: i64,
    /// The node type, e.g. `FunctionDefinition`.
    pub kind: String,
    /// The name of the enclosing contract or library.
    pub contract: Option<String>,
    /// The node source language.
    pub lang: CompilerLang,
    /// The node attributes.
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    ///
    /// Wraps a JSON object with an ID and a type into a node.
    ///
    pub fn from_json(
        value: &serde_json::Value,
        lang: CompilerLang,
        contract: Option<String>,
    ) -> Option<Self> {
        let fields = value.as_object()?;
        let id = Self::parse_id(fields.get(lang.node_id_key())?)?;
        let kind = fields
            .get(lang.node_type_key())
            .and_then(|kind| kind.as_str())
            .unwrap_or_default()
            .to_owned();

        Some(Self {
            id,
            kind,
            contract,
            lang,
            fields: fields.to_owned(),
        })
    }

    ///
    /// Parses a node ID, which is a number or a numeric string.
    ///
    pub fn parse_id(value: &serde_json::Value) -> Option<i64> {
        match value {
            serde_json::Value::Number(number) => number.as_i64(),
            serde_json::Value::String(string) => string.parse::<i64>().ok(),
            _ => None,
        }
    }

    ///
    /// Whether the node is of the given type.
    ///
    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_str() == kind
    }

    ///
    /// Whether the node is a contract, interface or library definition.
    ///
    pub fn is_contract_definition(&self) -> bool {
        self.is(self.lang.contract_definition_kind())
    }

    ///
    /// Whether the node is a library definition.
    ///
    pub fn is_library(&self) -> bool {
        self.get_str("contractKind") == Some("library")
    }

    ///
    /// Whether the node defines a struct, an enum or a user-defined value type.
    ///
    pub fn is_user_defined_type_definition(&self) -> bool {
        matches!(
            self.kind.as_str(),
            "StructDefinition" | "EnumDefinition" | "UserDefinedValueTypeDefinition"
        )
    }

    ///
    /// The contract stamp inherited by the nested nodes.
    ///
    pub fn contract_for_children(&self) -> Option<String> {
        if self.is_contract_definition() {
            self.name().map(str::to_owned)
        } else {
            self.contract.clone()
        }
    }

    ///
    /// Returns the raw attribute.
    ///
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    ///
    /// Returns the string attribute.
    ///
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|value| value.as_str())
    }

    ///
    /// Returns the boolean attribute.
    ///
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|value| value.as_bool())
    }

    ///
    /// Returns the integer attribute, which may be serialized as a string.
    ///
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Self::parse_id)
    }

    ///
    /// Returns the array attribute, which is empty if absent.
    ///
    pub fn get_array(&self, key: &str) -> &[serde_json::Value] {
        self.get(key)
            .and_then(|value| value.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    ///
    /// The `name` attribute.
    ///
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    ///
    /// The `src` attribute.
    ///
    pub fn src(&self) -> Option<SourceRange> {
        self.get_str("src").and_then(|src| src.parse().ok())
    }

    ///
    /// The `typeDescriptions.typeString` attribute.
    ///
    pub fn type_string(&self) -> Option<&str> {
        self.get("typeDescriptions")
            .and_then(|descriptions| descriptions.get("typeString"))
            .and_then(|type_string| type_string.as_str())
    }

    ///
    /// The `referencedDeclaration` attribute.
    ///
    pub fn referenced_declaration(&self) -> Option<i64> {
        self.get_i64("referencedDeclaration")
    }

    ///
    /// Wraps the nested node under the given key.
    ///
    pub fn child(&self, key: &str) -> Option<Node> {
        Node::from_json(self.get(key)?, self.lang, self.contract_for_children())
    }

    ///
    /// Wraps the nested nodes listed under the given key.
    ///
    pub fn children(&self, key: &str) -> Vec<Node> {
        let contract = self.contract_for_children();
        self.get_array(key)
            .iter()
            .filter_map(|value| Node::from_json(value, self.lang, contract.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler_lang::CompilerLang;

    use super::Node;

    #[test]
    fn children_inherit_contract_stamp() {
        let input = r#"{
    "id": 10,
    "nodeType": "ContractDefinition",
    "name": "Vault",
    "contractKind": "library",
    "nodes": [
        { "id": 11, "nodeType": "FunctionDefinition", "name": "deposit", "src": "40:20:0" }
    ]
}"#;
        let value: serde_json::Value = serde_json::from_str(input).expect("Always valid");
        let node = Node::from_json(&value, CompilerLang::Solidity, None).expect("Always valid");

        assert!(node.is_contract_definition());
        assert!(node.is_library());
        let children = node.children("nodes");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].contract.as_deref(), Some("Vault"));
        assert_eq!(children[0].src().map(|src| src.start), Some(40));
    }

    #[test]
    fn vyper_nodes_use_own_keys() {
        let value = serde_json::json!({ "node_id": "7", "ast_type": "Module", "name": "Vault.vy" });
        let node = Node::from_json(&value, CompilerLang::Vyper, None).expect("Always valid");
        assert_eq!(node.id, 7);
        assert!(node.is_contract_definition());
    }
}
