//!
//! The source-level types.
//!

pub mod abi;
pub mod ast;
pub mod declarations;
pub mod solidity_type;

use serde::Serialize;

use crate::ast::node::Node;
use crate::error::Error;

use self::declarations::Declarations;

///
/// The user-defined type attributes.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDefined {
    /// The type name.
    pub name: String,
    /// The compiler type string, e.g. `struct Vault.Position`.
    pub type_string: String,
    /// The fully qualified name, e.g. `Vault.Position`.
    pub canonical_name: String,
    /// The declaring contract, if not declared at the file level.
    pub contract_name: Option<String>,
    /// The declaration node ID.
    pub reference: i64,
}

///
/// The struct member.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMember {
    /// The member name.
    pub name: String,
    /// The member type.
    pub r#type: Type,
}

///
/// The source-level type, resolved through the AST declarations.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// The elementary or function type.
    Primitive {
        /// The type name.
        name: String,
        /// The compiler type string.
        type_string: String,
    },
    /// The mapping type.
    Mapping {
        /// The compiler type string.
        type_string: String,
        /// The key type.
        domain: Box<Type>,
        /// The value type.
        codomain: Box<Type>,
        /// The declaring contract.
        contract_name: Option<String>,
        /// The type name node ID.
        reference: i64,
    },
    /// The array type.
    Array {
        /// The compiler type string.
        type_string: String,
        /// The element type.
        element_type: Box<Type>,
        /// The length, `None` for dynamic arrays or non-literal lengths.
        length: Option<u64>,
        /// The declaring contract.
        contract_name: Option<String>,
        /// The type name node ID.
        reference: i64,
    },
    /// The enum type.
    Enum {
        /// The user-defined type attributes.
        user_defined: UserDefined,
        /// The member names.
        members: Vec<String>,
    },
    /// The struct type.
    Struct {
        /// The user-defined type attributes.
        user_defined: UserDefined,
        /// The struct members.
        members: Vec<StructMember>,
    },
    /// The user-defined value type, e.g. `type Price is uint256`.
    UserDefinedValueType {
        /// The user-defined type attributes.
        user_defined: UserDefined,
        /// The underlying type.
        underlying: Box<Type>,
    },
}

impl Type {
    ///
    /// A shortcut constructor.
    ///
    pub fn from_primitive_name(name: &str) -> Self {
        Self::Primitive {
            name: name.to_owned(),
            type_string: name.to_owned(),
        }
    }

    ///
    /// The type name.
    ///
    pub fn name(&self) -> String {
        match self {
            Self::Primitive { name, .. } => name.to_owned(),
            Self::Mapping {
                domain, codomain, ..
            } => format!("mapping({} => {})", domain.name(), codomain.name()),
            Self::Array { type_string, .. } => type_string.to_owned(),
            Self::Enum { user_defined, .. }
            | Self::Struct { user_defined, .. }
            | Self::UserDefinedValueType { user_defined, .. } => user_defined.name.to_owned(),
        }
    }

    ///
    /// The compiler type string.
    ///
    pub fn type_string(&self) -> &str {
        match self {
            Self::Primitive { type_string, .. }
            | Self::Mapping { type_string, .. }
            | Self::Array { type_string, .. } => type_string.as_str(),
            Self::Enum { user_defined, .. }
            | Self::Struct { user_defined, .. }
            | Self::UserDefinedValueType { user_defined, .. } => user_defined.type_string.as_str(),
        }
    }

    ///
    /// The user-defined type attributes, if the type is user-defined.
    ///
    pub fn user_defined(&self) -> Option<&UserDefined> {
        match self {
            Self::Enum { user_defined, .. }
            | Self::Struct { user_defined, .. }
            | Self::UserDefinedValueType { user_defined, .. } => Some(user_defined),
            _ => None,
        }
    }

    ///
    /// Whether two types denote the same type regardless of where they were resolved.
    ///
    /// User-defined types are compared by their canonical names, other types by their
    /// type strings.
    ///
    pub fn matches(&self, other: &Self) -> bool {
        match (self.user_defined(), other.user_defined()) {
            (Some(left), Some(right)) => left.canonical_name == right.canonical_name,
            _ => self.type_string() == other.type_string(),
        }
    }

    ///
    /// Resolves a type declaration node.
    ///
    /// Contracts are resolved to `address`.
    ///
    pub fn from_def_node(declarations: &Declarations, node: &Node) -> Result<Self, Error> {
        Self::from_def_node_with_stack(declarations, node, &mut Vec::new())
    }

    ///
    /// Resolves a type name node, e.g. the `typeName` of a variable declaration.
    ///
    pub fn from_type_name_node(declarations: &Declarations, node: &Node) -> Result<Self, Error> {
        Self::from_type_name_node_with_stack(declarations, node, &mut Vec::new())
    }

    ///
    /// Resolves a type declaration node.
    ///
    /// The structs being resolved are kept on the stack, so a struct referring to itself
    /// through an array or a mapping gets no members on the nested occurrence.
    ///
    fn from_def_node_with_stack(
        declarations: &Declarations,
        node: &Node,
        struct_stack: &mut Vec<i64>,
    ) -> Result<Self, Error> {
        match node.kind.as_str() {
            "EnumDefinition" => {
                let members = node
                    .children("members")
                    .iter()
                    .filter_map(|member| member.name().map(str::to_owned))
                    .collect();
                let canonical_name = Self::canonical_name_of(node)?;
                let type_string = match node.type_string() {
                    Some(type_string) => type_string.to_owned(),
                    None => format!("enum {}", canonical_name),
                };
                Ok(Self::Enum {
                    user_defined: Self::user_defined_of(node, type_string, canonical_name),
                    members,
                })
            }
            "StructDefinition" => {
                let canonical_name = Self::canonical_name_of(node)?;
                let mut members = Vec::new();
                if !struct_stack.contains(&node.id) {
                    struct_stack.push(node.id);
                    for member in node.children("members").iter() {
                        let type_name = member.child("typeName").ok_or_else(|| {
                            Error::internal(format!("Struct member {} has no type name", member.id))
                        })?;
                        members.push(StructMember {
                            name: member.name().unwrap_or_default().to_owned(),
                            r#type: Self::from_type_name_node_with_stack(
                                declarations,
                                &type_name,
                                struct_stack,
                            )?,
                        });
                    }
                    struct_stack.pop();
                }
                Ok(Self::Struct {
                    user_defined: Self::user_defined_of(
                        node,
                        format!("struct {}", canonical_name),
                        canonical_name,
                    ),
                    members,
                })
            }
            "UserDefinedValueTypeDefinition" => {
                let canonical_name = Self::canonical_name_of(node)?;
                let underlying = node.child("underlyingType").ok_or_else(|| {
                    Error::internal(format!("Value type {} has no underlying type", node.id))
                })?;
                Ok(Self::UserDefinedValueType {
                    user_defined: Self::user_defined_of(
                        node,
                        canonical_name.clone(),
                        canonical_name,
                    ),
                    underlying: Box::new(Self::from_type_name_node_with_stack(
                        declarations,
                        &underlying,
                        struct_stack,
                    )?),
                })
            }
            "ContractDefinition" => Ok(Self::from_primitive_name("address")),
            kind => {
                tracing::error!(target: "ast", "unexpected type definition node {} of type {}", node.id, kind);
                Err(Error::internal(format!(
                    "Unexpected AST type definition node {} of type `{}`",
                    node.id, kind
                )))
            }
        }
    }

    fn from_type_name_node_with_stack(
        declarations: &Declarations,
        node: &Node,
        struct_stack: &mut Vec<i64>,
    ) -> Result<Self, Error> {
        let type_string = || -> Result<String, Error> {
            node.type_string().map(str::to_owned).ok_or_else(|| {
                Error::internal(format!("Type name node {} has no type string", node.id))
            })
        };

        match node.kind.as_str() {
            "ElementaryTypeName" => Ok(Self::Primitive {
                name: node.name().unwrap_or_default().to_owned(),
                type_string: type_string()?,
            }),
            "FunctionTypeName" => {
                let type_string = type_string()?;
                Ok(Self::Primitive {
                    name: type_string.clone(),
                    type_string,
                })
            }
            "UserDefinedTypeName" => {
                let reference = node.referenced_declaration().ok_or_else(|| {
                    Error::internal(format!("Type name node {} has no declaration", node.id))
                })?;
                Self::from_def_node_with_stack(
                    declarations,
                    declarations.resolve(reference),
                    struct_stack,
                )
            }
            "Mapping" => {
                let key = node.child("keyType").ok_or_else(|| {
                    Error::internal(format!("Mapping node {} has no key type", node.id))
                })?;
                let value = node.child("valueType").ok_or_else(|| {
                    Error::internal(format!("Mapping node {} has no value type", node.id))
                })?;
                Ok(Self::Mapping {
                    type_string: type_string()?,
                    domain: Box::new(Self::from_type_name_node_with_stack(
                        declarations,
                        &key,
                        struct_stack,
                    )?),
                    codomain: Box::new(Self::from_type_name_node_with_stack(
                        declarations,
                        &value,
                        struct_stack,
                    )?),
                    contract_name: node.contract.clone(),
                    reference: node.id,
                })
            }
            "ArrayTypeName" => {
                let base = node.child("baseType").ok_or_else(|| {
                    Error::internal(format!("Array node {} has no base type", node.id))
                })?;
                let length = node
                    .get("length")
                    .and_then(|length| length.get("value"))
                    .and_then(|value| value.as_str())
                    .and_then(|value| value.parse::<u64>().ok());
                Ok(Self::Array {
                    type_string: type_string()?,
                    element_type: Box::new(Self::from_type_name_node_with_stack(
                        declarations,
                        &base,
                        struct_stack,
                    )?),
                    length,
                    contract_name: node.contract.clone(),
                    reference: node.id,
                })
            }
            kind => {
                tracing::error!(target: "ast", "unexpected type name node {} of type {}", node.id, kind);
                Err(Error::internal(format!(
                    "Unexpected AST type name node {} of type `{}`",
                    node.id, kind
                )))
            }
        }
    }

    ///
    /// The JSON representation consumed by the verifier.
    ///
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Primitive { name, .. } => serde_json::json!({
                "name": name,
                "type": "Primitive",
                "canonicalName": null,
                "contractName": null,
                "members": null,
            }),
            Self::Mapping {
                domain,
                codomain,
                contract_name,
                ..
            } => serde_json::json!({
                "name": self.name(),
                "type": "Mapping",
                "canonicalName": null,
                "contractName": contract_name,
                "members": null,
                "domain": domain.to_json(),
                "codomain": codomain.to_json(),
            }),
            Self::Array {
                type_string,
                element_type,
                length,
                contract_name,
                ..
            } => serde_json::json!({
                "name": type_string,
                "type": "Array",
                "canonicalName": null,
                "contractName": contract_name,
                "members": null,
                "elementType": element_type.to_json(),
                "length": length,
            }),
            Self::Enum {
                user_defined,
                members,
            } => serde_json::json!({
                "type": "Enum",
                "name": user_defined.name,
                "canonicalName": user_defined.canonical_name,
                "members": members
                    .iter()
                    .map(|member| serde_json::json!({ "name": member, "type": null }))
                    .collect::<Vec<serde_json::Value>>(),
                "contractName": user_defined.contract_name,
            }),
            Self::Struct {
                user_defined,
                members,
            } => serde_json::json!({
                "type": "Struct",
                "name": user_defined.name,
                "canonicalName": user_defined.canonical_name,
                "members": members
                    .iter()
                    .map(|member| serde_json::json!({ "name": member.name, "type": member.r#type.to_json() }))
                    .collect::<Vec<serde_json::Value>>(),
                "contractName": user_defined.contract_name,
            }),
            Self::UserDefinedValueType {
                user_defined,
                underlying,
            } => serde_json::json!({
                "type": "UserDefinedValueType",
                "name": user_defined.name,
                "canonicalName": user_defined.canonical_name,
                "members": null,
                "contractName": user_defined.contract_name,
                "underlying": underlying.to_json(),
            }),
        }
    }

    fn canonical_name_of(node: &Node) -> Result<String, Error> {
        node.get_str("canonicalName")
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::internal(format!("Type definition {} has no canonical name", node.id))
            })
    }

    fn user_defined_of(node: &Node, type_string: String, canonical_name: String) -> UserDefined {
        UserDefined {
            name: node.name().unwrap_or_default().to_owned(),
            type_string,
            canonical_name,
            contract_name: node.contract.clone(),
            reference: node.id,
        }
    }
}

impl Serialize for Type {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::Type;
    use super::UserDefined;

    fn enumeration(canonical_name: &str, contract_name: Option<&str>) -> Type {
        Type::Enum {
            user_defined: UserDefined {
                name: "Status".to_owned(),
                type_string: format!("enum {}", canonical_name),
                canonical_name: canonical_name.to_owned(),
                contract_name: contract_name.map(str::to_owned),
                reference: 3,
            },
            members: vec!["Open".to_owned(), "Closed".to_owned()],
        }
    }

    #[test]
    fn user_defined_types_match_by_canonical_name() {
        let mut other = enumeration("Pool.Status", Some("Pool"));
        if let Type::Enum { user_defined, .. } = &mut other {
            user_defined.reference = 42;
        }
        assert!(enumeration("Pool.Status", Some("Pool")).matches(&other));
        assert!(!enumeration("Pool.Status", Some("Pool")).matches(&enumeration("Vault.Status", None)));
    }

    #[test]
    fn primitive_types_match_by_type_string() {
        assert!(Type::from_primitive_name("uint256").matches(&Type::from_primitive_name("uint256")));
        assert!(!Type::from_primitive_name("uint256").matches(&Type::from_primitive_name("uint8")));
    }

    #[test]
    fn enum_json_shape() {
        let json = serde_json::to_value(enumeration("Status", None)).expect("Always valid");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "Enum",
                "name": "Status",
                "canonicalName": "Status",
                "members": [ { "name": "Open", "type": null }, { "name": "Closed", "type": null } ],
                "contractName": null,
            })
        );
    }
}
