//!
//! The function parameter type descriptor.
//!

use serde::Serialize;

use super::Type;

///
/// The function parameter type descriptor.
///
/// Reconciles the ABI and the AST views of a parameter type. Immutable once built.
///
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SolidityType {
    /// The source code base type, e.g. `A` for `A[][3]`.
    pub base_type: String,
    /// The resolved base type.
    #[serde(rename = "typeDescription")]
    pub better_type: Type,
    /// The tuple or struct member types.
    pub components: Vec<SolidityType>,
    /// The array dimensions, outermost first, `-1` for dynamic ones.
    pub array_dims: Vec<i64>,
    /// Whether the parameter is a storage pointer. Only library functions have those.
    pub is_storage: bool,
    /// Whether the type is a tuple or a struct.
    pub is_tuple: bool,
    /// Whether the type is an alias of `address`, e.g. a contract or `address payable`.
    pub is_address_alias: bool,
    /// Whether the type is an alias of `uint8`, e.g. an enum.
    pub is_uint8_alias: bool,
    /// Whether the type is a mapping.
    #[serde(skip)]
    pub is_mapping: bool,
    /// Whether the type is a function type.
    #[serde(skip)]
    pub is_function: bool,
    /// Whether the type is an enum.
    #[serde(skip)]
    pub is_enum: bool,
    /// Whether the type is a contract.
    #[serde(skip)]
    pub is_contract: bool,
    /// Whether the parameter lives in calldata.
    #[serde(skip)]
    pub is_calldata: bool,
    /// The canonical name of the user-defined type.
    #[serde(skip)]
    pub user_defined_name: Option<String>,
    /// The parameter type as written in the source, e.g. `bytes calldata`.
    #[serde(skip)]
    pub declaration: Option<String>,
    /// The base type used for the selector of a library function, if it differs.
    #[serde(skip)]
    pub lib_canonical_signature: Option<String>,
}

impl SolidityType {
    ///
    /// A shortcut constructor for a plain value type.
    ///
    pub fn elementary(name: &str) -> Self {
        Self {
            base_type: name.to_owned(),
            better_type: Type::from_primitive_name(name),
            components: vec![],
            array_dims: vec![],
            is_storage: false,
            is_tuple: false,
            is_address_alias: false,
            is_uint8_alias: false,
            is_mapping: false,
            is_function: false,
            is_enum: false,
            is_contract: false,
            is_calldata: false,
            user_defined_name: None,
            declaration: Some(name.to_owned()),
            lib_canonical_signature: None,
        }
    }

    ///
    /// The array dimensions as written in the source, e.g. `[][3]`.
    ///
    pub fn array_dims_signature(&self) -> String {
        self.array_dims
            .iter()
            .rev()
            .map(|dimension| {
                if *dimension == -1 {
                    "[]".to_owned()
                } else {
                    format!("[{}]", dimension)
                }
            })
            .collect()
    }

    ///
    /// The signature suffix: array dimensions and the storage location.
    ///
    pub fn complete_signature(&self) -> String {
        let mut signature = self.array_dims_signature();
        if self.is_storage {
            signature.push_str(" storage");
        }
        signature
    }

    ///
    /// The tuple signature, e.g. `(uint256,address)`.
    ///
    pub fn canonical_tuple_signature(&self) -> String {
        let components: Vec<String> = self
            .components
            .iter()
            .map(SolidityType::signature)
            .collect();
        format!("({})", components.join(","))
    }

    ///
    /// The canonical signature used for selectors.
    ///
    /// User-defined names are erased and tuples are decomposed, unless the library
    /// calling convention requires the canonical type name.
    ///
    pub fn signature(&self) -> String {
        let base = if let Some(lib_canonical_signature) = self.lib_canonical_signature.as_ref() {
            lib_canonical_signature.to_owned()
        } else if self.is_uint8_alias {
            "uint8".to_owned()
        } else if self.is_tuple {
            self.canonical_tuple_signature()
        } else if self.is_address_alias {
            "address".to_owned()
        } else {
            self.base_type.to_owned()
        };
        base + self.complete_signature().as_str()
    }

    ///
    /// The signature keeping user-defined type names.
    ///
    pub fn source_code_signature(&self) -> String {
        self.base_type.to_owned() + self.complete_signature().as_str()
    }

    ///
    /// Whether the calldata argument is passed as an offset and a length pair.
    ///
    pub fn is_decomposed(&self) -> bool {
        self.is_calldata
            && (self.array_dims.first() == Some(&-1)
                || matches!(self.base_type.as_str(), "string" | "bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::SolidityType;

    #[test]
    fn array_dims_are_written_innermost_last() {
        let mut r#type = SolidityType::elementary("uint256");
        r#type.array_dims = vec![3, -1];
        assert_eq!(r#type.source_code_signature(), "uint256[][3]");
        r#type.is_storage = true;
        assert_eq!(r#type.signature(), "uint256[][3] storage");
    }

    #[test]
    fn signature_erases_aliases() {
        let mut r#type = SolidityType::elementary("contract IERC20");
        r#type.is_address_alias = true;
        assert_eq!(r#type.signature(), "address");
        assert_eq!(r#type.source_code_signature(), "contract IERC20");

        let mut r#type = SolidityType::elementary("enum Pool.Status");
        r#type.is_uint8_alias = true;
        assert_eq!(r#type.signature(), "uint8");
    }

    #[test]
    fn signature_decomposes_tuples() {
        let mut r#type = SolidityType::elementary("struct Pool.Position");
        r#type.is_tuple = true;
        r#type.components = vec![
            SolidityType::elementary("uint256"),
            SolidityType::elementary("address"),
        ];
        r#type.array_dims = vec![-1];
        assert_eq!(r#type.signature(), "(uint256,address)[]");
    }

    #[test]
    fn library_signature_takes_precedence() {
        let mut r#type = SolidityType::elementary("struct Lib.Data");
        r#type.is_tuple = true;
        r#type.is_storage = true;
        r#type.lib_canonical_signature = Some("Lib.Data".to_owned());
        assert_eq!(r#type.signature(), "Lib.Data storage");
    }

    #[test]
    fn calldata_decomposition() {
        let mut r#type = SolidityType::elementary("bytes");
        assert!(!r#type.is_decomposed());
        r#type.is_calldata = true;
        assert!(r#type.is_decomposed());

        let mut r#type = SolidityType::elementary("uint256");
        r#type.is_calldata = true;
        r#type.array_dims = vec![4];
        assert!(!r#type.is_decomposed());
        r#type.array_dims = vec![-1];
        assert!(r#type.is_decomposed());
    }
}
