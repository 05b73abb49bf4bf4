//!
//! The parameter type resolution from the ABI.
//!

use crate::error::Error;
use crate::solc::standard_json::output::contract::abi::parameter::Parameter as AbiParameter;

use super::solidity_type::SolidityType;
use super::Type;

///
/// Splits the array dimensions off a type string, outermost first.
///
/// Returns `([3, -1], "uint256")` for `uint256[][3]`.
///
pub fn array_dims(type_string: &str) -> Result<(Vec<i64>, String), Error> {
    let outer_dimension = regex::Regex::new(r"\[(\d*)\]$").expect("Always valid");
    let mut dims = Vec::new();
    let mut base = type_string;
    while let Some(captures) = outer_dimension.captures(base) {
        let size = captures.get(1).map(|size| size.as_str()).unwrap_or_default();
        if size.is_empty() {
            dims.push(-1);
        } else {
            dims.push(size.parse::<i64>().map_err(|error| {
                Error::internal(format!(
                    "Invalid array dimension in {}: {}",
                    type_string, error
                ))
            })?);
        }
        base = &base[..base.len() - captures[0].len()];
    }
    Ok((dims, base.to_owned()))
}

///
/// Resolves the ABI parameter type, matching its internal type against the declared types.
///
pub fn resolve(parameter: &AbiParameter, types: &[Type]) -> Result<SolidityType, Error> {
    let components = parameter
        .components
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|component| resolve(component, types))
        .collect::<Result<Vec<SolidityType>, Error>>()?;
    let is_tuple = !components.is_empty();

    let (dims, base_type) = array_dims(parameter.r#type.as_str())?;

    let mut solidity_type = SolidityType::elementary(base_type.as_str());
    solidity_type.declaration = None;
    solidity_type.components = components;
    solidity_type.array_dims = dims.clone();
    solidity_type.is_tuple = is_tuple;

    if let Some(internal_type) = parameter.internal_type.as_deref() {
        let (internal_dims, internal_base_type) = array_dims(internal_type)?;
        if internal_dims != dims {
            return Err(Error::internal(format!(
                "The ABI type {} and the internal type {} have different array dimensions",
                parameter.r#type, internal_type
            )));
        }
        solidity_type.better_type = types
            .iter()
            .find(|r#type| r#type.type_string() == internal_base_type.as_str())
            .cloned()
            .unwrap_or_else(|| Type::from_primitive_name(internal_base_type.as_str()));
        solidity_type.is_address_alias =
            base_type.as_str() == "address" && internal_base_type != base_type;
        solidity_type.is_uint8_alias = base_type.as_str() == "uint8" && internal_base_type != base_type;
        solidity_type.base_type = internal_base_type;
    }

    Ok(solidity_type)
}

#[cfg(test)]
mod tests {
    use crate::solc::standard_json::output::contract::abi::parameter::Parameter;
    use crate::types::Type;
    use crate::types::UserDefined;

    fn parameter(json: &str) -> Parameter {
        serde_json::from_str(json).expect("Always valid")
    }

    #[test]
    fn dims_are_collected_outermost_first() {
        let (dims, base) = super::array_dims("uint256[][3]").expect("Always valid");
        assert_eq!(dims, vec![3, -1]);
        assert_eq!(base, "uint256");

        let (dims, base) = super::array_dims("bytes32").expect("Always valid");
        assert!(dims.is_empty());
        assert_eq!(base, "bytes32");
    }

    #[test]
    fn contract_is_an_address_alias() {
        let resolved = super::resolve(
            &parameter(r#"{"name": "token", "type": "address", "internalType": "contract IERC20"}"#),
            &[],
        )
        .expect("Always valid");
        assert!(resolved.is_address_alias);
        assert_eq!(resolved.base_type, "contract IERC20");
        assert_eq!(resolved.signature(), "address");
        assert_eq!(resolved.source_code_signature(), "contract IERC20");
    }

    #[test]
    fn enum_is_matched_against_declared_types() {
        let status = Type::Enum {
            user_defined: UserDefined {
                name: "Status".to_owned(),
                type_string: "enum Pool.Status".to_owned(),
                canonical_name: "Pool.Status".to_owned(),
                contract_name: Some("Pool".to_owned()),
                reference: 7,
            },
            members: vec!["Open".to_owned()],
        };
        let resolved = super::resolve(
            &parameter(r#"{"name": "s", "type": "uint8[]", "internalType": "enum Pool.Status[]"}"#),
            &[status.clone()],
        )
        .expect("Always valid");
        assert!(resolved.is_uint8_alias);
        assert_eq!(resolved.better_type, status);
        assert_eq!(resolved.signature(), "uint8[]");
    }

    #[test]
    fn struct_is_a_tuple() {
        let resolved = super::resolve(
            &parameter(
                r#"{
                    "name": "p",
                    "type": "tuple",
                    "internalType": "struct Pool.Position",
                    "components": [
                        {"name": "owner", "type": "address", "internalType": "address"},
                        {"name": "amount", "type": "uint256", "internalType": "uint256"}
                    ]
                }"#,
            ),
            &[],
        )
        .expect("Always valid");
        assert!(resolved.is_tuple);
        assert_eq!(resolved.signature(), "(address,uint256)");
        assert_eq!(resolved.source_code_signature(), "struct Pool.Position");
    }

    #[test]
    fn mismatching_dims_are_rejected() {
        assert!(super::resolve(
            &parameter(r#"{"name": "x", "type": "uint256[]", "internalType": "uint256"}"#),
            &[],
        )
        .is_err());
    }
}
