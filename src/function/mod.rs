//!
//! The function descriptor.
//!

pub mod catalog;
pub mod selector;
pub mod suggest;
pub mod visibility;

use std::cmp::Ordering;

use serde::ser::SerializeStruct;
use serde::Deserialize;
use serde::Serialize;

use crate::ast::source_range::SourceRange;
use crate::types::solidity_type::SolidityType;

use self::visibility::Visibility;

///
/// The function state mutability, serialized as `{"keyword": "view"}`.
///
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StateMutability {
    /// The mutability keyword.
    pub keyword: String,
}

impl StateMutability {
    /// The default mutability keyword.
    pub const NONPAYABLE: &'static str = "nonpayable";

    ///
    /// A shortcut constructor.
    ///
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_owned(),
        }
    }

    ///
    /// Whether the function rejects ether transfers.
    ///
    pub fn is_not_payable(&self) -> bool {
        matches!(self.keyword.as_str(), "nonpayable" | "view" | "pure")
    }
}

///
/// The function body location.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionLocation {
    /// The compiled file declaring the function.
    pub file: String,
    /// The body block source range.
    pub src: SourceRange,
}

///
/// The function descriptor.
///
/// Two descriptors are equal if both their source code and canonical signatures are equal.
///
#[derive(Debug, Clone)]
pub struct Func {
    /// The function name, `constructor` for constructors.
    pub name: String,
    /// The parameter types.
    pub full_args: Vec<SolidityType>,
    /// The parameter names, empty for getters and Vyper functions.
    pub param_names: Vec<String>,
    /// The return types.
    pub returns: Vec<SolidityType>,
    /// The selector hex without the prefix, `0` for non-external functions.
    pub sighash: String,
    /// Whether the function rejects ether transfers.
    pub notpayable: bool,
    /// Whether the function is a part of the contract ABI.
    pub is_abi: bool,
    /// Whether the function is declared in a library.
    pub from_lib: bool,
    /// Whether the function is the constructor.
    pub is_constructor: bool,
    /// The state mutability.
    pub state_mutability: StateMutability,
    /// The visibility.
    pub visibility: Visibility,
    /// Whether the function has a body.
    pub implemented: bool,
    /// Whether the function overrides a base declaration.
    pub overrides: bool,
    /// The definition node ID, absent for getters and Vyper functions.
    pub ast_id: Option<i64>,
    /// The body location, absent for unimplemented functions.
    pub location: Option<FunctionLocation>,
}

impl Func {
    ///
    /// Whether the selector is computed from library-specific type names.
    ///
    pub fn sighash_is_from_other_name(&self) -> bool {
        self.full_args
            .iter()
            .any(|argument| argument.lib_canonical_signature.is_some())
    }

    ///
    /// The canonical signature, e.g. `transfer(address,uint256)`.
    ///
    pub fn signature(&self) -> String {
        Self::compute_signature(self.name.as_str(), self.full_args.as_slice(), SolidityType::signature)
    }

    ///
    /// The signature with user-defined type names, e.g. `transfer(contract IERC20,uint256)`.
    ///
    pub fn source_code_signature(&self) -> String {
        Self::compute_signature(
            self.name.as_str(),
            self.full_args.as_slice(),
            SolidityType::source_code_signature,
        )
    }

    ///
    /// Formats a signature with the given argument type formatter.
    ///
    pub fn compute_signature<F>(name: &str, arguments: &[SolidityType], formatter: F) -> String
    where
        F: Fn(&SolidityType) -> String,
    {
        let arguments: Vec<String> = arguments.iter().map(formatter).collect();
        format!("{}({})", name, arguments.join(","))
    }

    ///
    /// Whether two functions have the same internal signature, comparing the resolved types.
    ///
    pub fn same_internal_signature_as(&self, other: &Self) -> bool {
        let types_match = |left: &[SolidityType], right: &[SolidityType]| {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(left, right)| left.better_type.matches(&right.better_type))
        };
        self.name == other.name
            && types_match(self.full_args.as_slice(), other.full_args.as_slice())
            && types_match(self.returns.as_slice(), other.returns.as_slice())
    }

    ///
    /// Whether the function is a candidate for an internal function finder.
    ///
    pub fn has_function_type_argument(&self) -> bool {
        self.full_args.iter().any(|argument| argument.is_function)
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        self.source_code_signature() == other.source_code_signature()
            && self.signature() == other.signature()
    }
}

impl Eq for Func {}

impl PartialOrd for Func {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Func {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source_code_signature()
            .cmp(&other.source_code_signature())
            .then_with(|| self.signature().cmp(&other.signature()))
    }
}

impl Serialize for Func {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Func", 10)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("paramNames", &self.param_names)?;
        state.serialize_field("fullArgs", &self.full_args)?;
        state.serialize_field("returns", &self.returns)?;
        state.serialize_field("sighash", &self.sighash)?;
        state.serialize_field("notpayable", &self.notpayable)?;
        state.serialize_field("isABI", &self.is_abi)?;
        state.serialize_field("stateMutability", &self.state_mutability)?;
        state.serialize_field("visibility", &self.visibility)?;
        state.serialize_field("sighashIsFromOtherName", &self.sighash_is_from_other_name())?;
        state.end()
    }
}
