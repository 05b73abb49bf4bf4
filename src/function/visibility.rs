//!
//! The function visibility.
//!

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

///
/// The function visibility.
///
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Callable from other contracts only.
    External,
    /// Callable from everywhere.
    Public,
    /// Callable from the contract and its heirs.
    Internal,
    /// Callable from the contract only.
    Private,
}

impl Visibility {
    ///
    /// Whether the function is a part of the external interface.
    ///
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External | Self::Public)
    }

    ///
    /// Whether the function is callable only from within the contract code.
    ///
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Private)
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "external" => Ok(Self::External),
            "public" => Ok(Self::Public),
            "internal" => Ok(Self::Internal),
            "private" => Ok(Self::Private),
            value => Err(format!("Unknown visibility `{}`", value)),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Public => write!(f, "public"),
            Self::Internal => write!(f, "internal"),
            Self::Private => write!(f, "private"),
        }
    }
}
