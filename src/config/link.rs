//!
//! The manual link directive.
//!

use std::str::FromStr;

use crate::error::Error;

///
/// The manual link directive, written as `Contract:reference=destination`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDirective {
    /// The linked contract.
    pub contract: String,
    /// The linked immutable, state variable or slot.
    pub reference: String,
    /// The destination contract name or address.
    pub destination: String,
}

impl FromStr for LinkDirective {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let error = || {
            Error::user_input(format!(
                "Link {} should be of the form Contract:reference=destination",
                string
            ))
        };

        let (source, destination) = string.split_once('=').ok_or_else(error)?;
        let (contract, reference) = source.split_once(':').ok_or_else(error)?;
        let (contract, reference, destination) =
            (contract.trim(), reference.trim(), destination.trim());
        if contract.is_empty() || reference.is_empty() || destination.is_empty() {
            return Err(error());
        }

        Ok(Self {
            contract: contract.to_owned(),
            reference: reference.to_owned(),
            destination: destination.to_owned(),
        })
    }
}

impl std::fmt::Display for LinkDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}={}", self.contract, self.reference, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::LinkDirective;

    #[test]
    fn parses_directive() {
        let directive: LinkDirective = "Vault:token=Token".parse().expect("Always valid");
        assert_eq!(directive.contract, "Vault");
        assert_eq!(directive.reference, "token");
        assert_eq!(directive.destination, "Token");
        assert_eq!(directive.to_string(), "Vault:token=Token");
    }

    #[test]
    fn rejects_malformed_directives() {
        assert!("Vault=Token".parse::<LinkDirective>().is_err());
        assert!("Vault:token".parse::<LinkDirective>().is_err());
        assert!(":token=Token".parse::<LinkDirective>().is_err());
    }
}
