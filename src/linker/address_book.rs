//!
//! The contract addresses chosen for a compiled file.
//!

use std::collections::BTreeMap;

use crate::build::address::AddressGenerator;
use crate::error::Error;

///
/// The contract addresses chosen for a compiled file, keyed by `file:contract`.
///
#[derive(Debug, Clone)]
pub struct AddressBook<'a> {
    /// The chosen addresses in assignment order.
    entries: Vec<(u128, String)>,
    /// The user address overrides by contract name.
    overrides: &'a BTreeMap<String, String>,
}

impl<'a> AddressBook<'a> {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(overrides: &'a BTreeMap<String, String>) -> Self {
        Self {
            entries: Vec::new(),
            overrides,
        }
    }

    ///
    /// Assigns the next address to the contract, unless it already has one.
    ///
    pub fn assign(&mut self, generator: &mut AddressGenerator, file: &str, contract: &str) {
        let key = Self::entry_key(file, contract);
        if self.entries.iter().any(|(_, entry)| *entry == key) {
            return;
        }
        self.entries.push((generator.next_address(), key));
    }

    ///
    /// Forgets the chosen addresses. The generator keeps counting.
    ///
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    ///
    /// Returns the address of the contract, formatted as 40 hexadecimal digits.
    ///
    /// A user override takes precedence over the chosen address.
    ///
    pub fn find(&self, file: &str, contract: &str) -> Result<String, Error> {
        let key = Self::entry_key(file, contract);
        let address = match self.entries.iter().find(|(_, entry)| *entry == key) {
            Some((address, _)) => *address,
            None => {
                let available: Vec<&str> =
                    self.entries.iter().map(|(_, entry)| entry.as_str()).collect();
                return Err(Error::user_input(format!(
                    "Failed to find a contract named {} in file {}. Please make sure there is a file named like the contract, or a file containing a contract with this name. Available contracts: {}",
                    contract,
                    file,
                    available.join(",")
                )));
            }
        };

        if let Some(value) = self.overrides.get(contract) {
            let address = Self::parse_integer(value.as_str()).ok_or_else(|| {
                Error::user_input(format!(
                    "Invalid address {} of contract {}",
                    value, contract
                ))
            })?;
            tracing::debug!(target: "ast", "custom address for {} is {:x}", contract, address);
            return Ok(format!("{:040x}", address));
        }
        tracing::debug!(target: "ast", "candidate address for {} is {:x}", contract, address);
        Ok(AddressGenerator::format(address))
    }

    ///
    /// Parses an integer with an optional `0x`, `0o` or `0b` radix prefix.
    ///
    pub fn parse_integer(value: &str) -> Option<num::BigUint> {
        let value = value.trim().replace('_', "");
        let (digits, radix) = match value.get(..2) {
            Some("0x" | "0X") => (&value[2..], 16),
            Some("0o" | "0O") => (&value[2..], 8),
            Some("0b" | "0B") => (&value[2..], 2),
            _ => (value.as_str(), 10),
        };
        num::BigUint::parse_bytes(digits.as_bytes(), radix)
    }

    fn entry_key(file: &str, contract: &str) -> String {
        format!("{}:{}", file, contract)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::build::address::AddressGenerator;
    use crate::error::Error;

    use super::AddressBook;

    #[test]
    fn chosen_and_overridden_addresses() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Oracle".to_owned(), "0x1234".to_owned());
        let mut generator = AddressGenerator::default();
        let mut book = AddressBook::new(&overrides);
        book.assign(&mut generator, "/p/Token.sol", "Token");
        book.assign(&mut generator, "/p/Oracle.sol", "Oracle");

        assert_eq!(
            book.find("/p/Token.sol", "Token").expect("Always valid"),
            "00000000ce4604a0000000000000000000000000"
        );
        assert_eq!(
            book.find("/p/Oracle.sol", "Oracle").expect("Always valid"),
            "0000000000000000000000000000000000001234"
        );
    }

    #[test]
    fn error_unknown_contract_lists_available() {
        let overrides = BTreeMap::new();
        let mut generator = AddressGenerator::default();
        let mut book = AddressBook::new(&overrides);
        book.assign(&mut generator, "/p/Token.sol", "Token");

        match book.find("/p/Token.sol", "Vault") {
            Err(Error::UserInput(message)) => {
                assert!(message.starts_with("Failed to find a contract named Vault in file /p/Token.sol."));
                assert!(message.ends_with("Available contracts: /p/Token.sol:Token"));
            }
            result => panic!("Unexpected result: {:?}", result),
        }
    }

    #[test]
    fn cleared_book_chooses_new_addresses() {
        let overrides = BTreeMap::new();
        let mut generator = AddressGenerator::default();
        let mut book = AddressBook::new(&overrides);
        book.assign(&mut generator, "/p/Lib.sol", "LibA");
        book.assign(&mut generator, "/p/Lib.sol", "LibA");
        let first = book.find("/p/Lib.sol", "LibA").expect("Always valid");
        assert_eq!(first, "00000000ce4604a0000000000000000000000000");

        book.clear();
        assert!(book.find("/p/Lib.sol", "LibA").is_err());
        book.assign(&mut generator, "/p/Lib.sol", "LibA");
        assert_eq!(
            book.find("/p/Lib.sol", "LibA").expect("Always valid"),
            "00000000ce4604a0000000000000000000000001"
        );
    }

    #[test]
    fn parses_prefixed_integers() {
        assert_eq!(AddressBook::parse_integer("0x10"), Some(num::BigUint::from(16u32)));
        assert_eq!(AddressBook::parse_integer("0b11"), Some(num::BigUint::from(3u32)));
        assert_eq!(AddressBook::parse_integer("42"), Some(num::BigUint::from(42u32)));
        assert_eq!(AddressBook::parse_integer("0xzz"), None);
    }
}
