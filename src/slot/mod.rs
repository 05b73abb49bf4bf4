//!
//! The storage slot resolver.
//!

use std::collections::BTreeSet;

use crate::error::Error;

///
/// The storage slot resolver.
///
/// Resolves a state variable name of a contract to its storage slot, formatted as un-prefixed
/// lowercase hex.
///
#[derive(Debug)]
pub struct SlotResolver<'a> {
    /// The contract name.
    contract: &'a str,
    /// The state variable name.
    name: &'a str,
}

impl<'a> SlotResolver<'a> {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(contract: &'a str, name: &'a str) -> Self {
        Self { contract, name }
    }

    ///
    /// Resolves the slot from the compiler-reported storage layout.
    ///
    /// Returns `None` if the layout has no storage section, in which case the assembly
    /// fallback is used.
    ///
    pub fn from_storage_layout(&self, layout: &serde_json::Value) -> Result<Option<String>, Error> {
        let storage = match layout.get("storage").and_then(|storage| storage.as_array()) {
            Some(storage) => storage,
            None => {
                tracing::debug!(target: "build_conf", "no storage section in the layout of {}", self.contract);
                return Ok(None);
            }
        };

        let slots: BTreeSet<String> = storage
            .iter()
            .filter(|entry| entry.get("label").and_then(|label| label.as_str()) == Some(self.name))
            .filter_map(|entry| match entry.get("slot") {
                Some(serde_json::Value::String(slot)) => Some(slot.to_owned()),
                Some(serde_json::Value::Number(slot)) => Some(slot.to_string()),
                _ => None,
            })
            .collect();

        match slots.len() {
            0 => Err(Error::user_input(format!(
                "Link to a variable {} that doesn't exist in the contract {}, neither as a state variable nor as an immutable.",
                self.name, self.contract
            ))),
            1 => {
                let slot = slots.into_iter().next().unwrap_or_default();
                let slot = decimal_to_hex(slot.as_str()).ok_or_else(|| {
                    Error::internal(format!(
                        "Invalid slot {} of {} in the storage layout of contract {}",
                        slot, self.name, self.contract
                    ))
                })?;
                tracing::debug!(target: "build_conf", "slot of {} in {} is {}", self.name, self.contract, slot);
                Ok(Some(slot))
            }
            _ => Err(Error::internal(format!(
                "Cannot link, found multiple matches for {} in storage layout of contract {}: {}",
                self.name,
                self.contract,
                slots.into_iter().collect::<Vec<String>>().join(", ")
            ))),
        }
    }

    ///
    /// Resolves the slot from the annotated assembly listing.
    ///
    /// The push instruction following the source comment ending with the variable name holds
    /// the slot.
    ///
    pub fn from_assembly(&self, assembly: &str) -> Result<String, Error> {
        let pattern = regex::Regex::new(
            format!(
                r#"/\* "[a-zA-Z0-9./_\-:]+":[0-9]+:[0-9]+\s* {} \*/"#,
                regex::escape(self.name)
            )
            .as_str(),
        )
        .map_err(|error| Error::internal(format!("Invalid slot pattern for {}: {}", self.name, error)))?;
        let literal = regex::Regex::new(r"^0[xX]").expect("Always valid");

        let lines: Vec<&str> = assembly.lines().collect();
        let candidates: BTreeSet<String> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| pattern.is_match(line))
            .filter_map(|(index, _)| lines.get(index + 1))
            .map(|line| line.trim().to_owned())
            .filter(|line| literal.is_match(line))
            .collect();
        let candidates_list = candidates
            .iter()
            .cloned()
            .collect::<Vec<String>>()
            .join(", ");

        match candidates.len() {
            1 => {
                let candidate = candidates.iter().next().cloned().unwrap_or_default();
                normalize_slot(candidate.as_str()).ok_or_else(|| {
                    Error::internal(format!(
                        "Invalid slot candidate {} for {} in {}",
                        candidate, self.name, self.contract
                    ))
                })
            }
            0 => Err(Error::user_input(format!(
                "Link to a var that doesnt exist on the contract. Failed to resolve slot for {} in {}, valid candidates: {{{}}}",
                self.name, self.contract, candidates_list
            ))),
            _ => Err(Error::internal(format!(
                "Cannot link, Found multiple matches for {} in {}, valid candidates: {{{}}}",
                self.name, self.contract, candidates_list
            ))),
        }
    }
}

///
/// Whether the string is a `0x`-prefixed hex number.
///
pub fn is_hex(value: &str) -> bool {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(digits) => !digits.is_empty() && digits.chars().all(|digit| digit.is_ascii_hexdigit()),
        None => false,
    }
}

///
/// Whether the string is a decimal number.
///
pub fn is_decimal(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|digit| digit.is_ascii_digit())
}

///
/// Converts a decimal slot to un-prefixed lowercase hex.
///
pub fn decimal_to_hex(value: &str) -> Option<String> {
    num::BigUint::parse_bytes(value.as_bytes(), 10).map(|slot| slot.to_str_radix(16))
}

///
/// Normalizes a hex or decimal slot to un-prefixed lowercase hex without leading zeros.
///
pub fn normalize_slot(value: &str) -> Option<String> {
    if is_hex(value) {
        num::BigUint::parse_bytes(value[2..].as_bytes(), 16).map(|slot| slot.to_str_radix(16))
    } else if is_decimal(value) {
        decimal_to_hex(value)
    } else {
        None
    }
}
