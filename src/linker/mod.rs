//!
//! The library bytecode linker.
//!

pub mod address_book;

use std::collections::BTreeMap;

use crate::error::Error;
use crate::solc::standard_json::output::contract::evm::bytecode::LinkReferences;

/// The `PUSH20` opcode preceding a linked library address.
pub const PUSH20: &str = "73";

/// The opcode marking a linked library address push.
pub const LIBRARY_LINK_MARKER: &str = "5c";

///
/// The linked bytecode.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedBytecode {
    /// The bytecode hex string with the library addresses substituted.
    pub bytecode: String,
    /// The substituted addresses, in the substitution order.
    pub library_addresses: Vec<String>,
}

///
/// Substitutes the library addresses into the bytecode at the link references.
///
/// References are byte offsets. They are applied from the last one to the first one, and a
/// `PUSH20` right before a reference is replaced with the library link marker.
///
pub fn link<F>(
    bytecode: &str,
    link_references: &LinkReferences,
    resolve_address: F,
) -> Result<LinkedBytecode, Error>
where
    F: Fn(&str, &str) -> Result<String, Error>,
{
    let mut replacements = BTreeMap::new();
    for (file, contracts) in link_references.iter() {
        for (contract, references) in contracts.iter() {
            for reference in references.iter() {
                let address = resolve_address(file.as_str(), contract.as_str())?;
                replacements.insert(reference.start, (reference.length, address));
            }
        }
    }
    tracing::debug!(target: "build_conf", "replacements: {:?}", replacements);

    let mut linked = bytecode.to_owned();
    let mut library_addresses = Vec::with_capacity(replacements.len());
    for (start, (length, address)) in replacements.into_iter().rev() {
        let offset = start * 2;
        let end = offset + length * 2;
        if end > linked.len() || !linked.is_char_boundary(offset) || !linked.is_char_boundary(end) {
            return Err(Error::internal(format!(
                "Link reference {}:{} is out of the bytecode bounds",
                start, length
            )));
        }
        tracing::debug!(target: "build_conf", "replacing at {} of length {} with {}", offset, length * 2, address);
        let is_push = offset >= 2 && linked.get(offset - 2..offset) == Some(PUSH20);
        linked = if is_push {
            format!(
                "{}{}{}{}",
                &linked[..offset - 2],
                LIBRARY_LINK_MARKER,
                address,
                &linked[end..]
            )
        } else {
            format!("{}{}{}", &linked[..offset], address, &linked[end..])
        };
        library_addresses.push(address);
    }

    Ok(LinkedBytecode {
        bytecode: linked,
        library_addresses,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::error::Error;
    use crate::solc::standard_json::output::contract::evm::bytecode::link_reference::LinkReference;
    use crate::solc::standard_json::output::contract::evm::bytecode::LinkReferences;

    const ADDRESS: &str = "00000000ce4604a0000000000000000000000001";

    fn references(entries: &[(&str, usize)]) -> LinkReferences {
        let mut contracts = BTreeMap::new();
        for (contract, start) in entries.iter() {
            contracts
                .entry(contract.to_string())
                .or_insert_with(Vec::new)
                .push(LinkReference::new(*start, 20));
        }
        let mut references = BTreeMap::new();
        references.insert("/p/Math.sol".to_owned(), contracts);
        references
    }

    fn placeholder() -> String {
        "__$0123456789abcdef0123456789abcdef01$__".to_owned()
    }

    #[test]
    fn push20_becomes_marker() {
        let bytecode = format!("6080{}{}6000", super::PUSH20, placeholder());
        let linked = super::link(bytecode.as_str(), &references(&[("Math", 3)]), |_, _| {
            Ok(ADDRESS.to_owned())
        })
        .expect("Always valid");

        assert_eq!(linked.bytecode, format!("60805c{}6000", ADDRESS));
        assert_eq!(linked.bytecode.len(), bytecode.len());
        assert_eq!(&linked.bytecode[6..46], ADDRESS);
        assert_eq!(linked.library_addresses, vec![ADDRESS.to_owned()]);
    }

    #[test]
    fn non_push_prefix_is_kept() {
        let bytecode = format!("6080{}", placeholder());
        let linked = super::link(bytecode.as_str(), &references(&[("Math", 2)]), |_, _| {
            Ok(ADDRESS.to_owned())
        })
        .expect("Always valid");
        assert_eq!(linked.bytecode, format!("6080{}", ADDRESS));
    }

    #[test]
    fn multiple_references_are_all_linked() {
        let bytecode = format!("73{}73{}", placeholder(), placeholder());
        let linked = super::link(
            bytecode.as_str(),
            &references(&[("Math", 1), ("Math", 22)]),
            |_, _| Ok(ADDRESS.to_owned()),
        )
        .expect("Always valid");
        assert_eq!(linked.bytecode, format!("5c{}5c{}", ADDRESS, ADDRESS));
        assert_eq!(linked.library_addresses.len(), 2);
    }

    #[test]
    fn error_out_of_bounds() {
        let result = super::link("6080", &references(&[("Math", 1)]), |_, _| {
            Ok(ADDRESS.to_owned())
        });
        assert!(matches!(result, Err(Error::InternalConsistency(_))));
    }

    #[test]
    fn resolution_error_is_propagated() {
        let bytecode = format!("73{}", placeholder());
        let result = super::link(bytecode.as_str(), &references(&[("Math", 1)]), |_, _| {
            Err(Error::user_input("missing"))
        });
        assert!(matches!(result, Err(Error::UserInput(_))));
    }
}
