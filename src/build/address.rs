//!
//! The synthetic contract address generator.
//!

///
/// The synthetic contract address generator.
///
/// Addresses are the `0xce4604a` tag shifted by 100 bits plus a strictly increasing index,
/// so they are distinct and reproducible within a build.
///
#[derive(Debug, Default, Clone)]
pub struct AddressGenerator {
    /// The index of the next address.
    next_index: u128,
}

impl AddressGenerator {
    /// The address tag.
    pub const TAG: u128 = 0xce4604a;

    /// The address tag bit offset.
    pub const TAG_SHIFT: u32 = 100;

    ///
    /// Returns the next address.
    ///
    pub fn next_address(&mut self) -> u128 {
        let address = (Self::TAG << Self::TAG_SHIFT) + self.next_index;
        self.next_index += 1;
        address
    }

    ///
    /// Formats the address as 40 hexadecimal digits.
    ///
    pub fn format(address: u128) -> String {
        format!("{:040x}", address)
    }
}

#[cfg(test)]
mod tests {
    use super::AddressGenerator;

    #[test]
    fn addresses_are_increasing() {
        let mut generator = AddressGenerator::default();
        let first = generator.next_address();
        let second = generator.next_address();
        assert!(second > first);
        assert_eq!(
            AddressGenerator::format(first),
            "00000000ce4604a0000000000000000000000000"
        );
        assert_eq!(
            AddressGenerator::format(second),
            "00000000ce4604a0000000000000000000000001"
        );
    }
}
