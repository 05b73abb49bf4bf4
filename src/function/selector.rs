//!
//! The function selector.
//!

use sha3::Digest;
use sha3::Keccak256;

///
/// Returns the first four bytes of the signature Keccak-256 hash as lowercase hex.
///
pub fn selector(signature: &str) -> String {
    let hash = Keccak256::digest(signature.as_bytes());
    hex::encode(&hash[..4])
}

#[cfg(test)]
mod tests {
    #[test]
    fn erc20_transfer() {
        assert_eq!(super::selector("transfer(address,uint256)"), "a9059cbb");
    }

    #[test]
    fn erc20_balance_of() {
        assert_eq!(super::selector("balanceOf(address)"), "70a08231");
    }
}
