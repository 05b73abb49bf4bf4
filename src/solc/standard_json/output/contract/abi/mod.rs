//!
//! The `solc --standard-json` output contract ABI.
//!

pub mod entry;
pub mod parameter;
