//!
//! The `solc --standard-json` interface.
//!

pub mod input;
pub mod output;
