//!
//! The bytecode link or immutable reference.
//!

use serde::Deserialize;
use serde::Serialize;

///
/// The bytecode link or immutable reference.
///
/// Both fields are in bytes, not in hexadecimal characters.
///
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LinkReference {
    /// The byte offset.
    pub start: usize,
    /// The byte length.
    pub length: usize,
}

impl LinkReference {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }
}
