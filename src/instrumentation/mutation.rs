//!
//! The source mutation strategy.
//!

///
/// The source mutation strategy applied at the instrumented byte.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The payload is written before the byte.
    InsertBefore,
    /// The payload is written after the byte.
    InsertAfter,
    /// The payload replaces the given number of bytes, starting with the instrumented one.
    Replace(usize),
}

impl Mutation {
    ///
    /// Writes the payload and the instrumented byte to the output.
    ///
    /// Returns the number of source bytes to skip after the instrumented one.
    ///
    pub fn apply(&self, payload: &str, expected: u8, output: &mut Vec<u8>) -> usize {
        match self {
            Self::InsertBefore => {
                output.extend_from_slice(payload.as_bytes());
                output.push(expected);
                0
            }
            Self::InsertAfter => {
                output.push(expected);
                output.extend_from_slice(payload.as_bytes());
                0
            }
            Self::Replace(length) => {
                output.extend_from_slice(payload.as_bytes());
                length.saturating_sub(1)
            }
        }
    }
}
