//!
//! The build session counter.
//!

///
/// The strictly increasing counter owned by a build session.
///
#[derive(Debug, Default, Clone)]
pub struct Counter {
    /// The next value.
    next: u64,
}

impl Counter {
    ///
    /// Returns the next value and advances the counter.
    ///
    pub fn next_value(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }
}
