//!
//! The AST node source range.
//!

use std::str::FromStr;

///
/// The AST node source range, parsed from the `start:length:file` notation.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    /// The byte offset of the range start.
    pub start: usize,
    /// The byte length.
    pub length: usize,
    /// The source file index, `-1` for generated code.
    pub file_index: Option<i64>,
}

impl SourceRange {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(start: usize, length: usize) -> Self {
        Self {
            start,
            length,
            file_index: None,
        }
    }

    ///
    /// The byte offset of the last byte of the range.
    ///
    pub fn last(&self) -> Option<usize> {
        (self.start + self.length).checked_sub(1)
    }
}

impl FromStr for SourceRange {
    type Err = String;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut parts = string.split(':');
        let mut next_number = |name: &str| -> Result<usize, String> {
            parts
                .next()
                .ok_or_else(|| format!("Source range `{}` has no {}", string, name))?
                .parse::<usize>()
                .map_err(|error| format!("Source range `{}` {} is invalid: {}", string, name, error))
        };
        let start = next_number("start")?;
        let length = next_number("length")?;
        let file_index = parts.next().and_then(|index| index.parse::<i64>().ok());

        Ok(Self {
            start,
            length,
            file_index,
        })
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.file_index {
            Some(file_index) => write!(f, "{}:{}:{}", self.start, self.length, file_index),
            None => write!(f, "{}:{}", self.start, self.length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SourceRange;

    #[test]
    fn parses_three_parts() {
        let range: SourceRange = "120:35:0".parse().expect("Always valid");
        assert_eq!(range.start, 120);
        assert_eq!(range.length, 35);
        assert_eq!(range.file_index, Some(0));
        assert_eq!(range.last(), Some(154));
    }

    #[test]
    fn error_non_numeric_start() {
        assert!("x:1:0".parse::<SourceRange>().is_err());
    }
}
