//!
//! The immutable variable reference.
//!

use serde::Serialize;

///
/// The immutable variable reference in the deployed bytecode.
///
/// A reference linked to a constant with a link directive carries the value.
///
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ImmutableReference {
    /// The byte offset.
    pub offset: usize,
    /// The byte length.
    pub length: usize,
    /// The variable name.
    pub varname: String,
    /// The preset value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ImmutableReference {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(offset: usize, length: usize, varname: String) -> Self {
        Self {
            offset,
            length,
            varname,
            value: None,
        }
    }

    ///
    /// Converts the reference into a preset one.
    ///
    pub fn preset(self, value: String) -> Self {
        Self {
            value: Some(value),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ImmutableReference;

    #[test]
    fn value_is_serialized_only_when_preset() {
        let reference = ImmutableReference::new(12, 32, "owner".to_owned());
        assert_eq!(
            serde_json::to_value(&reference).expect("Always valid"),
            serde_json::json!({ "offset": 12, "length": 32, "varname": "owner" })
        );
        assert_eq!(
            serde_json::to_value(&reference.preset("1234".to_owned())).expect("Always valid"),
            serde_json::json!({ "offset": 12, "length": 32, "varname": "owner", "value": "1234" })
        );
    }
}
