//!
//! The `solc --standard-json` output contract EVM bytecode.
//!

pub mod link_reference;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use self::link_reference::LinkReference;

///
/// The library link references: `file -> library -> [references]`.
///
pub type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkReference>>>;

///
/// The `solc --standard-json` output contract EVM bytecode.
///
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Bytecode {
    /// The bytecode object, unlinked.
    #[serde(default)]
    pub object: String,
    /// The source map. Vyper may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<serde_json::Value>,
    /// The library link references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_references: Option<LinkReferences>,
    /// The immutable references keyed by the declaration AST node ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable_references: Option<BTreeMap<String, Vec<LinkReference>>>,
}

impl Bytecode {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(object: String) -> Self {
        Self {
            object,
            ..Default::default()
        }
    }

    ///
    /// Returns the source map as a string, which is empty if absent.
    ///
    pub fn source_map_string(&self) -> String {
        match self.source_map.as_ref() {
            Some(serde_json::Value::String(source_map)) => source_map.to_owned(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(source_map) => source_map.to_string(),
        }
    }
}
