//!
//! The declaration lookups and the declared types of a contract.
//!

use std::collections::BTreeSet;

use crate::ast::node::Node;
use crate::ast::AstIndex;
use crate::compiler_lang::CompilerLang;
use crate::error::Error;

use super::Type;

///
/// Resolves referenced declarations within one compilation.
///
#[derive(Debug, Clone, Copy)]
pub struct Declarations<'a> {
    /// The AST index.
    pub index: &'a AstIndex,
    /// The original file the compilation was made for.
    pub original_file: &'a str,
}

impl<'a> Declarations<'a> {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(index: &'a AstIndex, original_file: &'a str) -> Self {
        Self {
            index,
            original_file,
        }
    }

    ///
    /// Returns the declaration node.
    ///
    /// # Panics
    /// If the declaration is not in the compilation.
    ///
    pub fn resolve(&self, reference: i64) -> &'a Node {
        self.index.original_def_node(self.original_file, reference)
    }

    ///
    /// Collects the user-defined types visible to a contract.
    ///
    /// Those are the file-level types of all transitively imported files, and the types
    /// declared inside the base contracts or inside libraries.
    ///
    pub fn source_types(
        &self,
        compiled_file: &str,
        contract_name: &str,
        lang: CompilerLang,
    ) -> Result<Vec<Type>, Error> {
        let base_contracts =
            self.index
                .base_contracts(self.original_file, compiled_file, contract_name)?;
        let imported_files = if lang.supports_imports() {
            self.index.imported_files(self.original_file, compiled_file)
        } else {
            BTreeSet::new()
        };

        let mut types = Vec::new();
        for imported_file in imported_files.iter() {
            types.extend(self.index.imported_types(
                self.original_file,
                imported_file.as_str(),
                || self.file_level_types(imported_file.as_str()),
            )?);
        }

        let base_files: BTreeSet<&str> = base_contracts
            .iter()
            .map(|base| base.file.as_str())
            .collect();
        for base_file in base_files.into_iter() {
            let unit = match self.index.unit(self.original_file, base_file) {
                Some(unit) => unit,
                None => continue,
            };
            for node in unit.values() {
                if !node.is_user_defined_type_definition() {
                    continue;
                }
                let owner = match node.contract.as_deref() {
                    Some(owner) => owner,
                    None => continue,
                };
                let is_base = base_contracts.iter().any(|base| base.name.as_str() == owner);
                let is_library = self
                    .index
                    .contract_def_node_ref(self.original_file, base_file, owner)
                    .map(|reference| {
                        self.index
                            .is_library_def_node(self.original_file, base_file, reference)
                    })
                    .unwrap_or_default();
                if is_base || is_library {
                    types.push(Type::from_def_node(self, node)?);
                }
            }
        }

        Ok(types)
    }

    fn file_level_types(&self, compiled_file: &str) -> Result<Vec<Type>, Error> {
        self.index
            .unit(self.original_file, compiled_file)
            .into_iter()
            .flat_map(|unit| unit.values())
            .filter(|node| node.contract.is_none() && node.is_user_defined_type_definition())
            .map(|node| Type::from_def_node(self, node))
            .collect()
    }
}
