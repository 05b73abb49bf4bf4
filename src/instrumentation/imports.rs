//!
//! The import directive rewriting.
//!

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::path::Path;

use crate::ast::node::Node;
use crate::ast::AstIndex;

use super::auto_finder_path;
use super::error::InstrumentationError;
use super::mutation::Mutation;
use super::normalize_path;
use super::Instrumentation;
use super::Instrumentations;

///
/// The import directive rewriting.
///
/// Every file importing an instrumented file, directly or transitively, is instrumented too,
/// with its import directives pointing to the instrumented copies.
///
#[derive(Debug)]
pub struct ImportRewriter<'a> {
    /// The AST index.
    index: &'a AstIndex,
    /// The compiled top-level file.
    original_file: &'a str,
}

impl<'a> ImportRewriter<'a> {
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
    /// Adds the import rewrites of all importers of the instrumented files.
    ///
    pub fn rewrite(&self, instrumentations: &mut Instrumentations) -> Result<(), InstrumentationError> {
        let importers = self.importers()?;

        let mut queue: VecDeque<String> = instrumentations.keys().cloned().collect();
        let mut visited: BTreeSet<String> = queue.iter().cloned().collect();
        while let Some(imported) = queue.pop_front() {
            let directives = match importers.get(imported.as_str()) {
                Some(directives) => directives,
                None => continue,
            };
            for (importer, node) in directives.iter() {
                let importer_key = normalize_path(importer.as_str());
                let (offset, instrumentation) = self.rewrite_directive(importer.as_str(), node)?;
                let file = instrumentations.entry(importer_key.clone()).or_default();
                if file.contains_key(&offset) {
                    return Err(InstrumentationError::Conflict {
                        file: importer.to_owned(),
                        offset,
                    });
                }
                tracing::debug!(
                    target: "finder_instrumentation",
                    "rewriting import {} of {} in {}",
                    node.id,
                    imported,
                    importer
                );
                file.insert(offset, instrumentation);

                if visited.insert(importer_key.clone()) {
                    queue.push_back(importer_key);
                }
            }
        }

        Ok(())
    }

    ///
    /// Returns the import directives by the normalized path of the imported file.
    ///
    fn importers(&self) -> Result<BTreeMap<String, Vec<(String, &'a Node)>>, InstrumentationError> {
        let mut importers: BTreeMap<String, Vec<(String, &'a Node)>> = BTreeMap::new();
        for (compiled_file, unit) in self.index.units(self.original_file) {
            for node in unit.values().filter(|node| node.is("ImportDirective")) {
                let absolute_path =
                    node.get_str("absolutePath")
                        .ok_or_else(|| InstrumentationError::Import {
                            file: compiled_file.to_owned(),
                            id: node.id,
                            reason: "no absolute path".to_owned(),
                        })?;
                importers
                    .entry(normalize_path(absolute_path))
                    .or_default()
                    .push((compiled_file.to_owned(), node));
            }
        }
        Ok(importers)
    }

    ///
    /// Returns the replacement of the import directive.
    ///
    fn rewrite_directive(
        &self,
        importer: &str,
        node: &Node,
    ) -> Result<(usize, Instrumentation), InstrumentationError> {
        let error = |reason: &str| InstrumentationError::Import {
            file: importer.to_owned(),
            id: node.id,
            reason: reason.to_owned(),
        };

        let absolute_path = node
            .get_str("absolutePath")
            .ok_or_else(|| error("no absolute path"))?;
        let new_path = auto_finder_path(Path::new(normalize_path(absolute_path).as_str()));
        let new_path = new_path.to_string_lossy();
        let src = node.src().ok_or_else(|| error("no source range"))?;

        let unit_alias = node.get_str("unitAlias").unwrap_or_default();
        let symbol_aliases = node.get_array("symbolAliases");
        if !unit_alias.is_empty() && !symbol_aliases.is_empty() {
            return Err(error("both unit and symbol aliases"));
        }

        let payload = if !symbol_aliases.is_empty() {
            let symbols = self.symbols(importer, node, symbol_aliases, &error)?;
            format!("import {{ {} }} from '{}';", symbols.join(", "), new_path)
        } else if !unit_alias.is_empty() {
            format!("import '{}' as {};", new_path, unit_alias)
        } else {
            format!("import '{}';", new_path)
        };

        Ok((
            src.start,
            Instrumentation::new(b'i', payload, Mutation::Replace(src.length)),
        ))
    }

    ///
    /// Returns the imported symbols with their aliases.
    ///
    /// Old compilers report the foreign symbols as bare source offsets, so the directive text
    /// is parsed instead.
    ///
    fn symbols<E>(
        &self,
        importer: &str,
        node: &Node,
        symbol_aliases: &[serde_json::Value],
        error: &E,
    ) -> Result<Vec<String>, InstrumentationError>
    where
        E: Fn(&str) -> InstrumentationError,
    {
        let mut symbols = Vec::with_capacity(symbol_aliases.len());
        for alias in symbol_aliases.iter() {
            let foreign = alias.get("foreign").ok_or_else(|| error("no foreign symbol"))?;
            if foreign.is_i64() || foreign.is_u64() {
                return self.symbols_from_source(importer, node, error);
            }

            let name = foreign
                .get("name")
                .and_then(|name| name.as_str())
                .ok_or_else(|| error("unrecognized foreign symbol"))?;
            match alias.get("local").and_then(|local| local.as_str()) {
                Some(local) => symbols.push(format!("{} as {}", name, local)),
                None => symbols.push(name.to_owned()),
            }
        }
        Ok(symbols)
    }

    ///
    /// Parses the imported symbols from the import directive source text.
    ///
    fn symbols_from_source<E>(
        &self,
        importer: &str,
        node: &Node,
        error: &E,
    ) -> Result<Vec<String>, InstrumentationError>
    where
        E: Fn(&str) -> InstrumentationError,
    {
        let src = node.src().ok_or_else(|| error("no source range"))?;
        let source = std::fs::read(importer).map_err(|error| InstrumentationError::Io {
            path: importer.to_owned(),
            error,
        })?;
        let directive = source
            .get(src.start..src.start + src.length)
            .ok_or_else(|| error("source range out of bounds"))?;
        let directive = String::from_utf8_lossy(directive);

        let pattern = regex::Regex::new(r"import\s+\{([^}]+)\}").expect("Always valid");
        let captures = pattern
            .captures(directive.as_ref())
            .ok_or_else(|| error("no symbol list in the directive"))?;
        Ok(captures[1]
            .split(',')
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty())
            .map(str::to_owned)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::ast::AstIndex;
    use crate::compiler_lang::CompilerLang;
    use crate::instrumentation::mutation::Mutation;
    use crate::instrumentation::Instrumentation;
    use crate::instrumentation::Instrumentations;
    use crate::solc::standard_json::output::source::Source;

    use super::ImportRewriter;

    fn index(main: &str, directive: serde_json::Value) -> AstIndex {
        let mut sources = BTreeMap::new();
        sources.insert(
            "/p/Token.sol".to_owned(),
            Source {
                id: 0,
                ast: Some(serde_json::json!({ "id": 1, "nodeType": "SourceUnit", "nodes": [] })),
            },
        );
        sources.insert(
            main.to_owned(),
            Source {
                id: 1,
                ast: Some(serde_json::json!({
                    "id": 9,
                    "nodeType": "SourceUnit",
                    "nodes": [directive],
                })),
            },
        );
        let mut index = AstIndex::default();
        index
            .insert(main, &sources, CompilerLang::Solidity)
            .expect("Always valid");
        index
    }

    fn instrumented_token() -> Instrumentations {
        let mut instrumentations = Instrumentations::new();
        instrumentations.entry("/p/Token.sol".to_owned()).or_default().insert(
            10,
            Instrumentation::new(b'{', "assembly {}".to_owned(), Mutation::InsertAfter),
        );
        instrumentations
    }

    #[test]
    fn rewrites_plain_and_aliased_imports() {
        let index = index(
            "/p/Main.sol",
            serde_json::json!({
                "id": 10,
                "nodeType": "ImportDirective",
                "absolutePath": "/p/Token.sol",
                "src": "0:22:1",
                "unitAlias": "T",
                "symbolAliases": [],
            }),
        );
        let mut instrumentations = instrumented_token();
        ImportRewriter::new(&index, "/p/Main.sol")
            .rewrite(&mut instrumentations)
            .expect("Always valid");

        let directive = &instrumentations["/p/Main.sol"][&0];
        assert_eq!(directive.payload, "import '/p/autoFinder_Token.sol' as T;");
        assert_eq!(directive.mutation, Mutation::Replace(22));
        assert_eq!(directive.expected, b'i');
    }

    #[test]
    fn rewrites_symbol_imports() {
        let index = index(
            "/p/Main.sol",
            serde_json::json!({
                "id": 10,
                "nodeType": "ImportDirective",
                "absolutePath": "/p/Token.sol",
                "src": "0:40:1",
                "unitAlias": "",
                "symbolAliases": [
                    { "foreign": { "id": 11, "nodeType": "Identifier", "name": "Token" }, "local": null },
                    { "foreign": { "id": 12, "nodeType": "Identifier", "name": "Pool" }, "local": "P" },
                ],
            }),
        );
        let mut instrumentations = instrumented_token();
        ImportRewriter::new(&index, "/p/Main.sol")
            .rewrite(&mut instrumentations)
            .expect("Always valid");

        assert_eq!(
            instrumentations["/p/Main.sol"][&0].payload,
            "import { Token, Pool as P } from '/p/autoFinder_Token.sol';"
        );
    }

    #[test]
    fn parses_legacy_symbol_offsets_from_source() {
        let directory = tempfile::tempdir().expect("Always valid");
        let main = directory.path().join("Main.sol");
        let text = "import {Token, Pool as P, } from './Token.sol';\n";
        std::fs::write(&main, text).expect("Always valid");
        let main = main.to_string_lossy().to_string();

        let index = index(
            main.as_str(),
            serde_json::json!({
                "id": 10,
                "nodeType": "ImportDirective",
                "absolutePath": "/p/Token.sol",
                "src": format!("0:{}:1", text.len() - 1),
                "symbolAliases": [ { "foreign": 8, "local": null } ],
            }),
        );
        let mut instrumentations = instrumented_token();
        ImportRewriter::new(&index, main.as_str())
            .rewrite(&mut instrumentations)
            .expect("Always valid");

        assert_eq!(
            instrumentations[main.as_str()][&0].payload,
            "import { Token, Pool as P } from '/p/autoFinder_Token.sol';"
        );
    }

    #[test]
    fn both_aliases_are_rejected() {
        let index = index(
            "/p/Main.sol",
            serde_json::json!({
                "id": 10,
                "nodeType": "ImportDirective",
                "absolutePath": "/p/Token.sol",
                "src": "0:22:1",
                "unitAlias": "T",
                "symbolAliases": [ { "foreign": { "id": 11, "name": "Token" } } ],
            }),
        );
        let mut instrumentations = instrumented_token();
        assert!(ImportRewriter::new(&index, "/p/Main.sol")
            .rewrite(&mut instrumentations)
            .is_err());
    }
}
