//!
//! The auto-finder instrumentation planner.
//!

use std::collections::BTreeMap;

use crate::ast::source_range::SourceRange;
use crate::ast::AstIndex;
use crate::build::sdc::Sdc;
use crate::function::Func;
use crate::session::counter::Counter;

use super::error::InstrumentationError;
use super::finder::FinderGenerator;
use super::mutation::Mutation;
use super::normalize_path;
use super::Instrumentation;
use super::Instrumentations;

///
/// The planned instrumentation of a build unit.
///
#[derive(Debug, Default)]
pub struct AutoFinderPlan {
    /// The instrumented functions, keyed by the finder symbol.
    pub finders: BTreeMap<String, Func>,
    /// The source edits.
    pub instrumentations: Instrumentations,
}

///
/// The auto-finder instrumentation planner.
///
/// Assigns a finder symbol to every implemented internal and public function and plans the
/// source edits logging its calls.
///
#[derive(Debug)]
pub struct Planner<'a> {
    /// The AST index.
    index: &'a AstIndex,
}

impl<'a> Planner<'a> {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(index: &'a AstIndex) -> Self {
        Self { index }
    }

    ///
    /// Plans the instrumentation of all contracts of the build unit.
    ///
    pub fn plan(
        &self,
        sdc: &Sdc,
        counter: &mut Counter,
    ) -> Result<AutoFinderPlan, InstrumentationError> {
        let mut plan = AutoFinderPlan::default();

        for contract in sdc.contracts.iter() {
            for function in contract.instrumentable_funcs() {
                if function.is_constructor {
                    continue;
                }
                if function.has_function_type_argument() {
                    tracing::warn!(
                        target: "finder_instrumentation",
                        "Cannot instrument function {} in {} with function-typed arguments",
                        function.source_code_signature(),
                        contract.name
                    );
                    continue;
                }

                let location = match function.location.as_ref() {
                    Some(location) => location,
                    None if !function.implemented => continue,
                    None => {
                        return Err(InstrumentationError::NoLocation {
                            function: function.source_code_signature(),
                            contract: contract.name.clone(),
                        })
                    }
                };
                let file_key = normalize_path(location.file.as_str());
                if function.full_args.len() != function.param_names.len() {
                    return Err(InstrumentationError::NoParameterNames {
                        function: function.source_code_signature(),
                        contract: contract.name.clone(),
                    });
                }

                let start_byte = location.src.start;
                if plan
                    .instrumentations
                    .get(file_key.as_str())
                    .map(|file| file.contains_key(&start_byte))
                    .unwrap_or_default()
                {
                    continue;
                }

                let ast_id = function
                    .ast_id
                    .ok_or_else(|| InstrumentationError::NoAstId(function.source_code_signature()))?;
                let definition = self
                    .index
                    .unit(sdc.sdc_origin_file.as_str(), location.file.as_str())
                    .and_then(|unit| unit.get(&ast_id))
                    .ok_or_else(|| InstrumentationError::NoDefinition {
                        function: function.source_code_signature(),
                        id: ast_id,
                    })?;

                let internal_id = counter.next_value();
                let symbol = format!("0x{:x}", FinderGenerator::symbol(internal_id));
                let file = plan.instrumentations.entry(file_key).or_default();

                let modifiers = definition.get_array("modifiers");
                if modifiers.is_empty() {
                    let finder = FinderGenerator::full_assembly_finder(
                        function,
                        internal_id,
                        &sdc.compiler_collector,
                    )?;
                    file.insert(
                        start_byte,
                        Instrumentation::new(b'{', finder, Mutation::InsertAfter),
                    );
                } else {
                    let finder = FinderGenerator::modifier_finder(
                        function,
                        internal_id,
                        &sdc.compiler_collector,
                    )?;
                    let signature = function.source_code_signature();

                    let definition_end = definition
                        .src()
                        .and_then(|src| src.last())
                        .ok_or_else(|| InstrumentationError::Modifier(signature.clone()))?;
                    file.insert(
                        definition_end,
                        Instrumentation::new(b'}', finder.definition, Mutation::InsertAfter),
                    );

                    let (first_start, first_name) =
                        Self::first_modifier(modifiers, signature.as_str())?;
                    let expected = first_name
                        .bytes()
                        .next()
                        .ok_or_else(|| InstrumentationError::Modifier(signature.clone()))?;
                    file.insert(
                        first_start,
                        Instrumentation::new(
                            expected,
                            format!("{} ", finder.invocation),
                            Mutation::InsertBefore,
                        ),
                    );
                }

                tracing::debug!(
                    target: "finder_instrumentation",
                    "instrumenting {} in {} as {}",
                    function.source_code_signature(),
                    contract.name,
                    symbol
                );
                plan.finders.insert(symbol, function.clone());
            }
        }

        Ok(plan)
    }

    ///
    /// Returns the start offset and the name of the first modifier invocation in the source.
    ///
    fn first_modifier(
        modifiers: &[serde_json::Value],
        signature: &str,
    ) -> Result<(usize, String), InstrumentationError> {
        let mut first: Option<(usize, String)> = None;
        for modifier in modifiers.iter() {
            let error = || InstrumentationError::Modifier(signature.to_owned());
            if modifier.get("nodeType").and_then(|kind| kind.as_str())
                != Some("ModifierInvocation")
            {
                return Err(error());
            }
            let src: SourceRange = modifier
                .get("src")
                .and_then(|src| src.as_str())
                .ok_or_else(error)?
                .parse()
                .map_err(|_| error())?;
            let name = modifier
                .get("modifierName")
                .and_then(|name| name.get("name"))
                .and_then(|name| name.as_str())
                .ok_or_else(error)?;
            if first
                .as_ref()
                .map(|(start, _)| src.start < *start)
                .unwrap_or(true)
            {
                first = Some((src.start, name.to_owned()));
            }
        }
        first.ok_or_else(|| InstrumentationError::Modifier(signature.to_owned()))
    }
}
