//!
//! The per-file compilation and contract collection.
//!

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::build::contract::ContractInSdc;
use crate::build::immutable::ImmutableReference;
use crate::build::sdc::Sdc;
use crate::compiler_lang::CompilerLang;
use crate::error::Error;
use crate::function::catalog::FunctionCatalog;
use crate::function::visibility::Visibility;
use crate::function::Func;
use crate::instrumentation::normalize_path;
use crate::linker;
use crate::solc::collector::CompilerCollector;
use crate::solc::standard_json::input::Input as SolcStandardJsonInput;
use crate::solc::standard_json::output::contract::evm::bytecode::Bytecode;
use crate::solc::standard_json::output::contract::evm::bytecode::LinkReferences;
use crate::solc::standard_json::output::Output as SolcStandardJsonOutput;
use crate::types::declarations::Declarations;

use super::BuildSession;

///
/// The source lists of a compilation.
///
#[derive(Debug, Default)]
pub struct SourceLists {
    /// Source ID to the compiler path.
    pub original: BTreeMap<usize, String>,
    /// Source ID to the report copy path.
    pub report: BTreeMap<usize, String>,
}

impl<'a> BuildSession<'a> {
    ///
    /// Compiles the file and returns a build unit per configured primary contract.
    ///
    /// `config_file` is the configured input the compiler settings and the contracts are
    /// looked up by, which differs from `build_file` for instrumented copies.
    ///
    /// The chosen addresses are reset for every configured input. An instrumented copy keeps
    /// the addresses of the files it compiles unchanged.
    ///
    pub fn collect_for_file(
        &mut self,
        build_file: &str,
        config_file: &str,
        file_index: usize,
        fail_on_compilation_error: bool,
    ) -> Result<Vec<Sdc>, Error> {
        let lang = CompilerLang::from_path(Path::new(config_file));
        let contracts = self.config.contracts_of(config_file);
        let file_name = Self::file_name(build_file);
        let sdc_name = format!("{}_{}", file_name, file_index);

        let executable = self.config.compiler_for(config_file, lang);
        let version = self.compiler.version(executable.as_str())?;
        let collector = CompilerCollector::new(
            lang,
            executable,
            version,
            self.config.optimization_flags(config_file),
        );
        tracing::debug!(
            target: "solc",
            "compiling {} with {} {}",
            build_file,
            collector.executable,
            collector.version_string()
        );

        let settings = self.config.settings(config_file, lang)?;
        let input = SolcStandardJsonInput::try_from_path(lang, Path::new(build_file), settings)?;
        let output = self.compiler.standard_json(
            collector.executable.as_str(),
            &input,
            self.config.path.as_slice(),
        )?;
        self.save_output(sdc_name.as_str(), &output)?;
        Self::check_errors(&output, &collector, fail_on_compilation_error)?;

        let sources = output.sources.clone().unwrap_or_default();
        self.index.insert(build_file, &sources, lang)?;
        let source_lists = self.source_lists(sdc_name.as_str(), lang, &output)?;

        if build_file == config_file {
            self.address_book.clear();
        }
        let contracts_with_libraries = self.contracts_with_libraries(build_file, lang, &output)?;
        for (file, names) in contracts_with_libraries.iter() {
            for name in names.iter() {
                self.address_book
                    .assign(&mut self.addresses, file.as_str(), name.as_str());
            }
        }

        let report_source_file = sources
            .get(build_file)
            .and_then(|source| source_lists.report.get(&source.id))
            .cloned()
            .ok_or_else(|| {
                Error::internal(format!("No source ID of {} in the compiler output", build_file))
            })?;

        let mut contracts_in_sdc = Vec::new();
        for (file, names) in contracts_with_libraries.iter() {
            for name in names.iter() {
                let is_primary = file.as_str() == build_file && contracts.contains(name);
                contracts_in_sdc.push(self.contract_in_sdc(
                    build_file,
                    file.as_str(),
                    name.as_str(),
                    report_source_file.as_str(),
                    &collector,
                    &output,
                    is_primary,
                )?);
            }
        }

        let mut library_addresses: Vec<String> = Vec::with_capacity(self.library_addresses.len());
        for address in self.library_addresses.drain(..) {
            if !library_addresses.contains(&address) {
                library_addresses.push(address);
            }
        }

        let mut sdcs = Vec::with_capacity(contracts.len());
        for primary_contract in contracts.iter() {
            let primary_contract_address =
                self.address_book.find(build_file, primary_contract.as_str())?;
            sdcs.push(Sdc {
                primary_contract: primary_contract.to_owned(),
                primary_contract_address,
                sdc_origin_file: build_file.to_owned(),
                original_srclist: source_lists.original.clone(),
                report_srclist: source_lists.report.clone(),
                sdc_name: sdc_name.clone(),
                contracts: contracts_in_sdc.clone(),
                library_addresses: library_addresses.clone(),
                generated_with: self.config.generated_with(),
                state: BTreeMap::new(),
                struct_linking_info: BTreeMap::new(),
                legacy_struct_linking: BTreeMap::new(),
                prototypes: vec![],
                compiler_collector: collector.clone(),
            });
        }

        Ok(sdcs)
    }

    ///
    /// Saves the raw compiler output to the scratch directory.
    ///
    fn save_output(&mut self, sdc_name: &str, output: &SolcStandardJsonOutput) -> Result<(), Error> {
        std::fs::create_dir_all(self.config.config_dir.as_path())?;
        let path = self
            .config
            .config_dir
            .join(format!("{}.standard.json", sdc_name));
        File::create(path.as_path())?.write_all(serde_json::to_vec_pretty(output)?.as_slice())?;
        self.compiler_outputs.insert(path);
        Ok(())
    }

    ///
    /// Fails on compiler errors and severe warnings.
    ///
    fn check_errors(
        output: &SolcStandardJsonOutput,
        collector: &CompilerCollector,
        fail_on_compilation_error: bool,
    ) -> Result<(), Error> {
        if let Some(error) = output.first_error() {
            let message = format!("{} had an error:\n{}", collector.compiler_name(), error);
            return Err(if fail_on_compilation_error {
                Error::user_input(message)
            } else {
                Error::Compilation(message)
            });
        }

        let warnings = output.severe_warnings();
        if let Some((last, previous)) = warnings.split_last() {
            for warning in previous.iter() {
                tracing::error!(
                    target: "solc",
                    "Severe compiler warning:\n{}\nPlease fix this warning before running the Certora Prover",
                    warning
                );
            }
            return Err(Error::user_input(format!(
                "Severe compiler warning:\n{}\nPlease fix this warning before running the Certora Prover",
                last
            )));
        }

        Ok(())
    }

    ///
    /// Builds the source lists and copies every source to its report location.
    ///
    fn source_lists(
        &self,
        sdc_name: &str,
        lang: CompilerLang,
        output: &SolcStandardJsonOutput,
    ) -> Result<SourceLists, Error> {
        let mut source_lists = SourceLists::default();
        let directory = match lang {
            CompilerLang::Solidity => self.config.config_dir.join(sdc_name),
            CompilerLang::Vyper => self.config.config_dir.clone(),
        };
        std::fs::create_dir_all(directory.as_path())?;

        for (path, source) in output.sources.iter().flatten() {
            let new_name = format!("{}_{}", source.id, Self::file_name(path.as_str()));
            std::fs::copy(path.as_str(), directory.join(new_name.as_str())).map_err(|error| {
                Error::user_input(format!(
                    "Failed to copy the source {} to {:?}: {}",
                    path, directory, error
                ))
            })?;
            source_lists.original.insert(source.id, path.to_owned());
            source_lists
                .report
                .insert(source.id, format!("{}/{}", sdc_name, new_name));
        }

        Ok(source_lists)
    }

    ///
    /// Returns the contracts of the file and of every file its contracts depend on.
    ///
    /// The dependencies are the base contracts, the linked libraries and the libraries whose
    /// internal functions are called.
    ///
    fn contracts_with_libraries(
        &self,
        build_file: &str,
        lang: CompilerLang,
        output: &SolcStandardJsonOutput,
    ) -> Result<BTreeMap<String, Vec<String>>, Error> {
        let mut contracts_with_libraries = BTreeMap::new();
        let mut seen = BTreeSet::new();
        let mut worklist = vec![build_file.to_owned()];

        while let Some(file) = worklist.pop() {
            if !seen.insert(normalize_path(file.as_str())) {
                continue;
            }
            let names: Vec<String> = output
                .file_contracts(file.as_str())
                .map(|contracts| contracts.keys().cloned().collect())
                .unwrap_or_default();

            if lang == CompilerLang::Solidity {
                for name in names.iter() {
                    let mut base_contracts =
                        self.index
                            .base_contracts(build_file, file.as_str(), name.as_str())?;
                    base_contracts.sort_by(|left, right| left.file.cmp(&right.file));
                    worklist.extend(base_contracts.into_iter().map(|base| base.file));

                    if let Some(link_references) = output
                        .contract(file.as_str(), name.as_str())
                        .and_then(|contract| contract.evm.as_ref())
                        .and_then(|evm| evm.runtime_bytecode.as_ref())
                        .and_then(|bytecode| bytecode.link_references.as_ref())
                    {
                        worklist.extend(link_references.keys().cloned());
                    }

                    let mut libraries = self.index.libraries_referenced_with_internal_functions(
                        build_file,
                        file.as_str(),
                        name.as_str(),
                    );
                    libraries.sort();
                    libraries.dedup();
                    for library in libraries.into_iter() {
                        let files: BTreeMap<String, String> = output
                            .contracts
                            .iter()
                            .flatten()
                            .filter(|(_, contracts)| contracts.contains_key(library.as_str()))
                            .map(|(file, _)| (normalize_path(file.as_str()), file.to_owned()))
                            .collect();
                        if files.len() == 1 {
                            worklist.extend(files.into_values());
                        } else {
                            tracing::debug!(
                                target: "build_conf",
                                "skipping the internally called library {} declared in {} files",
                                library,
                                files.len()
                            );
                        }
                    }
                }
            }

            contracts_with_libraries.insert(file, names);
        }

        Ok(contracts_with_libraries)
    }

    ///
    /// Builds the contract record.
    ///
    #[allow(clippy::too_many_arguments)]
    fn contract_in_sdc(
        &mut self,
        build_file: &str,
        compiled_file: &str,
        name: &str,
        report_source_file: &str,
        collector: &CompilerCollector,
        output: &SolcStandardJsonOutput,
        is_primary: bool,
    ) -> Result<ContractInSdc, Error> {
        let lang = collector.lang;
        let contract = output.contract(compiled_file, name).ok_or_else(|| {
            Error::internal(format!("No contract {} in the output of {}", name, compiled_file))
        })?;
        tracing::debug!(target: "build_conf", "collecting contract {} of {}", name, compiled_file);

        let types = match lang {
            CompilerLang::Solidity => Declarations::new(&self.index, build_file)
                .source_types(compiled_file, name, lang)?,
            CompilerLang::Vyper => vec![],
        };
        let functions = FunctionCatalog::new(&self.index, build_file, lang, contract, types.as_slice())
            .collect(compiled_file, name)?;
        let (methods, public_funcs, internal_funcs) = Self::split_functions(functions);

        let source_bytes = self
            .index
            .contract_def_node(build_file, compiled_file, name)
            .ok()
            .and_then(|node| node.src());

        let evm = contract.evm.clone().unwrap_or_default();
        let deployed = evm.runtime_bytecode.unwrap_or_default();
        let constructor = evm.deploy_bytecode.unwrap_or_default();

        let bytecode = self.link_bytecode(&deployed)?;
        if bytecode.is_empty() {
            if is_primary {
                return Err(Error::user_input(format!(
                    "Contract {} has no deployed bytecode. It may be an abstract contract or an interface.",
                    name
                )));
            }
            tracing::warn!(target: "build_conf", "Contract {} has no deployed bytecode", name);
        }
        let constructor_bytecode = self.link_bytecode(&constructor)?;
        if constructor_bytecode.is_empty() {
            tracing::warn!(target: "build_conf", "Contract {} has no constructor bytecode", name);
        }

        let mut immutables = Vec::new();
        for (id, references) in deployed.immutable_references.iter().flatten() {
            let varname = id
                .parse::<i64>()
                .ok()
                .and_then(|id| self.index.get_node_by_id(build_file, id))
                .and_then(|node| node.name())
                .ok_or_else(|| {
                    Error::internal(format!(
                        "No declaration {} of an immutable of {} in the AST",
                        id, name
                    ))
                })?;
            for reference in references.iter() {
                immutables.push(ImmutableReference::new(
                    reference.start,
                    reference.length,
                    varname.to_owned(),
                ));
            }
        }

        Ok(ContractInSdc {
            name: name.to_owned(),
            original_file: compiled_file.to_owned(),
            lang,
            report_source_file: report_source_file.to_owned(),
            address: self.address_book.find(compiled_file, name)?,
            methods,
            bytecode: lang.normalize_deployed_bytecode(bytecode),
            constructor_bytecode: lang.normalize_deployed_bytecode(constructor_bytecode),
            srcmap: deployed.source_map_string(),
            varmap: String::new(),
            constructor_srcmap: constructor.source_map_string(),
            storage_layout: contract.storage_layout.clone(),
            immutables,
            function_finders: self
                .function_finders
                .get(name)
                .cloned()
                .unwrap_or_default(),
            all_funcs: vec![],
            types,
            compiler_name: collector.compiler_name().to_owned(),
            compiler_version: collector.version_string(),
            optimization_flags: collector.optimization_flags.clone(),
            internal_funcs,
            public_funcs,
            source_bytes,
        })
    }

    ///
    /// Links the bytecode, remembering the library addresses.
    ///
    fn link_bytecode(&mut self, bytecode: &Bytecode) -> Result<String, Error> {
        let no_references = LinkReferences::new();
        let address_book = &self.address_book;
        let linked = linker::link(
            bytecode.object.as_str(),
            bytecode.link_references.as_ref().unwrap_or(&no_references),
            |file, contract| address_book.find(file, contract),
        )?;
        self.library_addresses.extend(linked.library_addresses);
        Ok(linked.bytecode)
    }

    ///
    /// Splits the functions into the methods, the public and the internal ones.
    ///
    fn split_functions(functions: Vec<Func>) -> (Vec<Func>, Vec<Func>, Vec<Func>) {
        let methods = functions
            .iter()
            .filter(|function| function.visibility.is_external())
            .cloned()
            .collect();
        let public = functions
            .iter()
            .filter(|function| function.visibility == Visibility::Public)
            .cloned()
            .collect();
        let internal = functions
            .into_iter()
            .filter(|function| function.visibility.is_internal())
            .collect();
        (methods, public, internal)
    }

    ///
    /// The file name of the path.
    ///
    fn file_name(path: &str) -> String {
        Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_owned())
    }
}
