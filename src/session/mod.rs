//!
//! The build session.
//!

pub mod auto_finders;
pub mod collect;
pub mod counter;
pub mod links;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use crate::ast::AstIndex;
use crate::build::address::AddressGenerator;
use crate::build::contract::ContractInSdc;
use crate::build::sdc::Sdc;
use crate::build::Build;
use crate::compiler_lang::CompilerLang;
use crate::config::BuildConfig;
use crate::error::Error;
use crate::function::suggest::verify_method;
use crate::function::Func;
use crate::linker::address_book::AddressBook;
use crate::solc::Compiler;

use self::counter::Counter;

///
/// The build session.
///
/// Owns all state accumulated over the input files of one build: the AST index, the build
/// units, the assigned addresses and the finder IDs. Files are processed sequentially, since
/// later files may link against the contracts of earlier ones.
///
pub struct BuildSession<'a> {
    /// The build configuration.
    config: &'a BuildConfig,
    /// The compiler collaborator.
    compiler: &'a dyn Compiler,
    /// The AST index.
    index: AstIndex,
    /// The build model.
    build: Build,
    /// The address generator.
    addresses: AddressGenerator,
    /// The assigned addresses.
    address_book: AddressBook<'a>,
    /// The library addresses linked into the contracts of the current file.
    library_addresses: Vec<String>,
    /// The internal function finder IDs.
    finder_ids: Counter,
    /// The preset function finders by contract name.
    function_finders: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    /// Whether the auto-finder instrumentation failed for any file.
    auto_finders_failed: bool,
    /// The generated instrumented sources.
    generated_files: BTreeSet<PathBuf>,
    /// The saved compiler outputs.
    compiler_outputs: BTreeSet<PathBuf>,
}

impl<'a> BuildSession<'a> {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(config: &'a BuildConfig, compiler: &'a dyn Compiler) -> Self {
        Self {
            config,
            compiler,
            index: AstIndex::default(),
            build: Build::default(),
            addresses: AddressGenerator::default(),
            address_book: AddressBook::new(&config.address),
            library_addresses: Vec::new(),
            finder_ids: Counter::default(),
            function_finders: BTreeMap::new(),
            auto_finders_failed: false,
            generated_files: BTreeSet::new(),
            compiler_outputs: BTreeSet::new(),
        }
    }

    ///
    /// Builds all input files and removes the generated files.
    ///
    pub fn run(&mut self) -> Result<(), Error> {
        let result = self.build_all();
        self.cleanup();
        result?;

        if self.auto_finders_failed && self.config.assert_autofinder_success {
            return Err(Error::Compilation(
                "Failed to generate the internal function finders".to_owned(),
            ));
        }
        Ok(())
    }

    ///
    /// The build model.
    ///
    pub fn build(&self) -> &Build {
        &self.build
    }

    ///
    /// Consumes the session and returns the build model.
    ///
    pub fn into_build(self) -> Build {
        self.build
    }

    ///
    /// Whether the auto-finder instrumentation failed for any file.
    ///
    pub fn auto_finders_failed(&self) -> bool {
        self.auto_finders_failed
    }

    ///
    /// Builds all input files in order, then applies the link directives.
    ///
    fn build_all(&mut self) -> Result<(), Error> {
        self.function_finders = self.config.function_finders()?;
        let prototypes = self.config.prototypes()?;
        let verified_contract = self.config.verified_contract();

        let mut files = self.config.files.clone();
        files.sort();
        for (file_index, file) in files.iter().enumerate() {
            tracing::debug!(target: "build_conf", "building file {}", file);
            let contracts = self.config.contracts_of(file.as_str());
            let sdcs = self.collect_for_file(file.as_str(), file.as_str(), file_index, true)?;

            if let (Some(method), Some(verified_contract)) =
                (self.config.method.as_deref(), verified_contract.as_ref())
            {
                if contracts.contains(verified_contract) {
                    if let Some(sdc) = sdcs
                        .iter()
                        .find(|sdc| &sdc.primary_contract == verified_contract)
                    {
                        verify_method(
                            method,
                            sdc.contracts.iter().flat_map(|contract| contract.methods.iter()),
                            sdc.contracts
                                .iter()
                                .flat_map(|contract| contract.internal_funcs.iter()),
                        )?;
                    }
                }
            }

            let units = match CompilerLang::from_path(Path::new(file.as_str())) {
                CompilerLang::Solidity => {
                    self.instrument_auto_finders(file.as_str(), file_index, sdcs)?
                }
                CompilerLang::Vyper => sdcs
                    .into_iter()
                    .map(|sdc| (BTreeMap::new(), sdc))
                    .collect(),
            };
            for (finders, sdc) in units.into_iter() {
                let prototypes = prototypes
                    .get(sdc.primary_contract.as_str())
                    .cloned()
                    .unwrap_or_default();
                self.add_sdc(sdc, &finders, prototypes)?;
            }
        }

        self.handle_links()?;
        self.handle_struct_links()?;
        Ok(())
    }

    ///
    /// Adds the unit to the build, splitting out its libraries.
    ///
    fn add_sdc(
        &mut self,
        mut sdc: Sdc,
        finders: &BTreeMap<String, Func>,
        prototypes: Vec<String>,
    ) -> Result<(), Error> {
        let mut finder_values = BTreeMap::new();
        for (symbol, function) in finders.iter() {
            finder_values.insert(symbol.to_owned(), serde_json::to_value(function)?);
        }
        for contract in sdc.contracts.iter_mut() {
            contract
                .function_finders
                .extend(finder_values.iter().map(|(symbol, value)| (symbol.clone(), value.clone())));
        }

        let all_functions: Vec<Func> = sdc
            .contracts
            .iter()
            .flat_map(|contract| contract.methods.iter().cloned())
            .collect();
        sdc.prototypes = prototypes;

        for address in sdc.library_addresses.iter() {
            let libraries: Vec<&ContractInSdc> = sdc
                .contracts
                .iter()
                .filter(|contract| &contract.address == address)
                .collect();
            if libraries.len() != 1 {
                return Err(Error::internal(format!(
                    "Expected exactly one library at address {} in {}, found {}",
                    address,
                    sdc.sdc_name,
                    libraries.len()
                )));
            }
            let library = sdc.split_library(libraries[0]);
            self.build.insert(library);
        }

        let primary_contract = sdc.primary_contract.clone();
        sdc.contracts
            .retain(|contract| contract.name == primary_contract);
        if sdc.contracts.len() != 1 {
            return Err(Error::internal(format!(
                "Expected exactly one primary contract {} in {}, found {}",
                primary_contract,
                sdc.sdc_name,
                sdc.contracts.len()
            )));
        }

        let mut unique_functions: Vec<Func> = Vec::with_capacity(all_functions.len());
        for function in all_functions.into_iter() {
            if !unique_functions
                .iter()
                .any(|unique| unique.same_internal_signature_as(&function))
            {
                unique_functions.push(function);
            }
        }
        unique_functions.sort();
        sdc.contracts[0].all_funcs = unique_functions;

        self.build.insert(sdc);
        Ok(())
    }

    ///
    /// Removes the generated sources and the saved compiler outputs, unless debugging.
    ///
    fn cleanup(&mut self) {
        if self.config.debug {
            return;
        }
        for path in self
            .generated_files
            .iter()
            .chain(self.compiler_outputs.iter())
        {
            if let Err(error) = std::fs::remove_file(path) {
                tracing::warn!(target: "build_conf", "Failed to remove {:?}: {}", path, error);
            }
        }
        self.generated_files.clear();
        self.compiler_outputs.clear();
    }
}
