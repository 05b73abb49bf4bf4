//!
//! The manual link directives.
//!

use std::path::Path;

use crate::compiler_lang::CompilerLang;
use crate::error::Error;
use crate::slot;
use crate::slot::SlotResolver;

use super::BuildSession;

impl<'a> BuildSession<'a> {
    ///
    /// Applies the link directives to the state maps and the immutables.
    ///
    pub fn handle_links(&mut self) -> Result<(), Error> {
        for directive in self.config.links()?.into_iter() {
            let key = self.unique_sdc_key(directive.contract.as_str())?;
            let destination = self.destination_address(directive.destination.as_str(), true);

            let holders: Vec<usize> = self.build.sdcs[key.as_str()]
                .contracts
                .iter()
                .enumerate()
                .filter(|(_, contract)| {
                    contract.name == directive.contract
                        && contract
                            .immutables
                            .iter()
                            .any(|immutable| immutable.varname == directive.reference)
                })
                .map(|(index, _)| index)
                .collect();
            if holders.len() > 1 {
                return Err(Error::internal(format!(
                    "Not expecting to find multiple immutables with the name {}, got matches {:?}",
                    directive.reference, holders
                )));
            }
            if let Some(holder) = holders.first() {
                tracing::debug!(target: "build_conf", "linking immutable {} to {}", directive, destination);
                if let Some(sdc) = self.build.sdcs.get_mut(key.as_str()) {
                    let contract = &mut sdc.contracts[*holder];
                    contract.immutables = std::mem::take(&mut contract.immutables)
                        .into_iter()
                        .map(|immutable| {
                            if immutable.varname == directive.reference {
                                immutable.preset(destination.clone())
                            } else {
                                immutable
                            }
                        })
                        .collect();
                }
                continue;
            }

            let reference = directive.reference.as_str();
            let slot = if !slot::is_decimal(reference) && !slot::is_hex(reference) {
                self.resolve_slot(key.as_str(), directive.contract.as_str(), reference)?
            } else {
                slot::normalize_slot(reference).ok_or_else(|| {
                    Error::user_input(format!("Invalid slot {} in link {}", reference, directive))
                })?
            };
            tracing::debug!(target: "build_conf", "linking slot {} of {} to {}", slot, directive.contract, destination);
            if let Some(sdc) = self.build.sdcs.get_mut(key.as_str()) {
                sdc.state.insert(slot, destination);
            }
        }
        Ok(())
    }

    ///
    /// Applies the struct link directives.
    ///
    pub fn handle_struct_links(&mut self) -> Result<(), Error> {
        for directive in self.config.struct_links()?.into_iter() {
            let key = self.unique_sdc_key(directive.contract.as_str())?;
            let destination = self.destination_address(directive.destination.as_str(), false);
            let reference = directive.reference.as_str();

            let sdc = match self.build.sdcs.get_mut(key.as_str()) {
                Some(sdc) => sdc,
                None => continue,
            };
            if !slot::is_decimal(reference) && !slot::is_hex(reference) {
                sdc.struct_linking_info
                    .insert(reference.to_owned(), destination);
            } else {
                let slot = slot::normalize_slot(reference).ok_or_else(|| {
                    Error::user_input(format!("Invalid slot {} in struct link {}", reference, directive))
                })?;
                sdc.legacy_struct_linking.insert(slot, destination);
            }
        }
        Ok(())
    }

    ///
    /// Resolves the storage slot of the state variable of the contract.
    ///
    /// Falls back to the assembly listing if the storage layout is not available.
    ///
    pub fn resolve_slot(&self, key: &str, contract: &str, name: &str) -> Result<String, Error> {
        let sdc = self.build.sdcs.get(key).ok_or_else(|| {
            Error::user_input(format!("No contract to link to with the name {}", contract))
        })?;
        let resolver = SlotResolver::new(contract, name);

        let layouts: Vec<&serde_json::Value> = sdc
            .contracts
            .iter()
            .filter(|record| record.name == contract)
            .filter_map(|record| record.storage_layout.as_ref())
            .collect();
        if let [layout] = layouts.as_slice() {
            if let Some(slot) = resolver.from_storage_layout(layout)? {
                return Ok(slot);
            }
        } else {
            tracing::debug!(target: "build_conf", "no storage layout of {}, falling back to the assembly", contract);
        }

        let origin_file = sdc.sdc_origin_file.as_str();
        let config_file = self
            .config
            .contract_to_file
            .get(contract)
            .map(String::as_str)
            .unwrap_or(origin_file);
        let executable = self
            .config
            .compiler_for(config_file, CompilerLang::from_path(Path::new(config_file)));
        let mut arguments = self.config.remappings();
        arguments.extend(self.config.extra_arguments()?);
        let assembly = self.compiler.assembly(
            executable.as_str(),
            Path::new(origin_file),
            arguments.as_slice(),
            self.config.path.as_slice(),
        )?;
        resolver.from_assembly(assembly.as_str())
    }

    ///
    /// Returns the key of the only unit of the contract.
    ///
    fn unique_sdc_key(&self, contract: &str) -> Result<String, Error> {
        let mut keys = self.build.matching_keys(contract);
        match keys.len() {
            0 => Err(Error::user_input(format!(
                "No contract to link to with the name {}",
                contract
            ))),
            1 => Ok(keys.remove(0)),
            _ => Err(Error::internal(format!(
                "Cannot link to {}, found multiple matching build units: {}",
                contract,
                keys.join(", ")
            ))),
        }
    }

    ///
    /// Returns the address of the destination contract, or the destination value itself.
    ///
    fn destination_address(&self, destination: &str, normalize_hex: bool) -> String {
        if let Some(address) = self.build.primary_address_of(destination) {
            return address;
        }
        if normalize_hex && slot::is_hex(destination) {
            if let Some(normalized) = slot::normalize_slot(destination) {
                return normalized;
            }
        }
        destination.to_owned()
    }
}
