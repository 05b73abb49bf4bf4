//!
//! The build configuration.
//!

pub mod link;

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::compiler_lang::CompilerLang;
use crate::error::Error;
use crate::solc::standard_json::input::settings::optimizer::Optimizer;
use crate::solc::standard_json::input::settings::Settings;

use self::link::LinkDirective;

///
/// The build configuration.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// The input source files.
    pub files: Vec<String>,
    /// The contracts to build from each file.
    pub file_to_contract: BTreeMap<String, Vec<String>>,
    /// The file declaring each contract.
    pub contract_to_file: BTreeMap<String, String>,
    /// The default compiler executable.
    pub solc: Option<String>,
    /// The compiler executable by file or contract name.
    pub solc_map: BTreeMap<String, String>,
    /// The extra compiler arguments.
    pub solc_args: Option<String>,
    /// The optimizer runs by contract name.
    pub optimize_map: BTreeMap<String, u64>,
    /// The import remappings, written as `prefix=path`.
    pub packages: Vec<String>,
    /// The paths the compiler may read sources from.
    pub path: Vec<String>,
    /// The manual link directives.
    pub link: Vec<String>,
    /// The manual struct link directives.
    pub struct_link: Vec<String>,
    /// The address overrides by contract name.
    pub address: BTreeMap<String, String>,
    /// The JSON file with preset function finders by contract name.
    pub function_finders: Option<PathBuf>,
    /// The prototype declarations, written as `signature=Contract`.
    pub prototype: Vec<String>,
    /// The verified method signature.
    pub method: Option<String>,
    /// The verified contract and its property file, written as `Contract:file`.
    pub verify: Option<String>,
    /// The contracts with asserted properties.
    pub assert_contracts: Vec<String>,
    /// Whether to compile via the Yul IR.
    pub via_ir: bool,
    /// The EVM version.
    pub evm_version: Option<String>,
    /// The optimizer runs for all contracts.
    pub optimize: Option<u64>,
    /// Whether to keep the generated files.
    pub debug: bool,
    /// Whether a failed auto-finder instrumentation fails the build.
    pub assert_autofinder_success: bool,
    /// The scratch directory.
    pub config_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            files: vec![],
            file_to_contract: BTreeMap::new(),
            contract_to_file: BTreeMap::new(),
            solc: None,
            solc_map: BTreeMap::new(),
            solc_args: None,
            optimize_map: BTreeMap::new(),
            packages: vec![],
            path: vec![],
            link: vec![],
            struct_link: vec![],
            address: BTreeMap::new(),
            function_finders: None,
            prototype: vec![],
            method: None,
            verify: None,
            assert_contracts: vec![],
            via_ir: false,
            evm_version: None,
            optimize: None,
            debug: false,
            assert_autofinder_success: false,
            config_dir: PathBuf::from(Self::DEFAULT_CONFIG_DIR),
        }
    }
}

impl BuildConfig {
    /// The default scratch directory.
    pub const DEFAULT_CONFIG_DIR: &'static str = ".certora_config";

    ///
    /// Loads the configuration from a JSON file.
    ///
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|error| anyhow::anyhow!("File {:?} reading error: {}", path, error))?;
        serde_json::from_str(text.as_str())
            .map_err(|error| anyhow::anyhow!("File {:?} parsing error: {}", path, error))
    }

    ///
    /// Returns the contracts to build from the file, defaulting to the one named after it.
    ///
    pub fn contracts_of(&self, file: &str) -> Vec<String> {
        match self.file_to_contract.get(file) {
            Some(contracts) if !contracts.is_empty() => contracts.to_owned(),
            _ => Path::new(file)
                .file_stem()
                .map(|stem| vec![stem.to_string_lossy().to_string()])
                .unwrap_or_default(),
        }
    }

    ///
    /// Returns the compiler executable for the file.
    ///
    /// The per-file entry wins over the per-contract ones, which win over the default.
    ///
    pub fn compiler_for(&self, file: &str, lang: CompilerLang) -> String {
        if let Some(executable) = self.solc_map.get(file) {
            return executable.to_owned();
        }
        if let Some(executable) = self
            .contracts_of(file)
            .iter()
            .find_map(|contract| self.solc_map.get(contract))
        {
            return executable.to_owned();
        }
        match (lang, self.solc.as_ref()) {
            (CompilerLang::Solidity, Some(executable)) => executable.to_owned(),
            (lang, _) => lang.default_executable().to_owned(),
        }
    }

    ///
    /// Returns the extra compiler arguments.
    ///
    pub fn extra_arguments(&self) -> anyhow::Result<Vec<String>> {
        match self.solc_args.as_deref() {
            Some(arguments) => shell_words::split(arguments)
                .map_err(|error| anyhow::anyhow!("Compiler arguments `{}` parsing error: {}", arguments, error)),
            None => Ok(vec![]),
        }
    }

    ///
    /// Returns the import remappings.
    ///
    pub fn remappings(&self) -> Vec<String> {
        self.packages.to_owned()
    }

    ///
    /// Returns the optimizer runs for the file, if optimization is requested.
    ///
    pub fn optimize_runs(&self, file: &str) -> Option<u64> {
        self.contracts_of(file)
            .iter()
            .find_map(|contract| self.optimize_map.get(contract).copied())
            .or(self.optimize)
    }

    ///
    /// Returns the standard-json settings for the file.
    ///
    /// The explicit configuration wins over the extra compiler arguments.
    ///
    pub fn settings(&self, file: &str, lang: CompilerLang) -> anyhow::Result<Settings> {
        let mut settings =
            Settings::try_from_arguments(lang, self.remappings(), self.extra_arguments()?.as_slice())?;
        if let Some(runs) = self.optimize_runs(file) {
            settings.optimizer = Some(Optimizer::new(Some(runs)));
        }
        if let Some(evm_version) = self.evm_version.as_ref() {
            settings.evm_version = Some(evm_version.to_owned());
        }
        if self.via_ir {
            settings.via_ir = Some(true);
        }
        Ok(settings)
    }

    ///
    /// Returns the optimization flags the file is compiled with, as written on the command line.
    ///
    pub fn optimization_flags(&self, file: &str) -> String {
        let mut flags = Vec::new();
        if let Some(runs) = self.optimize_runs(file) {
            flags.push(format!("--optimize --optimize-runs {}", runs));
        } else if let Some(arguments) = self.solc_args.as_deref() {
            flags.push(arguments.to_owned());
        }
        if self.via_ir {
            flags.push("--via-ir".to_owned());
        }
        flags.join(" ")
    }

    ///
    /// Returns the parsed link directives.
    ///
    pub fn links(&self) -> Result<Vec<LinkDirective>, Error> {
        self.link.iter().map(|link| link.parse()).collect()
    }

    ///
    /// Returns the parsed struct link directives.
    ///
    pub fn struct_links(&self) -> Result<Vec<LinkDirective>, Error> {
        self.struct_link.iter().map(|link| link.parse()).collect()
    }

    ///
    /// Returns the prototype signatures by contract name.
    ///
    pub fn prototypes(&self) -> Result<BTreeMap<String, Vec<String>>, Error> {
        let mut prototypes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for prototype in self.prototype.iter() {
            let (signature, contract) = prototype.rsplit_once('=').ok_or_else(|| {
                Error::user_input(format!(
                    "Prototype {} should be of the form signature=Contract",
                    prototype
                ))
            })?;
            prototypes
                .entry(contract.trim().to_owned())
                .or_default()
                .push(signature.trim().to_owned());
        }
        Ok(prototypes)
    }

    ///
    /// Returns the contract whose method is verified.
    ///
    pub fn verified_contract(&self) -> Option<String> {
        match self.verify.as_deref() {
            Some(verify) => verify
                .split_once(':')
                .map(|(contract, _)| contract)
                .or(Some(verify))
                .map(str::to_owned),
            None => self.assert_contracts.first().cloned(),
        }
    }

    ///
    /// Loads the preset function finders by contract name.
    ///
    pub fn function_finders(
        &self,
    ) -> Result<BTreeMap<String, BTreeMap<String, serde_json::Value>>, Error> {
        let path = match self.function_finders.as_ref() {
            Some(path) => path,
            None => return Ok(BTreeMap::new()),
        };
        let text = std::fs::read_to_string(path).map_err(|error| {
            Error::user_input(format!("Function finders file {:?} reading error: {}", path, error))
        })?;
        Ok(serde_json::from_str(text.as_str())?)
    }

    ///
    /// The configuration recorded in every build unit.
    ///
    pub fn generated_with(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler_lang::CompilerLang;

    use super::BuildConfig;

    const CONFIG: &str = r#"{
    "files": ["/project/Vault.sol", "/project/Pool.vy"],
    "fileToContract": { "/project/Vault.sol": ["Vault", "VaultLib"] },
    "solc": "solc8.17",
    "solcMap": { "VaultLib": "solc8.10" },
    "solcArgs": "--optimize-runs 200 --evm-version london",
    "optimizeMap": { "Vault": 1000 },
    "link": ["Vault:token=Token"],
    "prototype": ["6080=Vault"],
    "verify": "Vault:spec/Vault.spec"
}"#;

    fn config() -> BuildConfig {
        serde_json::from_str(CONFIG).expect("Always valid")
    }

    #[test]
    fn defaults() {
        let config: BuildConfig = serde_json::from_str("{}").expect("Always valid");
        assert_eq!(config.config_dir.to_string_lossy(), BuildConfig::DEFAULT_CONFIG_DIR);
        assert!(!config.debug);
    }

    #[test]
    fn compiler_selection() {
        let config = config();
        assert_eq!(config.compiler_for("/project/Vault.sol", CompilerLang::Solidity), "solc8.10");
        assert_eq!(config.compiler_for("/project/Other.sol", CompilerLang::Solidity), "solc8.17");
        assert_eq!(config.compiler_for("/project/Pool.vy", CompilerLang::Vyper), "vyper");
    }

    #[test]
    fn settings_prefer_configuration() {
        let config = config();
        let settings = config
            .settings("/project/Vault.sol", CompilerLang::Solidity)
            .expect("Always valid");
        assert_eq!(settings.evm_version.as_deref(), Some("london"));
        assert_eq!(settings.optimizer.and_then(|optimizer| optimizer.runs), Some(1000));
        assert_eq!(
            config.optimization_flags("/project/Vault.sol"),
            "--optimize --optimize-runs 1000"
        );
        assert_eq!(
            config.optimization_flags("/project/Other.sol"),
            "--optimize-runs 200 --evm-version london"
        );
    }

    #[test]
    fn directives() {
        let config = config();
        assert_eq!(config.links().expect("Always valid").len(), 1);
        assert_eq!(
            config.prototypes().expect("Always valid")["Vault"],
            vec!["6080".to_owned()]
        );
        assert_eq!(config.verified_contract().as_deref(), Some("Vault"));
        assert_eq!(config.contracts_of("/project/Other.sol"), vec!["Other".to_owned()]);
    }
}
