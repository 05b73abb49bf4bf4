//!
//! The `solc --standard-json` input settings.
//!

pub mod optimizer;

use serde::Deserialize;
use serde::Serialize;

use crate::compiler_lang::CompilerLang;

use self::optimizer::Optimizer;

///
/// The `solc --standard-json` input settings.
///
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// The import remappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remappings: Option<Vec<String>>,
    /// The output selection filters.
    pub output_selection: serde_json::Value,
    /// The target EVM version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
    /// The optimizer settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<Optimizer>,
    /// Whether to compile via the Yul IR.
    #[serde(rename = "viaIR", default, skip_serializing_if = "Option::is_none")]
    pub via_ir: Option<bool>,
}

impl Settings {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(
        language: CompilerLang,
        remappings: Vec<String>,
        evm_version: Option<String>,
        optimizer: Option<Optimizer>,
        via_ir: bool,
    ) -> Self {
        Self {
            remappings: if remappings.is_empty() {
                None
            } else {
                Some(remappings)
            },
            output_selection: language.output_selection(),
            evm_version,
            optimizer,
            via_ir: if via_ir { Some(true) } else { None },
        }
    }

    ///
    /// Parses the settings from the extra compiler command line arguments.
    ///
    /// Only `--evm-version`, `--optimize`, `--optimize-runs` and `--via-ir` are recognized.
    ///
    pub fn try_from_arguments(
        language: CompilerLang,
        remappings: Vec<String>,
        arguments: &[String],
    ) -> anyhow::Result<Self> {
        let mut evm_version = None;
        let mut optimize = false;
        let mut runs = None;
        let mut via_ir = false;

        let mut iterator = arguments.iter();
        while let Some(argument) = iterator.next() {
            let (flag, inline_value) = match argument.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_owned())),
                None => (argument.as_str(), None),
            };
            match flag {
                "--evm-version" => {
                    evm_version = Some(Self::value_of(flag, inline_value, &mut iterator)?);
                }
                "--optimize" => optimize = true,
                "--optimize-runs" => {
                    let value = Self::value_of(flag, inline_value, &mut iterator)?;
                    let value = value.parse::<u64>().map_err(|error| {
                        anyhow::anyhow!("Invalid `--optimize-runs` value `{}`: {}", value, error)
                    })?;
                    optimize = true;
                    runs = Some(value);
                }
                "--via-ir" => via_ir = true,
                _ => {}
            }
        }

        let optimizer = if optimize {
            Some(Optimizer::new(runs))
        } else {
            None
        };
        Ok(Self::new(
            language,
            remappings,
            evm_version,
            optimizer,
            via_ir,
        ))
    }

    fn value_of<'a, I>(
        flag: &str,
        inline_value: Option<String>,
        iterator: &mut I,
    ) -> anyhow::Result<String>
    where
        I: Iterator<Item = &'a String>,
    {
        match inline_value {
            Some(value) => Ok(value),
            None => iterator
                .next()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("The `{}` flag requires a value", flag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler_lang::CompilerLang;
    use crate::solc::standard_json::input::settings::optimizer::Optimizer;
    use crate::solc::standard_json::input::settings::Settings;

    #[test]
    fn parses_compiler_arguments() {
        let arguments = shell_words::split("--optimize-runs 200 --evm-version=london --via-ir")
            .expect("Always valid");
        let settings =
            Settings::try_from_arguments(CompilerLang::Solidity, vec![], arguments.as_slice())
                .expect("Always valid");

        assert_eq!(settings.optimizer, Some(Optimizer::new(Some(200))));
        assert_eq!(settings.evm_version.as_deref(), Some("london"));
        assert_eq!(settings.via_ir, Some(true));
        assert!(settings.remappings.is_none());
    }

    #[test]
    fn error_missing_flag_value() {
        let arguments = vec!["--optimize-runs".to_owned()];
        let result =
            Settings::try_from_arguments(CompilerLang::Solidity, vec![], arguments.as_slice());
        assert!(result.is_err());
    }
}
