//!
//! The `solc --standard-json` input representation.
//!

pub mod settings;
pub mod source;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::compiler_lang::CompilerLang;

use self::settings::Settings;
use self::source::Source;

///
/// The `solc --standard-json` input representation.
///
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// The input language.
    pub language: CompilerLang,
    /// The input source code files hashmap.
    pub sources: BTreeMap<String, Source>,
    /// The compiler settings.
    pub settings: Settings,
}

impl Input {
    ///
    /// A shortcut constructor.
    ///
    /// Solidity sources are referenced by their absolute path, while Vyper ones are inlined.
    ///
    pub fn try_from_path(
        language: CompilerLang,
        path: &Path,
        settings: Settings,
    ) -> anyhow::Result<Self> {
        let path_string = path.to_string_lossy().to_string();
        let source = match language {
            CompilerLang::Solidity => Source::from_url(path_string.clone()),
            CompilerLang::Vyper => Source::try_from(path)?,
        };

        let mut sources = BTreeMap::new();
        sources.insert(path_string, source);

        Ok(Self {
            language,
            sources,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::compiler_lang::CompilerLang;
    use crate::solc::standard_json::input::settings::Settings;
    use crate::solc::standard_json::input::Input;

    #[test]
    fn solidity_source_is_referenced_by_url() {
        let settings = Settings::new(
            CompilerLang::Solidity,
            vec!["@oz=/deps/oz".to_owned()],
            None,
            None,
            false,
        );
        let input = Input::try_from_path(
            CompilerLang::Solidity,
            Path::new("/project/Token.sol"),
            settings,
        )
        .expect("Always valid");
        let json = serde_json::to_value(&input).expect("Always valid");

        assert_eq!(json["language"], "Solidity");
        assert_eq!(
            json["sources"]["/project/Token.sol"]["urls"][0],
            "/project/Token.sol"
        );
        assert_eq!(json["settings"]["remappings"][0], "@oz=/deps/oz");
        assert_eq!(
            json["settings"]["outputSelection"]["*"][""],
            serde_json::json!(["id", "ast"])
        );
        assert!(json["settings"].get("viaIR").is_none());
    }
}
