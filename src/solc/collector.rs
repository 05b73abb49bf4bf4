//!
//! The compiler attributes of a build unit.
//!

use crate::compiler_lang::CompilerLang;

///
/// The compiler attributes of a build unit.
///
/// Answers the version-dependent questions of the source instrumentation.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCollector {
    /// The source language.
    pub lang: CompilerLang,
    /// The compiler executable.
    pub executable: String,
    /// The compiler version.
    pub version: semver::Version,
    /// The optimization flags passed to the compiler.
    pub optimization_flags: String,
}

impl CompilerCollector {
    /// The first solc version allowing `x.offset` and `x.length` of calldata arguments in assembly.
    pub const CALLDATA_ASSEMBLY_VERSION: semver::Version = semver::Version::new(0, 7, 5);

    /// The first solc version with the `x.slot` storage pointer suffix.
    pub const DOT_SLOT_VERSION: semver::Version = semver::Version::new(0, 7, 0);

    ///
    /// A shortcut constructor.
    ///
    pub fn new(
        lang: CompilerLang,
        executable: String,
        version: semver::Version,
        optimization_flags: String,
    ) -> Self {
        Self {
            lang,
            executable,
            version,
            optimization_flags,
        }
    }

    ///
    /// The compiler name.
    ///
    pub fn compiler_name(&self) -> &'static str {
        self.lang.compiler_name()
    }

    ///
    /// The compiler version formatted as `major.minor.patch`.
    ///
    pub fn version_string(&self) -> String {
        format!(
            "{}.{}.{}",
            self.version.major, self.version.minor, self.version.patch
        )
    }

    ///
    /// Whether a calldata argument with the given name may be accessed in inline assembly.
    ///
    pub fn supports_calldata_assembly(&self, name: &str) -> bool {
        !name.is_empty() && self.version >= Self::CALLDATA_ASSEMBLY_VERSION
    }

    ///
    /// Returns the inline assembly expression for the argument value.
    ///
    pub fn normalize_storage(&self, is_storage: bool, name: &str) -> String {
        if !is_storage {
            name.to_owned()
        } else if self.version >= Self::DOT_SLOT_VERSION {
            format!("{}.slot", name)
        } else {
            format!("{}_slot", name)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler_lang::CompilerLang;
    use crate::solc::collector::CompilerCollector;

    fn collector(minor: u64, patch: u64) -> CompilerCollector {
        CompilerCollector::new(
            CompilerLang::Solidity,
            "solc".to_owned(),
            semver::Version::new(0, minor, patch),
            String::new(),
        )
    }

    #[test]
    fn storage_pointer_suffix_depends_on_version() {
        assert_eq!(collector(6, 12).normalize_storage(true, "s"), "s_slot");
        assert_eq!(collector(8, 0).normalize_storage(true, "s"), "s.slot");
        assert_eq!(collector(8, 0).normalize_storage(false, "s"), "s");
    }

    #[test]
    fn calldata_assembly_requires_name_and_version() {
        assert!(!collector(7, 4).supports_calldata_assembly("data"));
        assert!(collector(7, 5).supports_calldata_assembly("data"));
        assert!(!collector(8, 17).supports_calldata_assembly(""));
    }
}
