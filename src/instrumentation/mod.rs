//!
//! The auto-finder source instrumentation.
//!

pub mod error;
pub mod finder;
pub mod imports;
pub mod mutation;
pub mod planner;
pub mod writer;

use std::collections::BTreeMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use self::mutation::Mutation;

/// The file name prefix of the instrumented source copies.
pub const AUTO_FINDER_PREFIX: &str = "autoFinder_";

///
/// A single source edit.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrumentation {
    /// The byte expected at the edit offset.
    pub expected: u8,
    /// The inserted text.
    pub payload: String,
    /// The edit kind.
    pub mutation: Mutation,
}

impl Instrumentation {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(expected: u8, payload: String, mutation: Mutation) -> Self {
        Self {
            expected,
            payload,
            mutation,
        }
    }
}

/// The edits of a single file, keyed by byte offset.
pub type FileInstrumentation = BTreeMap<usize, Instrumentation>;

/// The edits of all files, keyed by the normalized absolute path.
pub type Instrumentations = BTreeMap<String, FileInstrumentation>;

///
/// Returns the absolute path with `.` and `..` components resolved lexically.
///
pub fn normalize_path(path: &str) -> String {
    let path = Path::new(path);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|directory| directory.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            component => normalized.push(component.as_os_str()),
        }
    }
    normalized.to_string_lossy().to_string()
}

///
/// Returns the path of the instrumented copy, next to the original file.
///
pub fn auto_finder_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", AUTO_FINDER_PREFIX, file_name))
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::path::PathBuf;

    #[test]
    fn normalize_path_resolves_dots() {
        assert_eq!(
            super::normalize_path("/work/src/./lib/../Token.sol"),
            "/work/src/Token.sol"
        );
    }

    #[test]
    fn normalize_path_makes_relative_paths_absolute() {
        let normalized = super::normalize_path("contracts/Token.sol");
        assert!(Path::new(normalized.as_str()).is_absolute());
        assert!(normalized.ends_with("contracts/Token.sol"));
    }

    #[test]
    fn auto_finder_path_is_a_sibling() {
        assert_eq!(
            super::auto_finder_path(Path::new("/work/src/Token.sol")),
            PathBuf::from("/work/src/autoFinder_Token.sol")
        );
    }
}
