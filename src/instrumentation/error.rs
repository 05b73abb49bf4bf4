//!
//! The source instrumentation error.
//!

///
/// The source instrumentation error.
///
/// Any of these makes the build fall back to the uninstrumented sources.
///
#[derive(Debug, thiserror::Error)]
pub enum InstrumentationError {
    /// An implemented function has no body location.
    #[error("Implemented function {function} in {contract} has no location")]
    NoLocation {
        /// The function signature.
        function: String,
        /// The contract name.
        contract: String,
    },
    /// The parameter names do not match the parameter types.
    #[error("No argument names for {function} in {contract}")]
    NoParameterNames {
        /// The function signature.
        function: String,
        /// The contract name.
        contract: String,
    },
    /// The function has no definition node ID.
    #[error("No AST ID for {0}")]
    NoAstId(String),
    /// The definition node is not in the AST.
    #[error("No definition node {id} for {function}")]
    NoDefinition {
        /// The function signature.
        function: String,
        /// The definition node ID.
        id: i64,
    },
    /// An argument named after an opcode has no type declaration to rename it with.
    #[error("Argument {name} of type {type_name} cannot be renamed without a type declaration")]
    Renaming {
        /// The argument name.
        name: String,
        /// The argument type.
        type_name: String,
    },
    /// The modifier AST is not recognized.
    #[error("Unrecognized modifier of {0}")]
    Modifier(String),
    /// The import directive cannot be rewritten.
    #[error("Cannot rewrite import {id} in {file}: {reason}")]
    Import {
        /// The importing file.
        file: String,
        /// The import directive node ID.
        id: i64,
        /// The failure description.
        reason: String,
    },
    /// Two instrumentations target the same source range.
    #[error("Conflicting instrumentation at {offset} in {file}")]
    Conflict {
        /// The instrumented file.
        file: String,
        /// The byte offset.
        offset: usize,
    },
    /// The source byte at the offset is not the expected one.
    #[error("Expected {expected:?} at {offset} in {file}, found {found:?}")]
    ByteMismatch {
        /// The instrumented file.
        file: String,
        /// The byte offset.
        offset: usize,
        /// The expected byte.
        expected: char,
        /// The actual byte, if any.
        found: Option<char>,
    },
    /// The file system error.
    #[error("{path}: {error}")]
    Io {
        /// The file path.
        path: String,
        /// The underlying error.
        error: std::io::Error,
    },
    /// The instrumented sources do not compile.
    #[error("Compilation of the instrumented sources failed: {0}")]
    Compilation(String),
}
