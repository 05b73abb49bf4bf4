//!
//! The build pipeline error.
//!

///
/// The build pipeline error.
///
/// User input and compilation errors are reported to the user as is. Internal consistency
/// errors mean that the resolved model disagrees with the compiler output.
///
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The user input is invalid: bad link directives, unknown contracts or methods,
    /// or errors reported by the compiler on user sources.
    #[error("{0}")]
    UserInput(String),
    /// The model built from the compiler output is inconsistent with it.
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),
    /// The compiler rejected generated code.
    #[error("Compilation error: {0}")]
    Compilation(String),
    /// The file system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The compiler process error.
    #[error("{0}")]
    Compiler(#[from] anyhow::Error),
}

impl Error {
    ///
    /// A shortcut constructor.
    ///
    pub fn user_input<S: Into<String>>(message: S) -> Self {
        Self::UserInput(message.into())
    }

    ///
    /// A shortcut constructor.
    ///
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::InternalConsistency(message.into())
    }

    ///
    /// Whether the error was caused by the compiler rejecting generated code.
    ///
    pub fn is_compilation(&self) -> bool {
        matches!(self, Self::Compilation(_))
    }
}

///
/// The build pipeline result.
///
pub type Result<T> = std::result::Result<T, Error>;
