//!
//! The smart contract build pipeline library.
//!

pub mod ast;
pub mod build;
pub mod compiler_lang;
pub mod config;
pub mod error;
pub mod function;
pub mod instrumentation;
pub mod linker;
pub mod session;
pub mod slot;
pub mod solc;
pub mod types;

pub use self::build::Build;
pub use self::compiler_lang::CompilerLang;
pub use self::config::link::LinkDirective;
pub use self::config::BuildConfig;
pub use self::error::Error;
pub use self::error::Result;
pub use self::session::BuildSession;
pub use self::solc::Compiler;
pub use self::solc::SolcCompiler;

///
/// Builds all configured files and returns the build model.
///
pub fn build(config: &BuildConfig, compiler: &dyn Compiler) -> Result<Build> {
    let mut session = BuildSession::new(config, compiler);
    session.run()?;
    if session.auto_finders_failed() {
        tracing::warn!(target: "build_conf", "Some internal function finders could not be generated");
    }
    Ok(session.into_build())
}
