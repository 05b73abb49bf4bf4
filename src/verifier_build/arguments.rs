//!
//! The verifier build arguments.
//!

use std::path::PathBuf;

use structopt::StructOpt;

///
/// The verifier build arguments.
///
#[derive(Debug, StructOpt)]
#[structopt(
    name = "verifier-build",
    about = "The smart contract build pipeline for the verifier"
)]
pub struct Arguments {
    /// The input source files.
    #[structopt(parse(from_os_str))]
    pub input_files: Vec<PathBuf>,

    /// The JSON build configuration, merged with the arguments.
    #[structopt(long = "config", parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// The default compiler executable.
    #[structopt(long = "solc")]
    pub solc: Option<String>,

    /// The extra compiler arguments.
    #[structopt(long = "solc-args")]
    pub solc_args: Option<String>,

    /// The import remappings, written as `prefix=path`.
    #[structopt(long = "packages")]
    pub packages: Vec<String>,

    /// The paths the compiler may read sources from.
    #[structopt(long = "path")]
    pub path: Vec<String>,

    /// The link directives, written as `Contract:reference=destination`.
    #[structopt(long = "link")]
    pub link: Vec<String>,

    /// The struct link directives, written as `Contract:reference=destination`.
    #[structopt(long = "struct-link")]
    pub struct_link: Vec<String>,

    /// The prototype declarations, written as `signature=Contract`.
    #[structopt(long = "prototype")]
    pub prototype: Vec<String>,

    /// The verified method signature.
    #[structopt(long = "method")]
    pub method: Option<String>,

    /// The verified contract and its property file, written as `Contract:file`.
    #[structopt(long = "verify")]
    pub verify: Option<String>,

    /// The contracts with asserted properties.
    #[structopt(long = "assert")]
    pub assert_contracts: Vec<String>,

    /// Compile via the Yul IR.
    #[structopt(long = "via-ir")]
    pub via_ir: bool,

    /// The EVM version.
    #[structopt(long = "evm-version")]
    pub evm_version: Option<String>,

    /// The optimizer runs.
    #[structopt(long = "optimize")]
    pub optimize: Option<u64>,

    /// Fail if the internal function finders cannot be generated.
    #[structopt(long = "assert-autofinder-success")]
    pub assert_autofinder_success: bool,

    /// The scratch directory.
    #[structopt(long = "config-dir", parse(from_os_str))]
    pub config_dir: Option<PathBuf>,

    /// The output build model file.
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Keep the generated files and print the debug logs.
    #[structopt(long = "debug")]
    pub debug: bool,
}

impl Arguments {
    ///
    /// A shortcut constructor.
    ///
    pub fn new() -> Self {
        Self::from_args()
    }

    ///
    /// Validates the arguments.
    ///
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.input_files.is_empty() && self.config.is_none() {
            anyhow::bail!("The input files are missing");
        }
        if self.verify.is_some() && !self.assert_contracts.is_empty() {
            anyhow::bail!("Only one of `--verify` and `--assert` may be specified");
        }
        Ok(())
    }
}
