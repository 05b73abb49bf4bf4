//!
//! The smart contract build pipeline binary.
//!

pub mod arguments;

use tracing_subscriber::EnvFilter;

use verifier_build::BuildConfig;

use self::arguments::Arguments;

/// The process exit code on success.
const EXIT_CODE_SUCCESS: i32 = 0;

/// The process exit code on failure.
const EXIT_CODE_FAILURE: i32 = 1;

/// The default output build model file.
const DEFAULT_OUTPUT_FILE: &str = ".certora_build.json";

///
/// The application entry point.
///
fn main() {
    std::process::exit(match main_inner() {
        Ok(()) => EXIT_CODE_SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            EXIT_CODE_FAILURE
        }
    })
}

///
/// The auxiliary `main` function to facilitate the `?` error conversion operator.
///
fn main_inner() -> anyhow::Result<()> {
    let arguments = Arguments::new();
    arguments.validate()?;

    let default_filter = if arguments.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match arguments.config.as_ref() {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::default(),
    };
    for path in arguments.input_files.iter() {
        let path = path.canonicalize()?.to_string_lossy().to_string();
        if !config.files.contains(&path) {
            config.files.push(path);
        }
    }
    if arguments.solc.is_some() {
        config.solc = arguments.solc;
    }
    if arguments.solc_args.is_some() {
        config.solc_args = arguments.solc_args;
    }
    config.packages.extend(arguments.packages);
    config.path.extend(arguments.path);
    config.link.extend(arguments.link);
    config.struct_link.extend(arguments.struct_link);
    config.prototype.extend(arguments.prototype);
    config.assert_contracts.extend(arguments.assert_contracts);
    if arguments.method.is_some() {
        config.method = arguments.method;
    }
    if arguments.verify.is_some() {
        config.verify = arguments.verify;
    }
    if arguments.evm_version.is_some() {
        config.evm_version = arguments.evm_version;
    }
    if arguments.optimize.is_some() {
        config.optimize = arguments.optimize;
    }
    if let Some(config_dir) = arguments.config_dir {
        config.config_dir = config_dir;
    }
    config.via_ir |= arguments.via_ir;
    config.debug |= arguments.debug;
    config.assert_autofinder_success |= arguments.assert_autofinder_success;

    let compiler = verifier_build::SolcCompiler::default();
    let build = verifier_build::build(&config, &compiler)?;

    let output = arguments
        .output
        .unwrap_or_else(|| config.config_dir.join(DEFAULT_OUTPUT_FILE));
    build.write_to_file(output.as_path())?;
    Ok(())
}
