//!
//! The compiler process interface.
//!

pub mod collector;
pub mod standard_json;

use std::io::Write;
use std::path::Path;

use self::standard_json::input::Input as StandardJsonInput;
use self::standard_json::output::Output as StandardJsonOutput;

///
/// The compiler collaborator.
///
/// The pipeline only talks to the compiler through this interface, so tests may substitute
/// canned outputs for the real executable.
///
pub trait Compiler {
    ///
    /// Returns the compiler version.
    ///
    fn version(&self, executable: &str) -> anyhow::Result<semver::Version>;

    ///
    /// Runs the compiler in the `--standard-json` mode.
    ///
    fn standard_json(
        &self,
        executable: &str,
        input: &StandardJsonInput,
        allow_paths: &[String],
    ) -> anyhow::Result<StandardJsonOutput>;

    ///
    /// Runs the compiler in the `--asm` mode and returns the text assembly.
    ///
    fn assembly(
        &self,
        executable: &str,
        path: &Path,
        extra_arguments: &[String],
        allow_paths: &[String],
    ) -> anyhow::Result<String>;
}

///
/// The compiler collaborator spawning the executable.
///
#[derive(Debug, Default, Clone)]
pub struct SolcCompiler;

impl SolcCompiler {
    fn allow_paths_argument(allow_paths: &[String]) -> Option<String> {
        if allow_paths.is_empty() {
            None
        } else {
            Some(allow_paths.join(","))
        }
    }

    fn parse_version(stdout: &str) -> anyhow::Result<semver::Version> {
        let regex = regex::Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("Always valid");
        let captures = regex
            .captures(stdout)
            .ok_or_else(|| anyhow::anyhow!("Compiler version not found in `{}`", stdout.trim()))?;
        let part = |index: usize| -> anyhow::Result<u64> {
            captures[index]
                .parse::<u64>()
                .map_err(|error| anyhow::anyhow!("Compiler version parsing error: {}", error))
        };
        Ok(semver::Version::new(part(1)?, part(2)?, part(3)?))
    }
}

impl Compiler for SolcCompiler {
    fn version(&self, executable: &str) -> anyhow::Result<semver::Version> {
        tracing::debug!(target: "rpc", "running `{} --version`", executable);
        let output = std::process::Command::new(executable)
            .arg("--version")
            .output()
            .map_err(|error| anyhow::anyhow!("{} subprocess error: {:?}", executable, error))?;
        if !output.status.success() {
            anyhow::bail!(
                "{} version getting error: {}",
                executable,
                String::from_utf8_lossy(output.stderr.as_slice())
            );
        }

        Self::parse_version(String::from_utf8_lossy(output.stdout.as_slice()).as_ref())
    }

    fn standard_json(
        &self,
        executable: &str,
        input: &StandardJsonInput,
        allow_paths: &[String],
    ) -> anyhow::Result<StandardJsonOutput> {
        let mut command = std::process::Command::new(executable);
        command.stdin(std::process::Stdio::piped());
        command.stdout(std::process::Stdio::piped());
        command.stderr(std::process::Stdio::piped());
        command.arg("--standard-json");
        if let Some(allow_paths) = Self::allow_paths_argument(allow_paths) {
            command.arg("--allow-paths");
            command.arg(allow_paths);
        }
        tracing::debug!(target: "rpc", "running {:?}", command);

        let input_json = serde_json::to_vec(input)?;
        let mut process = command
            .spawn()
            .map_err(|error| anyhow::anyhow!("{} subprocess spawning error: {:?}", executable, error))?;
        process
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("{} stdin getting error", executable))?
            .write_all(input_json.as_slice())
            .map_err(|error| anyhow::anyhow!("{} stdin writing error: {:?}", executable, error))?;
        let output = process
            .wait_with_output()
            .map_err(|error| anyhow::anyhow!("{} subprocess output error: {:?}", executable, error))?;
        if !output.status.success() {
            anyhow::bail!(
                "{} error: {}",
                executable,
                String::from_utf8_lossy(output.stderr.as_slice())
            );
        }

        serde_json::from_slice(output.stdout.as_slice()).map_err(|error| {
            anyhow::anyhow!(
                "{} subprocess output parsing error: {}\n{}",
                executable,
                error,
                String::from_utf8_lossy(output.stdout.as_slice()),
            )
        })
    }

    fn assembly(
        &self,
        executable: &str,
        path: &Path,
        extra_arguments: &[String],
        allow_paths: &[String],
    ) -> anyhow::Result<String> {
        let mut command = std::process::Command::new(executable);
        command.args(extra_arguments);
        command.arg("--asm");
        if let Some(allow_paths) = Self::allow_paths_argument(allow_paths) {
            command.arg("--allow-paths");
            command.arg(allow_paths);
        }
        command.arg(path);
        tracing::debug!(target: "rpc", "running {:?}", command);

        let output = command
            .output()
            .map_err(|error| anyhow::anyhow!("{} subprocess error: {:?}", executable, error))?;
        if !output.status.success() {
            anyhow::bail!(
                "{} error: {}",
                executable,
                String::from_utf8_lossy(output.stderr.as_slice())
            );
        }

        Ok(String::from_utf8_lossy(output.stdout.as_slice()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::solc::SolcCompiler;

    #[test]
    fn parses_solc_version_output() {
        let stdout = "solc, the solidity compiler commandline interface\nVersion: 0.8.17+commit.8df45f5f.Linux.g++\n";
        let version = SolcCompiler::parse_version(stdout).expect("Always valid");
        assert_eq!(version, semver::Version::new(0, 8, 17));
    }

    #[test]
    fn parses_vyper_version_output() {
        let version = SolcCompiler::parse_version("0.3.7+commit.6020b8bb\n").expect("Always valid");
        assert_eq!(version, semver::Version::new(0, 3, 7));
    }
}
