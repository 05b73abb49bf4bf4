//!
//! The instrumented source writer.
//!

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use super::auto_finder_path;
use super::error::InstrumentationError;
use super::FileInstrumentation;
use super::Instrumentations;

///
/// Applies the edits to the source, checking the byte at every edit offset.
///
pub fn render(
    file: &str,
    source: &[u8],
    instrumentation: &FileInstrumentation,
) -> Result<Vec<u8>, InstrumentationError> {
    let payload_size: usize = instrumentation
        .values()
        .map(|instrumentation| instrumentation.payload.len())
        .sum();
    let mut output = Vec::with_capacity(source.len() + payload_size);

    let mut cursor = 0;
    for (offset, instrumentation) in instrumentation.iter() {
        let offset = *offset;
        if offset < cursor {
            return Err(InstrumentationError::Conflict {
                file: file.to_owned(),
                offset,
            });
        }
        match source.get(offset) {
            Some(byte) if *byte == instrumentation.expected => {}
            found => {
                return Err(InstrumentationError::ByteMismatch {
                    file: file.to_owned(),
                    offset,
                    expected: instrumentation.expected as char,
                    found: found.map(|byte| *byte as char),
                })
            }
        }
        output.extend_from_slice(&source[cursor..offset]);
        let skipped = instrumentation.mutation.apply(
            instrumentation.payload.as_str(),
            instrumentation.expected,
            &mut output,
        );
        cursor = (offset + 1 + skipped).min(source.len());
    }
    output.extend_from_slice(&source[cursor..]);

    Ok(output)
}

///
/// Writes the instrumented copies of all files next to the originals.
///
/// Nothing is written unless every file renders successfully, and the copies already written
/// are removed if writing a later one fails.
///
/// Returns the paths of the written copies.
///
pub fn write(instrumentations: &Instrumentations) -> Result<Vec<PathBuf>, InstrumentationError> {
    let mut rendered = Vec::with_capacity(instrumentations.len());
    for (file, instrumentation) in instrumentations.iter() {
        let source = std::fs::read(file).map_err(|error| InstrumentationError::Io {
            path: file.to_owned(),
            error,
        })?;
        let output = render(file.as_str(), source.as_slice(), instrumentation)?;
        rendered.push((auto_finder_path(Path::new(file.as_str())), output));
    }

    let mut written = Vec::with_capacity(rendered.len());
    for (path, output) in rendered.into_iter() {
        tracing::debug!(target: "finder_instrumentation", "writing {:?}", path);
        if let Err(error) = write_file(path.as_path(), output.as_slice()) {
            remove_all(written.as_slice());
            return Err(InstrumentationError::Io {
                path: path.to_string_lossy().to_string(),
                error,
            });
        }
        written.push(path);
    }

    Ok(written)
}

fn write_file(path: &Path, output: &[u8]) -> std::io::Result<()> {
    std::fs::File::create(path)?.write_all(output)
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths.iter() {
        if let Err(error) = std::fs::remove_file(path) {
            tracing::warn!(target: "finder_instrumentation", "Failed to remove {:?}: {}", path, error);
        }
    }
}
