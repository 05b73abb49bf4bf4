//!
//! The auto-finder instrumentation pass.
//!

use std::collections::BTreeMap;
use std::path::Path;

use crate::build::sdc::Sdc;
use crate::error::Error;
use crate::function::Func;
use crate::instrumentation::auto_finder_path;
use crate::instrumentation::error::InstrumentationError;
use crate::instrumentation::imports::ImportRewriter;
use crate::instrumentation::normalize_path;
use crate::instrumentation::planner::AutoFinderPlan;
use crate::instrumentation::planner::Planner;
use crate::instrumentation::writer;

use super::BuildSession;

///
/// The function finders by symbol, and the unit they belong to.
///
pub type InstrumentedUnit = (BTreeMap<String, Func>, Sdc);

impl<'a> BuildSession<'a> {
    ///
    /// Instruments the file with the internal function finders and recompiles it.
    ///
    /// Any instrumentation failure, including the compiler rejecting the instrumented code,
    /// falls back to the uninstrumented units and marks the session.
    ///
    pub fn instrument_auto_finders(
        &mut self,
        file: &str,
        file_index: usize,
        sdcs: Vec<Sdc>,
    ) -> Result<Vec<InstrumentedUnit>, Error> {
        if sdcs.is_empty() {
            return Ok(vec![]);
        }
        let (finders, auto_finder_file) = match self.instrument_sources(file, sdcs.as_slice()) {
            Ok(instrumented) => instrumented,
            Err(error) => return Ok(self.fall_back(file, error, sdcs)),
        };

        let instrumented_sdcs =
            match self.collect_for_file(auto_finder_file.as_str(), file, file_index, false) {
                Ok(instrumented_sdcs) => instrumented_sdcs,
                Err(error) if error.is_compilation() => {
                    let error = InstrumentationError::Compilation(error.to_string());
                    return Ok(self.fall_back(file, error, sdcs));
                }
                Err(error) => return Err(error),
            };

        Ok(instrumented_sdcs
            .into_iter()
            .map(|sdc| (finders.clone(), sdc))
            .collect())
    }

    ///
    /// Plans and writes the instrumented sources.
    ///
    /// Returns the finders and the instrumented copy of the file.
    ///
    fn instrument_sources(
        &mut self,
        file: &str,
        sdcs: &[Sdc],
    ) -> Result<(BTreeMap<String, Func>, String), InstrumentationError> {
        let plan = match sdcs.first() {
            Some(sdc) => Planner::new(&self.index).plan(sdc, &mut self.finder_ids)?,
            None => AutoFinderPlan::default(),
        };
        let mut instrumentations = plan.instrumentations;
        let main_file = normalize_path(file);
        instrumentations.entry(main_file.clone()).or_default();
        ImportRewriter::new(&self.index, file).rewrite(&mut instrumentations)?;

        let written = writer::write(&instrumentations)?;
        self.generated_files.extend(written);

        let auto_finder_file = auto_finder_path(Path::new(main_file.as_str()));
        Ok((plan.finders, auto_finder_file.to_string_lossy().to_string()))
    }

    ///
    /// Returns the uninstrumented units without finders.
    ///
    fn fall_back(
        &mut self,
        file: &str,
        error: InstrumentationError,
        sdcs: Vec<Sdc>,
    ) -> Vec<InstrumentedUnit> {
        tracing::warn!(
            target: "finder_instrumentation",
            "Failed to generate the internal function finders of {}: {}",
            file,
            error
        );
        self.auto_finders_failed = true;
        sdcs.into_iter().map(|sdc| (BTreeMap::new(), sdc)).collect()
    }
}
