//! Analysis routines over record stores
//!
//! Every routine implements [`Analysis`]: it reads segments and earlier
//! records through store views, computes, and appends new typed records to
//! the same store. Routines are written to be chained; later ones (e.g.
//! [`ModulationRatio`]) consume records written by earlier ones.
//!
//! Failure handling is two-tier. Caller bugs and integrity violations come
//! back as [`crate::Error`]; missing prerequisites degrade softly: the
//! routine logs and produces no output for the affected sheet or store.

mod modulation;
mod precision;
mod psth;
mod spike_triggered;
mod trial_average;
mod vector_average;

pub use modulation::ModulationRatio;
pub use precision::ResponsePrecision;
pub use psth::Psth;
pub use spike_triggered::SpikeTriggeredAverage;
pub use trial_average::TrialAveragedFiringRate;
pub use vector_average::PeriodicTuningVectorAverage;

use crate::error::{Error, Result};
use crate::store::RecordStore;
use std::time::Instant;
use tracing::info;

/// A named analysis routine that reads a store and appends records to it.
pub trait Analysis {
    /// Routine name, used as the `analysis_algorithm` of produced records.
    fn name(&self) -> &'static str;

    /// Run the routine against `store`.
    ///
    /// # Errors
    ///
    /// Fatal precondition failures only; soft failures are logged and
    /// skipped inside the routine.
    fn run(&self, store: &mut RecordStore) -> Result<()>;

    /// [`Analysis::run`] wrapped with timing and progress logs.
    ///
    /// # Errors
    ///
    /// Whatever [`Analysis::run`] returns.
    fn execute(&self, store: &mut RecordStore) -> Result<()> {
        let started = Instant::now();
        let records_before = store.record_count();
        info!(analysis = self.name(), "starting analysis");
        let result = self.run(store);
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => info!(
                analysis = self.name(),
                elapsed_ms,
                new_records = store.record_count() - records_before,
                "analysis finished"
            ),
            Err(error) => info!(
                analysis = self.name(),
                elapsed_ms,
                %error,
                "analysis failed"
            ),
        }
        result
    }
}

/// Element-wise mean of equally sized per-neuron vectors.
///
/// `context` names the caller for the error message.
pub(crate) fn mean_across(vectors: &[Vec<f64>], context: &str) -> Result<Vec<f64>> {
    let Some(first) = vectors.first() else {
        return Ok(Vec::new());
    };
    for vector in vectors {
        if vector.len() != first.len() {
            return Err(Error::ShapeMismatch {
                expected: first.len(),
                found: vector.len(),
                context: context.to_string(),
            });
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let n = vectors.len() as f64;
    let mut mean = vec![0.0; first.len()];
    for vector in vectors {
        for (slot, value) in mean.iter_mut().zip(vector) {
            *slot += value;
        }
    }
    for slot in &mut mean {
        *slot /= n;
    }
    Ok(mean)
}
