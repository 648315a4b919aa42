//! Response-precision autocorrelations

use super::{Analysis, Psth};
use crate::collapse::collapse;
use crate::error::{Error, Result};
use crate::record::{AnalysisRecord, RecordPayload};
use crate::store::RecordStore;
use crate::stimulus::Unit;
use std::collections::BTreeSet;
use tracing::debug;

/// Temporal precision of responses: the normalized autocorrelation of each
/// neuron's trial-averaged PSTH.
///
/// Per sheet, per-presentation histograms at `bin_length` milliseconds are
/// averaged over trials; for every selected neuron the full autocorrelation
/// of its averaged rate course is divided by the course's sum of squares
/// (skipped when that sum is zero, leaving the all-zero correlation). Each
/// condition yields one analog-signal-list record spanning lags
/// `-duration..duration`.
#[derive(Debug, Clone)]
pub struct ResponsePrecision {
    neurons: Vec<usize>,
    bin_length: f64,
    tags: BTreeSet<String>,
}

impl ResponsePrecision {
    /// Autocorrelate PSTHs of the given neurons, binned at `bin_length` ms.
    #[must_use]
    pub const fn new(neurons: Vec<usize>, bin_length: f64) -> Self {
        Self {
            neurons,
            bin_length,
            tags: BTreeSet::new(),
        }
    }

    /// Attach tags to every produced record.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }
}

impl Analysis for ResponsePrecision {
    fn name(&self) -> &'static str {
        "ResponsePrecision"
    }

    fn run(&self, store: &mut RecordStore) -> Result<()> {
        let mut produced = Vec::new();
        {
            for sheet in store.sheets() {
                let view = store.view().with_sheet(&sheet);
                let segments = view.segments();
                if segments.is_empty() {
                    continue;
                }

                let psths: Vec<Psth> = segments
                    .iter()
                    .map(|s| Psth::from_spike_trains(s.spike_trains(), self.bin_length))
                    .collect();
                let descriptors: Vec<_> = view.stimuli().into_iter().cloned().collect();

                let groups = collapse(psths, &descriptors, &["trial"], true)?;
                debug!(%sheet, conditions = groups.len(), "autocorrelating conditions");
                for group in groups {
                    check_uniform_shape(&group.values)?;
                    let psth = Psth::average(&group.values);
                    let duration = psth.duration();

                    let mut signals = Vec::with_capacity(self.neurons.len());
                    for &neuron in &self.neurons {
                        if neuron >= psth.num_neurons() {
                            return Err(Error::Precondition(format!(
                                "neuron index {neuron} out of range for sheet '{sheet}' \
                                 ({} recorded neurons)",
                                psth.num_neurons()
                            )));
                        }
                        let rates = psth.neuron_rates(neuron);
                        let mut correlation = full_autocorrelation(&rates);
                        let sum_of_squares: f64 = rates.iter().map(|v| v * v).sum();
                        if sum_of_squares != 0.0 {
                            for value in &mut correlation {
                                *value /= sum_of_squares;
                            }
                        }
                        signals.push(crate::signal::AnalogSignal::new(
                            correlation,
                            -duration + self.bin_length / 2.0,
                            self.bin_length,
                            Unit::dimensionless(),
                        ));
                    }

                    produced.push(
                        AnalysisRecord::builder(
                            "response autocorrelation",
                            &sheet,
                            RecordPayload::AnalogSignalList {
                                signals,
                                neurons: self.neurons.clone(),
                                x_axis_name: "time".to_string(),
                                y_axis_name: "autocorrelation".to_string(),
                            },
                        )
                        .stimulus(group.descriptor)
                        .algorithm(self.name())
                        .unit(Unit::dimensionless())
                        .tags(self.tags.iter().cloned())
                        .build(),
                    );
                }
            }
        }
        for record in produced {
            store.add_record(record);
        }
        Ok(())
    }
}

/// All histograms of one trial group must share binning and neuron count.
pub(super) fn check_uniform_shape(psths: &[Psth]) -> Result<()> {
    let Some(first) = psths.first() else {
        return Ok(());
    };
    for psth in psths {
        if psth.num_bins() != first.num_bins() {
            return Err(Error::ShapeMismatch {
                expected: first.num_bins(),
                found: psth.num_bins(),
                context: "PSTH bins across trials".to_string(),
            });
        }
        if psth.num_neurons() != first.num_neurons() {
            return Err(Error::ShapeMismatch {
                expected: first.num_neurons(),
                found: psth.num_neurons(),
                context: "PSTH neurons across trials".to_string(),
            });
        }
    }
    Ok(())
}

/// Full discrete autocorrelation: lags `-(n-1)..=(n-1)`, output length
/// `2n - 1`, zero lag in the middle.
fn full_autocorrelation(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mut out = vec![0.0; 2 * n - 1];
    #[allow(clippy::cast_possible_wrap)]
    let last = n as isize - 1;
    for (slot, lag) in out.iter_mut().zip(-last..=last) {
        let mut sum = 0.0;
        for i in 0..n {
            #[allow(clippy::cast_possible_wrap)]
            let j = i as isize + lag;
            if j >= 0 && j < n as isize {
                #[allow(clippy::cast_sign_loss)]
                let j = j as usize;
                sum += values[i] * values[j];
            }
        }
        *slot = sum;
    }
    out
}
