//! F1/F0 modulation ratios

use super::precision::check_uniform_shape;
use super::{Analysis, Psth};
use crate::circular::circular_dist;
use crate::collapse::{collapse, collapse_to_curves};
use crate::error::{Error, Result};
use crate::record::{AnalysisRecord, RecordKind, RecordPayload};
use crate::store::RecordStore;
use crate::stimulus::{StimulusDescriptor, Unit};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::collections::BTreeSet;
use std::f64::consts::PI;
use tracing::{debug, error};

/// Modulation ratio (F1/F0) of every neuron's response to a drifting
/// grating, evaluated at the neuron's preferred orientation.
///
/// Prerequisite: exactly one `"orientation preference"` per-neuron record
/// per sheet (see
/// [`PeriodicTuningVectorAverage`](super::PeriodicTuningVectorAverage));
/// a sheet whose record is absent or ambiguous is skipped with an error
/// log, leaving the other sheets' output intact. For each neuron the
/// trial-averaged PSTH of the presented
/// orientation circularly closest to the neuron's preference is Fourier
/// transformed; the ratio is twice the first-harmonic magnitude over the DC
/// magnitude, the harmonic index being the stimulus `temporal_frequency`
/// times the histogram duration. Out-of-range harmonics and silent
/// histograms yield ratio 0.
#[derive(Debug, Clone)]
pub struct ModulationRatio {
    stimulus_type: String,
    bin_length: f64,
    tags: BTreeSet<String>,
}

impl ModulationRatio {
    /// Modulation ratios for segments of `stimulus_type`, with PSTHs binned
    /// at `bin_length` ms.
    pub fn new(stimulus_type: impl Into<String>, bin_length: f64) -> Self {
        Self {
            stimulus_type: stimulus_type.into(),
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

    fn numeric_parameter(descriptor: &StimulusDescriptor, name: &str) -> Result<f64> {
        descriptor
            .parameter(name)
            .ok_or_else(|| Error::MissingParameter {
                parameter: name.to_string(),
                descriptor: descriptor.to_string(),
            })?
            .as_f64()
            .ok_or_else(|| {
                Error::Precondition(format!(
                    "parameter '{name}' of {descriptor} is not numeric"
                ))
            })
    }
}

impl Analysis for ModulationRatio {
    fn name(&self) -> &'static str {
        "ModulationRatio"
    }

    fn run(&self, store: &mut RecordStore) -> Result<()> {
        let mut produced = Vec::new();
        {
            for sheet in store.sheets() {
                let view = store
                    .view()
                    .with_sheet(&sheet)
                    .with_stimulus_type(&self.stimulus_type);
                let segments = view.segments();
                if segments.is_empty() {
                    continue;
                }

                let preference_record = store
                    .view()
                    .with_sheet(&sheet)
                    .with_kind(RecordKind::PerNeuronValue)
                    .with_value_name("orientation preference")
                    .unique_record();
                let preferences = match preference_record {
                    Ok(record) => record
                        .per_neuron_values()
                        .map(<[f64]>::to_vec)
                        .unwrap_or_default(),
                    Err(err) => {
                        error!(
                            %sheet,
                            %err,
                            "modulation ratio needs exactly one orientation preference \
                             record per sheet; skipping this sheet"
                        );
                        continue;
                    }
                };

                let psths: Vec<Psth> = segments
                    .iter()
                    .map(|s| Psth::from_spike_trains(s.spike_trains(), self.bin_length))
                    .collect();
                let descriptors: Vec<_> = view.stimuli().into_iter().cloned().collect();

                let mut presented = Vec::with_capacity(descriptors.len());
                for descriptor in &descriptors {
                    presented.push(Self::numeric_parameter(descriptor, "orientation")?);
                }
                presented.sort_by(f64::total_cmp);
                presented.dedup_by(|a, b| a.to_bits() == b.to_bits());

                let closest: Vec<f64> = preferences
                    .iter()
                    .map(|&preference| closest_orientation(preference, &presented))
                    .collect();

                let groups = collapse(psths, &descriptors, &["trial"], true)?;
                let mut averaged = Vec::with_capacity(groups.len());
                let mut conditions = Vec::with_capacity(groups.len());
                for group in groups {
                    check_uniform_shape(&group.values)?;
                    averaged.push(Psth::average(&group.values));
                    conditions.push(group.descriptor);
                }

                let curves = collapse_to_curves(averaged, &conditions, "orientation")?;
                debug!(%sheet, curves = curves.len(), "computing modulation ratios");
                for curve in curves {
                    let frequency =
                        Self::numeric_parameter(&curve.descriptor, "temporal_frequency")?;

                    let mut ratios = vec![0.0; preferences.len()];
                    for (value, psth) in curve.parameter_values.iter().zip(&curve.values) {
                        if psth.num_neurons() != preferences.len() {
                            return Err(Error::ShapeMismatch {
                                expected: preferences.len(),
                                found: psth.num_neurons(),
                                context: "PSTH neurons vs orientation preferences".to_string(),
                            });
                        }
                        let orientation = value.as_f64().ok_or_else(|| {
                            Error::Precondition(format!(
                                "parameter 'orientation' has non-numeric value {value}"
                            ))
                        })?;
                        for (neuron, &target) in closest.iter().enumerate() {
                            if orientation.to_bits() == target.to_bits() {
                                ratios[neuron] = modulation_ratio(
                                    &psth.neuron_rates(neuron),
                                    frequency,
                                    self.bin_length,
                                );
                            }
                        }
                    }

                    produced.push(
                        AnalysisRecord::builder(
                            "Modulation ratio",
                            &sheet,
                            RecordPayload::PerNeuronValue(ratios),
                        )
                        .stimulus(curve.descriptor)
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

/// The presented orientation circularly closest to `preference`.
/// Orientation lives on a half circle, period pi.
fn closest_orientation(preference: f64, presented: &[f64]) -> f64 {
    let mut best = presented[0];
    let mut best_dist = circular_dist(preference, best, PI);
    for &candidate in &presented[1..] {
        let dist = circular_dist(preference, candidate, PI);
        if dist < best_dist {
            best = candidate;
            best_dist = dist;
        }
    }
    best
}

/// Twice the first-harmonic magnitude over the DC magnitude of `rates`.
///
/// The harmonic index is `round(duration * frequency)`. Empty input,
/// non-positive frequency, an out-of-range harmonic, or zero DC all yield 0.
fn modulation_ratio(rates: &[f64], frequency_hz: f64, bin_length_ms: f64) -> f64 {
    let n = rates.len();
    if n == 0 || frequency_hz <= 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let duration_s = n as f64 * bin_length_ms / 1000.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let harmonic = (duration_s * frequency_hz).round() as usize;
    if harmonic == 0 || harmonic >= n {
        debug!(
            harmonic,
            bins = n,
            "first harmonic outside the spectrum; reporting ratio 0"
        );
        return 0.0;
    }

    let mut buffer: Vec<Complex<f64>> =
        rates.iter().map(|&v| Complex::new(v, 0.0)).collect();
    FftPlanner::<f64>::new()
        .plan_fft_forward(n)
        .process(&mut buffer);

    let dc = buffer[0].norm();
    if dc == 0.0 {
        0.0
    } else {
        2.0 * buffer[harmonic].norm() / dc
    }
}
