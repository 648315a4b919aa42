//! Tuning preference and selectivity via circular vector averaging

use super::Analysis;
use crate::circular::circular_mean;
use crate::collapse::collapse_to_curves;
use crate::error::{Error, Result};
use crate::record::{AnalysisRecord, RecordKind, RecordPayload};
use crate::store::RecordStore;
use crate::stimulus::{StimulusDescriptor, Unit};
use std::collections::BTreeSet;
use tracing::debug;

/// Preferred value and selectivity of every neuron along one periodic
/// stimulus parameter, computed as the weighted circular mean of the
/// neuron's tuning curve.
///
/// Consumes per-neuron records (typically trial-averaged firing rates) whose
/// stimuli differ along the configured parameter. For each fixed combination
/// of the remaining parameters it writes two per-neuron records:
/// `"<parameter> preference"` (circular mean, in the parameter's unit and
/// period) and `"<parameter> selectivity"` (resultant length in `[0, 1]`).
///
/// Neurons whose responses sum to zero get preference 0 and selectivity 0.
#[derive(Debug, Clone)]
pub struct PeriodicTuningVectorAverage {
    parameter_name: String,
    tags: BTreeSet<String>,
}

impl PeriodicTuningVectorAverage {
    /// Average over the given periodic stimulus parameter.
    pub fn new(parameter_name: impl Into<String>) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            tags: BTreeSet::new(),
        }
    }

    /// Attach tags to every produced record.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Per-neuron values and their stimuli for one sheet, aligned.
    fn collect_inputs<'a>(
        records: &[&'a AnalysisRecord],
    ) -> Result<(Vec<Vec<f64>>, Vec<StimulusDescriptor>)> {
        let mut values = Vec::with_capacity(records.len());
        let mut stimuli = Vec::with_capacity(records.len());
        for record in records {
            let Some(per_neuron) = record.per_neuron_values() else {
                continue; // kind filter upstream guarantees per-neuron payloads
            };
            let stimulus = record.stimulus().ok_or_else(|| {
                Error::Precondition(format!(
                    "record '{}' carries no stimulus; vector averaging needs one per record",
                    record.value_name()
                ))
            })?;
            values.push(per_neuron.to_vec());
            stimuli.push(stimulus.clone());
        }
        Ok((values, stimuli))
    }
}

impl Analysis for PeriodicTuningVectorAverage {
    fn name(&self) -> &'static str {
        "PeriodicTuningVectorAverage"
    }

    fn run(&self, store: &mut RecordStore) -> Result<()> {
        let mut produced = Vec::new();
        {
            for sheet in store.sheets() {
                let view = store
                    .view()
                    .with_sheet(&sheet)
                    .with_kind(RecordKind::PerNeuronValue);
                let records = view.records();
                let Some(first) = records.first() else {
                    continue;
                };

                let value_name = first.value_name();
                for record in records {
                    if record.value_name() != value_name {
                        return Err(Error::Precondition(format!(
                            "sheet '{sheet}' mixes per-neuron value names \
                             '{value_name}' and '{}'; narrow the store first",
                            record.value_name()
                        )));
                    }
                }

                let (values, stimuli) = Self::collect_inputs(records)?;
                if stimuli.is_empty() {
                    continue;
                }
                for stimulus in &stimuli {
                    if stimulus.stimulus_type() != stimuli[0].stimulus_type() {
                        return Err(Error::MixedStimulusTypes {
                            first: stimuli[0].stimulus_type().to_string(),
                            other: stimulus.stimulus_type().to_string(),
                        });
                    }
                }
                let period = stimuli[0].period(&self.parameter_name).ok_or_else(|| {
                    Error::Precondition(format!(
                        "parameter '{}' of {} is not periodic; vector averaging \
                         is defined for circular parameters only",
                        self.parameter_name, stimuli[0]
                    ))
                })?;
                let unit = stimuli[0]
                    .unit(&self.parameter_name)
                    .cloned()
                    .unwrap_or_default();

                let curves = collapse_to_curves(values, &stimuli, &self.parameter_name)?;
                debug!(%sheet, value_name, curves = curves.len(), "vector averaging curves");

                for curve in curves {
                    let angles = curve
                        .parameter_values
                        .iter()
                        .map(|v| {
                            v.as_f64().ok_or_else(|| {
                                Error::Precondition(format!(
                                    "parameter '{}' has non-numeric value {v}",
                                    self.parameter_name
                                ))
                            })
                        })
                        .collect::<Result<Vec<f64>>>()?;

                    let num_neurons = curve.values[0].len();
                    for point in &curve.values {
                        if point.len() != num_neurons {
                            return Err(Error::ShapeMismatch {
                                expected: num_neurons,
                                found: point.len(),
                                context: "per-neuron values across curve points".to_string(),
                            });
                        }
                    }

                    let mut preference = Vec::with_capacity(num_neurons);
                    let mut selectivity = Vec::with_capacity(num_neurons);
                    let mut weights = vec![0.0; curve.values.len()];
                    for neuron in 0..num_neurons {
                        for (slot, point) in weights.iter_mut().zip(&curve.values) {
                            *slot = point[neuron];
                        }
                        let (mean, resultant) = circular_mean(&angles, &weights, period);
                        preference.push(mean);
                        selectivity.push(resultant);
                    }

                    produced.push(
                        AnalysisRecord::builder(
                            format!("{} preference", self.parameter_name),
                            &sheet,
                            RecordPayload::PerNeuronValue(preference),
                        )
                        .stimulus(curve.descriptor.clone())
                        .algorithm(self.name())
                        .unit(unit.clone())
                        .period(period)
                        .tags(self.tags.iter().cloned())
                        .build(),
                    );
                    produced.push(
                        AnalysisRecord::builder(
                            format!("{} selectivity", self.parameter_name),
                            &sheet,
                            RecordPayload::PerNeuronValue(selectivity),
                        )
                        .stimulus(curve.descriptor)
                        .algorithm(self.name())
                        .unit(Unit::dimensionless())
                        .period(1.0)
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
