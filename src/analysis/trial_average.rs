//! Trial-averaged firing rates

use super::{mean_across, Analysis};
use crate::collapse::collapse;
use crate::error::Result;
use crate::record::{AnalysisRecord, RecordPayload};
use crate::store::RecordStore;
use crate::stimulus::Unit;
use std::collections::BTreeSet;
use tracing::debug;

/// Mean firing rate per neuron and stimulus condition, averaged over trials.
///
/// For every sheet, segments recorded under the configured stimulus type are
/// collapsed over the `trial` parameter; each group yields one
/// `"Firing rate"` per-neuron record (spikes per second) whose stimulus is
/// the shared trial-free descriptor.
///
/// # Example
///
/// ```no_run
/// use sintonia_db::analysis::{Analysis, TrialAveragedFiringRate};
/// use sintonia_db::RecordStore;
///
/// let mut store = RecordStore::new();
/// TrialAveragedFiringRate::new("FullfieldDriftingGrating")
///     .execute(&mut store)
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TrialAveragedFiringRate {
    stimulus_type: String,
    tags: BTreeSet<String>,
}

impl TrialAveragedFiringRate {
    /// Average rates of segments recorded under `stimulus_type`.
    pub fn new(stimulus_type: impl Into<String>) -> Self {
        Self {
            stimulus_type: stimulus_type.into(),
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

impl Analysis for TrialAveragedFiringRate {
    fn name(&self) -> &'static str {
        "TrialAveragedFiringRate"
    }

    fn run(&self, store: &mut RecordStore) -> Result<()> {
        let mut produced = Vec::new();
        {
            let base = store.view().with_stimulus_type(&self.stimulus_type);
            for sheet in base.sheets() {
                let view = base.clone().with_sheet(&sheet);
                let rates: Vec<Vec<f64>> =
                    view.segments().iter().map(|s| s.mean_rates()).collect();
                if rates.is_empty() {
                    continue;
                }
                let descriptors: Vec<_> = view.stimuli().into_iter().cloned().collect();

                let groups = collapse(rates, &descriptors, &["trial"], false)?;
                debug!(
                    %sheet,
                    segments = descriptors.len(),
                    conditions = groups.len(),
                    "collapsed trials"
                );
                for group in groups {
                    let trials = group.values.len();
                    let mean = mean_across(&group.values, "trial-averaged firing rates")?;
                    debug!(%sheet, stimulus = %group.descriptor, trials, "averaged condition");
                    produced.push(
                        AnalysisRecord::builder(
                            "Firing rate",
                            &sheet,
                            RecordPayload::PerNeuronValue(mean),
                        )
                        .stimulus(group.descriptor)
                        .algorithm(self.name())
                        .unit(Unit::new("spike/s"))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use crate::signal::{Segment, SpikeTrain};
    use crate::stimulus::StimulusDescriptor;

    fn spikes(count: usize) -> SpikeTrain {
        #[allow(clippy::cast_precision_loss)]
        let times = (0..count).map(|i| i as f64 + 0.5).collect();
        SpikeTrain::new(times, 0.0, 1000.0)
    }

    fn store_with_trials() -> RecordStore {
        let mut store = RecordStore::new();
        for trial in 0..3i64 {
            for (orientation, base) in [(0.0, 10), (1.5, 40)] {
                let stim = StimulusDescriptor::builder("Grating")
                    .parameter("orientation", orientation)
                    .parameter("trial", trial)
                    .build();
                // rates base, base+1, base+2 across trials -> mean base+1
                #[allow(clippy::cast_sign_loss)]
                let count = base + trial as usize;
                store.add_segment(Segment::new("V1", stim, vec![spikes(count)]));
            }
        }
        store
    }

    #[test]
    fn averages_rates_over_trials() {
        let mut store = store_with_trials();
        TrialAveragedFiringRate::new("Grating")
            .run(&mut store)
            .unwrap();

        let view = store
            .view()
            .with_kind(RecordKind::PerNeuronValue)
            .with_value_name("Firing rate");
        assert_eq!(view.record_count(), 2);

        for record in view.records() {
            let stim = record.stimulus().unwrap();
            assert!(!stim.has_parameter("trial"));
            let expected = if stim.parameter("orientation").unwrap().as_f64() == Some(0.0) {
                11.0
            } else {
                41.0
            };
            let values = record.per_neuron_values().unwrap();
            assert!((values[0] - expected).abs() < 1e-9);
            assert_eq!(record.unit().symbol(), "spike/s");
        }
    }

    #[test]
    fn unrelated_stimulus_types_are_ignored() {
        let mut store = store_with_trials();
        store.add_segment(Segment::new(
            "V1",
            StimulusDescriptor::builder("NaturalImage")
                .parameter("trial", 0i64)
                .build(),
            vec![spikes(100)],
        ));

        TrialAveragedFiringRate::new("Grating")
            .run(&mut store)
            .unwrap();
        let view = store.view().with_value_name("Firing rate");
        assert_eq!(view.record_count(), 2);
    }

    #[test]
    fn empty_store_produces_nothing() {
        let mut store = RecordStore::new();
        TrialAveragedFiringRate::new("Grating")
            .run(&mut store)
            .unwrap();
        assert_eq!(store.record_count(), 0);
    }
}
