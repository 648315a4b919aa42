//! Spike-triggered averaging of conductance traces

use super::Analysis;
use crate::error::{Error, Result};
use crate::record::{AnalysisRecord, RecordPayload};
use crate::signal::{AnalogSignal, SpikeTrain};
use crate::store::RecordStore;
use std::collections::BTreeSet;
use tracing::debug;

/// Spike-triggered average of excitatory and inhibitory conductances around
/// each neuron's own spikes, pooled over every presentation of a sheet.
///
/// For each selected neuron, windows of `window_length` milliseconds on both
/// sides of every spike are cut from the conductance traces and averaged;
/// spikes whose window does not fit inside the recording are skipped. The
/// result is one conductance-signal-list record per sheet whose signals run
/// from `-window_length` to `+window_length` around the spike.
///
/// A neuron with no usable spike yields an all-zero trace. Sheets without
/// conductance recordings are skipped.
#[derive(Debug, Clone)]
pub struct SpikeTriggeredAverage {
    window_length: f64,
    neurons: Vec<usize>,
    tags: BTreeSet<String>,
}

impl SpikeTriggeredAverage {
    /// Average over `window_length` ms on each side of a spike, for the
    /// given neurons.
    #[must_use]
    pub const fn new(window_length: f64, neurons: Vec<usize>) -> Self {
        Self {
            window_length,
            neurons,
            tags: BTreeSet::new(),
        }
    }

    /// Attach tags to every produced record.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Per-neuron entry lookup shared by spike trains and conductances.
    fn trace_for<'a, T>(
        traces: &'a [T],
        neuron: usize,
        sheet: &str,
        num_neurons: usize,
    ) -> Result<&'a T> {
        traces.get(neuron).ok_or_else(|| {
            Error::Precondition(format!(
                "neuron index {neuron} out of range for sheet '{sheet}' \
                 ({num_neurons} recorded neurons)"
            ))
        })
    }
}

impl Analysis for SpikeTriggeredAverage {
    fn name(&self) -> &'static str {
        "SpikeTriggeredAverage"
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
                if segments
                    .iter()
                    .all(|s| s.excitatory_conductances().is_empty())
                {
                    debug!(%sheet, "no conductance recordings; skipping sheet");
                    continue;
                }

                let mut excitatory = Vec::with_capacity(self.neurons.len());
                let mut inhibitory = Vec::with_capacity(self.neurons.len());
                for &neuron in &self.neurons {
                    let mut spikes = Vec::with_capacity(segments.len());
                    let mut g_exc = Vec::with_capacity(segments.len());
                    let mut g_inh = Vec::with_capacity(segments.len());
                    for segment in segments {
                        let num = segment.num_neurons();
                        spikes.push(Self::trace_for(
                            segment.spike_trains(),
                            neuron,
                            &sheet,
                            num,
                        )?);
                        g_exc.push(Self::trace_for(
                            segment.excitatory_conductances(),
                            neuron,
                            &sheet,
                            num,
                        )?);
                        g_inh.push(Self::trace_for(
                            segment.inhibitory_conductances(),
                            neuron,
                            &sheet,
                            num,
                        )?);
                    }
                    excitatory.push(triggered_average(&g_exc, &spikes, self.window_length));
                    inhibitory.push(triggered_average(&g_inh, &spikes, self.window_length));
                }

                produced.push(
                    AnalysisRecord::builder(
                        "conductance STA",
                        &sheet,
                        RecordPayload::ConductanceSignalList {
                            excitatory,
                            inhibitory,
                            neurons: self.neurons.clone(),
                        },
                    )
                    .algorithm(self.name())
                    .unit(find_unit(segments))
                    .tags(self.tags.iter().cloned())
                    .build(),
                );
            }
        }
        for record in produced {
            store.add_record(record);
        }
        Ok(())
    }
}

fn find_unit(segments: &[&crate::signal::Segment]) -> crate::stimulus::Unit {
    segments
        .iter()
        .flat_map(|s| s.excitatory_conductances().first())
        .map(|sig| sig.unit().clone())
        .next()
        .unwrap_or_default()
}

/// Average of `signals` windows centered on the spikes of `trains`,
/// pairwise per presentation.
///
/// Window half-width is `floor(window_length / dt)` samples; spikes whose
/// window leaves the recording are dropped. With zero usable spikes the
/// result is all zeros. All signals share the sampling period of the first.
fn triggered_average(
    signals: &[&AnalogSignal],
    trains: &[&SpikeTrain],
    window_length: f64,
) -> AnalogSignal {
    let Some(first) = signals.first() else {
        return AnalogSignal::new(Vec::new(), 0.0, 1.0, crate::stimulus::Unit::dimensionless());
    };
    let dt = first.sampling_period();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let half = (window_length / dt) as usize;
    let mut accumulated = vec![0.0; 2 * half + 1];
    let mut count = 0usize;

    for (signal, train) in signals.iter().zip(trains) {
        let samples = signal.samples();
        for &time in train.times() {
            if time <= signal.t_start() || time >= signal.t_stop() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let idx = ((time - signal.t_start()) / dt) as usize;
            if idx > half && idx + half + 1 <= samples.len() {
                for (slot, &value) in accumulated.iter_mut().zip(&samples[idx - half..=idx + half])
                {
                    *slot += value;
                }
                count += 1;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let divisor = count.max(1) as f64;
    for slot in &mut accumulated {
        *slot /= divisor;
    }
    #[allow(clippy::cast_precision_loss)]
    let t_start = -(half as f64) * dt;
    AnalogSignal::new(accumulated, t_start, dt, first.unit().clone())
}
