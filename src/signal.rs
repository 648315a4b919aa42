//! Recorded signals: spike trains, analog traces, per-presentation segments
//!
//! All times are in milliseconds. A [`Segment`] bundles everything recorded
//! from one sheet during one stimulus presentation; neuron index `i` refers
//! to the same cell across its spike trains and conductance traces.

use crate::stimulus::{StimulusDescriptor, Unit};
use serde::{Deserialize, Serialize};

/// Spike times of one neuron over one recording window.
///
/// Times are in milliseconds, ascending, within `[t_start, t_stop]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeTrain {
    times: Vec<f64>,
    t_start: f64,
    t_stop: f64,
}

impl SpikeTrain {
    /// New spike train over `[t_start, t_stop]` (ms). `times` must be
    /// ascending and inside the window.
    #[must_use]
    pub fn new(times: Vec<f64>, t_start: f64, t_stop: f64) -> Self {
        debug_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        Self {
            times,
            t_start,
            t_stop,
        }
    }

    /// Spike times in milliseconds.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Window start (ms).
    #[must_use]
    pub const fn t_start(&self) -> f64 {
        self.t_start
    }

    /// Window end (ms).
    #[must_use]
    pub const fn t_stop(&self) -> f64 {
        self.t_stop
    }

    /// Window length (ms).
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.t_stop - self.t_start
    }

    /// Number of spikes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the train holds no spikes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Mean firing rate in spikes per second. Zero for an empty window.
    #[must_use]
    pub fn mean_rate(&self) -> f64 {
        let duration_s = self.duration() / 1000.0;
        if duration_s <= 0.0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.times.len() as f64;
        count / duration_s
    }
}

/// Regularly sampled analog trace (conductance, membrane potential, PSTH
/// rows, autocorrelation functions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogSignal {
    samples: Vec<f64>,
    t_start: f64,
    sampling_period: f64,
    unit: Unit,
}

impl AnalogSignal {
    /// New signal starting at `t_start` (ms) with one sample every
    /// `sampling_period` ms.
    #[must_use]
    pub const fn new(samples: Vec<f64>, t_start: f64, sampling_period: f64, unit: Unit) -> Self {
        Self {
            samples,
            t_start,
            sampling_period,
            unit,
        }
    }

    /// Sample values.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Time of the first sample (ms).
    #[must_use]
    pub const fn t_start(&self) -> f64 {
        self.t_start
    }

    /// Time just past the last sample (ms).
    #[must_use]
    pub fn t_stop(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = self.samples.len() as f64;
        self.t_start + n * self.sampling_period
    }

    /// Sampling period (ms).
    #[must_use]
    pub const fn sampling_period(&self) -> f64 {
        self.sampling_period
    }

    /// Unit of the samples.
    #[must_use]
    pub const fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the signal holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Everything recorded from one sheet during one stimulus presentation.
///
/// Spike trains are indexed by neuron; conductance traces, when recorded,
/// use the same indexing. Conductance vectors are either empty or exactly
/// as long as `spike_trains`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    sheet_name: String,
    stimulus: StimulusDescriptor,
    spike_trains: Vec<SpikeTrain>,
    excitatory_conductances: Vec<AnalogSignal>,
    inhibitory_conductances: Vec<AnalogSignal>,
}

impl Segment {
    /// New spiking-only segment.
    pub fn new(
        sheet_name: impl Into<String>,
        stimulus: StimulusDescriptor,
        spike_trains: Vec<SpikeTrain>,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            stimulus,
            spike_trains,
            excitatory_conductances: Vec::new(),
            inhibitory_conductances: Vec::new(),
        }
    }

    /// Attach per-neuron excitatory and inhibitory conductance traces.
    #[must_use]
    pub fn with_conductances(
        mut self,
        excitatory: Vec<AnalogSignal>,
        inhibitory: Vec<AnalogSignal>,
    ) -> Self {
        self.excitatory_conductances = excitatory;
        self.inhibitory_conductances = inhibitory;
        self
    }

    /// Sheet the segment was recorded from.
    #[must_use]
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Descriptor of the presentation that produced this segment.
    #[must_use]
    pub const fn stimulus(&self) -> &StimulusDescriptor {
        &self.stimulus
    }

    /// Per-neuron spike trains.
    #[must_use]
    pub fn spike_trains(&self) -> &[SpikeTrain] {
        &self.spike_trains
    }

    /// Per-neuron excitatory conductances; empty when not recorded.
    #[must_use]
    pub fn excitatory_conductances(&self) -> &[AnalogSignal] {
        &self.excitatory_conductances
    }

    /// Per-neuron inhibitory conductances; empty when not recorded.
    #[must_use]
    pub fn inhibitory_conductances(&self) -> &[AnalogSignal] {
        &self.inhibitory_conductances
    }

    /// Number of recorded neurons.
    #[must_use]
    pub fn num_neurons(&self) -> usize {
        self.spike_trains.len()
    }

    /// Mean firing rate of every neuron, in spikes per second.
    #[must_use]
    pub fn mean_rates(&self) -> Vec<f64> {
        self.spike_trains.iter().map(SpikeTrain::mean_rate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::StimulusDescriptor;

    #[test]
    fn mean_rate_converts_ms_window_to_hz() {
        // 5 spikes over 500 ms -> 10 spikes/s
        let train = SpikeTrain::new(vec![10.0, 100.0, 200.0, 300.0, 400.0], 0.0, 500.0);
        assert!((train.mean_rate() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn mean_rate_of_degenerate_window_is_zero() {
        let train = SpikeTrain::new(vec![], 100.0, 100.0);
        assert_eq!(train.mean_rate(), 0.0);
    }

    #[test]
    fn analog_signal_t_stop() {
        let sig = AnalogSignal::new(vec![0.0; 10], -5.0, 0.5, Unit::new("nS"));
        assert!((sig.t_stop() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn segment_rates_follow_neuron_order() {
        let stim = StimulusDescriptor::builder("Null").build();
        let seg = Segment::new(
            "V1",
            stim,
            vec![
                SpikeTrain::new(vec![1.0], 0.0, 1000.0),
                SpikeTrain::new(vec![1.0, 2.0, 3.0], 0.0, 1000.0),
            ],
        );
        assert_eq!(seg.mean_rates(), vec![1.0, 3.0]);
        assert_eq!(seg.num_neurons(), 2);
    }
}
