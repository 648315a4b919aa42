//! Peri-stimulus time histograms

use crate::signal::SpikeTrain;
use ndarray::Array2;

/// Binned instantaneous firing rates of one segment: a `bins x neurons`
/// matrix in spikes per second.
///
/// All spike trains of one segment share a recording window; the histogram
/// takes its window from the first train. The bin count is the rounded
/// window-to-bin ratio, so a window that is not an exact multiple of the bin
/// length folds its trailing spikes into the last bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Psth {
    rates: Array2<f64>,
    t_start: f64,
    bin_length: f64,
}

impl Psth {
    /// Bin the given spike trains at `bin_length` milliseconds.
    #[must_use]
    pub fn from_spike_trains(trains: &[SpikeTrain], bin_length: f64) -> Self {
        let Some(first) = trains.first() else {
            return Self {
                rates: Array2::zeros((0, 0)),
                t_start: 0.0,
                bin_length,
            };
        };
        let t_start = first.t_start();
        let duration = first.duration();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let num_bins = (duration / bin_length).round().max(0.0) as usize;

        let mut rates = Array2::zeros((num_bins, trains.len()));
        if num_bins == 0 {
            return Self {
                rates,
                t_start,
                bin_length,
            };
        }

        // one spike contributes 1/bin_length spikes per ms = 1000/bin_length Hz
        let rate_per_spike = 1000.0 / bin_length;
        for (neuron, train) in trains.iter().enumerate() {
            for &time in train.times() {
                if time < t_start || time > first.t_stop() {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let bin = (((time - t_start) / bin_length) as usize).min(num_bins - 1);
                rates[[bin, neuron]] += rate_per_spike;
            }
        }
        Self {
            rates,
            t_start,
            bin_length,
        }
    }

    /// Rate matrix, `bins x neurons`, in spikes per second.
    #[must_use]
    pub const fn rates(&self) -> &Array2<f64> {
        &self.rates
    }

    /// Rate course of one neuron as a plain vector.
    #[must_use]
    pub fn neuron_rates(&self, neuron: usize) -> Vec<f64> {
        self.rates.column(neuron).to_vec()
    }

    /// Number of time bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.rates.nrows()
    }

    /// Number of neurons.
    #[must_use]
    pub fn num_neurons(&self) -> usize {
        self.rates.ncols()
    }

    /// Start of the binned window (ms).
    #[must_use]
    pub const fn t_start(&self) -> f64 {
        self.t_start
    }

    /// Bin length (ms).
    #[must_use]
    pub const fn bin_length(&self) -> f64 {
        self.bin_length
    }

    /// Binned window length (ms).
    #[must_use]
    pub fn duration(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let bins = self.num_bins() as f64;
        bins * self.bin_length
    }

    /// Element-wise mean of histograms with identical shape and binning.
    ///
    /// # Panics
    ///
    /// On an empty slice or mismatched shapes; callers validate shape
    /// uniformity beforehand.
    #[must_use]
    pub fn average(psths: &[Self]) -> Self {
        assert!(!psths.is_empty(), "cannot average zero histograms");
        let first = &psths[0];
        let mut rates = Array2::zeros(first.rates.raw_dim());
        for psth in psths {
            assert_eq!(
                psth.rates.raw_dim(),
                first.rates.raw_dim(),
                "histogram shapes must match"
            );
            rates += &psth.rates;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = psths.len() as f64;
        rates /= n;
        Self {
            rates,
            t_start: first.t_start,
            bin_length: first.bin_length,
        }
    }
}
