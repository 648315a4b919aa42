//! Orientation Tuning Analysis Example
//!
//! Simulates one grating experiment (4 orientations x 5 trials, 30 neurons
//! with random preferred orientations), then runs the analysis chain:
//! trial-averaged rates, vector-averaged preference/selectivity, and F1/F0
//! modulation ratios.
//!
//! Run with: cargo run --example tuning_analysis
//! Set RUST_LOG=debug to watch the collapse and analysis internals.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sintonia_db::analysis::{
    Analysis, ModulationRatio, PeriodicTuningVectorAverage, TrialAveragedFiringRate,
};
use sintonia_db::circular::circular_dist;
use sintonia_db::{RecordStore, Segment, SpikeTrain, StimulusDescriptor, Unit};
use std::f64::consts::{PI, TAU};

const ORIENTATIONS: [f64; 4] = [0.0, PI / 4.0, PI / 2.0, 3.0 * PI / 4.0];
const TRIALS: i64 = 5;
const NEURONS: usize = 30;
const DURATION_MS: f64 = 2000.0;
const TEMPORAL_FREQUENCY_HZ: f64 = 2.0;

/// Spike times of a neuron tuned to `preferred`, responding to `orientation`
/// with a drifting-grating-modulated rate plus Poisson-like jitter.
fn tuned_spikes(rng: &mut StdRng, preferred: f64, orientation: f64) -> Vec<f64> {
    let tuning = (-circular_dist(orientation, preferred, PI).powi(2) / 0.3).exp();
    let dc = 5.0 + 45.0 * tuning;
    let amplitude = 0.8 * dc * tuning;

    let mut times = Vec::new();
    let mut t = 0.0;
    while t < DURATION_MS {
        let rate = dc + amplitude * (TAU * TEMPORAL_FREQUENCY_HZ * t / 1000.0).sin();
        // thin a 1 kHz raster against the instantaneous rate
        if rng.gen::<f64>() < rate / 1000.0 {
            times.push(t);
        }
        t += 1.0;
    }
    times
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Sintonia-DB Orientation Tuning Analysis ===\n");

    let mut rng = StdRng::seed_from_u64(42);
    let preferred: Vec<f64> = (0..NEURONS).map(|_| rng.gen_range(0.0..PI)).collect();

    // -------------------------------------------------------------------------
    // 1. Record the experiment
    // -------------------------------------------------------------------------
    println!("1. Recording {NEURONS} neurons over {} presentations...", ORIENTATIONS.len() as i64 * TRIALS);

    let mut store = RecordStore::new();
    for trial in 0..TRIALS {
        for &orientation in &ORIENTATIONS {
            let stimulus = StimulusDescriptor::builder("FullfieldDriftingGrating")
                .parameter("orientation", orientation)
                .parameter("temporal_frequency", TEMPORAL_FREQUENCY_HZ)
                .parameter("contrast", 0.8)
                .parameter("trial", trial)
                .period("orientation", PI)
                .unit("orientation", Unit::new("rad"))
                .build();

            let trains = preferred
                .iter()
                .map(|&pref| {
                    SpikeTrain::new(tuned_spikes(&mut rng, pref, orientation), 0.0, DURATION_MS)
                })
                .collect();
            store.add_segment(Segment::new("V1_Exc", stimulus, trains));
        }
    }
    println!("   Segments recorded: {}", store.segment_count());

    // -------------------------------------------------------------------------
    // 2. Trial-averaged firing rates
    // -------------------------------------------------------------------------
    println!("\n2. Averaging rates over trials...");

    TrialAveragedFiringRate::new("FullfieldDriftingGrating").execute(&mut store)?;

    let rates = store.view().with_value_name("Firing rate");
    println!("   Conditions after collapsing trials: {}", rates.record_count());
    for record in rates.records() {
        let stimulus = record.stimulus().expect("rate records carry a stimulus");
        let orientation = stimulus.parameter("orientation").and_then(|v| v.as_f64());
        let mean: f64 = record.per_neuron_values().map_or(0.0, |v| {
            v.iter().sum::<f64>() / v.len() as f64
        });
        println!(
            "   orientation={:.3} rad -> population mean {:.1} {}",
            orientation.unwrap_or(f64::NAN),
            mean,
            record.unit().symbol()
        );
    }

    // -------------------------------------------------------------------------
    // 3. Orientation preference and selectivity
    // -------------------------------------------------------------------------
    println!("\n3. Vector-averaging tuning curves...");

    PeriodicTuningVectorAverage::new("orientation").execute(&mut store)?;

    let preference = store
        .view()
        .with_value_name("orientation preference")
        .unique_record()?
        .per_neuron_values()
        .expect("preference is per-neuron")
        .to_vec();
    let selectivity = store
        .view()
        .with_value_name("orientation selectivity")
        .unique_record()?
        .per_neuron_values()
        .expect("selectivity is per-neuron")
        .to_vec();

    let mean_error: f64 = preference
        .iter()
        .zip(&preferred)
        .map(|(&estimated, &actual)| circular_dist(estimated, actual, PI))
        .sum::<f64>()
        / NEURONS as f64;
    println!("   Mean |preference error|: {mean_error:.3} rad");
    println!("   First neurons (actual -> estimated, selectivity):");
    for neuron in 0..5 {
        println!(
            "     #{neuron}: {:.3} -> {:.3} rad  (selectivity {:.2})",
            preferred[neuron], preference[neuron], selectivity[neuron]
        );
    }

    // -------------------------------------------------------------------------
    // 4. Modulation ratios at the preferred orientation
    // -------------------------------------------------------------------------
    println!("\n4. Computing F1/F0 modulation ratios...");

    ModulationRatio::new("FullfieldDriftingGrating", 10.0).execute(&mut store)?;

    let ratios = store
        .view()
        .with_value_name("Modulation ratio")
        .unique_record()?
        .per_neuron_values()
        .expect("ratios are per-neuron")
        .to_vec();
    let population_mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let complex_like = ratios.iter().filter(|&&r| r < 1.0).count();
    println!("   Population mean ratio: {population_mean:.2}");
    println!(
        "   {complex_like} of {NEURONS} neurons below 1.0 (complex-like response)"
    );

    // -------------------------------------------------------------------------
    // 5. Store contents
    // -------------------------------------------------------------------------
    println!("\n5. Store contents:");
    println!("   Sheets: {:?}", store.sheets());
    println!("   Segments: {}", store.segment_count());
    println!("   Analysis records: {}", store.record_count());

    println!("\n=== Tuning Analysis Complete ===");
    Ok(())
}
