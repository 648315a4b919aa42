//! Parameter Sweep Reconstruction Example
//!
//! Writes a 3x4 contrast/size sweep to disk (one record store per parameter
//! combination), corrupts one store on purpose, then loads the sweep back,
//! analyses every surviving combination and reconstructs dense result grids
//! with a NaN hole where the corrupt store used to be.
//!
//! Run with: cargo run --example parameter_sweep
//! Set RUST_LOG=debug to watch the loader and grid internals.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sintonia_db::analysis::{Analysis, TrialAveragedFiringRate};
use sintonia_db::sweep::{Combination, SweepDirectory};
use sintonia_db::{
    AnalysisRecord, ParamValue, RecordPayload, RecordStore, Segment, SpikeTrain,
    StimulusDescriptor,
};

const CONTRASTS: [f64; 3] = [0.1, 0.5, 1.0];
const SIZES: [f64; 4] = [0.5, 1.0, 2.0, 4.0];
const TRIALS: i64 = 3;
const DURATION_MS: f64 = 1000.0;

fn combinations() -> Vec<Combination> {
    let mut all = Vec::new();
    for &contrast in &CONTRASTS {
        for &size in &SIZES {
            let mut combination = Combination::new();
            combination.insert("contrast".to_string(), ParamValue::Float(contrast));
            combination.insert("size".to_string(), ParamValue::Float(size));
            all.push(combination);
        }
    }
    all
}

/// Simulate one combination: a contrast-and-size-dependent Poisson response.
fn simulate(rng: &mut StdRng, combination: &Combination) -> RecordStore {
    let contrast = combination["contrast"].as_f64().unwrap_or_default();
    let size = combination["size"].as_f64().unwrap_or_default();
    let rate = 40.0 * contrast * (size / (size + 1.0));

    let mut store = RecordStore::new();
    for trial in 0..TRIALS {
        let stimulus = StimulusDescriptor::builder("DriftingGrating")
            .parameter("contrast", contrast)
            .parameter("size", size)
            .parameter("trial", trial)
            .build();
        let trains = (0..10)
            .map(|_| {
                let times = (0..DURATION_MS as usize)
                    .filter(|_| rng.gen::<f64>() < rate / 1000.0)
                    .map(|ms| ms as f64 + 0.5)
                    .collect();
                SpikeTrain::new(times, 0.0, DURATION_MS)
            })
            .collect();
        store.add_segment(Segment::new("V1_Exc", stimulus, trains));
    }
    store
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Sintonia-DB Parameter Sweep Reconstruction ===\n");

    let mut rng = StdRng::seed_from_u64(7);
    let dir = tempfile::tempdir()?;
    let sweep = SweepDirectory::new(dir.path().join("contrast_size_sweep"), "V1Model");

    // -------------------------------------------------------------------------
    // 1. Run the sweep: one store per combination, written to disk
    // -------------------------------------------------------------------------
    let all = combinations();
    println!("1. Simulating {} combinations into {}...", all.len(), sweep.root().display());

    sweep.write_manifest(&all)?;
    for combination in &all {
        sweep.save_store(combination, &simulate(&mut rng, combination))?;
    }

    // -------------------------------------------------------------------------
    // 2. Lose one combination to disk corruption
    // -------------------------------------------------------------------------
    let victim = &all[6];
    println!(
        "\n2. Corrupting the store of contrast={}, size={}...",
        victim["contrast"], victim["size"]
    );
    std::fs::write(sweep.store_path(victim), "truncated by a full disk")?;

    // -------------------------------------------------------------------------
    // 3. Load the sweep back
    // -------------------------------------------------------------------------
    println!("\n3. Loading the sweep...");

    let mut load = sweep.load()?;
    println!(
        "   Loaded {} of {} combinations ({} unloadable)",
        load.len(),
        load.len() + load.unloadable(),
        load.unloadable()
    );
    println!("   Swept parameters: {:?}", load.parameter_names());

    // -------------------------------------------------------------------------
    // 4. Analyse every surviving combination
    // -------------------------------------------------------------------------
    println!("\n4. Trial-averaging each combination...");

    load.run_on_each(|_, store| {
        TrialAveragedFiringRate::new("DriftingGrating").execute(store)?;
        let record = store
            .view()
            .with_value_name("Firing rate")
            .unique_record()?;
        let values = record.per_neuron_values().unwrap_or_default();
        let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
        store.add_record(
            AnalysisRecord::builder("mean rate", "V1_Exc", RecordPayload::SingleValue(mean))
                .algorithm("sweep summary")
                .build(),
        );
        Ok(())
    })?;

    // -------------------------------------------------------------------------
    // 5. Reconstruct the dense grid
    // -------------------------------------------------------------------------
    println!("\n5. Reconstructing the contrast x size grid...");

    let grid = load.build_grid("mean rate", |view| view)?;
    println!("   Axes: {:?}", grid.parameter_names);
    println!("   Shape: {:?}\n", grid.values.shape());

    print!("   contrast \\ size");
    for size in &SIZES {
        print!("{size:>9}");
    }
    println!();
    for (c, &contrast) in CONTRASTS.iter().enumerate() {
        print!("   {contrast:>15}");
        for s in 0..SIZES.len() {
            let cell = grid.values[ndarray::IxDyn(&[c, s])];
            if cell.is_nan() {
                print!("{:>9}", "-");
            } else {
                print!("{cell:>9.1}");
            }
        }
        println!();
    }
    println!("\n   ('-' marks the corrupted combination)");

    // -------------------------------------------------------------------------
    // 6. Export grids as JSON
    // -------------------------------------------------------------------------
    println!("\n6. Exporting grids...");

    let written = load.export_grids(|view| view, sweep.root().join("grids"))?;
    for path in &written {
        println!("   wrote {}", path.display());
    }

    println!("\n=== Sweep Reconstruction Complete ===");
    Ok(())
}
