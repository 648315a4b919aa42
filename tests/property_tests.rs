//! Property-based tests for sintonia-db
//!
//! Mathematical invariants of the collapse engine, the circular statistics,
//! PSTH binning and the sweep grid reconstruction:
//! - Collapsing conserves values and drops exactly the excluded parameters
//! - Circular distances and means stay inside their defined ranges
//! - A full sweep reconstructs with no NaN holes
//! - Run with ProptestConfig::with_cases(100)

use ndarray::IxDyn;
use proptest::prelude::*;
use sintonia_db::analysis::Psth;
use sintonia_db::circular::{circular_dist, circular_mean};
use sintonia_db::sweep::{combination_dir_name, load_sweep, Combination};
use sintonia_db::{
    collapse, collapse_to_curves, AnalysisRecord, ParamValue, RecordPayload, RecordStore,
    SpikeTrain, StimulusDescriptor,
};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Presentation descriptors over `conditions x trials`, in a random
/// presentation order.
fn arb_presentations() -> impl Strategy<Value = Vec<StimulusDescriptor>> {
    (1usize..5, 1usize..4)
        .prop_flat_map(|(conditions, trials)| {
            let pairs: Vec<(usize, usize)> = (0..conditions)
                .flat_map(|c| (0..trials).map(move |t| (c, t)))
                .collect();
            Just(pairs).prop_shuffle()
        })
        .prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(condition, trial)| {
                    StimulusDescriptor::builder("Grating")
                        .parameter("orientation", condition as f64 * 0.4)
                        .parameter("trial", trial as i64)
                        .build()
                })
                .collect()
        })
}

/// Distinct orientation values in a random order.
fn arb_unique_orientations() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::btree_set(0u32..64, 1..8)
        .prop_map(|set| set.into_iter().map(|v| f64::from(v) * 0.1).collect::<Vec<f64>>())
        .prop_shuffle()
}

/// Ascending spike times inside a 1000 ms window.
fn arb_spike_times() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.0f64..1000.0, 0..40).prop_map(|mut times| {
        times.sort_by(f64::total_cmp);
        times
    })
}

/// The `rows x cols` cross product of two float parameters.
fn grid_combinations(rows: usize, cols: usize) -> Vec<Combination> {
    let mut combinations = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let mut combination = Combination::new();
            combination.insert("a".to_string(), ParamValue::Float(r as f64));
            combination.insert("b".to_string(), ParamValue::Float(c as f64));
            combinations.push(combination);
        }
    }
    combinations
}

fn scalar_store(name: &str, value: f64) -> RecordStore {
    let mut store = RecordStore::new();
    store.add_record(AnalysisRecord::builder(name, "V1", RecordPayload::SingleValue(value)).build());
    store
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Collapse Engine Properties
    // ========================================================================

    /// Property: collapsing conserves the multiset of input values
    #[test]
    fn prop_collapse_conserves_values(descriptors in arb_presentations()) {
        let values: Vec<f64> = (0..descriptors.len()).map(|i| i as f64).collect();
        let groups = collapse(values.clone(), &descriptors, &["trial"], false).unwrap();

        let total: usize = groups.iter().map(|g| g.values.len()).sum();
        prop_assert_eq!(total, descriptors.len());

        let mut collected: Vec<f64> = groups.iter().flat_map(|g| g.values.clone()).collect();
        collected.sort_by(f64::total_cmp);
        prop_assert_eq!(collected, values);
    }

    /// Property: re-grouping the group representatives by the same
    /// exclude-set leaves the grouping unchanged
    #[test]
    fn prop_collapse_is_idempotent(descriptors in arb_presentations()) {
        let values: Vec<f64> = (0..descriptors.len()).map(|i| i as f64).collect();
        let groups = collapse(values, &descriptors, &["trial"], false).unwrap();

        let representatives: Vec<StimulusDescriptor> =
            groups.iter().map(|g| g.descriptor.clone()).collect();
        let regrouped = collapse(
            groups.iter().map(|g| g.values.clone()).collect(),
            &representatives,
            &["trial"],
            false,
        )
        .unwrap();

        prop_assert_eq!(regrouped.len(), groups.len());
        for (regroup, group) in regrouped.iter().zip(&groups) {
            prop_assert_eq!(&regroup.descriptor, &group.descriptor);
            prop_assert_eq!(regroup.values.len(), 1);
            prop_assert_eq!(&regroup.values[0], &group.values);
        }
    }

    /// Property: the number of groups is between 1 and the input length
    #[test]
    fn prop_collapse_group_count_bounded(descriptors in arb_presentations()) {
        let values = vec![0.0; descriptors.len()];
        let groups = collapse(values, &descriptors, &["trial"], false).unwrap();
        prop_assert!(!groups.is_empty());
        prop_assert!(groups.len() <= descriptors.len());
    }

    /// Property: group descriptors drop the excluded parameter and keep the rest
    #[test]
    fn prop_collapse_descriptors_drop_excluded(descriptors in arb_presentations()) {
        let values = vec![0.0; descriptors.len()];
        let groups = collapse(values, &descriptors, &["trial"], false).unwrap();
        for group in &groups {
            prop_assert!(!group.descriptor.has_parameter("trial"));
            prop_assert!(group.descriptor.has_parameter("orientation"));
        }
    }

    /// Property: within one group, values keep their input order
    #[test]
    fn prop_collapse_preserves_order_within_groups(descriptors in arb_presentations()) {
        let values: Vec<f64> = (0..descriptors.len()).map(|i| i as f64).collect();
        let groups = collapse(values, &descriptors, &["trial"], false).unwrap();
        for group in &groups {
            for pair in group.values.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }

    /// Property: excluding every parameter collapses to one group
    #[test]
    fn prop_full_exclusion_yields_one_group(descriptors in arb_presentations()) {
        let values = vec![0.0; descriptors.len()];
        let groups =
            collapse(values, &descriptors, &["orientation", "trial"], false).unwrap();
        prop_assert_eq!(groups.len(), 1);
        prop_assert_eq!(groups[0].values.len(), descriptors.len());
    }

    /// Property: tuning curves come out sorted by the varied parameter,
    /// with values still aligned to their parameter value
    #[test]
    fn prop_curves_sorted_and_aligned(orientations in arb_unique_orientations()) {
        let descriptors: Vec<StimulusDescriptor> = orientations
            .iter()
            .map(|&orientation| {
                StimulusDescriptor::builder("Grating")
                    .parameter("orientation", orientation)
                    .build()
            })
            .collect();
        let values: Vec<f64> = orientations.iter().map(|o| o * 3.0).collect();

        let curves = collapse_to_curves(values, &descriptors, "orientation").unwrap();
        prop_assert_eq!(curves.len(), 1);

        let curve = &curves[0];
        for pair in curve.parameter_values.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for (value, parameter) in curve.values.iter().zip(&curve.parameter_values) {
            let orientation = parameter.as_f64().unwrap();
            prop_assert!((value - orientation * 3.0).abs() < 1e-12);
        }
    }

    // ========================================================================
    // Circular Statistics Properties
    // ========================================================================

    /// Property: circular distance is symmetric and within [0, period/2]
    #[test]
    fn prop_circular_dist_symmetric_and_bounded(
        a in -10.0f64..10.0,
        b in -10.0f64..10.0,
        period in 0.5f64..10.0
    ) {
        let d = circular_dist(a, b, period);
        prop_assert!((d - circular_dist(b, a, period)).abs() < 1e-9);
        prop_assert!(d >= 0.0);
        prop_assert!(d <= period / 2.0 + 1e-9);
    }

    /// Property: circular distance is invariant under full-period shifts
    #[test]
    fn prop_circular_dist_period_invariant(
        a in -10.0f64..10.0,
        b in -10.0f64..10.0,
        period in 0.5f64..10.0,
        turns in -3i32..3
    ) {
        let shifted = a + f64::from(turns) * period;
        let d = circular_dist(a, b, period);
        prop_assert!((circular_dist(shifted, b, period) - d).abs() < 1e-9);
    }

    /// Property: circular mean lies in [0, period), resultant in [0, 1]
    #[test]
    fn prop_circular_mean_in_range(
        angles in proptest::collection::vec(-10.0f64..10.0, 1..10),
        period in 0.5f64..10.0
    ) {
        let weights = vec![1.0; angles.len()];
        let (mean, resultant) = circular_mean(&angles, &weights, period);
        prop_assert!(mean >= 0.0);
        prop_assert!(mean < period);
        prop_assert!(resultant >= 0.0);
        prop_assert!(resultant <= 1.0 + 1e-9);
    }

    /// Property: all weight on one angle makes that angle the mean, with
    /// resultant length 1
    #[test]
    fn prop_circular_mean_of_point_mass(
        angle in -10.0f64..10.0,
        weight in 0.1f64..10.0,
        period in 0.5f64..10.0
    ) {
        let (mean, resultant) = circular_mean(&[angle], &[weight], period);
        prop_assert!(circular_dist(mean, angle, period) < 1e-6);
        prop_assert!((resultant - 1.0).abs() < 1e-9);
    }

    // ========================================================================
    // PSTH Properties
    // ========================================================================

    /// Property: binning conserves the spike count
    #[test]
    fn prop_psth_conserves_spike_count(times in arb_spike_times()) {
        let count = times.len();
        let train = SpikeTrain::new(times, 0.0, 1000.0);
        let psth = Psth::from_spike_trains(&[train], 10.0);

        let binned: f64 = psth.rates().iter().sum::<f64>() * psth.bin_length() / 1000.0;
        prop_assert!((binned - count as f64).abs() < 1e-6);
    }

    // ========================================================================
    // Sweep Grid Properties
    // ========================================================================

    /// Property: a full cross product reconstructs with every cell filled
    #[test]
    fn prop_full_grid_has_no_holes(rows in 1usize..5, cols in 1usize..5) {
        let combinations = grid_combinations(rows, cols);
        let load = load_sweep(&combinations, |c| {
            let value =
                10.0 * c["a"].as_f64().unwrap() + c["b"].as_f64().unwrap();
            Ok::<_, String>(scalar_store("score", value))
        })
        .unwrap();

        let grid = load.build_grid("score", |v| v).unwrap();
        prop_assert_eq!(grid.values.shape(), &[rows, cols]);
        for r in 0..rows {
            for c in 0..cols {
                let expected = 10.0 * r as f64 + c as f64;
                prop_assert_eq!(grid.values[IxDyn(&[r, c])], expected);
            }
        }
    }

    /// Property: combination directory names never contain path separators
    /// or whitespace
    #[test]
    fn prop_dir_names_are_path_safe(
        simulation in "[a-zA-Z0-9 /]{1,12}",
        text in "[a-zA-Z0-9 /]{0,10}",
        value in -100.0f64..100.0
    ) {
        let mut combination = Combination::new();
        combination.insert("label".to_string(), ParamValue::Text(text));
        combination.insert("rate".to_string(), ParamValue::Float(value));

        let name = combination_dir_name(&simulation, &combination);
        prop_assert!(!name.contains('/'));
        prop_assert!(!name.contains('\\'));
        prop_assert!(!name.chars().any(char::is_whitespace));
    }
}
