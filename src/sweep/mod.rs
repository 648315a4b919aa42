//! Parameter-sweep loading and grid reconstruction
//!
//! A sweep run writes one record store per parameter combination, laid out
//! on disk by [`SweepDirectory`]. Loading brings the surviving combinations
//! back as a [`SweepLoad`]; a combination whose store cannot be read is a
//! soft failure, logged and counted, and later visible as a hole in the
//! dense grid. Structural problems (ragged parameter sets, non-grid spaces,
//! repeated combinations) are fatal.

mod grid;
mod layout;

pub use grid::GridExport;
pub use layout::{combination_dir_name, SweepDirectory};

use crate::error::{Error, Result};
use crate::stimulus::ParamValue;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// One point of the swept parameter space, name to value.
///
/// The map form keeps parameter order deterministic; every combination of a
/// sweep must use the same name set.
pub type Combination = BTreeMap<String, ParamValue>;

/// `name=value, name=value` rendering for logs and error messages.
pub(crate) fn combination_label<'a>(
    names: impl IntoIterator<Item = &'a str>,
    values: &[ParamValue],
) -> String {
    names
        .into_iter()
        .zip(values)
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The loaded part of a sweep: one store per surviving combination, plus
/// the count of combinations that failed to load.
///
/// Entry order follows the combination list passed to [`load_sweep`].
#[derive(Debug)]
pub struct SweepLoad<S> {
    parameter_names: Vec<String>,
    loaded: Vec<(Vec<ParamValue>, S)>,
    unloadable: usize,
}

impl<S> SweepLoad<S> {
    /// Names of the swept parameters, sorted.
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Number of successfully loaded combinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Whether nothing was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Number of combinations that failed to load.
    #[must_use]
    pub const fn unloadable(&self) -> usize {
        self.unloadable
    }

    /// Loaded entries: parameter values (aligned with
    /// [`SweepLoad::parameter_names`]) and the store.
    pub fn entries(&self) -> impl Iterator<Item = (&[ParamValue], &S)> {
        self.loaded
            .iter()
            .map(|(values, store)| (values.as_slice(), store))
    }

    /// Run `operation` over every loaded store, in load order.
    ///
    /// Stops at the first fatal error.
    ///
    /// # Errors
    ///
    /// Whatever `operation` returns.
    pub fn run_on_each<F>(&mut self, mut operation: F) -> Result<()>
    where
        F: FnMut(&[ParamValue], &mut S) -> Result<()>,
    {
        for (values, store) in &mut self.loaded {
            debug!(
                combination = %combination_label(
                    self.parameter_names.iter().map(String::as_str),
                    values,
                ),
                "running operation on combination"
            );
            operation(values, store)?;
        }
        Ok(())
    }
}

/// Load every combination of a sweep with `loader`, tolerating per-entry
/// failures.
///
/// All combinations must share one parameter name set. A failing `loader`
/// call is logged and counted, not propagated; the grid stage accounts for
/// such holes.
///
/// # Errors
///
/// [`Error::MismatchedParameterSets`] when combinations disagree on their
/// parameter names.
pub fn load_sweep<S, E, F>(combinations: &[Combination], mut loader: F) -> Result<SweepLoad<S>>
where
    E: fmt::Display,
    F: FnMut(&Combination) -> std::result::Result<S, E>,
{
    let parameter_names = check_fixed_parameter_set(combinations)?;
    let mut loaded = Vec::with_capacity(combinations.len());
    let mut unloadable = 0usize;
    for combination in combinations {
        let values: Vec<ParamValue> = combination.values().cloned().collect();
        match loader(combination) {
            Ok(store) => loaded.push((values, store)),
            Err(err) => {
                warn!(
                    combination = %combination_label(
                        parameter_names.iter().map(String::as_str),
                        &values,
                    ),
                    %err,
                    "combination failed to load; continuing without it"
                );
                unloadable += 1;
            }
        }
    }
    info!(
        loaded = loaded.len(),
        unloadable,
        parameters = parameter_names.len(),
        "sweep loaded"
    );
    Ok(SweepLoad {
        parameter_names,
        loaded,
        unloadable,
    })
}

/// [`load_sweep`] with the loader calls spread over a rayon thread pool.
///
/// Entry order and failure accounting match the sequential version exactly.
///
/// # Errors
///
/// Same as [`load_sweep`].
#[cfg(feature = "parallel")]
pub fn par_load_sweep<S, E, F>(combinations: &[Combination], loader: F) -> Result<SweepLoad<S>>
where
    S: Send,
    E: fmt::Display + Send,
    F: Fn(&Combination) -> std::result::Result<S, E> + Sync,
{
    use rayon::prelude::*;

    let parameter_names = check_fixed_parameter_set(combinations)?;
    // indexed parallel collect keeps combination order
    let results: Vec<std::result::Result<S, E>> =
        combinations.par_iter().map(|c| loader(c)).collect();

    let mut loaded = Vec::with_capacity(combinations.len());
    let mut unloadable = 0usize;
    for (combination, result) in combinations.iter().zip(results) {
        let values: Vec<ParamValue> = combination.values().cloned().collect();
        match result {
            Ok(store) => loaded.push((values, store)),
            Err(err) => {
                warn!(
                    combination = %combination_label(
                        parameter_names.iter().map(String::as_str),
                        &values,
                    ),
                    %err,
                    "combination failed to load; continuing without it"
                );
                unloadable += 1;
            }
        }
    }
    info!(
        loaded = loaded.len(),
        unloadable,
        parameters = parameter_names.len(),
        "sweep loaded"
    );
    Ok(SweepLoad {
        parameter_names,
        loaded,
        unloadable,
    })
}

/// Sorted parameter names shared by every combination.
fn check_fixed_parameter_set(combinations: &[Combination]) -> Result<Vec<String>> {
    let Some(first) = combinations.first() else {
        return Ok(Vec::new());
    };
    let names: Vec<String> = first.keys().cloned().collect();
    for combination in combinations {
        if !combination.keys().eq(names.iter()) {
            return Err(Error::MismatchedParameterSets {
                expected: names.join(", "),
                found: combination.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(pairs: &[(&str, f64)]) -> Combination {
        pairs
            .iter()
            .map(|&(name, value)| (name.to_string(), ParamValue::Float(value)))
            .collect()
    }

    #[test]
    fn load_keeps_order_and_counts_failures() {
        let combinations = vec![
            combo(&[("a", 1.0), ("b", 1.0)]),
            combo(&[("a", 1.0), ("b", 2.0)]),
            combo(&[("a", 2.0), ("b", 1.0)]),
        ];
        let load = load_sweep(&combinations, |c| {
            let a = c["a"].as_f64().unwrap_or_default();
            if a > 1.5 {
                Err("disk gone")
            } else {
                Ok(a)
            }
        })
        .unwrap();

        assert_eq!(load.len(), 2);
        assert_eq!(load.unloadable(), 1);
        assert_eq!(load.parameter_names(), ["a", "b"]);
        let entries: Vec<_> = load.entries().collect();
        assert_eq!(entries[0].0[1], ParamValue::Float(1.0));
        assert_eq!(entries[1].0[1], ParamValue::Float(2.0));
    }

    #[test]
    fn ragged_parameter_sets_are_fatal() {
        let combinations = vec![
            combo(&[("a", 1.0), ("b", 1.0)]),
            combo(&[("a", 1.0), ("c", 1.0)]),
        ];
        let err = load_sweep(&combinations, |_| Ok::<_, String>(0)).unwrap_err();
        assert!(matches!(err, Error::MismatchedParameterSets { .. }));
    }

    #[test]
    fn empty_sweep_loads_empty() {
        let load = load_sweep(&[], |_| Ok::<_, String>(0)).unwrap();
        assert!(load.is_empty());
        assert!(load.parameter_names().is_empty());
    }

    #[test]
    fn run_on_each_visits_all_and_stops_on_error() {
        let combinations = vec![combo(&[("a", 1.0)]), combo(&[("a", 2.0)])];
        let mut load = load_sweep(&combinations, |_| Ok::<_, String>(0u32)).unwrap();

        load.run_on_each(|_, store| {
            *store += 1;
            Ok(())
        })
        .unwrap();
        assert!(load.entries().all(|(_, &store)| store == 1));

        let err = load
            .run_on_each(|values, _| {
                if values[0] == ParamValue::Float(2.0) {
                    Err(Error::Precondition("boom".to_string()))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_load_matches_sequential() {
        let combinations: Vec<Combination> = (0..16)
            .map(|i| combo(&[("a", f64::from(i % 4)), ("b", f64::from(i / 4))]))
            .collect();
        let loader = |c: &Combination| {
            let a = c["a"].as_f64().unwrap_or_default();
            if a == 3.0 {
                Err("nope")
            } else {
                Ok(a)
            }
        };
        let sequential = load_sweep(&combinations, loader).unwrap();
        let parallel = par_load_sweep(&combinations, loader).unwrap();
        assert_eq!(parallel.len(), sequential.len());
        assert_eq!(parallel.unloadable(), sequential.unloadable());
        let seq: Vec<_> = sequential.entries().map(|(v, s)| (v.to_vec(), *s)).collect();
        let par: Vec<_> = parallel.entries().map(|(v, s)| (v.to_vec(), *s)).collect();
        assert_eq!(seq, par);
    }
}
