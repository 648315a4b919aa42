//! Dense grid reconstruction from sparse sweep results

use super::{combination_label, SweepLoad};
use crate::error::{Error, Result};
use crate::record::RecordKind;
use crate::store::{RecordStore, StoreView};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One reconstructed value grid: an n-dimensional matrix over the sweep's
/// parameter axes.
///
/// `values` has one axis per swept parameter, in `parameter_names` order;
/// index `i` along axis `d` corresponds to `parameter_values[d][i]`. Cells
/// of combinations that failed to load hold NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridExport {
    /// Name of the scalar record the grid was built from.
    pub value_name: String,
    /// Swept parameter names, one per grid axis.
    pub parameter_names: Vec<String>,
    /// Sorted distinct values of each parameter, aligned with axes.
    pub parameter_values: Vec<Vec<crate::stimulus::ParamValue>>,
    /// The dense grid; NaN marks an unloadable combination.
    pub values: ArrayD<f64>,
}

impl SweepLoad<RecordStore> {
    /// Sorted distinct names of the scalar records in the first loaded
    /// store. These are the grids [`SweepLoad::export_grids`] will write.
    #[must_use]
    pub fn value_names(&self) -> Vec<String> {
        let Some((_, first)) = self.loaded.first() else {
            return Vec::new();
        };
        first
            .view()
            .with_kind(RecordKind::SingleValue)
            .records()
            .iter()
            .map(|r| r.value_name().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Reconstruct the dense grid of one scalar value across the sweep.
    ///
    /// `query` narrows each store's view before the scalar is extracted
    /// (identity for plain sweeps); after it, exactly one scalar record
    /// named `value_name` must remain per store. Axes are the sorted
    /// distinct values of each parameter; cells of unloadable combinations
    /// stay NaN.
    ///
    /// # Errors
    ///
    /// [`Error::IncompleteSweep`] when loaded plus unloadable combinations
    /// do not tile the axes' full cross product,
    /// [`Error::DuplicateCombination`] when two loaded combinations map to
    /// one cell, and [`Error::AmbiguousRecord`] when a store does not hold
    /// exactly one matching scalar.
    pub fn build_grid<Q>(&self, value_name: &str, query: Q) -> Result<GridExport>
    where
        Q: Fn(StoreView<'_>) -> StoreView<'_>,
    {
        let axes = self.axes();
        let dims: Vec<usize> = axes.iter().map(Vec::len).collect();
        let expected: usize = dims.iter().product();
        if self.loaded.len() + self.unloadable != expected {
            return Err(Error::IncompleteSweep {
                loaded: self.loaded.len(),
                unloadable: self.unloadable,
                expected,
            });
        }

        let mut grid = ArrayD::from_elem(IxDyn(&dims), f64::NAN);
        for (values, store) in &self.loaded {
            let record = query(store.view())
                .with_kind(RecordKind::SingleValue)
                .with_value_name(value_name)
                .unique_record()?;
            let scalar = record.single_value().ok_or_else(|| {
                Error::Precondition(format!(
                    "record '{value_name}' is not a scalar after kind filtering"
                ))
            })?;

            let index = self.cell_index(&axes, values)?;
            let cell = &mut grid[IxDyn(&index)];
            if !cell.is_nan() {
                return Err(Error::DuplicateCombination {
                    combination: combination_label(
                        self.parameter_names.iter().map(String::as_str),
                        values,
                    ),
                });
            }
            *cell = scalar;
        }

        debug!(
            value_name,
            cells = expected,
            holes = self.unloadable,
            "reconstructed grid"
        );
        Ok(GridExport {
            value_name: value_name.to_string(),
            parameter_names: self.parameter_names.clone(),
            parameter_values: axes,
            values: grid,
        })
    }

    /// Build and write one JSON grid file per scalar value name into
    /// `out_dir`, returning the written paths.
    ///
    /// Every grid is assembled before the first file is written, so a
    /// fatal error on any value name leaves `out_dir` untouched.
    ///
    /// # Errors
    ///
    /// The fatal cases of [`SweepLoad::build_grid`], plus IO failures.
    pub fn export_grids<Q>(&self, query: Q, out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>>
    where
        Q: Fn(StoreView<'_>) -> StoreView<'_>,
    {
        let grids = self
            .value_names()
            .iter()
            .map(|name| self.build_grid(name, &query))
            .collect::<Result<Vec<_>>>()?;

        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;

        let mut written = Vec::with_capacity(grids.len());
        for grid in &grids {
            let path = out_dir.join(format!("{}.json", file_stem(&grid.value_name)));
            std::fs::write(&path, serde_json::to_string_pretty(grid)?)?;
            info!(value_name = %grid.value_name, path = %path.display(), "exported grid");
            written.push(path);
        }
        Ok(written)
    }

    /// Sorted distinct values per parameter, in parameter order.
    fn axes(&self) -> Vec<Vec<crate::stimulus::ParamValue>> {
        (0..self.parameter_names.len())
            .map(|axis| {
                let mut values: Vec<_> = self
                    .loaded
                    .iter()
                    .map(|(values, _)| values[axis].clone())
                    .collect();
                values.sort_unstable();
                values.dedup();
                values
            })
            .collect()
    }

    /// Grid index of one combination, by binary search on each axis.
    fn cell_index(
        &self,
        axes: &[Vec<crate::stimulus::ParamValue>],
        values: &[crate::stimulus::ParamValue],
    ) -> Result<Vec<usize>> {
        axes.iter()
            .zip(values)
            .map(|(axis, value)| {
                axis.binary_search(value).map_err(|_| {
                    // axes are built from the loaded values, so a miss means
                    // the load was mutated out from under us
                    Error::Precondition(format!("value {value} missing from its grid axis"))
                })
            })
            .collect()
    }
}

fn file_stem(value_name: &str) -> String {
    value_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}
