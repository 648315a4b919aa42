//! On-disk layout of sweep results

use super::{load_sweep, Combination, SweepLoad};
use crate::error::Result;
use crate::store::RecordStore;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

const MANIFEST_FILE: &str = "manifest.json";
const STORE_FILE: &str = "records.json";

/// Directory name of one combination:
/// `<simulation>_<name>=<value>_<name>=<value>` with parameters in name
/// order. Path separators and whitespace inside values become `-`.
#[must_use]
pub fn combination_dir_name(simulation_name: &str, combination: &Combination) -> String {
    let mut name = sanitize(simulation_name);
    for (parameter, value) in combination {
        let _ = write!(name, "_{}={}", sanitize(parameter), sanitize(&value.to_string()));
    }
    name
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_whitespace() {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Root directory of one parameter sweep.
///
/// The layout is one subdirectory per combination (named by
/// [`combination_dir_name`]) holding a `records.json` store, plus a
/// `manifest.json` at the root listing every combination of the sweep.
///
/// # Example
///
/// ```no_run
/// use sintonia_db::sweep::SweepDirectory;
///
/// let sweep = SweepDirectory::new("runs/contrast_sweep", "V1Model");
/// let load = sweep.load()?;
/// println!("{} of {} combinations loaded", load.len(), load.len() + load.unloadable());
/// # Ok::<(), sintonia_db::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SweepDirectory {
    root: PathBuf,
    simulation_name: String,
}

impl SweepDirectory {
    /// Sweep rooted at `root` for the given simulation name.
    pub fn new(root: impl Into<PathBuf>, simulation_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            simulation_name: simulation_name.into(),
        }
    }

    /// Sweep root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Simulation name used as the directory-name prefix.
    #[must_use]
    pub fn simulation_name(&self) -> &str {
        &self.simulation_name
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Directory of one combination.
    #[must_use]
    pub fn combination_dir(&self, combination: &Combination) -> PathBuf {
        self.root
            .join(combination_dir_name(&self.simulation_name, combination))
    }

    /// Store file of one combination.
    #[must_use]
    pub fn store_path(&self, combination: &Combination) -> PathBuf {
        self.combination_dir(combination).join(STORE_FILE)
    }

    /// Write the combination manifest, creating the root as needed.
    ///
    /// # Errors
    ///
    /// IO or serialization failures.
    pub fn write_manifest(&self, combinations: &[Combination]) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(combinations)?;
        std::fs::write(self.manifest_path(), json)?;
        debug!(
            path = %self.manifest_path().display(),
            combinations = combinations.len(),
            "wrote sweep manifest"
        );
        Ok(())
    }

    /// Read the combination manifest.
    ///
    /// # Errors
    ///
    /// IO or deserialization failures.
    pub fn read_manifest(&self) -> Result<Vec<Combination>> {
        let json = std::fs::read_to_string(self.manifest_path())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save one combination's store, creating its directory as needed.
    ///
    /// # Errors
    ///
    /// IO or serialization failures.
    pub fn save_store(&self, combination: &Combination, store: &RecordStore) -> Result<()> {
        std::fs::create_dir_all(self.combination_dir(combination))?;
        store.save_json(self.store_path(combination))
    }

    /// Load one combination's store.
    ///
    /// # Errors
    ///
    /// IO or deserialization failures.
    pub fn load_store(&self, combination: &Combination) -> Result<RecordStore> {
        RecordStore::load_json(self.store_path(combination))
    }

    /// Load the whole sweep per its manifest. Unreadable stores are soft
    /// failures; see [`load_sweep`].
    ///
    /// # Errors
    ///
    /// Manifest IO failures and the fatal cases of [`load_sweep`].
    pub fn load(&self) -> Result<SweepLoad<RecordStore>> {
        let combinations = self.read_manifest()?;
        load_sweep(&combinations, |combination| self.load_store(combination))
    }

    /// [`SweepDirectory::load`] with store reads spread over a rayon pool.
    ///
    /// # Errors
    ///
    /// Same as [`SweepDirectory::load`].
    #[cfg(feature = "parallel")]
    pub fn par_load(&self) -> Result<SweepLoad<RecordStore>> {
        let combinations = self.read_manifest()?;
        super::par_load_sweep(&combinations, |combination| self.load_store(combination))
    }
}
