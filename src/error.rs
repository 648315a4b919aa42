//! Error types for sintonia-db
//!
//! Two-tier design: everything in this enum is a fatal precondition failure
//! (caller bug or data-integrity violation) that aborts the current routine
//! or export. Soft, continuable failures (an unloadable sweep combination, a
//! missing prerequisite record) never become `Error` values; they are
//! logged, counted and skipped where they occur.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// sintonia-db error types
#[derive(Error, Debug)]
pub enum Error {
    /// Value and descriptor sequences passed to the collapse engine differ
    /// in length
    #[error("length mismatch: {values} values vs {descriptors} descriptors\nEvery value must be paired with the descriptor of the presentation that produced it.")]
    LengthMismatch {
        /// Number of values supplied
        values: usize,
        /// Number of descriptors supplied
        descriptors: usize,
    },

    /// Descriptors of more than one stimulus type were collapsed together
    /// without explicit permission
    #[error("mixed stimulus types in one collapse: '{first}' vs '{other}'\nPass allow_mixed_stimulus_types=true if grouping across types is intended.")]
    MixedStimulusTypes {
        /// Stimulus type of the first descriptor
        first: String,
        /// The conflicting stimulus type
        other: String,
    },

    /// A descriptor is missing a parameter the operation requires
    #[error("descriptor {descriptor} has no parameter '{parameter}'")]
    MissingParameter {
        /// The absent parameter name
        parameter: String,
        /// Display form of the offending descriptor
        descriptor: String,
    },

    /// Per-neuron arrays inside one group do not share a common shape
    #[error("shape mismatch in {context}: expected {expected} entries, found {found}")]
    ShapeMismatch {
        /// Expected length
        expected: usize,
        /// Length actually found
        found: usize,
        /// Where the mismatch was detected
        context: String,
    },

    /// A query that must identify exactly one record matched zero or many
    #[error("expected exactly one record, found {found} ({context})")]
    AmbiguousRecord {
        /// Number of records the query matched
        found: usize,
        /// The filters that were applied
        context: String,
    },

    /// Sweep combinations do not share one fixed parameter set
    #[error("sweep is not over a fixed parameter set: {{{expected}}} vs {{{found}}}")]
    MismatchedParameterSets {
        /// Parameter names of the first combination
        expected: String,
        /// Parameter names of the conflicting combination
        found: String,
    },

    /// Two loaded sweep combinations map to the same grid cell
    #[error("duplicate sweep combination: {combination}")]
    DuplicateCombination {
        /// Display form of the repeated combination
        combination: String,
    },

    /// Loaded + unloadable combinations do not cover the full grid
    #[error("incomplete sweep: {loaded} loaded + {unloadable} unloadable != {expected} grid cells\nThe parameter space was not a full grid, or the manifest lists a combination more than once.")]
    IncompleteSweep {
        /// Combinations successfully loaded
        loaded: usize,
        /// Combinations that failed to load (soft failures)
        unloadable: usize,
        /// Product of the grid dimensions
        expected: usize,
    },

    /// A routine precondition that has no more specific variant
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
