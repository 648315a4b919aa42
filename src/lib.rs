//! # Sintonia-DB: Analytics Store for Neural-Simulation Recordings
//!
//! Sintonia-DB post-processes recordings from neural-simulation experiments.
//! Per-trial, per-stimulus measurements go into an append-only record store;
//! a generic collapsing engine regroups them by any subset of their stimulus
//! parameters; pluggable analyses (tuning curves, spike-triggered averages,
//! autocorrelations, modulation ratios) write typed results back; and a sweep
//! loader reassembles many independent simulation runs into dense
//! n-dimensional result grids with integrity checks.
//!
//! ## Design Principles
//!
//! - **Deterministic ordering**: every grouping, axis, and emission order has
//!   an explicit, documented sort key, never map-iteration luck
//! - **Two-tier failures**: caller bugs and integrity violations are typed
//!   errors; a missing sweep store or prerequisite record is logged, counted
//!   and skipped
//! - **Append-only provenance**: records carry their producing algorithm,
//!   stimulus condition, unit and tags, and are never mutated in place
//!
//! ## Example Usage
//!
//! ```rust
//! use sintonia_db::{collapse, StimulusDescriptor};
//!
//! // three trials of one condition land in one group
//! let descriptors: Vec<_> = (0..3)
//!     .map(|trial| {
//!         StimulusDescriptor::builder("FullfieldDriftingGrating")
//!             .parameter("orientation", 0.0)
//!             .parameter("trial", i64::from(trial))
//!             .build()
//!     })
//!     .collect();
//!
//! let groups = collapse(vec![12.0, 11.0, 13.0], &descriptors, &["trial"], false)?;
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].values.len(), 3);
//! # Ok::<(), sintonia_db::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod circular;
pub mod collapse;
pub mod error;
pub mod record;
pub mod signal;
pub mod stimulus;
pub mod store;
pub mod sweep;

pub use collapse::{collapse, collapse_to_curves, collapse_with, CollapsedGroup, ParameterCurve};
pub use error::{Error, Result};
pub use record::{AnalysisRecord, RecordKind, RecordPayload};
pub use signal::{AnalogSignal, Segment, SpikeTrain};
pub use stimulus::{ParamValue, StimulusDescriptor, Unit};
pub use store::{RecordStore, StoreView};
