//! Analysis records: typed outputs of analysis routines
//!
//! Every analysis writes [`AnalysisRecord`]s back into the store it read
//! from, so later stages (and exports) can query them by sheet, stimulus,
//! kind, value name, algorithm or tag. The set of payload shapes is closed;
//! adding a new one is a deliberate API change.

use crate::signal::AnalogSignal;
use crate::stimulus::{StimulusDescriptor, Unit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Payload shape of an [`AnalysisRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// One scalar per recorded neuron
    PerNeuronValue,
    /// One scalar for a whole sheet or simulation
    SingleValue,
    /// One analog signal per selected neuron
    AnalogSignalList,
    /// Paired excitatory/inhibitory signals per selected neuron
    ConductanceSignalList,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PerNeuronValue => "PerNeuronValue",
            Self::SingleValue => "SingleValue",
            Self::AnalogSignalList => "AnalogSignalList",
            Self::ConductanceSignalList => "ConductanceSignalList",
        };
        write!(f, "{name}")
    }
}

/// Typed payload of an analysis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordPayload {
    /// One value per neuron, indexed like the segments' spike trains.
    PerNeuronValue(Vec<f64>),
    /// One scalar summarizing a sheet or a whole simulation.
    SingleValue(f64),
    /// Analog signals for a subset of neurons.
    AnalogSignalList {
        /// One signal per entry of `neurons`
        signals: Vec<AnalogSignal>,
        /// Neuron indices the signals belong to
        neurons: Vec<usize>,
        /// Label of the signal's x axis, e.g. `"time"`
        x_axis_name: String,
        /// Label of the signal's y axis, e.g. `"autocorrelation"`
        y_axis_name: String,
    },
    /// Paired conductance signals for a subset of neurons.
    ConductanceSignalList {
        /// Excitatory traces, one per entry of `neurons`
        excitatory: Vec<AnalogSignal>,
        /// Inhibitory traces, one per entry of `neurons`
        inhibitory: Vec<AnalogSignal>,
        /// Neuron indices the signals belong to
        neurons: Vec<usize>,
    },
}

impl RecordPayload {
    /// Kind tag for this payload.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::PerNeuronValue(_) => RecordKind::PerNeuronValue,
            Self::SingleValue(_) => RecordKind::SingleValue,
            Self::AnalogSignalList { .. } => RecordKind::AnalogSignalList,
            Self::ConductanceSignalList { .. } => RecordKind::ConductanceSignalList,
        }
    }
}

/// One typed analysis output.
///
/// Records are immutable once built. `stimulus` is the (usually
/// trial-collapsed) descriptor of the condition the record summarizes;
/// global records carry `None`. `period` marks the record's values
/// themselves as circular, e.g. an orientation preference with period pi.
///
/// # Example
///
/// ```
/// use sintonia_db::{AnalysisRecord, RecordPayload, Unit};
///
/// let record = AnalysisRecord::builder(
///     "Firing rate",
///     "V1_Exc",
///     RecordPayload::PerNeuronValue(vec![12.0, 3.5, 0.0]),
/// )
/// .algorithm("TrialAveragedFiringRate")
/// .unit(Unit::new("spike/s"))
/// .tag("contrast-series")
/// .build();
///
/// assert_eq!(record.per_neuron_values(), Some(&[12.0, 3.5, 0.0][..]));
/// assert!(record.has_tag("contrast-series"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    value_name: String,
    sheet_name: String,
    stimulus: Option<StimulusDescriptor>,
    analysis_algorithm: String,
    tags: BTreeSet<String>,
    unit: Unit,
    period: Option<f64>,
    created_at: DateTime<Utc>,
    payload: RecordPayload,
}

impl AnalysisRecord {
    /// Start building a record.
    pub fn builder(
        value_name: impl Into<String>,
        sheet_name: impl Into<String>,
        payload: RecordPayload,
    ) -> AnalysisRecordBuilder {
        AnalysisRecordBuilder {
            value_name: value_name.into(),
            sheet_name: sheet_name.into(),
            stimulus: None,
            analysis_algorithm: String::new(),
            tags: BTreeSet::new(),
            unit: Unit::dimensionless(),
            period: None,
            created_at: None,
            payload,
        }
    }

    /// Name of the quantity stored, e.g. `"Firing rate"`.
    #[must_use]
    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    /// Sheet the record describes.
    #[must_use]
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Stimulus condition the record summarizes, if any.
    #[must_use]
    pub const fn stimulus(&self) -> Option<&StimulusDescriptor> {
        self.stimulus.as_ref()
    }

    /// Name of the routine that produced the record.
    #[must_use]
    pub fn analysis_algorithm(&self) -> &str {
        &self.analysis_algorithm
    }

    /// Free-form tags, sorted.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether the record carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Unit of the stored values.
    #[must_use]
    pub const fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Period of the stored values when they are circular.
    #[must_use]
    pub const fn period(&self) -> Option<f64> {
        self.period
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The typed payload.
    #[must_use]
    pub const fn payload(&self) -> &RecordPayload {
        &self.payload
    }

    /// Payload kind tag.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.payload.kind()
    }

    /// Per-neuron values, `None` for other payload kinds.
    #[must_use]
    pub fn per_neuron_values(&self) -> Option<&[f64]> {
        match &self.payload {
            RecordPayload::PerNeuronValue(values) => Some(values),
            _ => None,
        }
    }

    /// Scalar value, `None` for other payload kinds.
    #[must_use]
    pub const fn single_value(&self) -> Option<f64> {
        match &self.payload {
            RecordPayload::SingleValue(value) => Some(*value),
            _ => None,
        }
    }
}

/// Builder for [`AnalysisRecord`].
#[derive(Debug, Clone)]
pub struct AnalysisRecordBuilder {
    value_name: String,
    sheet_name: String,
    stimulus: Option<StimulusDescriptor>,
    analysis_algorithm: String,
    tags: BTreeSet<String>,
    unit: Unit,
    period: Option<f64>,
    created_at: Option<DateTime<Utc>>,
    payload: RecordPayload,
}

impl AnalysisRecordBuilder {
    /// Attach the stimulus condition the record summarizes.
    #[must_use]
    pub fn stimulus(mut self, stimulus: StimulusDescriptor) -> Self {
        self.stimulus = Some(stimulus);
        self
    }

    /// Name the producing routine.
    #[must_use]
    pub fn algorithm(mut self, name: impl Into<String>) -> Self {
        self.analysis_algorithm = name.into();
        self
    }

    /// Add one tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add several tags.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Set the unit of the stored values.
    #[must_use]
    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Mark the stored values as circular with the given period.
    #[must_use]
    pub fn period(mut self, period: f64) -> Self {
        self.period = Some(period);
        self
    }

    /// Override the creation timestamp (defaults to now).
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> AnalysisRecord {
        AnalysisRecord {
            value_name: self.value_name,
            sheet_name: self.sheet_name,
            stimulus: self.stimulus,
            analysis_algorithm: self.analysis_algorithm,
            tags: self.tags,
            unit: self.unit,
            period: self.period,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            payload: self.payload,
        }
    }
}
