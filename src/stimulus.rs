//! Stimulus descriptors and parameter values
//!
//! A [`StimulusDescriptor`] is a flat, typed summary of one stimulus
//! presentation: a stimulus type name plus named parameters. Descriptors are
//! the grouping keys of the whole crate; the collapse engine partitions
//! recordings by descriptor equality after removing selected parameters.
//!
//! Float parameters use bit-pattern equality and `total_cmp` ordering so that
//! grouping and sorting stay deterministic for every input, NaN included.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One typed stimulus parameter value.
///
/// The set of value shapes is closed: integers, floats, text, and 2-d float
/// pairs (e.g. a spatial position). Floats compare by bit pattern, so `NaN`
/// equals itself and `0.0` and `-0.0` are distinct keys.
///
/// # Example
///
/// ```
/// use sintonia_db::ParamValue;
///
/// let a = ParamValue::from(0.75);
/// let b = ParamValue::from(0.75);
/// assert_eq!(a, b);
/// assert!(ParamValue::from(1i64) < ParamValue::from(0.0));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParamValue {
    /// Signed integer parameter (trial numbers, neuron counts)
    Int(i64),
    /// Floating-point parameter (orientations, contrasts, frequencies)
    Float(f64),
    /// Free-text parameter (image paths, condition labels)
    Text(String),
    /// Two-component float parameter (positions, direction vectors)
    Pair(f64, f64),
}

impl ParamValue {
    /// Numeric view: `Int` widened to `f64`, `Float` as-is, otherwise `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view, `None` for every other variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view, `None` for every other variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Rank used to order values of different variants.
    const fn variant_rank(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::Text(_) => 2,
            Self::Pair(..) => 3,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Pair(a0, a1), Self::Pair(b0, b1)) => {
                a0.to_bits() == b0.to_bits() && a1.to_bits() == b1.to_bits()
            }
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_rank().hash(state);
        match self {
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
            Self::Pair(a, b) => {
                a.to_bits().hash(state);
                b.to_bits().hash(state);
            }
        }
    }
}

impl PartialOrd for ParamValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParamValue {
    /// Total order: variant rank first, then within-variant values.
    /// Floats order by `total_cmp`, which agrees with bit-pattern equality.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Pair(a0, a1), Self::Pair(b0, b1)) => {
                a0.total_cmp(b0).then_with(|| a1.total_cmp(b1))
            }
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Pair(a, b) => write!(f, "({a},{b})"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<(f64, f64)> for ParamValue {
    fn from(v: (f64, f64)) -> Self {
        Self::Pair(v.0, v.1)
    }
}

/// Measurement unit attached to values and signals.
///
/// Plain symbolic unit (no dimensional algebra); carried through analyses so
/// downstream consumers and exports stay labelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit(String);

impl Unit {
    /// Unit with the given symbol, e.g. `"spike/s"` or `"nS"`.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The dimensionless unit (empty symbol).
    #[must_use]
    pub const fn dimensionless() -> Self {
        Self(String::new())
    }

    /// Unit symbol as text.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Opaque grouping key: stimulus type plus the retained parameters in name
/// order. Used by the collapse engine to bucket presentations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct GroupKey {
    stimulus_type: String,
    parameters: Vec<(String, ParamValue)>,
}

/// Flat, typed description of one stimulus presentation.
///
/// Parameters live in name-sorted maps, so iteration order, display form and
/// grouping keys are all deterministic. A parameter may additionally carry a
/// period (marking it circular, e.g. orientation with period pi) and a unit.
///
/// # Example
///
/// ```
/// use sintonia_db::StimulusDescriptor;
/// use std::f64::consts::PI;
///
/// let grating = StimulusDescriptor::builder("FullfieldDriftingGrating")
///     .parameter("orientation", PI / 4.0)
///     .parameter("contrast", 0.8)
///     .parameter("trial", 2i64)
///     .period("orientation", PI)
///     .build();
///
/// assert_eq!(grating.parameter_names().count(), 3);
/// assert_eq!(grating.period("orientation"), Some(PI));
/// assert_eq!(grating.period("contrast"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusDescriptor {
    stimulus_type: String,
    parameters: BTreeMap<String, ParamValue>,
    periods: BTreeMap<String, f64>,
    units: BTreeMap<String, Unit>,
}

impl StimulusDescriptor {
    /// Start building a descriptor for the given stimulus type.
    pub fn builder(stimulus_type: impl Into<String>) -> StimulusDescriptorBuilder {
        StimulusDescriptorBuilder {
            stimulus_type: stimulus_type.into(),
            parameters: BTreeMap::new(),
            periods: BTreeMap::new(),
            units: BTreeMap::new(),
        }
    }

    /// Stimulus type name.
    #[must_use]
    pub fn stimulus_type(&self) -> &str {
        &self.stimulus_type
    }

    /// Value of one parameter, if present.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Whether the named parameter is present.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Parameter names in sorted order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    /// All parameters in name order.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    /// Period of a circular parameter, `None` for aperiodic ones.
    #[must_use]
    pub fn period(&self, name: &str) -> Option<f64> {
        self.periods.get(name).copied()
    }

    /// Unit of one parameter, if declared.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    /// Whether `self` and `other` agree on stimulus type and on every
    /// parameter outside `exclude`.
    ///
    /// Both descriptors must carry the same parameter names outside
    /// `exclude`; a name present on one side only makes them unequal.
    #[must_use]
    pub fn equal_except(&self, other: &Self, exclude: &[&str]) -> bool {
        if self.stimulus_type != other.stimulus_type {
            return false;
        }
        let retained = |map: &'_ BTreeMap<String, ParamValue>| {
            map.iter()
                .filter(|(name, _)| !exclude.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect::<Vec<_>>()
        };
        retained(&self.parameters) == retained(&other.parameters)
    }

    /// Copy of this descriptor with the `exclude` parameters removed,
    /// along with their period and unit entries.
    #[must_use]
    pub fn restrict(&self, exclude: &[&str]) -> Self {
        let keep = |name: &String| !exclude.contains(&name.as_str());
        Self {
            stimulus_type: self.stimulus_type.clone(),
            parameters: self
                .parameters
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            periods: self
                .periods
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, period)| (name.clone(), *period))
                .collect(),
            units: self
                .units
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, unit)| (name.clone(), unit.clone()))
                .collect(),
        }
    }

    /// Grouping key over stimulus type and the parameters outside `exclude`.
    pub(crate) fn group_key(&self, exclude: &[&str]) -> GroupKey {
        GroupKey {
            stimulus_type: self.stimulus_type.clone(),
            parameters: self
                .parameters
                .iter()
                .filter(|(name, _)| !exclude.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

impl fmt::Display for StimulusDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.stimulus_type)?;
        for (i, (name, value)) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

/// Builder for [`StimulusDescriptor`].
#[derive(Debug, Clone)]
pub struct StimulusDescriptorBuilder {
    stimulus_type: String,
    parameters: BTreeMap<String, ParamValue>,
    periods: BTreeMap<String, f64>,
    units: BTreeMap<String, Unit>,
}

impl StimulusDescriptorBuilder {
    /// Add one parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Mark a parameter as circular with the given period.
    #[must_use]
    pub fn period(mut self, name: impl Into<String>, period: f64) -> Self {
        self.periods.insert(name.into(), period);
        self
    }

    /// Attach a unit to a parameter.
    #[must_use]
    pub fn unit(mut self, name: impl Into<String>, unit: Unit) -> Self {
        self.units.insert(name.into(), unit);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> StimulusDescriptor {
        StimulusDescriptor {
            stimulus_type: self.stimulus_type,
            parameters: self.parameters,
            periods: self.periods,
            units: self.units,
        }
    }
}
