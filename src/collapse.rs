//! Generic collapsing engine
//!
//! Collapsing partitions a list of values by the stimulus descriptors that
//! produced them, after removing selected parameters from the comparison.
//! Removing `"trial"` groups repeated presentations of one condition;
//! removing `"orientation"` turns flat lists into tuning curves.
//!
//! Ordering is deterministic everywhere: groups come out in order of first
//! appearance, values inside a group keep input order, and curve points are
//! sorted by parameter value with ties kept in input order.

use crate::error::{Error, Result};
use crate::stimulus::{GroupKey, ParamValue, StimulusDescriptor};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// One collapsed group: the values that shared a condition, plus the
/// condition itself with the excluded parameters removed.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedGroup<V> {
    /// Values of the group, in input order.
    pub values: Vec<V>,
    /// Shared descriptor, restricted to the retained parameters.
    pub descriptor: StimulusDescriptor,
}

/// One single-parameter tuning curve produced by [`collapse_to_curves`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCurve<V> {
    /// Descriptor of the fixed parameters (the varied one removed).
    pub descriptor: StimulusDescriptor,
    /// Values of the varied parameter, ascending; duplicates kept.
    pub parameter_values: Vec<ParamValue>,
    /// One value per curve point, aligned with `parameter_values`.
    pub values: Vec<V>,
}

/// Group `values` by their descriptors, ignoring the `exclude` parameters.
///
/// Two presentations land in the same group when their descriptors agree on
/// stimulus type and on every parameter outside `exclude`. Each group's
/// descriptor is the shared one with the excluded parameters removed. The
/// union of all group values is exactly the input, and groups appear in
/// order of first appearance.
///
/// Unless `allow_mixed_stimulus_types` is set, all descriptors must share
/// one stimulus type.
///
/// # Errors
///
/// [`Error::LengthMismatch`] when `values` and `descriptors` differ in
/// length; [`Error::MixedStimulusTypes`] when types differ without
/// permission.
///
/// # Example
///
/// ```
/// use sintonia_db::{collapse, StimulusDescriptor};
///
/// let descriptors: Vec<_> = (0..4)
///     .map(|trial| {
///         StimulusDescriptor::builder("Grating")
///             .parameter("orientation", f64::from(trial % 2))
///             .parameter("trial", i64::from(trial / 2))
///             .build()
///     })
///     .collect();
///
/// let groups = collapse(vec![10.0, 20.0, 30.0, 40.0], &descriptors, &["trial"], false).unwrap();
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].values, vec![10.0, 30.0]);
/// assert_eq!(groups[1].values, vec![20.0, 40.0]);
/// assert!(!groups[0].descriptor.has_parameter("trial"));
/// ```
pub fn collapse<V>(
    values: Vec<V>,
    descriptors: &[StimulusDescriptor],
    exclude: &[&str],
    allow_mixed_stimulus_types: bool,
) -> Result<Vec<CollapsedGroup<V>>> {
    if values.len() != descriptors.len() {
        return Err(Error::LengthMismatch {
            values: values.len(),
            descriptors: descriptors.len(),
        });
    }
    if !allow_mixed_stimulus_types {
        check_single_stimulus_type(descriptors)?;
    }

    let mut groups: Vec<CollapsedGroup<V>> = Vec::new();
    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();

    for (value, descriptor) in values.into_iter().zip(descriptors) {
        match index.entry(descriptor.group_key(exclude)) {
            Entry::Occupied(slot) => groups[*slot.get()].values.push(value),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push(CollapsedGroup {
                    values: vec![value],
                    descriptor: descriptor.restrict(exclude),
                });
            }
        }
    }
    Ok(groups)
}

/// [`collapse`], then reduce each group to a single value with `combine`.
///
/// Returns `(combined_value, descriptor)` pairs in group order. `combine`
/// always receives a non-empty vector.
///
/// # Errors
///
/// Same as [`collapse`].
pub fn collapse_with<V, F>(
    values: Vec<V>,
    descriptors: &[StimulusDescriptor],
    exclude: &[&str],
    allow_mixed_stimulus_types: bool,
    mut combine: F,
) -> Result<Vec<(V, StimulusDescriptor)>>
where
    F: FnMut(Vec<V>) -> V,
{
    let groups = collapse(values, descriptors, exclude, allow_mixed_stimulus_types)?;
    Ok(groups
        .into_iter()
        .map(|group| (combine(group.values), group.descriptor))
        .collect())
}

/// Group by everything except `parameter_name` and order each group along
/// that parameter, producing one tuning curve per fixed condition.
///
/// Every descriptor must carry `parameter_name`. Points are sorted by the
/// parameter's total order; duplicate parameter values are kept, tied points
/// staying in input order.
///
/// # Errors
///
/// [`Error::LengthMismatch`] on ragged input, [`Error::MissingParameter`]
/// when a descriptor lacks the varied parameter.
pub fn collapse_to_curves<V>(
    values: Vec<V>,
    descriptors: &[StimulusDescriptor],
    parameter_name: &str,
) -> Result<Vec<ParameterCurve<V>>> {
    if values.len() != descriptors.len() {
        return Err(Error::LengthMismatch {
            values: values.len(),
            descriptors: descriptors.len(),
        });
    }

    let exclude = [parameter_name];
    let mut curves: Vec<(Vec<(ParamValue, V)>, StimulusDescriptor)> = Vec::new();
    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();

    for (value, descriptor) in values.into_iter().zip(descriptors) {
        let parameter = descriptor
            .parameter(parameter_name)
            .ok_or_else(|| Error::MissingParameter {
                parameter: parameter_name.to_string(),
                descriptor: descriptor.to_string(),
            })?
            .clone();
        match index.entry(descriptor.group_key(&exclude)) {
            Entry::Occupied(slot) => curves[*slot.get()].0.push((parameter, value)),
            Entry::Vacant(slot) => {
                slot.insert(curves.len());
                curves.push((vec![(parameter, value)], descriptor.restrict(&exclude)));
            }
        }
    }

    Ok(curves
        .into_iter()
        .map(|(mut points, descriptor)| {
            points.sort_by(|a, b| a.0.cmp(&b.0));
            let (parameter_values, values) = points.into_iter().unzip();
            ParameterCurve {
                descriptor,
                parameter_values,
                values,
            }
        })
        .collect())
}

fn check_single_stimulus_type(descriptors: &[StimulusDescriptor]) -> Result<()> {
    let Some(first) = descriptors.first() else {
        return Ok(());
    };
    for descriptor in descriptors {
        if descriptor.stimulus_type() != first.stimulus_type() {
            return Err(Error::MixedStimulusTypes {
                first: first.stimulus_type().to_string(),
                other: descriptor.stimulus_type().to_string(),
            });
        }
    }
    Ok(())
}
