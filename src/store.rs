//! In-memory record store with chainable filter views
//!
//! A [`RecordStore`] owns the raw segments of one simulation run plus every
//! analysis record derived from them. Queries go through [`StoreView`], a
//! cheap borrowed view that narrows both collections one filter at a time
//! without copying any data. Insertion order is preserved and is the
//! iteration order of every view.

use crate::error::{Error, Result};
use crate::record::{AnalysisRecord, RecordKind};
use crate::signal::Segment;
use crate::stimulus::StimulusDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Owning container for segments and analysis records.
///
/// # Example
///
/// ```
/// use sintonia_db::{RecordStore, AnalysisRecord, RecordPayload};
///
/// let mut store = RecordStore::new();
/// store.add_record(
///     AnalysisRecord::builder("Mean rate", "V1", RecordPayload::SingleValue(4.2)).build(),
/// );
///
/// let view = store.view().with_sheet("V1").with_value_name("Mean rate");
/// assert_eq!(view.record_count(), 1);
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecordStore {
    segments: Vec<Segment>,
    records: Vec<AnalysisRecord>,
}

impl RecordStore {
    /// New empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Append one recorded segment.
    pub fn add_segment(&mut self, segment: Segment) {
        debug!(
            sheet = segment.sheet_name(),
            stimulus = %segment.stimulus(),
            neurons = segment.num_neurons(),
            "adding segment"
        );
        self.segments.push(segment);
    }

    /// Append one analysis record.
    pub fn add_record(&mut self, record: AnalysisRecord) {
        debug!(
            value_name = record.value_name(),
            sheet = record.sheet_name(),
            kind = %record.kind(),
            algorithm = record.analysis_algorithm(),
            "adding analysis record"
        );
        self.records.push(record);
    }

    /// Number of stored segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of stored analysis records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds neither segments nor records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.records.is_empty()
    }

    /// Sorted distinct sheet names across segments and records.
    #[must_use]
    pub fn sheets(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        names.extend(self.segments.iter().map(Segment::sheet_name));
        names.extend(self.records.iter().map(AnalysisRecord::sheet_name));
        names.into_iter().map(str::to_string).collect()
    }

    /// Unfiltered view over the whole store.
    #[must_use]
    pub fn view(&self) -> StoreView<'_> {
        StoreView {
            segments: self.segments.iter().collect(),
            records: self.records.iter().collect(),
            filters: Vec::new(),
        }
    }

    /// Serialize the store to pretty-printed JSON at `path`.
    ///
    /// # Errors
    ///
    /// IO or serialization failures.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(
            path = %path.display(),
            segments = self.segments.len(),
            records = self.records.len(),
            "saved store"
        );
        Ok(())
    }

    /// Load a store previously written by [`RecordStore::save_json`].
    ///
    /// # Errors
    ///
    /// IO or deserialization failures.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let store: Self = serde_json::from_str(&json)?;
        debug!(
            path = %path.display(),
            segments = store.segments.len(),
            records = store.records.len(),
            "loaded store"
        );
        Ok(store)
    }
}

/// Borrowed, filterable view over a [`RecordStore`].
///
/// Filters consume the view and return a narrower one, so they chain.
/// Segment filters and record filters are applied to both collections
/// wherever the predicate makes sense for both.
#[derive(Debug, Clone)]
pub struct StoreView<'a> {
    segments: Vec<&'a Segment>,
    records: Vec<&'a AnalysisRecord>,
    /// Human-readable trail of applied filters, for error context.
    filters: Vec<String>,
}

impl<'a> StoreView<'a> {
    /// Keep only segments and records from the given sheet.
    #[must_use]
    pub fn with_sheet(mut self, sheet_name: &str) -> Self {
        self.segments.retain(|s| s.sheet_name() == sheet_name);
        self.records.retain(|r| r.sheet_name() == sheet_name);
        self.filters.push(format!("sheet='{sheet_name}'"));
        self
    }

    /// Keep only segments and records whose stimulus has the given type.
    /// Records without a stimulus are dropped.
    #[must_use]
    pub fn with_stimulus_type(mut self, stimulus_type: &str) -> Self {
        self.segments
            .retain(|s| s.stimulus().stimulus_type() == stimulus_type);
        self.records.retain(|r| {
            r.stimulus()
                .is_some_and(|st| st.stimulus_type() == stimulus_type)
        });
        self.filters.push(format!("stimulus_type='{stimulus_type}'"));
        self
    }

    /// Keep only records of the given payload kind. Segments pass through.
    #[must_use]
    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.records.retain(|r| r.kind() == kind);
        self.filters.push(format!("kind={kind}"));
        self
    }

    /// Keep only records with the given value name. Segments pass through.
    #[must_use]
    pub fn with_value_name(mut self, value_name: &str) -> Self {
        self.records.retain(|r| r.value_name() == value_name);
        self.filters.push(format!("value_name='{value_name}'"));
        self
    }

    /// Keep only records produced by the given algorithm. Segments pass
    /// through.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: &str) -> Self {
        self.records.retain(|r| r.analysis_algorithm() == algorithm);
        self.filters.push(format!("algorithm='{algorithm}'"));
        self
    }

    /// Keep only records carrying the given tag. Segments pass through.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.records.retain(|r| r.has_tag(tag));
        self.filters.push(format!("tag='{tag}'"));
        self
    }

    /// Matching segments, in insertion order.
    #[must_use]
    pub fn segments(&self) -> &[&'a Segment] {
        &self.segments
    }

    /// Matching records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[&'a AnalysisRecord] {
        &self.records
    }

    /// Stimulus descriptors of the matching segments, aligned with
    /// [`StoreView::segments`].
    #[must_use]
    pub fn stimuli(&self) -> Vec<&'a StimulusDescriptor> {
        self.segments.iter().map(|s| s.stimulus()).collect()
    }

    /// Sorted distinct sheet names across the matching segments and records.
    #[must_use]
    pub fn sheets(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        names.extend(self.segments.iter().map(|s| s.sheet_name()));
        names.extend(self.records.iter().map(|r| r.sheet_name()));
        names.into_iter().map(str::to_string).collect()
    }

    /// Number of matching segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of matching records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Whether the view matches neither segments nor records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.records.is_empty()
    }

    /// The single record this view matches.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousRecord`] when the view matches zero or several
    /// records; the message carries the applied filter trail.
    pub fn unique_record(&self) -> Result<&'a AnalysisRecord> {
        match self.records.as_slice() {
            [record] => Ok(record),
            found => Err(Error::AmbiguousRecord {
                found: found.len(),
                context: if self.filters.is_empty() {
                    "no filters applied".to_string()
                } else {
                    self.filters.join(", ")
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordPayload;
    use crate::signal::SpikeTrain;
    use crate::stimulus::StimulusDescriptor;

    fn sample_store() -> RecordStore {
        let mut store = RecordStore::new();
        for (sheet, orientation) in [("V1_Exc", 0.0), ("V1_Exc", 1.5), ("V1_Inh", 0.0)] {
            let stim = StimulusDescriptor::builder("Grating")
                .parameter("orientation", orientation)
                .build();
            store.add_segment(Segment::new(
                sheet,
                stim.clone(),
                vec![SpikeTrain::new(vec![1.0], 0.0, 100.0)],
            ));
            store.add_record(
                AnalysisRecord::builder("Firing rate", sheet, RecordPayload::PerNeuronValue(vec![10.0]))
                    .stimulus(stim)
                    .algorithm("TrialAveragedFiringRate")
                    .build(),
            );
        }
        store.add_record(
            AnalysisRecord::builder("Mean rate", "V1_Exc", RecordPayload::SingleValue(7.0))
                .tag("summary")
                .build(),
        );
        store
    }

    #[test]
    fn sheet_filter_narrows_both_collections() {
        let store = sample_store();
        let view = store.view().with_sheet("V1_Exc");
        assert_eq!(view.segment_count(), 2);
        assert_eq!(view.record_count(), 3);

        let view = store.view().with_sheet("V1_Inh");
        assert_eq!(view.segment_count(), 1);
        assert_eq!(view.record_count(), 1);
    }

    #[test]
    fn filters_chain() {
        let store = sample_store();
        let view = store
            .view()
            .with_sheet("V1_Exc")
            .with_kind(RecordKind::SingleValue)
            .with_tag("summary");
        assert_eq!(view.record_count(), 1);
        assert_eq!(view.records()[0].value_name(), "Mean rate");
    }

    #[test]
    fn records_without_stimulus_fail_stimulus_type_filter() {
        let store = sample_store();
        let view = store.view().with_stimulus_type("Grating");
        // the tag-only "Mean rate" record has no stimulus
        assert_eq!(view.record_count(), 3);
        assert_eq!(view.segment_count(), 3);
    }

    #[test]
    fn unique_record_reports_filter_trail() {
        let store = sample_store();
        let err = store
            .view()
            .with_sheet("V1_Exc")
            .with_value_name("Firing rate")
            .unique_record()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("found 2"));
        assert!(msg.contains("sheet='V1_Exc'"));
        assert!(msg.contains("value_name='Firing rate'"));

        let ok = store
            .view()
            .with_sheet("V1_Inh")
            .with_value_name("Firing rate")
            .unique_record();
        assert!(ok.is_ok());
    }

    #[test]
    fn sheets_are_sorted_and_distinct() {
        let store = sample_store();
        assert_eq!(store.sheets(), vec!["V1_Exc", "V1_Inh"]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let store = sample_store();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        store.save_json(&path).unwrap();

        let loaded = RecordStore::load_json(&path).unwrap();
        assert_eq!(loaded.segment_count(), store.segment_count());
        assert_eq!(loaded.record_count(), store.record_count());
        assert_eq!(loaded.sheets(), store.sheets());
    }
}
