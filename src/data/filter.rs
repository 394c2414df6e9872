use std::collections::{BTreeMap, BTreeSet};

use super::model::Record;

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per field
// ---------------------------------------------------------------------------

/// Per-field selection state: field_name → set of selected value strings.
/// If a field is absent or its set is empty, it imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    selections: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the selection of `field`, or remove it if already there.
    pub fn toggle_value(&mut self, field: &str, value: &str) {
        let selected = self.selections.entry(field.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Drop every selection.
    pub fn clear(&mut self) {
        self.selections.values_mut().for_each(BTreeSet::clear);
    }

    pub fn current(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.selections
    }

    pub fn selected(&self, field: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(field)
    }

    pub fn is_selected(&self, field: &str, value: &str) -> bool {
        self.selections
            .get(field)
            .is_some_and(|selected| selected.contains(value))
    }

    /// Fields with a non-empty selection.
    pub fn active(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.selections
            .iter()
            .filter(|(_, selected)| !selected.is_empty())
            .map(|(field, selected)| (field.as_str(), selected))
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }

    /// Does `record` satisfy every active selection?
    ///
    /// A record lacking a constrained field never passes.
    pub fn matches(&self, record: &Record) -> bool {
        self.active().all(|(field, selected)| {
            record
                .filter_key(field)
                .is_some_and(|key| selected.contains(&key))
        })
    }
}

/// Return indices of records that pass all active filters, in store order.
pub fn apply_filters(records: &[Record], state: &FilterState) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, rec)| state.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MetadataValue;

    fn with_f(id: &str, value: Option<MetadataValue>) -> Record {
        let rec = Record::new(id, 0.0, 0.0, 0.0);
        match value {
            Some(v) => rec.with_field("f", v),
            None => rec,
        }
    }

    fn s(v: &str) -> Option<MetadataValue> {
        Some(MetadataValue::String(v.to_string()))
    }

    #[test]
    fn empty_state_is_identity() {
        let records = vec![with_f("1", s("a")), with_f("2", None), with_f("3", s("c"))];
        assert_eq!(apply_filters(&records, &FilterState::new()), vec![0, 1, 2]);
        assert!(apply_filters(&[], &FilterState::new()).is_empty());
    }

    #[test]
    fn selection_excludes_other_and_missing_values() {
        let records = vec![
            with_f("a", s("a")),
            with_f("c", s("c")),
            with_f("missing", None),
            with_f("b", s("b")),
        ];
        let mut state = FilterState::new();
        state.toggle_value("f", "a");
        state.toggle_value("f", "b");
        assert_eq!(apply_filters(&records, &state), vec![0, 3]);
    }

    #[test]
    fn null_value_does_not_match_real_selection() {
        let records = vec![with_f("n", Some(MetadataValue::Null)), with_f("a", s("a"))];
        let mut state = FilterState::new();
        state.toggle_value("f", "a");
        assert_eq!(apply_filters(&records, &state), vec![1]);
    }

    #[test]
    fn numeric_and_string_values_filter_identically() {
        let records = vec![
            with_f("num", Some(MetadataValue::Integer(1))),
            with_f("str", s("1")),
            with_f("float", Some(MetadataValue::Float(1.0))),
            with_f("other", Some(MetadataValue::Integer(2))),
        ];
        let mut state = FilterState::new();
        state.toggle_value("f", "1");
        assert_eq!(apply_filters(&records, &state), vec![0, 1, 2]);
    }

    #[test]
    fn fields_combine_with_and() {
        let records = vec![
            Record::new("1", 0.0, 0.0, 0.0)
                .with_field("lang", MetadataValue::String("en".into()))
                .with_field("src", MetadataValue::String("wiki".into())),
            Record::new("2", 0.0, 0.0, 0.0)
                .with_field("lang", MetadataValue::String("en".into()))
                .with_field("src", MetadataValue::String("arxiv".into())),
        ];
        let mut state = FilterState::new();
        state.toggle_value("lang", "en");
        state.toggle_value("src", "arxiv");
        assert_eq!(apply_filters(&records, &state), vec![1]);
    }

    #[test]
    fn apply_is_idempotent() {
        let records = vec![with_f("1", s("a")), with_f("2", s("b")), with_f("3", s("a"))];
        let mut state = FilterState::new();
        state.toggle_value("f", "a");
        let first = apply_filters(&records, &state);
        let second = apply_filters(&records, &state);
        assert_eq!(first, second);
        assert_eq!(first, vec![0, 2]);
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let mut state = FilterState::new();
        state.toggle_value("f", "a");
        let before = state.current().clone();

        state.toggle_value("f", "b");
        assert!(state.is_selected("f", "b"));
        assert_ne!(state.current(), &before);
        state.toggle_value("f", "b");
        assert_eq!(state.current(), &before);
        assert!(!state.is_selected("f", "b"));
    }

    #[test]
    fn clear_removes_every_constraint() {
        let records = vec![with_f("1", s("a")), with_f("2", s("b"))];
        let mut state = FilterState::new();
        state.toggle_value("f", "a");
        state.toggle_value("g", "z");
        assert!(!state.is_unconstrained());

        state.clear();
        assert!(state.is_unconstrained());
        assert_eq!(apply_filters(&records, &state), vec![0, 1]);
    }
}
