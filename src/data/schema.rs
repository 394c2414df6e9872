use std::collections::{BTreeMap, BTreeSet};

use super::model::Record;

/// Fields with more distinct values than this are kept out of the filter panel.
pub const MAX_FILTER_VALUES: usize = 50;

// ---------------------------------------------------------------------------
// Schema – metadata fields and their distinct values
// ---------------------------------------------------------------------------

/// Read-only snapshot of the metadata found in a record collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Every non-reserved key seen on at least one record.
    pub fields: BTreeSet<String>,
    /// For each field the sorted set of stringified, non-null values.
    pub distinct_values: BTreeMap<String, BTreeSet<String>>,
}

/// Derive the schema of `records`. Pure and order-independent.
pub fn extract_schema(records: &[Record]) -> Schema {
    let mut fields: BTreeSet<String> = BTreeSet::new();
    let mut distinct_values: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for rec in records {
        for (field, val) in &rec.metadata {
            fields.insert(field.clone());
            let values = distinct_values.entry(field.clone()).or_default();
            if !val.is_null() {
                values.insert(val.filter_key());
            }
        }
    }

    Schema {
        fields,
        distinct_values,
    }
}

impl Schema {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Distinct values of `field`, empty if the field is unknown.
    pub fn values(&self, field: &str) -> impl Iterator<Item = &str> {
        self.distinct_values
            .get(field)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn is_filterable(&self, field: &str) -> bool {
        self.distinct_values
            .get(field)
            .is_some_and(|vals| (1..=MAX_FILTER_VALUES).contains(&vals.len()))
    }

    /// Fields that get a filter group, in sorted order.
    pub fn filterable_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|f| self.is_filterable(f))
            .collect()
    }

    /// Fields present in the data but left out of the filter panel.
    pub fn unfilterable_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|f| !self.is_filterable(f))
            .collect()
    }

    /// Case-insensitive substring search over a field's values.
    pub fn search_values<'a>(&'a self, field: &str, query: &str) -> Vec<&'a str> {
        let needle = query.trim().to_lowercase();
        self.values(field)
            .filter(|v| needle.is_empty() || v.to_lowercase().contains(&needle))
            .collect()
    }
}
