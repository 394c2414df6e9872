use crate::data::filter::{FilterState, apply_filters};
use crate::data::model::{Record, RecordStore};
use crate::data::schema::{Schema, extract_schema};
use crate::data::source::LoadOutcome;
use crate::data::stats::{StatsSummary, compute_stats};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Lifecycle of the session's dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading { request: u64, origin: String },
    Loaded { origin: String, accepted: usize, rejected: usize },
    Failed(String),
}

/// Store indices passing the last applied filters.
///
/// `generation` increases on every recomputation so indices handed out to the
/// UI can be checked against the view they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub generation: u64,
    pub indices: Vec<usize>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

/// Everything the viewer knows about the current dataset, independent of rendering.
#[derive(Debug, Default)]
pub struct Session {
    /// Loaded records (None until a load succeeds).
    store: Option<RecordStore>,
    schema: Schema,
    /// Selections being edited in the filter panel.
    filters: FilterState,
    /// Selections the current view was computed from.
    applied: FilterState,
    view: FilteredView,
    stats: StatsSummary,
    /// Store index of the inspected point.
    selected: Option<usize>,
    status: LoadStatus,
    latest_request: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // -- loading --

    /// Mark a new load as in flight and return its request number.
    pub fn begin_load(&mut self, origin: impl Into<String>) -> u64 {
        self.latest_request += 1;
        self.status = LoadStatus::Loading {
            request: self.latest_request,
            origin: origin.into(),
        };
        self.latest_request
    }

    /// Accept the result of a load. Outcomes of superseded requests are dropped.
    pub fn finish_load(&mut self, outcome: LoadOutcome) {
        if outcome.request != self.latest_request {
            log::debug!(
                "Dropping stale load {} (latest is {})",
                outcome.request,
                self.latest_request
            );
            return;
        }
        match outcome.result {
            Ok(store) => self.set_store(outcome.origin, store),
            Err(e) => {
                log::error!("Failed to load vectors from {}: {e}", outcome.origin);
                self.store = None;
                self.schema = Schema::default();
                self.filters = FilterState::new();
                self.applied = FilterState::new();
                self.view = FilteredView {
                    generation: self.view.generation + 1,
                    indices: Vec::new(),
                };
                self.stats = StatsSummary::default();
                self.selected = None;
                self.status = LoadStatus::Failed(format!("Error loading vector data: {e}"));
            }
        }
    }

    /// Ingest a freshly loaded store: derive the schema and show everything.
    pub fn set_store(&mut self, origin: impl Into<String>, store: RecordStore) {
        let origin = origin.into();
        self.schema = extract_schema(store.records());
        log::info!(
            "Loaded {} vectors from {origin} ({} rejected), fields {:?}",
            store.len(),
            store.rejected(),
            self.schema.fields
        );
        let unfilterable = self.schema.unfilterable_fields();
        if !unfilterable.is_empty() {
            log::info!("Fields not offered as filters: {unfilterable:?}");
        }

        self.status = LoadStatus::Loaded {
            origin,
            accepted: store.len(),
            rejected: store.rejected(),
        };
        self.filters = FilterState::new();
        self.applied = FilterState::new();
        self.selected = None;
        self.store = Some(store);
        self.recompute();
    }

    // -- commands --

    /// Toggle a value in the pending filter selection. Does not refilter.
    ///
    /// Returns false (and changes nothing) for values the schema does not offer.
    pub fn toggle_filter_value(&mut self, field: &str, value: &str) -> bool {
        if !self.schema.is_filterable(field) || !self.schema.values(field).any(|v| v == value) {
            log::warn!("Ignoring toggle of unknown filter value {field}={value:?}");
            return false;
        }
        self.filters.toggle_value(field, value);
        true
    }

    /// Commit the pending selection and recompute the view and stats.
    pub fn apply_filters(&mut self) {
        self.applied = self.filters.clone();
        self.recompute();
    }

    /// Clear every selection and show the full dataset again.
    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.apply_filters();
    }

    /// Inspect the point at `index` of the view identified by `generation`.
    ///
    /// A stale generation or out-of-range index clears the selection.
    pub fn select_point(&mut self, generation: u64, index: usize) -> Option<&Record> {
        self.selected = self.store_index(generation, index);
        self.selected_record()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // -- queries --

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Loading { .. })
    }

    pub fn has_data(&self) -> bool {
        self.store.is_some()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Whether the panel holds selections that have not been applied yet.
    pub fn has_pending_changes(&self) -> bool {
        !self.filters.active().eq(self.applied.active())
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    /// Records of the current view, in store order.
    pub fn view_records(&self) -> impl Iterator<Item = &Record> {
        let records = self.store.as_ref().map(RecordStore::records).unwrap_or(&[]);
        self.view.indices.iter().filter_map(move |&i| records.get(i))
    }

    pub fn stats(&self) -> &StatsSummary {
        &self.stats
    }

    pub fn total_count(&self) -> usize {
        self.store.as_ref().map_or(0, RecordStore::len)
    }

    /// Record at `index` of the view with `generation`, if that view is current.
    pub fn point_at(&self, generation: u64, index: usize) -> Option<&Record> {
        let i = self.store_index(generation, index)?;
        self.store.as_ref()?.get(i)
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.store.as_ref()?.get(self.selected?)
    }

    fn store_index(&self, generation: u64, index: usize) -> Option<usize> {
        if generation != self.view.generation {
            return None;
        }
        self.view.indices.get(index).copied()
    }

    /// Recompute `view` and `stats` from the applied filters.
    fn recompute(&mut self) {
        let indices = match &self.store {
            Some(store) => apply_filters(store.records(), &self.applied),
            None => Vec::new(),
        };
        self.view = FilteredView {
            generation: self.view.generation + 1,
            indices,
        };
        self.stats = compute_stats(self.view_records());
        log::debug!(
            "View {}: {} of {} vectors",
            self.view.generation,
            self.view.len(),
            self.total_count()
        );

        if let Some(sel) = self.selected {
            if !self.view.indices.contains(&sel) {
                self.selected = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MetadataValue;
    use crate::data::source::FetchError;

    fn store() -> RecordStore {
        let rec = |id: &str, x: f64, lang: &str| {
            Record::new(id, x, x + 1.0, x + 2.0)
                .with_field("lang", MetadataValue::String(lang.to_string()))
        };
        RecordStore::ingest(vec![
            Ok(rec("a", 1.0, "en")),
            Ok(rec("b", 3.0, "de")),
            Ok(rec("c", 5.0, "en")),
        ])
    }

    fn loaded() -> Session {
        let mut session = Session::new();
        session.set_store("test", store());
        session
    }

    fn ids(session: &Session) -> Vec<String> {
        session.view_records().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn load_shows_everything() {
        let session = loaded();
        assert_eq!(ids(&session), vec!["a", "b", "c"]);
        assert_eq!(session.stats().count, 3);
        assert_eq!(session.total_count(), 3);
        assert_eq!(session.schema().filterable_fields(), vec!["lang"]);
        assert!(matches!(session.status(), LoadStatus::Loaded { accepted: 3, .. }));
    }

    #[test]
    fn toggle_waits_for_apply() {
        let mut session = loaded();
        assert!(session.toggle_filter_value("lang", "en"));
        assert_eq!(session.view().len(), 3);
        assert!(session.has_pending_changes());

        session.apply_filters();
        assert_eq!(ids(&session), vec!["a", "c"]);
        assert!(!session.has_pending_changes());
        assert_eq!(session.stats().count, 2);
        assert!((session.stats().x.mean - 3.0).abs() < 1e-12);
        assert!((session.stats().x.std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_values_are_not_toggled() {
        let mut session = loaded();
        assert!(!session.toggle_filter_value("lang", "fr"));
        assert!(!session.toggle_filter_value("missing", "en"));
        assert!(session.filters().is_unconstrained());
    }

    #[test]
    fn reset_restores_full_view() {
        let mut session = loaded();
        session.toggle_filter_value("lang", "de");
        session.apply_filters();
        assert_eq!(ids(&session), vec!["b"]);

        session.reset_filters();
        assert_eq!(ids(&session), vec!["a", "b", "c"]);
        assert!(session.filters().is_unconstrained());
        assert!(!session.has_pending_changes());
    }

    #[test]
    fn stale_point_index_is_not_found() {
        let mut session = loaded();
        let old = session.view().generation;
        assert_eq!(session.select_point(old, 2).map(|r| r.id.as_str()), Some("c"));

        session.toggle_filter_value("lang", "de");
        session.apply_filters();
        // "c" left the view, so the selection is cleared.
        assert!(session.selected_record().is_none());
        assert!(session.point_at(old, 0).is_none());

        let current = session.view().generation;
        assert!(session.select_point(current, 5).is_none());
        assert_eq!(session.select_point(current, 0).map(|r| r.id.as_str()), Some("b"));
    }

    #[test]
    fn failed_load_leaves_no_data() {
        let mut session = loaded();
        let request = session.begin_load("http://localhost/api/vectors");
        assert!(session.is_loading());
        session.finish_load(LoadOutcome {
            request,
            origin: "http://localhost/api/vectors".into(),
            result: Err(FetchError::Status {
                status: 404,
                message: "No vectors found".into(),
            }),
        });
        assert!(!session.has_data());
        assert_eq!(session.view_records().count(), 0);
        assert_eq!(*session.stats(), StatsSummary::default());
        match session.status() {
            LoadStatus::Failed(msg) => assert!(msg.contains("No vectors found")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn superseded_load_is_ignored() {
        let mut session = Session::new();
        let first = session.begin_load("first");
        let second = session.begin_load("second");

        session.finish_load(LoadOutcome {
            request: first,
            origin: "first".into(),
            result: Ok(store()),
        });
        assert!(!session.has_data());
        assert!(session.is_loading());

        session.finish_load(LoadOutcome {
            request: second,
            origin: "second".into(),
            result: Ok(RecordStore::default()),
        });
        assert!(session.has_data());
        assert_eq!(session.total_count(), 0);
        assert_eq!(session.stats().count, 0);
    }
}
