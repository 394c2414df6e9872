use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::source::{DataSource, FileSource};
use crate::state::{LoadStatus, Session};
use crate::ui::{Projection, ViewState};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filter panel. Checkbox changes only edit the pending
/// selection; the view is recomputed on "Apply" / "Reset".
pub fn filter_panel(ui: &mut Ui, session: &mut Session, view: &mut ViewState) {
    ui.heading("Filters");
    ui.separator();

    if !session.has_data() {
        ui.label("No dataset loaded.");
        return;
    }

    let schema = session.schema();
    if schema.is_empty() {
        ui.label("No metadata fields available for filtering");
        return;
    }
    let fields: Vec<String> = schema
        .filterable_fields()
        .into_iter()
        .map(str::to_string)
        .collect();
    let skipped = schema.unfilterable_fields().join(", ");

    let mut toggles: Vec<(String, String)> = Vec::new();
    let mut apply = false;
    let mut reset = false;

    ui.horizontal(|ui: &mut Ui| {
        let label = if session.has_pending_changes() {
            RichText::new("Apply filters").strong()
        } else {
            RichText::new("Apply filters")
        };
        apply = ui.button(label).clicked();
        reset = ui.button("Reset").clicked();
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if fields.is_empty() {
                ui.label("No suitable fields for filtering");
            }

            // ---- Per-field filter groups (collapsible) ----
            for field in &fields {
                let schema = session.schema();
                let filters = session.filters();

                let n_selected = filters.selected(field).map_or(0, |s| s.len());
                let n_total = schema.values(field).count();
                let header_text = format!("{field}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(field)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        let query = view.search.entry(field.clone()).or_default();
                        ui.add(
                            egui::TextEdit::singleline(query)
                                .hint_text(format!("Search {field}...")),
                        );

                        for value in schema.search_values(field, query) {
                            let mut checked = filters.is_selected(field, value);
                            if ui.checkbox(&mut checked, value).changed() {
                                toggles.push((field.clone(), value.to_string()));
                            }
                        }
                    });
            }

            if !skipped.is_empty() {
                ui.separator();
                ui.label(
                    RichText::new(format!("Too many or no values to filter: {skipped}"))
                        .small()
                        .weak(),
                );
            }
        });

    for (field, value) in toggles {
        session.toggle_filter_value(&field, &value);
    }
    if reset {
        session.reset_filters();
    } else if apply {
        session.apply_filters();
    }
}

// ---------------------------------------------------------------------------
// Right side panel – point inspector and statistics
// ---------------------------------------------------------------------------

pub fn inspector_panel(ui: &mut Ui, session: &Session) {
    ui.heading("Vector info");
    ui.separator();

    match session.selected_record() {
        None => {
            ui.label("Click on a point to see details");
        }
        Some(rec) => {
            let rows = rec.inspector_rows();
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto())
                .column(Column::remainder())
                .body(|mut body| {
                    for (key, value) in &rows {
                        body.row(18.0, |mut row| {
                            row.col(|ui| {
                                ui.strong(key);
                            });
                            row.col(|ui| {
                                ui.label(value);
                            });
                        });
                    }
                });
        }
    }

    ui.add_space(12.0);
    ui.heading("Statistics");
    ui.separator();
    if session.has_data() {
        for line in session.stats().readout(session.total_count()) {
            ui.label(line);
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Load requests raised from the menu bar.
pub enum TopBarAction {
    Open(Box<dyn DataSource>),
    ReloadApi,
}

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, session: &Session, view: &mut ViewState) -> Option<TopBarAction> {
    let mut action = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                action = open_file_dialog().map(TopBarAction::Open);
                ui.close_menu();
            }
            if ui.button("Reload from API").clicked() {
                action = Some(TopBarAction::ReloadApi);
                ui.close_menu();
            }
        });

        ui.separator();

        egui::ComboBox::from_id_salt("projection")
            .selected_text(view.projection.label())
            .show_ui(ui, |ui: &mut Ui| {
                for p in Projection::ALL {
                    ui.selectable_value(&mut view.projection, p, p.label());
                }
            });

        ui.separator();

        match session.status() {
            LoadStatus::Idle => {}
            LoadStatus::Loading { origin, .. } => {
                ui.spinner();
                ui.label(format!("Loading {origin}"));
            }
            LoadStatus::Loaded {
                origin, rejected, ..
            } => {
                ui.label(format!(
                    "{} vectors from {origin}, {} visible",
                    session.total_count(),
                    session.view().len()
                ));
                if *rejected > 0 {
                    ui.label(
                        RichText::new(format!("{rejected} malformed skipped"))
                            .color(Color32::YELLOW),
                    );
                }
            }
            LoadStatus::Failed(msg) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
        }
    });

    action
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog() -> Option<Box<dyn DataSource>> {
    let path = rfd::FileDialog::new()
        .set_title("Open vector export")
        .add_filter("Supported files", &["json", "csv", "parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()?;
    log::info!("Opening {}", path.display());
    Some(Box::new(FileSource::new(path)))
}
