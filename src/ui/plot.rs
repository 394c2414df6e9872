use eframe::egui::{Align2, Color32, Pos2, RichText, Ui};
use egui_plot::{MarkerShape, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::ColorScale;
use crate::data::model::Record;
use crate::state::{LoadStatus, Session};
use crate::ui::Projection;

/// Number of colour buckets the z gradient is split into.
const COLOR_BINS: usize = 32;

/// Maximum screen distance (points) between a click and the picked marker.
const PICK_RADIUS: f32 = 12.0;

/// A click on a marker: index into the view with the given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointPick {
    pub generation: u64,
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Render the current view as a scatter plot coloured by z.
///
/// Returns the point the user clicked, if any.
pub fn scatter_plot(ui: &mut Ui, session: &Session, projection: Projection) -> Option<PointPick> {
    if !session.has_data() {
        placeholder(ui, session.status());
        return None;
    }

    let generation = session.view().generation;
    let records: Vec<&Record> = session.view_records().collect();
    let projected: Vec<[f64; 2]> = records.iter().map(|r| projection.project(r)).collect();
    let scale = ColorScale::spanning(records.iter().map(|r| r.z));

    let mut bins: Vec<Vec<[f64; 2]>> = vec![Vec::new(); COLOR_BINS];
    for (rec, p) in records.iter().zip(&projected) {
        let bin = (scale.position(rec.z) * (COLOR_BINS - 1) as f32).round() as usize;
        bins[bin.min(COLOR_BINS - 1)].push(*p);
    }

    let (x_label, y_label) = projection.axis_names();
    let selected = session.selected_record();

    let response = Plot::new("vector_plot")
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let (lo, hi) = scale.range();
            for (bin, points) in bins.into_iter().enumerate() {
                if points.is_empty() {
                    continue;
                }
                let t = bin as f64 / (COLOR_BINS - 1) as f64;
                let color = scale.color_for(lo + t * (hi - lo));
                let points: PlotPoints = points.into_iter().collect();
                plot_ui.points(
                    Points::new(points)
                        .shape(MarkerShape::Circle)
                        .radius(3.0)
                        .color(color),
                );
            }

            if let Some(rec) = selected {
                let [px, py] = projection.project(rec);
                plot_ui.points(
                    Points::new(PlotPoints::new(vec![[px, py]]))
                        .shape(MarkerShape::Circle)
                        .radius(7.0)
                        .filled(false)
                        .color(Color32::RED),
                );
                plot_ui.text(
                    Text::new(PlotPoint::new(px, py), rec.label()).anchor(Align2::LEFT_BOTTOM),
                );
            }

            if !plot_ui.response().clicked() {
                return None;
            }
            let pointer = plot_ui.screen_from_plot(plot_ui.pointer_coordinate()?);
            let screen = projected
                .iter()
                .map(|p| plot_ui.screen_from_plot(PlotPoint::new(p[0], p[1])));
            nearest_within(screen, pointer, PICK_RADIUS)
        });

    response
        .inner
        .map(|index| PointPick { generation, index })
}

/// Index of the position closest to `target`, if it lies within `radius`.
pub fn nearest_within(
    positions: impl IntoIterator<Item = Pos2>,
    target: Pos2,
    radius: f32,
) -> Option<usize> {
    positions
        .into_iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance(target)))
        .filter(|&(_, d)| d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn placeholder(ui: &mut Ui, status: &LoadStatus) {
    ui.centered_and_justified(|ui: &mut Ui| match status {
        LoadStatus::Loading { origin, .. } => {
            ui.heading(format!("Loading vectors from {origin}…"));
        }
        LoadStatus::Failed(msg) => {
            ui.heading(RichText::new(msg).color(Color32::RED));
        }
        LoadStatus::Idle | LoadStatus::Loaded { .. } => {
            ui.heading("Open a file to view vectors  (File → Open…)");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_closest_marker_in_radius() {
        let markers = [Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0), Pos2::new(4.0, 3.0)];
        assert_eq!(nearest_within(markers, Pos2::new(5.0, 2.0), 12.0), Some(2));
        assert_eq!(nearest_within(markers, Pos2::new(9.0, 0.0), 12.0), Some(1));
        assert_eq!(nearest_within(markers, Pos2::new(100.0, 100.0), 12.0), None);
        assert_eq!(nearest_within(Vec::new(), Pos2::ZERO, 12.0), None);
    }
}
