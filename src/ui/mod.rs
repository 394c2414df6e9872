use std::collections::BTreeMap;

use crate::data::model::Record;

pub mod panels;
pub mod plot;

/// Which pair of axes the scatter plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Xy,
    Xz,
    Yz,
}

impl Projection {
    pub const ALL: [Projection; 3] = [Projection::Xy, Projection::Xz, Projection::Yz];

    pub fn label(self) -> &'static str {
        match self {
            Projection::Xy => "X / Y",
            Projection::Xz => "X / Z",
            Projection::Yz => "Y / Z",
        }
    }

    pub fn axis_names(self) -> (&'static str, &'static str) {
        match self {
            Projection::Xy => ("X", "Y"),
            Projection::Xz => ("X", "Z"),
            Projection::Yz => ("Y", "Z"),
        }
    }

    pub fn project(self, rec: &Record) -> [f64; 2] {
        match self {
            Projection::Xy => [rec.x, rec.y],
            Projection::Xz => [rec.x, rec.z],
            Projection::Yz => [rec.y, rec.z],
        }
    }
}

/// Widget state that is not part of the session (search boxes, plot plane).
#[derive(Debug, Default)]
pub struct ViewState {
    pub projection: Projection,
    /// Per-field text typed into the filter search box.
    pub search: BTreeMap<String, String>,
}
