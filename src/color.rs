use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Continuous colour scale for the z axis
// ---------------------------------------------------------------------------

/// Viridis anchor colours, low → high.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

/// Maps a value in `[min, max]` onto the Viridis gradient.
#[derive(Debug, Clone)]
pub struct ColorScale {
    min: f64,
    max: f64,
    stops: Vec<LinSrgb>,
}

impl ColorScale {
    pub fn new(min: f64, max: f64) -> Self {
        let stops: Vec<LinSrgb> = VIRIDIS
            .iter()
            .map(|&(r, g, b)| Srgb::new(r, g, b).into_format::<f32>().into_linear())
            .collect();
        ColorScale { min, max, stops }
    }

    /// Scale spanning the range of `values`; a degenerate range maps to the midpoint.
    pub fn spanning(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            return Self::new(0.0, 1.0);
        }
        Self::new(min, max)
    }

    /// Position of `value` in the range, clamped to `[0, 1]`.
    pub fn position(&self, value: f64) -> f32 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / range).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let segments = (self.stops.len() - 1) as f32;
        let scaled = self.position(value) * segments;
        let lower = (scaled.floor() as usize).min(self.stops.len() - 2);
        let t = scaled - lower as f32;
        let mixed = self.stops[lower].mix(self.stops[lower + 1], t);
        let rgb: Srgb<u8> = Srgb::from_linear(mixed);
        Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}
