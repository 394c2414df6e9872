use std::fmt;

use serde::Serialize;

use super::model::Record;

// ---------------------------------------------------------------------------
// Descriptive statistics over a view
// ---------------------------------------------------------------------------

/// Mean and population standard deviation of one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AxisStats {
    pub mean: f64,
    pub std: f64,
}

impl AxisStats {
    /// Zero for an empty slice; divides by N, not N-1.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return AxisStats::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        AxisStats {
            mean,
            std: variance.sqrt(),
        }
    }
}

impl fmt::Display for AxisStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} (±{:.4})", self.mean, self.std)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: usize,
    pub x: AxisStats,
    pub y: AxisStats,
    pub z: AxisStats,
}

/// Summarise any sequence of records (full store or a filtered view).
pub fn compute_stats<'a>(view: impl IntoIterator<Item = &'a Record>) -> StatsSummary {
    let (mut xs, mut ys, mut zs) = (Vec::new(), Vec::new(), Vec::new());
    for rec in view {
        xs.push(rec.x);
        ys.push(rec.y);
        zs.push(rec.z);
    }
    StatsSummary {
        count: xs.len(),
        x: AxisStats::from_values(&xs),
        y: AxisStats::from_values(&ys),
        z: AxisStats::from_values(&zs),
    }
}

impl StatsSummary {
    /// Readout lines: "Vectors shown: N of M" followed by one line per axis.
    pub fn readout(&self, total: usize) -> Vec<String> {
        vec![
            format!("Vectors shown: {} of {}", self.count, total),
            format!("X mean: {}", self.x),
            format!("Y mean: {}", self.y),
            format!("Z mean: {}", self.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn empty_view_is_all_zero() {
        let stats = compute_stats(std::iter::empty::<&Record>());
        assert_eq!(stats, StatsSummary::default());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.x.mean, 0.0);
        assert_eq!(stats.z.std, 0.0);
    }

    #[test]
    fn two_points_population_std() {
        let records = vec![Record::new("a", 1.0, 2.0, 3.0), Record::new("b", 3.0, 4.0, 5.0)];
        let stats = compute_stats(&records);
        assert_eq!(stats.count, 2);
        assert!(close(stats.x.mean, 2.0));
        assert!(close(stats.y.mean, 3.0));
        assert!(close(stats.z.mean, 4.0));
        assert!(close(stats.x.std, 1.0));
        assert!(close(stats.y.std, 1.0));
        assert!(close(stats.z.std, 1.0));
    }

    #[test]
    fn single_point_has_zero_spread() {
        let records = vec![Record::new("a", -2.5, 0.0, 7.0)];
        let stats = compute_stats(&records);
        assert_eq!(stats.count, 1);
        assert!(close(stats.x.mean, -2.5));
        assert_eq!(stats.x.std, 0.0);
    }

    #[test]
    fn readout_formats_four_decimals() {
        let records = vec![Record::new("a", 1.0, 2.0, 3.0), Record::new("b", 3.0, 4.0, 5.0)];
        let lines = compute_stats(&records).readout(10);
        assert_eq!(lines[0], "Vectors shown: 2 of 10");
        assert_eq!(lines[1], "X mean: 2.0000 (±1.0000)");
    }
}
