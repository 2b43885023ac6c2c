//! Chart-ready output shapes handed to the rendering layer.
//!
//! Every series keeps its parallel vectors the same length and in display
//! order; renderers must not re-sort them.

use serde::Serialize;

use crate::analyzers::utility::truncate_label;

/// Slice colors assigned by rank for pie-style charts.
pub const PALETTE: [&str; 10] = [
    "#F97316", "#3B82F6", "#10B981", "#8B5CF6", "#EF4444", "#F59E0B", "#6366F1", "#EC4899",
    "#14B8A6", "#64748B",
];

pub const POSITIVE_COLOR: &str = "#10B981";
pub const NEGATIVE_COLOR: &str = "#EF4444";
pub const NEUTRAL_COLOR: &str = "#9CA3AF";

/// Base RGB of the heatmap scale.
const HEAT_RGB: (u8, u8, u8) = (249, 115, 22);

/// Categorical series for bar, line, and area charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorySeries {
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

impl CategorySeries {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (categories, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self { categories, values }
    }

    pub fn from_counts<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self::from_pairs(pairs.into_iter().map(|(c, n)| (c, n as f64)))
    }

    /// Applies the axis-label truncation to every category.
    pub fn with_truncated_labels(mut self) -> Self {
        self.categories = self.categories.iter().map(|c| truncate_label(c)).collect();
        self
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn value_of(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|i| self.values[i])
    }
}

/// Labeled distribution for pie and donut charts, one color per label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabeledSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<String>,
}

impl LabeledSeries {
    /// Colors slices by position using [`PALETTE`], wrapping when there are
    /// more slices than colors.
    pub fn ranked<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut series = Self::default();
        for (i, (label, value)) in pairs.into_iter().enumerate() {
            series.labels.push(label.into());
            series.values.push(value);
            series.colors.push(PALETTE[i % PALETTE.len()].to_string());
        }
        series
    }

    pub fn ranked_counts<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self::ranked(pairs.into_iter().map(|(l, n)| (l, n as f64)))
    }

    /// Fixed labels with explicit colors.
    pub fn fixed(slices: &[(&str, f64, &str)]) -> Self {
        let mut series = Self::default();
        for (label, value, color) in slices {
            series.labels.push(label.to_string());
            series.values.push(*value);
            series.colors.push(color.to_string());
        }
        series
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i])
    }
}

/// Scatter points, one per index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PointSeries {
    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Straight-line fit drawn over a scatter chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Day-by-hour order density for one region. `counts[day][hour]` with
/// Sunday as day 0; `intensity` is each count over this region's own maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionHeatmap {
    pub region: String,
    pub days: Vec<String>,
    pub hours: Vec<String>,
    pub counts: Vec<Vec<u32>>,
    pub intensity: Vec<Vec<f64>>,
    pub colors: Vec<Vec<String>>,
    pub max_count: u32,
}

/// Color for a normalized heat value in `[0, 1]`.
pub fn heat_color(intensity: f64) -> String {
    let (r, g, b) = HEAT_RGB;
    let alpha = (intensity.clamp(0.0, 1.0) * 100.0).round() / 100.0;
    format!("rgba({r}, {g}, {b}, {alpha})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_colors_wrap() {
        let pairs: Vec<(String, f64)> = (0..12).map(|i| (format!("c{i}"), 1.0)).collect();
        let series = LabeledSeries::ranked(pairs);
        assert_eq!(series.colors.len(), 12);
        assert_eq!(series.colors[0], PALETTE[0]);
        assert_eq!(series.colors[10], PALETTE[0]);
        assert_eq!(series.colors[11], PALETTE[1]);
    }

    #[test]
    fn test_category_series_lookup() {
        let series = CategorySeries::from_counts([("Biryani", 2usize), ("Naan", 1)]);
        assert_eq!(series.value_of("Naan"), Some(1.0));
        assert_eq!(series.value_of("Dosa"), None);
        assert_eq!(series.total(), 3.0);
    }

    #[test]
    fn test_heat_color_alpha() {
        assert_eq!(heat_color(0.0), "rgba(249, 115, 22, 0)");
        assert_eq!(heat_color(0.5), "rgba(249, 115, 22, 0.5)");
        assert_eq!(heat_color(2.0), "rgba(249, 115, 22, 1)");
    }
}
