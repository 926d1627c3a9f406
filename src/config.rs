//! Chart configuration: field names, canvas size, labels.
//!
//! Defaults match the alpha-rarefaction report layout. A config can be read
//! from a JSON file; missing keys fall back to the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the y domain is derived from a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YExtent {
    /// `[min, max]` of the plotted y statistic.
    #[default]
    Statistic,
    /// `[min(min column), max(max column)]` when the dataset has `min`/`max`
    /// columns, else the statistic.
    Envelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Column holding the x value (sequencing depth).
    pub x_field: String,
    /// Column holding the plotted statistic.
    pub y_field: String,
    /// Tried in order when `y_field` is absent.
    pub y_field_aliases: Vec<String>,
    /// Explicit per-sample group column; the active category is used when absent.
    pub sample_id_field: String,
    pub y_extent: YExtent,
    /// Plot area size in pixels (excluding margins and legend).
    pub width: u32,
    pub height: u32,
    pub legend_width: u32,
    /// Locale tag for tick labels (`en`, `de`, ...).
    pub locale: String,
    pub x_label: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            x_field: "depth".into(),
            y_field: "median".into(),
            y_field_aliases: vec!["50%".into()],
            sample_id_field: "sample-id".into(),
            y_extent: YExtent::Statistic,
            width: 1000,
            height: 400,
            legend_width: 200,
            locale: "en".into(),
            x_label: "Sequencing Depth".into(),
        }
    }
}

impl ChartConfig {
    /// Load a config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// Candidate y columns: `y_field` first, then the aliases.
    pub fn y_candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.y_field.as_str()).chain(self.y_field_aliases.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: ChartConfig =
            serde_json::from_str(r#"{"y_field": "mean", "y_extent": "envelope"}"#).unwrap();
        assert_eq!(cfg.y_field, "mean");
        assert_eq!(cfg.y_extent, YExtent::Envelope);
        assert_eq!(cfg.x_field, "depth");
        assert_eq!(cfg.width, 1000);
    }

    #[test]
    fn y_candidates_start_with_primary_field() {
        let cfg = ChartConfig::default();
        let c: Vec<&str> = cfg.y_candidates().collect();
        assert_eq!(c, vec!["median", "50%"]);
    }
}
