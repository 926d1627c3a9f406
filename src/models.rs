use crate::error::{ChartError, ChartResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One cell of a dataset row.
///
/// JSON numbers map to `Number`, strings to `Text`, `null` to `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    /// Numeric value of the cell, if it holds a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// String form used as a series key. Whole numbers drop the trailing `.0`
    /// so a numeric metadata column groups as `"3"`, not `"3.0"`.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            Cell::Number(v) => Some(v.to_string()),
            Cell::Null => None,
        }
    }

    /// Parse a raw text field (CSV/TSV) into a cell: empty → `Null`,
    /// numeric-looking → `Number`, anything else → `Text`.
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("nan") {
            return Cell::Null;
        }
        match t.parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(t.to_string()),
        }
    }
}

/// A table of rows with named columns, in the pandas "split" orientation:
/// `{"columns": ["sample-id", "depth", ...], "data": [["S1", 10, ...], ...]}`.
///
/// Rows are immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, data: Vec<Vec<Cell>>) -> Self {
        Self { columns, data }
    }

    /// Position of `name` among the columns.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Dataset::column_index`] but a missing column is a configuration error.
    pub fn require_column(&self, name: &str) -> ChartResult<usize> {
        self.column_index(name)
            .ok_or_else(|| ChartError::missing_column(name, &self.columns))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at (`row`, `col`); short rows read as `Null`.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static NULL: Cell = Cell::Null;
        self.data.get(row).and_then(|r| r.get(col)).unwrap_or(&NULL)
    }

    /// Finite numeric values of one column, skipping non-numeric cells.
    pub fn numeric_column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .filter_map(move |r| r.get(col).and_then(Cell::as_f64))
    }
}

/// Data of one metric: either a single table grouped by sample id,
/// or one table per metadata category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricData {
    Single(Dataset),
    ByCategory(IndexMap<String, Dataset>),
}

/// A whole rarefaction report: metric name → its data, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    metrics: IndexMap<String, MetricData>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report holding one metric backed by a single dataset.
    pub fn single(metric: impl Into<String>, dataset: Dataset) -> Self {
        let mut report = Self::new();
        report.insert(metric, MetricData::Single(dataset));
        report
    }

    pub fn insert(&mut self, metric: impl Into<String>, data: MetricData) {
        self.metrics.insert(metric.into(), data);
    }

    /// Metric names in file order.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Category names for `metric` (empty when the metric has no categories).
    pub fn categories(&self, metric: &str) -> Vec<&str> {
        match self.metrics.get(metric) {
            Some(MetricData::ByCategory(map)) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.metrics.contains_key(metric)
    }

    /// Resolve the dataset slice for a metric and optional category.
    ///
    /// A metric without categories ignores `category`; a metric with
    /// categories requires one that exists.
    pub fn dataset(&self, metric: &str, category: Option<&str>) -> ChartResult<&Dataset> {
        let data = self
            .metrics
            .get(metric)
            .ok_or_else(|| ChartError::configuration(format!("unknown metric `{metric}`")))?;
        match (data, category) {
            (MetricData::Single(ds), _) => Ok(ds),
            (MetricData::ByCategory(map), Some(c)) => map.get(c).ok_or_else(|| {
                ChartError::configuration(format!(
                    "unknown category `{c}` for metric `{metric}`"
                ))
            }),
            (MetricData::ByCategory(_), None) => Err(ChartError::configuration(format!(
                "metric `{metric}` is split by category but none was selected"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_deserialize_untagged() {
        let ds: Dataset = serde_json::from_str(
            r#"{"columns":["sample-id","depth","median"],"data":[["S1",10,1.5],["S2",20,null]]}"#,
        )
        .unwrap();
        assert_eq!(ds.columns.len(), 3);
        assert_eq!(ds.cell(0, 0), &Cell::Text("S1".into()));
        assert_eq!(ds.cell(0, 1).as_f64(), Some(10.0));
        assert_eq!(ds.cell(1, 2), &Cell::Null);
        // short rows read as null
        assert_eq!(ds.cell(5, 0), &Cell::Null);
    }

    #[test]
    fn numeric_keys_drop_fraction() {
        assert_eq!(Cell::Number(3.0).as_key().as_deref(), Some("3"));
        assert_eq!(Cell::Number(2.5).as_key().as_deref(), Some("2.5"));
        assert_eq!(Cell::Null.as_key(), None);
    }

    #[test]
    fn parse_raw_fields() {
        assert_eq!(Cell::parse(" 42 "), Cell::Number(42.0));
        assert_eq!(Cell::parse(""), Cell::Null);
        assert_eq!(Cell::parse("NaN"), Cell::Null);
        assert_eq!(Cell::parse("gut"), Cell::Text("gut".into()));
    }

    #[test]
    fn report_keeps_file_order_and_resolves_slices() {
        let report: Report = serde_json::from_str(
            r#"{
                "shannon": {"body-site": {"columns":["body-site","depth","median"],"data":[]},
                            "subject":   {"columns":["subject","depth","median"],"data":[]}},
                "observed_otus": {"columns":["sample-id","depth","median"],"data":[]}
            }"#,
        )
        .unwrap();
        let metrics: Vec<&str> = report.metrics().collect();
        assert_eq!(metrics, vec!["shannon", "observed_otus"]);
        assert_eq!(report.categories("shannon"), vec!["body-site", "subject"]);
        assert!(report.categories("observed_otus").is_empty());

        assert!(report.dataset("shannon", Some("subject")).is_ok());
        assert!(report.dataset("observed_otus", Some("ignored")).is_ok());
        assert!(matches!(
            report.dataset("shannon", None),
            Err(ChartError::Configuration { .. })
        ));
        assert!(matches!(
            report.dataset("faith_pd", None),
            Err(ChartError::Configuration { .. })
        ));
    }
}
