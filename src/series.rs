//! Series building: rows → one ordered, colored series per group value.

use crate::config::ChartConfig;
use crate::error::{ChartError, ChartResult};
use crate::models::{Cell, Dataset};
use crate::state::VisibilityStore;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green, Dark Blue, Dark Orange, Dark Gray, Brownish Gold.
const OFFICE10: [Rgb; 10] = [
    Rgb(68, 114, 196),  // blue      (#4472C4)
    Rgb(237, 125, 49),  // orange    (#ED7D31)
    Rgb(165, 165, 165), // gray      (#A5A5A5)
    Rgb(255, 192, 0),   // gold      (#FFC000)
    Rgb(91, 155, 213),  // light blue(#5B9BD5)
    Rgb(112, 173, 71),  // green     (#70AD47)
    Rgb(38, 68, 120),   // dark blue (#264478)
    Rgb(158, 72, 14),   // dark org. (#9E480E)
    Rgb(99, 99, 99),    // dark gray (#636363)
    Rgb(153, 115, 0),   // brownish  (#997300)
];

/// Fixed-size categorical palette indexed by position modulo its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: OFFICE10.to_vec(),
        }
    }
}

impl Palette {
    /// Custom palette; an empty list falls back to the default colors.
    pub fn new(colors: Vec<Rgb>) -> Self {
        if colors.is_empty() {
            Self::default()
        } else {
            Self { colors }
        }
    }

    #[inline]
    pub fn pick(&self, idx: usize) -> Rgb {
        self.colors[idx % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Map an ordered key list onto palette slots by position.
pub fn assign_colors<'a, I>(keys: I, palette: &Palette) -> Vec<(String, Rgb)>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .enumerate()
        .map(|(i, k)| (k.to_string(), palette.pick(i)))
        .collect()
}

/// One data point of a series. `row` is the index of the source row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub row: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: String,
    /// Sorted ascending by `x`.
    pub points: Vec<Point>,
    pub color: Rgb,
    pub line_visible: bool,
    pub dots_visible: bool,
}

/// Series of one render pass, in stable key order. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesSet {
    series: Vec<Series>,
}

impl SeriesSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Series> {
        self.series.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.key == key)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn total_points(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// Combined `[min, max]` of x over all points.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        extent(self.series.iter().flat_map(|s| s.points.iter().map(|p| p.x)))
    }

    /// Combined `[min, max]` of y over all points.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        extent(self.series.iter().flat_map(|s| s.points.iter().map(|p| p.y)))
    }

    /// Re-read color and flags of every series from the store.
    pub(crate) fn sync_state(&mut self, store: &mut VisibilityStore) {
        for s in self.series.iter_mut() {
            let st = store.ensure(&s.key);
            s.color = st.color;
            s.line_visible = st.line_visible;
            s.dots_visible = st.dots_visible;
        }
    }
}

impl<'a> IntoIterator for &'a SeriesSet {
    type Item = &'a Series;
    type IntoIter = std::slice::Iter<'a, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

/// `[min, max]` of finite values; `None` when there are none.
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Column positions used to build series from one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    pub group: String,
    pub group_idx: usize,
    pub x_idx: usize,
    pub y_idx: usize,
}

/// Resolve the group, x and y columns.
///
/// The group column is the sample-id column when the dataset has one,
/// otherwise the active category. Anything missing is a configuration error.
pub fn resolve_fields(
    dataset: &Dataset,
    config: &ChartConfig,
    category: Option<&str>,
) -> ChartResult<Fields> {
    let group = if dataset.has_column(&config.sample_id_field) {
        config.sample_id_field.clone()
    } else if let Some(c) = category {
        c.to_string()
    } else {
        return Err(ChartError::missing_column(
            &config.sample_id_field,
            &dataset.columns,
        ));
    };
    let group_idx = dataset.require_column(&group)?;
    let x_idx = dataset.require_column(&config.x_field)?;
    let y_idx = config
        .y_candidates()
        .find_map(|name| dataset.column_index(name))
        .ok_or_else(|| ChartError::missing_column(&config.y_field, &dataset.columns))?;
    Ok(Fields {
        group,
        group_idx,
        x_idx,
        y_idx,
    })
}

/// Group rows into per-key point lists.
///
/// Keys come out in first-occurrence order after a stable sort of all rows
/// by x, and each point list is ascending by x. No state is touched, so a
/// failure here leaves the session as it was.
pub fn group_rows(dataset: &Dataset, fields: &Fields) -> ChartResult<IndexMap<String, Vec<Point>>> {
    let mut rows: Vec<(String, Point)> = Vec::with_capacity(dataset.len());
    for row in 0..dataset.len() {
        let key = dataset
            .cell(row, fields.group_idx)
            .as_key()
            .ok_or_else(|| malformed(row, &fields.group, "is empty"))?;
        let x = numeric(dataset, row, fields.x_idx)?;
        let y = numeric(dataset, row, fields.y_idx)?;
        rows.push((key, Point { row, x, y }));
    }
    // stable: equal depths keep file order
    rows.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));

    let mut groups: IndexMap<String, Vec<Point>> = IndexMap::new();
    for (key, point) in rows {
        groups.entry(key).or_default().push(point);
    }
    Ok(groups)
}

/// Build the series set for one dataset, taking color and visibility of each
/// key from the store (first sightings are created there).
pub fn build_series(
    dataset: &Dataset,
    fields: &Fields,
    store: &mut VisibilityStore,
) -> ChartResult<SeriesSet> {
    let groups = group_rows(dataset, fields)?;
    if groups.is_empty() {
        warn!("dataset has no rows; rendering an empty chart");
    }
    let series = groups
        .into_iter()
        .map(|(key, points)| {
            let st = store.ensure(&key);
            Series {
                key,
                points,
                color: st.color,
                line_visible: st.line_visible,
                dots_visible: st.dots_visible,
            }
        })
        .collect::<Vec<_>>();
    debug!(
        "built {} series from {} rows grouped by `{}`",
        series.len(),
        dataset.len(),
        fields.group
    );
    Ok(SeriesSet { series })
}

fn numeric(dataset: &Dataset, row: usize, col: usize) -> ChartResult<f64> {
    let cell = dataset.cell(row, col);
    cell.as_f64().ok_or_else(|| {
        let reason = match cell {
            Cell::Null => "is empty".to_string(),
            Cell::Text(t) => format!("is not numeric (`{t}`)"),
            Cell::Number(v) => format!("is not finite ({v})"),
        };
        malformed(row, &dataset.columns[col], &reason)
    })
}

fn malformed(row: usize, column: &str, reason: &str) -> ChartError {
    ChartError::MalformedRow {
        row,
        column: column.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(rows: &[(&str, f64, f64)]) -> Dataset {
        Dataset::new(
            vec!["sample-id".into(), "depth".into(), "median".into()],
            rows.iter()
                .map(|(k, x, y)| vec![Cell::Text((*k).into()), Cell::Number(*x), Cell::Number(*y)])
                .collect(),
        )
    }

    fn fields(d: &Dataset) -> Fields {
        resolve_fields(d, &ChartConfig::default(), None).unwrap()
    }

    #[test]
    fn keys_in_first_occurrence_order_after_sorting_by_depth() {
        // B appears first in the file but A owns the smallest depth
        let d = ds(&[("B", 20.0, 1.0), ("A", 10.0, 2.0), ("B", 5.0, 3.0), ("C", 30.0, 0.0)]);
        let groups = group_rows(&d, &fields(&d)).unwrap();
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
        let bx: Vec<f64> = groups["B"].iter().map(|p| p.x).collect();
        assert_eq!(bx, vec![5.0, 20.0]);
    }

    #[test]
    fn every_row_lands_in_exactly_one_series() {
        let d = ds(&[
            ("A", 10.0, 1.0),
            ("B", 10.0, 1.0),
            ("A", 30.0, 1.0),
            ("C", 20.0, 1.0),
            ("B", 20.0, 1.0),
        ]);
        let mut store = VisibilityStore::new();
        let set = build_series(&d, &fields(&d), &mut store).unwrap();
        assert_eq!(set.len(), 3);
        let mut rows: Vec<usize> = set.iter().flat_map(|s| s.points.iter().map(|p| p.row)).collect();
        rows.sort();
        assert_eq!(rows, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn category_column_used_without_sample_id() {
        let d = Dataset::new(
            vec!["body-site".into(), "depth".into(), "50%".into()],
            vec![vec![Cell::Text("gut".into()), Cell::Number(1.0), Cell::Number(2.0)]],
        );
        let f = resolve_fields(&d, &ChartConfig::default(), Some("body-site")).unwrap();
        assert_eq!(f.group, "body-site");
        assert_eq!(f.y_idx, 2);
    }

    #[test]
    fn missing_group_column_is_configuration_error() {
        let d = Dataset::new(vec!["depth".into(), "median".into()], vec![]);
        let err = resolve_fields(&d, &ChartConfig::default(), Some("subject")).unwrap_err();
        assert!(matches!(err, ChartError::Configuration { .. }));
        let err = resolve_fields(&d, &ChartConfig::default(), None).unwrap_err();
        assert!(matches!(err, ChartError::Configuration { .. }));
    }

    #[test]
    fn non_numeric_depth_is_malformed_row() {
        let d = Dataset::new(
            vec!["sample-id".into(), "depth".into(), "median".into()],
            vec![vec![Cell::Text("S1".into()), Cell::Text("deep".into()), Cell::Number(1.0)]],
        );
        let err = group_rows(&d, &fields(&d)).unwrap_err();
        assert!(matches!(err, ChartError::MalformedRow { row: 0, ref column, .. } if column == "depth"));
    }

    #[test]
    fn color_assignment_is_positional_and_stable() {
        let palette = Palette::default();
        let keys = ["S1", "S2", "S3"];
        let first = assign_colors(keys, &palette);
        let second = assign_colors(keys, &palette);
        assert_eq!(first, second);
        assert_eq!(first[2].1, palette.pick(2));
        // wraps around the palette
        let many: Vec<String> = (0..12).map(|i| format!("k{i}")).collect();
        let colors = assign_colors(many.iter().map(String::as_str), &palette);
        assert_eq!(colors[10].1, colors[0].1);
    }

    #[test]
    fn new_keys_append_without_shifting_colors() {
        let mut store = VisibilityStore::new();
        let d1 = ds(&[("A", 1.0, 1.0), ("B", 2.0, 1.0)]);
        let s1 = build_series(&d1, &fields(&d1), &mut store).unwrap();
        // C sorts before A by depth in the second dataset but is new to the session
        let d2 = ds(&[("C", 0.5, 1.0), ("A", 1.0, 1.0), ("B", 2.0, 1.0)]);
        let s2 = build_series(&d2, &fields(&d2), &mut store).unwrap();
        assert_eq!(s1.get("A").unwrap().color, s2.get("A").unwrap().color);
        assert_eq!(s1.get("B").unwrap().color, s2.get("B").unwrap().color);
        assert_eq!(s2.get("C").unwrap().color, Palette::default().pick(2));
    }

    #[test]
    fn hex_format() {
        assert_eq!(Rgb(68, 114, 196).hex(), "#4472c4");
    }
}
