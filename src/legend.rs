//! Legend state: one line swatch, one dot swatch and a label per series,
//! plus the aggregate "Select All" entry.
//!
//! Clicks are routed through [`Legend::click`], which mutates the
//! [`VisibilityStore`] and then asks the [`RenderedChart`] to re-apply
//! opacity for the affected series only.

use crate::error::{ChartError, ChartResult};
use crate::reconcile::{RenderedChart, Scope};
use crate::series::{Rgb, SeriesSet};
use crate::state::{AggregateState, SELECT_ALL_KEY, VisibilityStore};
use crate::viz::text::truncate_to_width;
use indexmap::IndexMap;
use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;

/// Characters kept verbatim in element ids.
const ID_SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Label font size in pixels.
pub const LABEL_FONT_PX: u32 = 10;
/// Vertical distance between legend rows.
pub const ROW_HEIGHT: f64 = 20.0;
/// x offset of the label text (after both swatches).
pub const LABEL_X: u32 = 40;
pub const SELECT_ALL_LABEL: &str = "Select All";
/// Fill of the aggregate swatches while everything is shown.
pub const AGGREGATE_COLOR: Rgb = Rgb(64, 64, 64);

/// Percent-encode a series key so it can be embedded in an element id.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, ID_SAFE).to_string()
}

/// Inverse of [`encode_key`].
pub fn decode_key(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Swatch fill: the series color when shown, neutral when hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "color", rename_all = "lowercase")]
pub enum Fill {
    Colored(Rgb),
    Neutral,
}

impl Fill {
    fn of(color: Rgb, visible: bool) -> Self {
        if visible { Fill::Colored(color) } else { Fill::Neutral }
    }

    pub fn is_colored(&self) -> bool {
        matches!(self, Fill::Colored(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub key: String,
    /// The series key as shown to the user; see [`Legend::display_label`]
    /// for the width-fitted form.
    pub label: String,
    /// Element id fragment, e.g. `idrect<id>` / `iddot<id>`.
    pub element_id: String,
    pub color: Rgb,
    pub line_fill: Fill,
    pub dot_fill: Fill,
    /// Row center, in legend pixels.
    pub y: f64,
}

/// A click on one legend glyph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LegendTarget {
    Line(String),
    Dots(String),
    AllLines,
    AllDots,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legend {
    #[serde(serialize_with = "entries_seq")]
    entries: IndexMap<String, LegendEntry>,
    select_all: Option<LegendEntry>,
    #[serde(skip)]
    label_width_px: u32,
}

fn entries_seq<S: serde::Serializer>(
    map: &IndexMap<String, LegendEntry>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(map.values())
}

impl Legend {
    /// Legend whose labels are truncated to fit `width_px`.
    pub fn new(width_px: u32) -> Self {
        Self {
            label_width_px: width_px.saturating_sub(LABEL_X + 4),
            ..Self::default()
        }
    }

    /// Rebuild entries for `series`, in series order. The aggregate entry is
    /// omitted when there are no series.
    pub fn sync(&mut self, series: &SeriesSet, store: &mut VisibilityStore) {
        let mut entries = IndexMap::with_capacity(series.len());
        for (i, key) in series.keys().enumerate() {
            let st = store.ensure(key);
            entries.insert(
                key.to_string(),
                LegendEntry {
                    key: key.to_string(),
                    label: key.to_string(),
                    element_id: encode_key(key),
                    color: st.color,
                    line_fill: Fill::of(st.color, st.line_visible),
                    dot_fill: Fill::of(st.color, st.dots_visible),
                    y: row_center(i),
                },
            );
        }
        self.select_all = if entries.is_empty() {
            None
        } else {
            let agg = store.aggregate_of(entries.keys().map(String::as_str));
            Some(LegendEntry {
                key: SELECT_ALL_KEY.to_string(),
                label: SELECT_ALL_LABEL.to_string(),
                element_id: encode_key(SELECT_ALL_KEY),
                color: AGGREGATE_COLOR,
                line_fill: Fill::of(AGGREGATE_COLOR, agg.line_visible),
                dot_fill: Fill::of(AGGREGATE_COLOR, agg.dots_visible),
                y: row_center(entries.len()),
            })
        };
        self.entries = entries;
    }

    /// Handle a click: mutate the store, refresh the affected swatches and
    /// re-apply opacity on the chart. Returns how many chart elements changed.
    pub fn click(
        &mut self,
        target: &LegendTarget,
        store: &mut VisibilityStore,
        chart: &mut RenderedChart,
    ) -> ChartResult<usize> {
        let changed = match target {
            LegendTarget::Line(key) => {
                let st = self.lookup(key, store)?;
                store.set_line(key, !st.line_visible)?;
                self.refresh_entry(key, store)?;
                chart.apply_visibility(Scope::Series(key), store)
            }
            LegendTarget::Dots(key) => {
                let st = self.lookup(key, store)?;
                store.set_dots(key, !st.dots_visible)?;
                self.refresh_entry(key, store)?;
                chart.apply_visibility(Scope::Series(key), store)
            }
            LegendTarget::AllLines | LegendTarget::AllDots => {
                if self.select_all.is_none() {
                    debug!("legend click {target:?} ignored: no series shown");
                    return Ok(0);
                }
                let target_visible = !self.aggregate(store).all_visible();
                store.toggle_all(target_visible);
                let keys: Vec<String> = self.entries.keys().cloned().collect();
                for key in &keys {
                    self.refresh_entry(key, store)?;
                }
                chart.apply_visibility(Scope::All, store)
            }
        };
        self.refresh_aggregate(store);
        debug!("legend click {target:?} changed {changed} elements");
        Ok(changed)
    }

    pub fn entries(&self) -> impl Iterator<Item = &LegendEntry> {
        self.entries.values()
    }

    pub fn entry(&self, key: &str) -> Option<&LegendEntry> {
        self.entries.get(key)
    }

    /// Find an entry by its encoded element id.
    pub fn entry_by_element_id(&self, element_id: &str) -> Option<&LegendEntry> {
        self.entries.get(&decode_key(element_id))
    }

    /// Aggregate flags over the series currently in the legend.
    pub fn aggregate(&self, store: &VisibilityStore) -> AggregateState {
        store.aggregate_of(self.entries.keys().map(String::as_str))
    }

    /// Label of `entry` shortened with an ellipsis to fit the legend column.
    pub fn display_label(&self, entry: &LegendEntry) -> String {
        self.fit_label(&entry.label)
    }

    pub fn select_all(&self) -> Option<&LegendEntry> {
        self.select_all.as_ref()
    }

    /// Number of rows, including the aggregate row.
    pub fn row_count(&self) -> usize {
        self.entries.len() + usize::from(self.select_all.is_some())
    }

    /// Height needed to draw every row.
    pub fn height_px(&self) -> f64 {
        self.row_count() as f64 * ROW_HEIGHT
    }

    fn lookup(&self, key: &str, store: &VisibilityStore) -> ChartResult<crate::state::SeriesState> {
        if !self.entries.contains_key(key) {
            return Err(ChartError::StateLookup {
                key: key.to_string(),
            });
        }
        store.get(key)
    }

    fn refresh_entry(&mut self, key: &str, store: &VisibilityStore) -> ChartResult<()> {
        let st = store.get(key)?;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.line_fill = Fill::of(entry.color, st.line_visible);
            entry.dot_fill = Fill::of(entry.color, st.dots_visible);
        }
        Ok(())
    }

    fn refresh_aggregate(&mut self, store: &VisibilityStore) {
        let agg = self.aggregate(store);
        if let Some(entry) = self.select_all.as_mut() {
            entry.line_fill = Fill::of(entry.color, agg.line_visible);
            entry.dot_fill = Fill::of(entry.color, agg.dots_visible);
        }
    }

    fn fit_label(&self, key: &str) -> String {
        if self.label_width_px == 0 {
            key.to_string()
        } else {
            truncate_to_width(key, LABEL_FONT_PX, self.label_width_px)
        }
    }
}

fn row_center(i: usize) -> f64 {
    ROW_HEIGHT / 2.0 + i as f64 * ROW_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_element_ids() {
        for key in ["S1", "gut microbiome", "50%", "a/b#c.d", "Ünïcödé ✓", "__select_all__"] {
            let enc = encode_key(key);
            assert!(!enc.contains(' '));
            assert!(!enc.contains('#'));
            assert_eq!(decode_key(&enc), key);
        }
        assert_eq!(encode_key("Select All"), "Select%20All");
    }

    fn one_series(key: &str) -> (SeriesSet, VisibilityStore) {
        use crate::config::ChartConfig;
        use crate::models::{Cell, Dataset};
        use crate::series::{build_series, resolve_fields};
        let ds = Dataset::new(
            vec!["sample-id".into(), "depth".into(), "median".into()],
            vec![vec![Cell::Text(key.into()), Cell::Number(10.0), Cell::Number(1.0)]],
        );
        let mut store = VisibilityStore::new();
        let fields = resolve_fields(&ds, &ChartConfig::default(), None).unwrap();
        let set = build_series(&ds, &fields, &mut store).unwrap();
        (set, store)
    }

    #[test]
    fn labels_keep_the_full_key() {
        let key = "a-very-long-sample-identifier-that-will-not-fit";
        let (set, mut store) = one_series(key);
        let mut legend = Legend::new(120);
        legend.sync(&set, &mut store);
        let entry = legend.entry(key).unwrap();
        assert_eq!(entry.label, key);
        let shown = legend.display_label(entry);
        assert!(shown.ends_with('…'));
        assert!(shown.chars().count() < key.chars().count());
        assert_eq!(Legend::new(0).fit_label("short"), "short");
    }

    #[test]
    fn select_all_on_empty_legend_is_a_noop() {
        let mut store = VisibilityStore::new();
        store.ensure("hidden-elsewhere");
        let mut legend = Legend::new(200);
        legend.sync(&SeriesSet::default(), &mut store);
        assert!(legend.select_all().is_none());
        let mut chart = RenderedChart::new();
        let changed = legend
            .click(&LegendTarget::AllLines, &mut store, &mut chart)
            .unwrap();
        assert_eq!(changed, 0);
        assert!(store.get("hidden-elsewhere").unwrap().line_visible);
    }

    #[test]
    fn row_centers_are_evenly_spaced() {
        assert_eq!(row_center(0), 10.0);
        assert_eq!(row_center(2), 50.0);
    }
}
