//! Per-series visibility and color state that survives re-renders.
//!
//! The store is created once per report session and owned by it. Entries are
//! only ever added; a key that disappears from the active dataset keeps its
//! state so toggles come back when the key does.

use crate::error::{ChartError, ChartResult};
use crate::series::{Palette, Rgb};
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

/// Key of the synthetic "select all" legend entry.
pub const SELECT_ALL_KEY: &str = "__select_all__";

/// Visibility and color of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesState {
    pub color: Rgb,
    pub line_visible: bool,
    pub dots_visible: bool,
}

/// Summary flags of the aggregate entry: `true` when every known series has
/// that element visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateState {
    pub line_visible: bool,
    pub dots_visible: bool,
}

impl AggregateState {
    pub fn all_visible(&self) -> bool {
        self.line_visible && self.dots_visible
    }
}

impl Default for AggregateState {
    fn default() -> Self {
        Self {
            line_visible: true,
            dots_visible: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VisibilityStore {
    #[serde(skip)]
    palette: Palette,
    /// Insertion order is first-sighting order, which fixes palette slots.
    series: IndexMap<String, SeriesState>,
    #[serde(rename = "__select_all__")]
    aggregate: AggregateState,
}

impl VisibilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_palette(palette: Palette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    /// Existing state for `key`, or a fresh visible entry colored from the
    /// next palette slot. Never overwrites.
    pub fn ensure(&mut self, key: &str) -> SeriesState {
        if let Some(state) = self.series.get(key) {
            return *state;
        }
        let state = SeriesState {
            color: self.palette.pick(self.series.len()),
            line_visible: true,
            dots_visible: true,
        };
        debug!("new series state for `{key}` (slot {})", self.series.len());
        self.series.insert(key.to_string(), state);
        self.refresh_aggregate();
        state
    }

    /// State of a key that was previously ensured.
    pub fn get(&self, key: &str) -> ChartResult<SeriesState> {
        self.series
            .get(key)
            .copied()
            .ok_or_else(|| ChartError::StateLookup {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }

    pub fn set_line(&mut self, key: &str, visible: bool) -> ChartResult<()> {
        self.entry_mut(key)?.line_visible = visible;
        self.refresh_aggregate();
        Ok(())
    }

    pub fn set_dots(&mut self, key: &str, visible: bool) -> ChartResult<()> {
        self.entry_mut(key)?.dots_visible = visible;
        self.refresh_aggregate();
        Ok(())
    }

    /// Set both flags of every known series to `visible` and record the
    /// aggregate flags to the same value.
    pub fn toggle_all(&mut self, visible: bool) {
        for state in self.series.values_mut() {
            state.line_visible = visible;
            state.dots_visible = visible;
        }
        self.aggregate = AggregateState {
            line_visible: visible,
            dots_visible: visible,
        };
    }

    pub fn aggregate(&self) -> AggregateState {
        self.aggregate
    }

    /// Aggregate flags over `keys` only; keys without state count as visible.
    pub fn aggregate_of<'a, I>(&self, keys: I) -> AggregateState
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut agg = AggregateState::default();
        for st in keys.into_iter().filter_map(|k| self.series.get(k)) {
            agg.line_visible &= st.line_visible;
            agg.dots_visible &= st.dots_visible;
        }
        agg
    }

    /// Known keys in first-sighting order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn entry_mut(&mut self, key: &str) -> ChartResult<&mut SeriesState> {
        self.series
            .get_mut(key)
            .ok_or_else(|| ChartError::StateLookup {
                key: key.to_string(),
            })
    }

    fn refresh_aggregate(&mut self) {
        self.aggregate = AggregateState {
            line_visible: self.series.values().all(|s| s.line_visible),
            dots_visible: self.series.values().all(|s| s.dots_visible),
        };
    }
}
