//! Keyed reconciliation of rendered lines and markers.
//!
//! Elements are identified by stable keys: a line by its series key, a marker
//! by `(series key, x, occurrence)`. A pass diffs the wanted elements against
//! the current ones, so elements whose data did not change keep their handle
//! and are not recreated. Hidden elements stay in place with zero opacity.

use crate::scale::ChartScales;
use crate::series::{Rgb, SeriesSet};
use crate::state::VisibilityStore;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

/// Handle of a rendered element, unique for the lifetime of a chart.
pub type ElementId = u64;

pub const VISIBLE: f64 = 1.0;
pub const HIDDEN: f64 = 0.0;

fn opacity(visible: bool) -> f64 {
    if visible { VISIBLE } else { HIDDEN }
}

/// Identity of a marker. `occurrence` separates repeated depths within one series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerKey {
    pub series: String,
    x_bits: u64,
    pub occurrence: usize,
}

impl MarkerKey {
    pub fn new(series: impl Into<String>, x: f64, occurrence: usize) -> Self {
        Self {
            series: series.into(),
            x_bits: x.to_bits(),
            occurrence,
        }
    }

    pub fn x(&self) -> f64 {
        f64::from_bits(self.x_bits)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: ElementId,
    pub series: String,
    /// Source row of the point.
    pub row: usize,
    /// Data coordinates.
    pub data: (f64, f64),
    /// Pixel coordinates inside the plot area.
    pub pos: (f64, f64),
    pub color: Rgb,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub id: ElementId,
    pub series: String,
    pub data: Vec<(f64, f64)>,
    pub path: Vec<(f64, f64)>,
    pub color: Rgb,
    pub opacity: f64,
}

/// Counts of one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl ReconcileReport {
    /// Nothing was added, updated or removed.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

/// Which series an opacity refresh applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Series(&'a str),
    All,
}

impl Scope<'_> {
    fn covers(&self, key: &str) -> bool {
        match self {
            Scope::Series(k) => *k == key,
            Scope::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MarkerSpec {
    series: String,
    row: usize,
    data: (f64, f64),
    pos: (f64, f64),
    color: Rgb,
    opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct LineSpec {
    data: Vec<(f64, f64)>,
    path: Vec<(f64, f64)>,
    color: Rgb,
    opacity: f64,
}

/// Wanted element set of one pass, computed without touching the chart.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    markers: IndexMap<MarkerKey, MarkerSpec>,
    lines: IndexMap<String, LineSpec>,
}

impl Plan {
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Rendered lines and markers, owned exclusively by the reconciler.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderedChart {
    #[serde(serialize_with = "values_only")]
    markers: IndexMap<MarkerKey, Marker>,
    #[serde(serialize_with = "values_only")]
    lines: IndexMap<String, Line>,
    #[serde(skip)]
    next_id: ElementId,
}

fn values_only<K, V: Serialize, S: serde::Serializer>(
    map: &IndexMap<K, V>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(map.values())
}

impl RenderedChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the wanted elements for `series`. Keys without a store entry
    /// are ensured (shown) rather than rejected.
    pub fn plan(
        &self,
        series: &SeriesSet,
        scales: &ChartScales,
        store: &mut VisibilityStore,
    ) -> Plan {
        let mut plan = Plan::default();
        for s in series {
            let st = store.ensure(&s.key);
            let mut seen: IndexMap<u64, usize> = IndexMap::new();
            for p in &s.points {
                let occ = seen.entry(p.x.to_bits()).or_insert(0);
                plan.markers.insert(
                    MarkerKey::new(s.key.as_str(), p.x, *occ),
                    MarkerSpec {
                        series: s.key.clone(),
                        row: p.row,
                        data: (p.x, p.y),
                        pos: scales.project(p.x, p.y),
                        color: st.color,
                        opacity: opacity(st.dots_visible),
                    },
                );
                *occ += 1;
            }
            let data: Vec<(f64, f64)> = s.points.iter().map(|p| (p.x, p.y)).collect();
            let path = data.iter().map(|(x, y)| scales.project(*x, *y)).collect();
            plan.lines.insert(
                s.key.clone(),
                LineSpec {
                    data,
                    path,
                    color: st.color,
                    opacity: opacity(st.line_visible),
                },
            );
        }
        plan
    }

    /// Apply a plan: drop elements that are no longer wanted, update retained
    /// ones in place, add new ones. Element order follows the plan.
    pub fn commit(&mut self, plan: Plan) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let mut old_markers = std::mem::take(&mut self.markers);
        let mut markers = IndexMap::with_capacity(plan.markers.len());
        for (key, spec) in plan.markers {
            let marker = match old_markers.swap_remove(&key) {
                Some(mut m) => {
                    let changed = m.row != spec.row
                        || m.data != spec.data
                        || m.pos != spec.pos
                        || m.color != spec.color
                        || m.opacity != spec.opacity;
                    if changed {
                        m.row = spec.row;
                        m.data = spec.data;
                        m.pos = spec.pos;
                        m.color = spec.color;
                        m.opacity = spec.opacity;
                        report.updated += 1;
                    } else {
                        report.unchanged += 1;
                    }
                    m
                }
                None => {
                    report.added += 1;
                    Marker {
                        id: self.next_id(),
                        series: spec.series,
                        row: spec.row,
                        data: spec.data,
                        pos: spec.pos,
                        color: spec.color,
                        opacity: spec.opacity,
                    }
                }
            };
            markers.insert(key, marker);
        }
        report.removed += old_markers.len();
        self.markers = markers;

        let mut old_lines = std::mem::take(&mut self.lines);
        let mut lines = IndexMap::with_capacity(plan.lines.len());
        for (key, spec) in plan.lines {
            let line = match old_lines.swap_remove(&key) {
                Some(mut l) => {
                    let changed = l.data != spec.data
                        || l.path != spec.path
                        || l.color != spec.color
                        || l.opacity != spec.opacity;
                    if changed {
                        l.data = spec.data;
                        l.path = spec.path;
                        l.color = spec.color;
                        l.opacity = spec.opacity;
                        report.updated += 1;
                    } else {
                        report.unchanged += 1;
                    }
                    l
                }
                None => {
                    report.added += 1;
                    Line {
                        id: self.next_id(),
                        series: key.clone(),
                        data: spec.data,
                        path: spec.path,
                        color: spec.color,
                        opacity: spec.opacity,
                    }
                }
            };
            lines.insert(key, line);
        }
        report.removed += old_lines.len();
        self.lines = lines;

        debug!("reconciled chart: {report:?}");
        report
    }

    /// Plan and commit in one step.
    pub fn reconcile(
        &mut self,
        series: &SeriesSet,
        scales: &ChartScales,
        store: &mut VisibilityStore,
    ) -> ReconcileReport {
        let plan = self.plan(series, scales, store);
        self.commit(plan)
    }

    /// Re-read visibility from the store for the elements in `scope`.
    /// Returns how many elements changed opacity.
    pub fn apply_visibility(&mut self, scope: Scope<'_>, store: &mut VisibilityStore) -> usize {
        let mut changed = 0;
        for line in self.lines.values_mut().filter(|l| scope.covers(&l.series)) {
            let o = opacity(store.ensure(&line.series).line_visible);
            if line.opacity != o {
                line.opacity = o;
                changed += 1;
            }
        }
        for marker in self.markers.values_mut().filter(|m| scope.covers(&m.series)) {
            let o = opacity(store.ensure(&marker.series).dots_visible);
            if marker.opacity != o {
                marker.opacity = o;
                changed += 1;
            }
        }
        changed
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    pub fn marker(&self, key: &MarkerKey) -> Option<&Marker> {
        self.markers.get(key)
    }

    pub fn line(&self, series: &str) -> Option<&Line> {
        self.lines.get(series)
    }

    pub fn markers_of<'a>(&'a self, series: &'a str) -> impl Iterator<Item = &'a Marker> + 'a {
        self.markers.values().filter(move |m| m.series == series)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.lines.is_empty()
    }

    fn next_id(&mut self) -> ElementId {
        self.next_id += 1;
        self.next_id
    }
}
