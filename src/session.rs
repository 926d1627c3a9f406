//! A report session: the active metric/category selection plus everything
//! derived from it (series, scales, reconciled chart, legend) and the
//! visibility store that outlives every selection change.
//!
//! Each selection change re-runs the pipeline. The new series, scales and
//! reconcile plan are computed before any of the session's fields change, so
//! a failing pass leaves the previous chart on screen.

use crate::config::{ChartConfig, YExtent};
use crate::error::{ChartError, ChartResult};
use crate::legend::{Legend, LegendEntry, LegendTarget};
use crate::models::{Dataset, Report};
use crate::reconcile::{ReconcileReport, RenderedChart};
use crate::scale::{ChartScales, envelope_extent, x_axis, y_axis};
use crate::series::{SeriesSet, build_series, resolve_fields};
use crate::state::VisibilityStore;
use log::{debug, info};
use serde::Serialize;

const ENVELOPE_LOW: &str = "min";
const ENVELOPE_HIGH: &str = "max";

#[derive(Debug, Clone)]
pub struct Session {
    report: Report,
    config: ChartConfig,
    metric: String,
    category: Option<String>,
    store: VisibilityStore,
    series: SeriesSet,
    scales: ChartScales,
    chart: RenderedChart,
    legend: Legend,
}

/// Serializable view of a session, written by the CLI's `--state` flag.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot<'a> {
    pub metric: &'a str,
    pub category: Option<&'a str>,
    pub download_target: String,
    pub scales: &'a ChartScales,
    pub legend: Vec<&'a LegendEntry>,
    pub select_all: Option<&'a LegendEntry>,
    pub state: &'a VisibilityStore,
    pub chart: &'a RenderedChart,
}

impl Session {
    /// Open a session on the first metric of `report` and, for a
    /// category-split metric, its first category.
    pub fn new(report: Report, config: ChartConfig) -> ChartResult<Self> {
        let metric = report
            .metrics()
            .next()
            .ok_or_else(|| ChartError::configuration("report has no metrics"))?
            .to_string();
        let category = report.categories(&metric).first().map(|c| c.to_string());
        Self::with_selection(report, config, metric, category)
    }

    /// Open a session on an explicit selection. Without a category, a
    /// category-split metric opens on its first one; a named category must
    /// exist.
    pub fn with_selection(
        report: Report,
        config: ChartConfig,
        metric: impl Into<String>,
        category: Option<String>,
    ) -> ChartResult<Self> {
        let legend = Legend::new(config.legend_width);
        let mut session = Self {
            report,
            config,
            metric: metric.into(),
            category: None,
            store: VisibilityStore::new(),
            series: SeriesSet::default(),
            scales: ChartScales {
                x: x_axis(None, 0.0),
                y: y_axis(None, 0.0),
            },
            chart: RenderedChart::new(),
            legend,
        };
        if !session.report.has_metric(&session.metric) {
            return Err(ChartError::configuration(format!(
                "unknown metric `{}`",
                session.metric
            )));
        }
        let metric = session.metric.clone();
        let category = category.or_else(|| session.fit_category(&metric, None));
        session.render(&metric, category)?;
        Ok(session)
    }

    /// Switch metric, keeping the category when the new metric has it.
    pub fn set_metric(&mut self, metric: &str) -> ChartResult<ReconcileReport> {
        if !self.report.has_metric(metric) {
            return Err(ChartError::configuration(format!(
                "unknown metric `{metric}`"
            )));
        }
        let category = self.fit_category(metric, self.category.clone());
        let report = self.render(metric, category)?;
        info!("metric set to `{metric}`");
        Ok(report)
    }

    /// Switch category, keeping the metric.
    pub fn set_category(&mut self, category: &str) -> ChartResult<ReconcileReport> {
        let metric = self.metric.clone();
        let report = self.render(&metric, Some(category.to_string()))?;
        info!("category set to `{category}`");
        Ok(report)
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// File name offered for downloading the active metric's table.
    pub fn download_target(&self) -> String {
        format!("{}.csv", self.metric)
    }

    /// Route a legend click. Returns how many chart elements changed opacity.
    pub fn click(&mut self, target: &LegendTarget) -> ChartResult<usize> {
        let changed = self
            .legend
            .click(target, &mut self.store, &mut self.chart)?;
        self.series.sync_state(&mut self.store);
        Ok(changed)
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    pub fn chart(&self) -> &RenderedChart {
        &self.chart
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn store(&self) -> &VisibilityStore {
        &self.store
    }

    pub fn scales(&self) -> &ChartScales {
        &self.scales
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            metric: &self.metric,
            category: self.category.as_deref(),
            download_target: self.download_target(),
            scales: &self.scales,
            legend: self.legend.entries().collect(),
            select_all: self.legend.select_all(),
            state: &self.store,
            chart: &self.chart,
        }
    }

    /// Category to use for `metric`: the requested one when the metric has
    /// it (or has no categories at all), else the metric's first category.
    fn fit_category(&self, metric: &str, wanted: Option<String>) -> Option<String> {
        let categories = self.report.categories(metric);
        if categories.is_empty() {
            return wanted;
        }
        match wanted {
            Some(c) if categories.contains(&c.as_str()) => Some(c),
            _ => categories.first().map(|c| c.to_string()),
        }
    }

    fn render(&mut self, metric: &str, category: Option<String>) -> ChartResult<ReconcileReport> {
        let dataset = self.report.dataset(metric, category.as_deref())?;
        let fields = resolve_fields(dataset, &self.config, category.as_deref())?;
        let series = build_series(dataset, &fields, &mut self.store)?;
        let scales = ChartScales {
            x: x_axis(series.x_extent(), f64::from(self.config.width)),
            y: y_axis(
                y_extent(dataset, &series, self.config.y_extent),
                f64::from(self.config.height),
            ),
        };
        let plan = self.chart.plan(&series, &scales, &mut self.store);

        let report = self.chart.commit(plan);
        self.legend.sync(&series, &mut self.store);
        self.series = series;
        self.scales = scales;
        self.metric = metric.to_string();
        self.category = category;
        debug!(
            "rendered `{}` / {:?}: {} series, {} markers",
            self.metric,
            self.category,
            self.series.len(),
            self.chart.marker_count()
        );
        Ok(report)
    }
}

fn y_extent(dataset: &Dataset, series: &SeriesSet, mode: YExtent) -> Option<(f64, f64)> {
    let stat = series.y_extent();
    if mode == YExtent::Statistic || series.is_empty() {
        return stat;
    }
    let (Some(lo), Some(hi)) = (
        dataset.column_index(ENVELOPE_LOW),
        dataset.column_index(ENVELOPE_HIGH),
    ) else {
        return stat;
    };
    match (
        envelope_extent(dataset.numeric_column(lo), dataset.numeric_column(hi)),
        stat,
    ) {
        (Some((a, b)), Some((c, d))) => Some((a.min(c), b.max(d))),
        (env, stat) => env.or(stat),
    }
}
