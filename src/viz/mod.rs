//! Drawing: render a [`Session`]'s reconciled chart and legend to **SVG** or a bitmap.
//!
//! - Axes and tick labels come from plotters' mesh, driven by the session's scales
//! - Locale-aware tick labels (`30,000` vs `30.000`)
//! - Hidden lines and markers are skipped; visible ones are drawn at their reconciled opacity
//! - Legend panel on the right: line swatch, dot swatch, label per series, then "Select All"

pub mod legend;
pub mod text;
pub mod types;
pub mod util;

pub use types::{DEFAULT_MARGINS, Margins, OutputFormat};

use crate::reconcile::HIDDEN;
use crate::session::Session;
use anyhow::{Context, Result, anyhow};
use log::info;

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::FontFamily;

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::Once;

use legend::{draw_legend_panel, legend_height_px};
use util::{
    bottom_label_area_px, format_tick, left_label_area_px, map_locale, rgba, tick_precision,
};

const TICK_FONT_PX: u32 = 12;
const AXIS_DESC_FONT_PX: u32 = 12;
const MARKER_RADIUS: i32 = 4;
const LINE_WIDTH: u32 = 2;

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        if plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        )
        .is_err()
        {
            log::warn!("bundled sans-serif font could not be registered");
        }
    });
}

/// Canvas size for a session: plot area + margins + label areas, legend beside it.
pub fn canvas_size(session: &Session) -> (u32, u32) {
    let (plot_w, plot_h, legend_w) = layout(session);
    let legend_h = legend_height_px(session.legend());
    (plot_w + legend_w, plot_h.max(legend_h))
}

/// (plot panel width, plot panel height, legend width)
fn layout(session: &Session) -> (u32, u32, u32) {
    let cfg = session.config();
    let (locale, dec_sep) = map_locale(&cfg.locale);
    let scales = session.scales();
    let left = left_label_area_px(&scales.y, locale, dec_sep, TICK_FONT_PX);
    let bottom = bottom_label_area_px(&scales.x, locale, dec_sep, TICK_FONT_PX);
    let m = DEFAULT_MARGINS;
    (
        m.left.max(left) + cfg.width + m.right,
        m.top + cfg.height + bottom + m.bottom,
        cfg.legend_width,
    )
}

/// Render the session to an SVG document held in memory.
pub fn render_svg(session: &Session) -> Result<String> {
    ensure_fonts_registered();
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, canvas_size(session)).into_drawing_area();
        draw_chart(root, session)?;
    }
    Ok(buf)
}

/// Render the session to `out_path`; `.svg` writes SVG, other extensions a bitmap.
pub fn write_chart<P: AsRef<Path>>(session: &Session, out_path: P) -> Result<()> {
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let size = canvas_size(session);
    match OutputFormat::from_path(out_path) {
        OutputFormat::Svg => {
            let root = SVGBackend::new(out_path, size).into_drawing_area();
            draw_chart(root, session)
        }
        OutputFormat::Bitmap => {
            let root = BitMapBackend::new(out_path, size).into_drawing_area();
            draw_chart(root, session)
        }
    }
    .with_context(|| format!("drawing chart to {}", out_path.display()))?;
    info!("wrote chart to {}", out_path.display());
    Ok(())
}

/// Helper that draws to any Plotters backend.
fn draw_chart<DB>(root: DrawingArea<DB, Shift>, session: &Session) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let cfg = session.config();
    let scales = session.scales();
    let (locale, dec_sep) = map_locale(&cfg.locale);
    let (plot_w, _plot_h, _legend_w) = layout(session);
    let (plot_area, legend_area) = root.split_horizontally(plot_w);

    let m = DEFAULT_MARGINS;
    let left = left_label_area_px(&scales.y, locale, dec_sep, TICK_FONT_PX).max(m.left);
    let bottom = bottom_label_area_px(&scales.x, locale, dec_sep, TICK_FONT_PX);
    let [x0, x1] = scales.x.scale.domain;
    let [y0, y1] = scales.y.scale.domain;

    let mut chart = ChartBuilder::on(&plot_area)
        .margin_top(m.top)
        .margin_right(m.right)
        .margin_bottom(m.bottom)
        .set_label_area_size(LabelAreaPosition::Left, left)
        .set_label_area_size(LabelAreaPosition::Bottom, bottom)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(|e| anyhow!("{:?}", e))?;

    let (x_prec, y_prec) = (tick_precision(&scales.x), tick_precision(&scales.y));
    let x_fmt = |v: &f64| format_tick(*v, x_prec, locale, dec_sep);
    let y_fmt = |v: &f64| format_tick(*v, y_prec, locale, dec_sep);

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(cfg.x_label.as_str())
        .y_desc(session.metric())
        .x_labels(scales.x.tick_count)
        .y_labels(scales.y.tick_count)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style((FontFamily::SansSerif, TICK_FONT_PX))
        .axis_desc_style((FontFamily::SansSerif, AXIS_DESC_FONT_PX))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    let elements = session.chart();
    for line in elements.lines().filter(|l| l.opacity > HIDDEN) {
        let style = ShapeStyle {
            color: rgba(line.color, line.opacity),
            filled: false,
            stroke_width: LINE_WIDTH,
        };
        chart
            .draw_series(LineSeries::new(line.data.iter().copied(), style))
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    chart
        .draw_series(
            elements
                .markers()
                .filter(|mk| mk.opacity > HIDDEN)
                .map(|mk| Circle::new(mk.data, MARKER_RADIUS, rgba(mk.color, mk.opacity).filled())),
        )
        .map_err(|e| anyhow!("{:?}", e))?;

    draw_legend_panel(&legend_area, session.legend())?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
