//! Legend panel drawing: one row per legend entry, line swatch first, then
//! dot swatch, then the label.

use anyhow::{Result, anyhow};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::util::rgba;
use crate::legend::{Fill, LABEL_FONT_PX, LABEL_X, Legend, LegendEntry};

const PAD_X: i32 = 6;
const PAD_Y: i32 = 6;
const SWATCH_W: i32 = 15;
const SWATCH_H: i32 = 5;
const DOT_X: i32 = 30;
const DOT_R: i32 = 5;
const OUTLINE: RGBColor = RGBColor(169, 169, 169); // darkgrey

fn fill_color(fill: Fill) -> RGBAColor {
    match fill {
        Fill::Colored(c) => rgba(c, 1.0),
        Fill::Neutral => WHITE.to_rgba(),
    }
}

fn draw_row<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    entry: &LegendEntry,
    label: &str,
) -> Result<()> {
    let y = PAD_Y + entry.y.round() as i32;
    let rect = [
        (PAD_X, y - SWATCH_H / 2),
        (PAD_X + SWATCH_W, y - SWATCH_H / 2 + SWATCH_H),
    ];
    area.draw(&Rectangle::new(rect, fill_color(entry.line_fill).filled()))
        .map_err(|e| anyhow!("{:?}", e))?;
    area.draw(&Rectangle::new(rect, OUTLINE.stroke_width(1)))
        .map_err(|e| anyhow!("{:?}", e))?;

    let center = (PAD_X + DOT_X, y);
    area.draw(&Circle::new(center, DOT_R, fill_color(entry.dot_fill).filled()))
        .map_err(|e| anyhow!("{:?}", e))?;
    area.draw(&Circle::new(center, DOT_R, OUTLINE.stroke_width(1)))
        .map_err(|e| anyhow!("{:?}", e))?;

    let style: TextStyle = TextStyle::from((FontFamily::SansSerif, LABEL_FONT_PX))
        .pos(Pos::new(HPos::Left, VPos::Center));
    area.draw(&Text::new(
        label,
        (PAD_X + LABEL_X as i32, y),
        style,
    ))
    .map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

/// Draw every series row followed by the "Select All" row.
pub fn draw_legend_panel<DB: DrawingBackend>(
    legend_area: &DrawingArea<DB, Shift>,
    legend: &Legend,
) -> Result<()> {
    legend_area
        .fill(&WHITE)
        .map_err(|e| anyhow!("{:?}", e))?;
    for entry in legend.entries().chain(legend.select_all()) {
        draw_row(legend_area, entry, &legend.display_label(entry))?;
    }
    Ok(())
}

/// Pixel height the panel needs for `legend`.
pub fn legend_height_px(legend: &Legend) -> u32 {
    (legend.height_px().ceil() as u32) + 2 * PAD_Y as u32
}
