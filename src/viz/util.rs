//! Drawing helpers: colors, tick label formatting, locale mapping, label areas.

use crate::scale::AxisScale;
use crate::series::Rgb;
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use super::text::widest_px;

/// Plotters color for a series color at the given opacity.
#[inline]
pub fn rgba(color: Rgb, opacity: f64) -> RGBAColor {
    RGBAColor(color.0, color.1, color.2, opacity)
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'), // default
    }
}

/// Decimals needed to tell adjacent ticks of `axis` apart. Integer axes
/// need none; others get one more than the tick step shows, since plotters
/// may place labels between our ticks.
pub fn tick_precision(axis: &AxisScale) -> usize {
    if axis.integer_ticks {
        return 0;
    }
    match axis.scale.tick_step(axis.tick_count) {
        Some(step) if step < 1.0 => (-step.log10().floor()).max(0.0) as usize + 1,
        _ => 1,
    }
}

/// Format one tick value with at most `precision` decimals. Whole numbers
/// print with the locale's thousands separator; trailing zeros are dropped.
pub fn format_tick(v: f64, precision: usize, locale: &Locale, dec_sep: char) -> String {
    if precision == 0 || (v - v.round()).abs() < 1e-9 {
        return (v.round() as i64).to_formatted_string(locale);
    }
    let s = format!("{:.*}", precision, v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if dec_sep == '.' {
        s.to_string()
    } else {
        s.replace('.', &dec_sep.to_string())
    }
}

/// Width of the left label area: the widest formatted y tick plus room for
/// tick marks and the rotated axis title, clamped to a sensible range.
pub fn left_label_area_px(axis: &AxisScale, locale: &Locale, dec_sep: char, font_px: u32) -> u32 {
    let precision = tick_precision(axis);
    let labels: Vec<String> = axis
        .scale
        .ticks(axis.tick_count)
        .into_iter()
        .map(|v| format_tick(v, precision, locale, dec_sep))
        .collect();
    let widest = widest_px(labels.iter().map(String::as_str), font_px, 10);
    (widest + 18 + font_px + 8).clamp(48, 160)
}

/// Height of the bottom label area: the widest x tick label (drawn rotated)
/// plus the axis title.
pub fn bottom_label_area_px(axis: &AxisScale, locale: &Locale, dec_sep: char, font_px: u32) -> u32 {
    let precision = tick_precision(axis);
    let labels: Vec<String> = axis
        .scale
        .ticks(axis.tick_count)
        .into_iter()
        .map(|v| format_tick(v, precision, locale, dec_sep))
        .collect();
    let widest = widest_px(labels.iter().map(String::as_str), font_px, 30);
    (widest + 12 + font_px + 8).clamp(40, 160)
}
