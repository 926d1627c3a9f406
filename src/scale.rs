//! Linear scales with padded, "niced" domains.
//!
//! The tick arithmetic follows the usual 1-2-5 step ladder: a step is chosen
//! among `{1, 2, 5, 10} × 10^k` so that roughly `count` ticks cover the span.

use crate::series::extent;
use serde::Serialize;

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Target tick count used when nicing a domain.
pub const NICE_TICKS: usize = 10;

/// Maps a numeric domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    /// Position of `v` in the range. A zero-width domain maps to the range midpoint.
    pub fn map(&self, v: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Widen the domain to round bounds aligned with a `count`-tick step.
    pub fn nice(mut self, count: usize) -> Self {
        let [mut start, mut stop] = self.domain;
        let reversed = stop < start;
        if reversed {
            std::mem::swap(&mut start, &mut stop);
        }
        let mut prestep = f64::NAN;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count as f64);
            if step == prestep {
                break;
            } else if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = step;
        }
        self.domain = if reversed { [stop, start] } else { [start, stop] };
        self
    }

    /// Round tick values inside the domain, about `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [a, b] = self.domain;
        let (start, stop) = if a <= b { (a, b) } else { (b, a) };
        if count == 0 || !start.is_finite() || !stop.is_finite() {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        let step = tick_increment(start, stop, count as f64);
        if step == 0.0 || !step.is_finite() {
            return Vec::new();
        }
        let mut out = Vec::new();
        if step > 0.0 {
            let i0 = (start / step).ceil() as i64;
            let i1 = (stop / step).floor() as i64;
            for i in i0..=i1 {
                out.push(i as f64 * step);
            }
        } else {
            let inv = -step;
            let i0 = (start * inv).ceil() as i64;
            let i1 = (stop * inv).floor() as i64;
            for i in i0..=i1 {
                out.push(i as f64 / inv);
            }
        }
        out
    }
}

impl LinearScale {
    /// Positive distance between the ticks [`LinearScale::ticks`] returns
    /// for `count`, or `None` when there are fewer than two.
    pub fn tick_step(&self, count: usize) -> Option<f64> {
        let [a, b] = self.domain;
        let (start, stop) = if a <= b { (a, b) } else { (b, a) };
        if count == 0 || !start.is_finite() || !stop.is_finite() || start == stop {
            return None;
        }
        let step = tick_increment(start, stop, count as f64);
        if step == 0.0 || !step.is_finite() {
            return None;
        }
        Some(if step > 0.0 { step } else { -1.0 / step })
    }
}

/// Step between ticks. Negative values encode `1 / |step|` for sub-unit
/// steps, which keeps the arithmetic exact for decimal fractions.
fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

/// One axis: its scale, how many ticks to request and how to format them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisScale {
    pub scale: LinearScale,
    pub tick_count: usize,
    /// Ticks are whole numbers (depths).
    pub integer_ticks: bool,
    /// Padding added on each side before nicing.
    pub pad: f64,
}

/// Both axes of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartScales {
    pub x: AxisScale,
    pub y: AxisScale,
}

impl ChartScales {
    /// Pixel position of a data point.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x.scale.map(x), self.y.scale.map(y))
    }
}

/// Padding for the x extent. Whole-number bounds get a whole-number pad of
/// at least 1; anything else gets 3% of the span.
pub fn x_padding(min: f64, max: f64) -> (f64, bool) {
    let raw = (max - min) * 0.03;
    if min.fract() == 0.0 && max.fract() == 0.0 {
        (raw.round().max(1.0), true)
    } else {
        (raw, false)
    }
}

/// X axis over `[min, max]` (`None` for no data), mapped onto `[0, width]`.
pub fn x_axis(extent: Option<(f64, f64)>, width: f64) -> AxisScale {
    let range = [0.0, width];
    let Some((min, max)) = extent else {
        return AxisScale {
            scale: LinearScale::new([0.0, 1.0], range),
            tick_count: 3,
            integer_ticks: false,
            pad: 0.0,
        };
    };
    let (pad, integer_ticks) = x_padding(min, max);
    let (lo, hi) = widen_degenerate(min - pad, max + pad);
    let tick_count = ((max - min) + 2.0 * pad).clamp(3.0, 12.0) as usize;
    AxisScale {
        scale: LinearScale::new([lo, hi], range).nice(NICE_TICKS),
        tick_count,
        integer_ticks,
        pad,
    }
}

/// Y axis over `[min, max]` with no padding, mapped onto `[height, 0]`.
pub fn y_axis(extent: Option<(f64, f64)>, height: f64) -> AxisScale {
    let (min, max) = extent.unwrap_or((0.0, 1.0));
    let (lo, hi) = widen_degenerate(min, max);
    AxisScale {
        scale: LinearScale::new([lo, hi], [height, 0.0]).nice(NICE_TICKS),
        tick_count: NICE_TICKS,
        integer_ticks: false,
        pad: 0.0,
    }
}

/// Y extent spanning the values of two envelope columns.
pub fn envelope_extent<I, J>(lows: I, highs: J) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
    J: IntoIterator<Item = f64>,
{
    let lo = extent(lows)?.0;
    let hi = extent(highs)?.1;
    Some((lo.min(hi), lo.max(hi)))
}

fn widen_degenerate(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_widens_to_round_bounds() {
        let s = LinearScale::new([0.3, 9.6], [0.0, 100.0]).nice(10);
        assert_eq!(s.domain, [0.0, 10.0]);
        let s = LinearScale::new([9.0, 31.0], [0.0, 1.0]).nice(10);
        assert_eq!(s.domain, [8.0, 32.0]);
    }

    #[test]
    fn nice_handles_small_fractions() {
        let s = LinearScale::new([0.123, 0.987], [0.0, 1.0]).nice(10);
        assert!((s.domain[0] - 0.1).abs() < 1e-12);
        assert!((s.domain[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn integer_depths_get_whole_pad() {
        assert_eq!(x_padding(10.0, 30.0), (1.0, true));
        assert_eq!(x_padding(1.0, 5000.0), (150.0, true));
        let (pad, int) = x_padding(0.5, 10.5);
        assert!(!int);
        assert!((pad - 0.3).abs() < 1e-12);
    }

    #[test]
    fn x_axis_for_small_depth_range() {
        let ax = x_axis(Some((10.0, 30.0)), 1000.0);
        assert!(ax.integer_ticks);
        assert_eq!(ax.pad, 1.0);
        // (30 - 10) + 2 clamps to 12
        assert_eq!(ax.tick_count, 12);
        assert_eq!(ax.scale.domain, [8.0, 32.0]);
        assert_eq!(ax.scale.range, [0.0, 1000.0]);
    }

    #[test]
    fn tick_count_has_a_floor_of_three() {
        let ax = x_axis(Some((0.1, 0.2)), 100.0);
        assert_eq!(ax.tick_count, 3);
        let ax = x_axis(Some((7.0, 7.0)), 100.0);
        assert_eq!(ax.tick_count, 3);
        assert!(ax.scale.domain[0] <= 6.0 && ax.scale.domain[1] >= 8.0);
    }

    #[test]
    fn domain_never_clips_data() {
        let cases = [
            (10.0, 30.0),
            (1.0, 5000.0),
            (0.5, 10.5),
            (137.0, 9_871.0),
            (-3.25, 4.75),
            (0.001, 0.0019),
            (42.0, 42.0),
        ];
        for (min, max) in cases {
            let ax = x_axis(Some((min, max)), 1000.0);
            let [lo, hi] = ax.scale.domain;
            assert!(lo <= min - ax.pad + 1e-12, "{min}..{max} → {lo}");
            assert!(hi >= max + ax.pad - 1e-12, "{min}..{max} → {hi}");
            let ay = y_axis(Some((min, max)), 400.0);
            assert!(ay.scale.domain[0] <= min && ay.scale.domain[1] >= max);
        }
    }

    #[test]
    fn y_axis_is_inverted_and_unpadded() {
        let ay = y_axis(Some((5.0, 8.0)), 400.0);
        assert_eq!(ay.scale.domain, [5.0, 8.0]);
        assert_eq!(ay.scale.map(5.0), 400.0);
        assert_eq!(ay.scale.map(8.0), 0.0);
    }

    #[test]
    fn empty_extent_uses_unit_domain() {
        let ax = x_axis(None, 10.0);
        assert_eq!(ax.scale.domain, [0.0, 1.0]);
        let ay = y_axis(None, 10.0);
        assert_eq!(ay.scale.domain, [0.0, 1.0]);
    }

    #[test]
    fn ticks_are_round_and_inside_domain() {
        let s = LinearScale::new([8.0, 32.0], [0.0, 1.0]);
        assert_eq!(s.ticks(6), vec![10.0, 15.0, 20.0, 25.0, 30.0]);
        let s = LinearScale::new([0.0, 1.0], [0.0, 1.0]);
        let t = s.ticks(5);
        assert_eq!(t.len(), 6);
        assert!((t[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn envelope_spans_both_columns() {
        let e = envelope_extent([2.0, 1.5, 3.0], [4.0, 6.5]);
        assert_eq!(e, Some((1.5, 6.5)));
        assert_eq!(envelope_extent(Vec::<f64>::new(), [1.0]), None);
    }
}
