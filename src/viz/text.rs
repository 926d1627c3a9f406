//! Text measurement and truncation.

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Widest of `labels` at `font_px`, or `min_px` if all are narrower.
pub fn widest_px<'a, I>(labels: I, font_px: u32, min_px: u32) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .map(|l| estimate_text_width_px(l, font_px))
        .fold(min_px, u32::max)
}

/// Shorten `text` to fit `max_px`, ending with a single ellipsis when cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out: String = String::new();
    for ch in text.chars() {
        out.push(ch);
        out.push('…');
        let fits = estimate_text_width_px(&out, font_px) <= max_px;
        out.pop();
        if !fits {
            out.pop();
            break;
        }
    }
    if out.is_empty() {
        return out;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("S1", 10, 100), "S1");
    }

    #[test]
    fn long_text_gets_one_ellipsis() {
        let t = truncate_to_width("abcdefghijklmnopqrstuvwxyz", 10, 60);
        assert!(t.ends_with('…'));
        assert_eq!(t.matches('…').count(), 1);
        assert!(estimate_text_width_px(&t, 10) <= 60);
    }

    #[test]
    fn nothing_fits_in_zero_width() {
        assert_eq!(truncate_to_width("abc", 10, 0), "");
    }

    #[test]
    fn widest_respects_floor() {
        assert_eq!(widest_px(["a", "bb"], 10, 30), 30);
        assert_eq!(widest_px(["abcdefghij"], 10, 30), 60);
    }
}
