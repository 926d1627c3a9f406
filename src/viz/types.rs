//! Public types and constants for the drawing module.

use std::path::Path;

/// Space around the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// Default margins of the rarefaction plot.
pub const DEFAULT_MARGINS: Margins = Margins {
    top: 20,
    right: 50,
    bottom: 50,
    left: 70,
};

/// Output encodings supported by [`super::write_chart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    /// Any bitmap format the `image` crate infers from the extension (png, jpg, bmp).
    Bitmap,
}

impl OutputFormat {
    /// `.svg` → `Svg`, everything else → `Bitmap`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => OutputFormat::Svg,
            _ => OutputFormat::Bitmap,
        }
    }
}
