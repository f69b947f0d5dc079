//! Glyph identity, bitmap and rasterization service types.

use std::fmt;

/// Font style variant of a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum GlyphStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl GlyphStyle {
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => GlyphStyle::Regular,
            (true, false) => GlyphStyle::Bold,
            (false, true) => GlyphStyle::Italic,
            (true, true) => GlyphStyle::BoldItalic,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, GlyphStyle::Bold | GlyphStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, GlyphStyle::Italic | GlyphStyle::BoldItalic)
    }
}

impl fmt::Display for GlyphStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GlyphStyle::Regular => "regular",
            GlyphStyle::Bold => "bold",
            GlyphStyle::Italic => "italic",
            GlyphStyle::BoldItalic => "bold italic",
        };
        f.write_str(name)
    }
}

/// Identity of a glyph in the atlas: codepoint plus style variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphKey {
    pub ch: char,
    pub style: GlyphStyle,
}

impl GlyphKey {
    pub fn new(ch: char, style: GlyphStyle) -> Self {
        Self { ch, style }
    }

    pub fn regular(ch: char) -> Self {
        Self::new(ch, GlyphStyle::Regular)
    }
}

impl fmt::Display for GlyphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (U+{:04X}, {})", self.ch, self.ch as u32, self.style)
    }
}

/// A rasterized glyph bitmap in RGBA8.
///
/// Bearings are relative to the top-left corner of the cell: `bearing_x`
/// pixels to the right and `bearing_y` pixels down to the bitmap's top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    pub width: u32,
    pub height: u32,
    pub bearing_x: f32,
    pub bearing_y: f32,
    pub pixels: Vec<u8>,
}

impl RasterizedGlyph {
    /// A glyph with no visible pixels (whitespace in most fonts).
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            bearing_x: 0.0,
            bearing_y: 0.0,
            pixels: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check that the pixel buffer holds exactly `width * height` RGBA texels.
    pub fn validate(&self, key: GlyphKey) -> Result<(), RasterizeError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(RasterizeError::InvalidBitmap {
                glyph: key,
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }
}

/// Pixel dimensions of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width: f32,
    pub height: f32,
    /// Distance from the cell top to the baseline
    pub baseline: f32,
}

/// Errors produced while rasterizing a glyph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RasterizeError {
    #[error("Glyph {0} not found in any loaded font")]
    GlyphNotFound(GlyphKey),

    #[error("Failed to render glyph {glyph}: {reason}")]
    RenderFailed { glyph: GlyphKey, reason: String },

    #[error("Glyph {glyph} bitmap has {actual} bytes, expected {expected}")]
    InvalidBitmap {
        glyph: GlyphKey,
        expected: usize,
        actual: usize,
    },
}

/// Glyph rasterization service.
///
/// Invoked by the atlas only on a cache miss; implementations may be slow.
pub trait GlyphRasterizer {
    fn rasterize(&mut self, key: GlyphKey) -> Result<RasterizedGlyph, RasterizeError>;

    fn cell_metrics(&self) -> CellMetrics;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_from_flags() {
        assert_eq!(GlyphStyle::from_flags(true, true), GlyphStyle::BoldItalic);
        assert!(GlyphStyle::BoldItalic.is_bold());
        assert!(GlyphStyle::BoldItalic.is_italic());
        assert!(!GlyphStyle::Italic.is_bold());
    }

    #[test]
    fn test_validate_rejects_short_buffer() {
        let glyph = RasterizedGlyph {
            width: 2,
            height: 2,
            pixels: vec![0; 15],
            ..RasterizedGlyph::empty()
        };
        let err = glyph.validate(GlyphKey::regular('x')).unwrap_err();
        assert_eq!(
            err,
            RasterizeError::InvalidBitmap {
                glyph: GlyphKey::regular('x'),
                expected: 16,
                actual: 15,
            }
        );
    }

    #[test]
    fn test_key_display() {
        let key = GlyphKey::new('A', GlyphStyle::Bold);
        assert_eq!(key.to_string(), "'A' (U+0041, bold)");
    }
}
