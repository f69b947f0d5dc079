//! Production glyph rasterizer backed by swash.

use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

use crate::font_manager::FontManager;
use crate::glyph::{CellMetrics, GlyphKey, GlyphRasterizer, RasterizeError, RasterizedGlyph};

/// Physical DPI on macOS (points-based at 72 ppi).
const MACOS_PLATFORM_DPI: f32 = 72.0;

/// Physical DPI on non-macOS platforms (screen pixels at 96 ppi).
const DEFAULT_PLATFORM_DPI: f32 = 96.0;

/// Font sizes are specified in typographic points at 72 ppi.
const FONT_REFERENCE_DPI: f32 = 72.0;

/// Scaling options for [`SwashRasterizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerOptions {
    pub font_size_px: f32,
    pub antialias: bool,
    pub hinting: bool,
    /// Render with subpixel masks, collapsed to luminance for lighter strokes
    pub thin_strokes: bool,
    pub line_spacing: f32,
    pub char_spacing: f32,
}

impl Default for RasterizerOptions {
    fn default() -> Self {
        Self {
            font_size_px: 16.0,
            antialias: true,
            hinting: true,
            thin_strokes: false,
            line_spacing: 1.0,
            char_spacing: 1.0,
        }
    }
}

impl RasterizerOptions {
    /// Derive options from the config for a display with `scale_factor`.
    pub fn from_config(config: &termgrid_config::Config, scale_factor: f32) -> Self {
        let platform_dpi = if cfg!(target_os = "macos") {
            MACOS_PLATFORM_DPI
        } else {
            DEFAULT_PLATFORM_DPI
        };
        let base_font_pixels = config.font_size * platform_dpi / FONT_REFERENCE_DPI;

        Self {
            font_size_px: (base_font_pixels * scale_factor).max(1.0),
            antialias: config.font_antialias,
            hinting: config.font_hinting,
            thin_strokes: config.font_thin_strokes,
            line_spacing: config.line_spacing,
            char_spacing: config.char_spacing,
        }
    }
}

/// Rasterizes glyphs from a [`FontManager`] with swash.
pub struct SwashRasterizer {
    fonts: FontManager,
    context: ScaleContext,
    options: RasterizerOptions,
    metrics: CellMetrics,
}

impl SwashRasterizer {
    pub fn new(fonts: FontManager, options: RasterizerOptions) -> Self {
        let metrics = compute_cell_metrics(&fonts, &options);
        log::info!(
            "Cell metrics: {}x{} px, baseline {} (font {} px)",
            metrics.width,
            metrics.height,
            metrics.baseline,
            options.font_size_px
        );
        Self {
            fonts,
            context: ScaleContext::new(),
            options,
            metrics,
        }
    }

    pub fn options(&self) -> &RasterizerOptions {
        &self.options
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }
}

impl GlyphRasterizer for SwashRasterizer {
    fn rasterize(&mut self, key: GlyphKey) -> Result<RasterizedGlyph, RasterizeError> {
        let (font_idx, glyph_id) = self
            .fonts
            .find_glyph(key.ch, key.style)
            .ok_or(RasterizeError::GlyphNotFound(key))?;
        let font = *self
            .fonts
            .get_font(font_idx)
            .ok_or(RasterizeError::GlyphNotFound(key))?;

        let mut scaler = self
            .context
            .builder(font)
            .size(self.options.font_size_px)
            .hint(self.options.hinting)
            .build();

        let render_format = if self.options.antialias && self.options.thin_strokes {
            Format::Subpixel
        } else {
            Format::Alpha
        };

        // Color sources first so emoji fonts render as colored bitmaps; text
        // fonts have no color data and fall through to Outline.
        let image = Render::new(&[
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::ColorOutline(0),
            Source::Outline,
        ])
        .format(render_format)
        .render(&mut scaler, glyph_id)
        .ok_or_else(|| RasterizeError::RenderFailed {
            glyph: key,
            reason: format!("no renderable source in font {font_idx}"),
        })?;

        let width = image.placement.width;
        let height = image.placement.height;
        // Color bitmaps are already RGBA and composite as fg * texel
        let pixels = match image.content {
            Content::Color => image.data,
            Content::Mask => mask_to_rgba(&image.data, self.options.antialias),
            Content::SubpixelMask => subpixel_to_rgba(&image.data, width, height),
        };

        let glyph = RasterizedGlyph {
            width,
            height,
            bearing_x: image.placement.left as f32,
            bearing_y: self.metrics.baseline - image.placement.top as f32,
            pixels,
        };
        glyph.validate(key)?;
        Ok(glyph)
    }

    fn cell_metrics(&self) -> CellMetrics {
        self.metrics
    }
}

/// Cell size from the advance of `'m'` and the line height of the primary font.
fn compute_cell_metrics(fonts: &FontManager, options: &RasterizerOptions) -> CellMetrics {
    let primary_font = fonts.primary_font();
    let metrics = primary_font.metrics(&[]);
    let scale = options.font_size_px / metrics.units_per_em.max(1) as f32;
    let glyph_id = primary_font.charmap().map('m');
    let advance = primary_font.glyph_metrics(&[]).advance_width(glyph_id) * scale;

    let ascent = metrics.ascent * scale;
    let natural_line_height = ascent + metrics.descent * scale + metrics.leading * scale;
    let height = (natural_line_height * options.line_spacing).max(1.0).ceil();
    let width = (advance * options.char_spacing).max(1.0).ceil();

    // Extra line spacing is split evenly above and below the text
    let baseline = ((height - natural_line_height) / 2.0 + ascent).round();

    CellMetrics {
        width,
        height,
        baseline,
    }
}

/// Expand an 8-bit coverage mask to white RGBA texels.
///
/// Without antialiasing the coverage is thresholded for crisp edges.
pub fn mask_to_rgba(mask: &[u8], antialias: bool) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(mask.len() * 4);
    for &coverage in mask {
        let alpha = if antialias {
            coverage
        } else if coverage > 127 {
            255
        } else {
            0
        };
        pixels.extend_from_slice(&[255, 255, 255, alpha]);
    }
    pixels
}

/// Collapse a subpixel (RGB or RGBA per texel) mask to white RGBA with
/// luminance alpha.
///
/// Buffers with an unexpected stride produce fully transparent texels of
/// the right size.
pub fn subpixel_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let texels = width as usize * height as usize;
    let mut pixels = Vec::with_capacity(texels * 4);

    let stride = if texels > 0 { data.len() / texels } else { 0 };
    match stride {
        3 | 4 => {
            // The fourth channel, when present, is not reliable coverage
            for chunk in data.chunks_exact(stride).take(texels) {
                let (r, g, b) = (chunk[0] as u32, chunk[1] as u32, chunk[2] as u32);
                let alpha = ((r * 299 + g * 587 + b * 114) / 1000) as u8;
                pixels.extend_from_slice(&[255, 255, 255, alpha]);
            }
        }
        _ => {
            if texels > 0 {
                log::warn!(
                    "Unexpected subpixel mask stride: {} bytes for {}x{}",
                    data.len(),
                    width,
                    height
                );
            }
            pixels.resize(texels * 4, 0);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_threshold_without_antialias() {
        let pixels = mask_to_rgba(&[0, 100, 200], false);
        assert_eq!(pixels, vec![255, 255, 255, 0, 255, 255, 255, 0, 255, 255, 255, 255]);
    }

    #[test]
    fn test_mask_keeps_coverage_with_antialias() {
        let pixels = mask_to_rgba(&[100], true);
        assert_eq!(pixels, vec![255, 255, 255, 100]);
    }

    #[test]
    fn test_subpixel_rgb_luminance() {
        // Pure green weighs 587/1000
        let pixels = subpixel_to_rgba(&[0, 255, 0, 255, 255, 255], 2, 1);
        assert_eq!(pixels, vec![255, 255, 255, 149, 255, 255, 255, 255]);
    }

    #[test]
    fn test_subpixel_rgba_ignores_fourth_channel() {
        let pixels = subpixel_to_rgba(&[255, 0, 0, 0], 1, 1);
        assert_eq!(pixels, vec![255, 255, 255, 76]);
    }

    #[test]
    fn test_subpixel_bad_stride_is_transparent() {
        let pixels = subpixel_to_rgba(&[1, 2], 2, 2);
        assert_eq!(pixels, vec![0; 16]);
    }
}
