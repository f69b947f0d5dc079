//! Font discovery and glyph rasterization for the termgrid renderer.
//!
//! This crate provides:
//! - The rasterization service interface ([`GlyphRasterizer`]) consumed by the
//!   glyph atlas, with the [`GlyphKey`] identity and [`RasterizedGlyph`] bitmap
//!   types
//! - A `FontManager` loading system fonts through fontdb with bold/italic
//!   variants and a fallback chain
//! - [`SwashRasterizer`], the production rasterizer scaling glyphs with swash
//!
//! # Architecture
//!
//! The atlas asks the rasterizer for a glyph only on a cache miss. The
//! rasterizer resolves the glyph through a priority-ordered chain:
//! 1. Styled font (bold/italic/bold-italic variant, or the primary font)
//! 2. System fallback fonts

pub mod font_manager;
pub mod glyph;
pub mod rasterizer;

// Re-export main types for convenience
pub use font_manager::{FALLBACK_FAMILIES, FontData, FontManager};
pub use glyph::{
    CellMetrics, GlyphKey, GlyphRasterizer, GlyphStyle, RasterizeError, RasterizedGlyph,
};
pub use rasterizer::{RasterizerOptions, SwashRasterizer};
