//! Font management with a fallback chain for Unicode coverage.
//!
//! Supports:
//! - A primary font with bold/italic/bold-italic variants
//! - An automatic fallback chain for missing glyphs

mod fallbacks;
mod loader;
mod types;

use anyhow::{Result, anyhow};
use fontdb::Database;
use swash::FontRef;

use crate::glyph::GlyphStyle;

pub use fallbacks::{FALLBACK_FAMILIES, PRIMARY_CANDIDATES};
pub use types::FontData;

/// Manages the styled fonts and the fallback chain.
///
/// Font indices are assigned as follows:
/// - 0: Primary/regular font
/// - 1: Bold font (if available)
/// - 2: Italic font (if available)
/// - 3: Bold-italic font (if available)
/// - 4..: Fallback fonts
pub struct FontManager {
    primary: FontData,
    bold: Option<FontData>,
    italic: Option<FontData>,
    bold_italic: Option<FontData>,
    fallbacks: Vec<FontData>,
}

const FALLBACK_START_INDEX: usize = 4;

impl FontManager {
    /// Create a FontManager from system fonts.
    ///
    /// # Arguments
    /// * `primary_family` - Regular weight family; `None` picks a monospace font
    /// * `bold_family` - Bold family; `None` queries the primary family at bold weight
    /// * `italic_family` - Italic family; `None` queries the primary family in italic
    /// * `bold_italic_family` - Bold italic family; `None` queries the primary family
    pub fn new(
        primary_family: Option<&str>,
        bold_family: Option<&str>,
        italic_family: Option<&str>,
        bold_italic_family: Option<&str>,
    ) -> Result<Self> {
        let mut font_db = Database::new();
        font_db.load_system_fonts();
        log::info!("Loaded {} system fonts", font_db.len());

        let (primary, primary_name) = Self::load_primary_font(&font_db, primary_family)?;

        let fallbacks = Self::build_fallback_chain(&font_db);
        log::info!("Loaded {} fallback fonts", fallbacks.len());

        // Styled variants default to the primary family so bold/italic cells
        // still get a real bold/italic face when one is installed.
        let bold = Self::load_styled_font(
            &font_db,
            bold_family.or(primary_name.as_deref()),
            GlyphStyle::Bold,
        );
        let italic = Self::load_styled_font(
            &font_db,
            italic_family.or(primary_name.as_deref()),
            GlyphStyle::Italic,
        );
        let bold_italic = Self::load_styled_font(
            &font_db,
            bold_italic_family.or(primary_name.as_deref()),
            GlyphStyle::BoldItalic,
        );

        Ok(FontManager {
            primary,
            bold,
            italic,
            bold_italic,
            fallbacks,
        })
    }

    /// Create a FontManager from the font families in `config`.
    pub fn from_config(config: &termgrid_config::Config) -> Result<Self> {
        Self::new(
            config.font_family.as_deref(),
            config.font_family_bold.as_deref(),
            config.font_family_italic.as_deref(),
            config.font_family_bold_italic.as_deref(),
        )
    }

    /// Create a FontManager from already loaded fonts.
    pub fn from_fonts(primary: FontData, fallbacks: Vec<FontData>) -> Self {
        FontManager {
            primary,
            bold: None,
            italic: None,
            bold_italic: None,
            fallbacks,
        }
    }

    /// Load the primary font, returning it with the family name that matched.
    fn load_primary_font(
        font_db: &Database,
        family: Option<&str>,
    ) -> Result<(FontData, Option<String>)> {
        if let Some(family_name) = family {
            log::info!("Attempting to load primary font: {}", family_name);
            if let Some(font_data) = loader::load_font_from_db(font_db, family_name) {
                log::info!("Successfully loaded primary font: {}", family_name);
                return Ok((font_data, Some(family_name.to_string())));
            }
            log::warn!(
                "Primary font '{}' not found, trying monospace defaults",
                family_name
            );
        }

        for candidate in PRIMARY_CANDIDATES {
            if let Some(font_data) = loader::load_font_from_db(font_db, candidate) {
                log::info!("Using primary font: {}", candidate);
                return Ok((font_data, Some((*candidate).to_string())));
            }
        }

        loader::load_generic_monospace(font_db)
            .map(|font_data| {
                log::info!("Using generic monospace system font");
                (font_data, None)
            })
            .ok_or_else(|| anyhow!("No usable monospace font found on this system"))
    }

    /// Build the fallback font chain from available system fonts.
    fn build_fallback_chain(font_db: &Database) -> Vec<FontData> {
        let mut fallbacks = Vec::new();
        for family_name in FALLBACK_FAMILIES {
            if let Some(font_data) = loader::load_font_from_db(font_db, family_name) {
                log::debug!("Added fallback font: {}", family_name);
                fallbacks.push(font_data);
            }
        }
        fallbacks
    }

    /// Load a styled font variant (bold, italic, or bold-italic).
    fn load_styled_font(
        font_db: &Database,
        family: Option<&str>,
        style: GlyphStyle,
    ) -> Option<FontData> {
        let family_name = family?;
        let weight = if style.is_bold() {
            fontdb::Weight::BOLD
        } else {
            fontdb::Weight::NORMAL
        };
        let font_style = style.is_italic().then_some(fontdb::Style::Italic);

        let font_data =
            loader::load_font_from_db_with_style(font_db, family_name, Some(weight), font_style);
        if font_data.is_some() {
            log::info!("Loaded {} font: {}", style, family_name);
        } else {
            log::warn!(
                "{} font '{}' not found, will use primary font",
                style,
                family_name
            );
        }
        font_data
    }

    /// Get the font for a style, falling back to the primary font.
    fn get_styled_font(&self, style: GlyphStyle) -> (usize, &FontData) {
        let variant = match style {
            GlyphStyle::Regular => None,
            GlyphStyle::Bold => self.bold.as_ref().map(|f| (1, f)),
            GlyphStyle::Italic => self.italic.as_ref().map(|f| (2, f)),
            GlyphStyle::BoldItalic => self.bold_italic.as_ref().map(|f| (3, f)),
        };
        variant.unwrap_or((0, &self.primary))
    }

    /// Find a glyph for a character across the font fallback chain.
    ///
    /// Returns `(font_index, glyph_id)` where `font_index` identifies which
    /// font contains the glyph.
    pub fn find_glyph(&self, character: char, style: GlyphStyle) -> Option<(usize, u16)> {
        let (font_idx, styled_font) = self.get_styled_font(style);
        let glyph_id = styled_font.font_ref.charmap().map(character);
        if glyph_id != 0 {
            return Some((font_idx, glyph_id));
        }

        for (idx, fallback) in self.fallbacks.iter().enumerate() {
            let glyph_id = fallback.font_ref.charmap().map(character);
            if glyph_id != 0 {
                log::debug!(
                    "Character '{}' (U+{:04X}) found in fallback font index {}",
                    character,
                    character as u32,
                    FALLBACK_START_INDEX + idx
                );
                return Some((FALLBACK_START_INDEX + idx, glyph_id));
            }
        }

        log::debug!(
            "Character '{}' (U+{:04X}) not found in any font ({} total fonts)",
            character,
            character as u32,
            self.font_count()
        );
        None
    }

    /// Get font reference by index (see struct documentation for layout).
    pub fn get_font(&self, font_index: usize) -> Option<&FontRef<'static>> {
        match font_index {
            0 => Some(&self.primary.font_ref),
            1 => self.bold.as_ref().map(|f| &f.font_ref),
            2 => self.italic.as_ref().map(|f| &f.font_ref),
            3 => self.bold_italic.as_ref().map(|f| &f.font_ref),
            idx => self
                .fallbacks
                .get(idx - FALLBACK_START_INDEX)
                .map(|fd| &fd.font_ref),
        }
    }

    /// Get the primary font reference.
    pub fn primary_font(&self) -> &FontRef<'static> {
        &self.primary.font_ref
    }

    /// Get number of fonts loaded (primary + styled + fallbacks).
    pub fn font_count(&self) -> usize {
        let styled_count = 1
            + self.bold.is_some() as usize
            + self.italic.is_some() as usize
            + self.bold_italic.is_some() as usize;
        styled_count + self.fallbacks.len()
    }
}
