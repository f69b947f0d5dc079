//! Owned font bytes paired with a swash font reference.

use std::sync::Arc;
use swash::FontRef;

/// Stores font data with lifetime management.
///
/// Owns the font bytes and a `FontRef` into them. The `FontRef` is valid for
/// the lifetime of this struct.
#[derive(Clone)]
pub struct FontData {
    /// Raw font data bytes (TTF/OTF/TTC)
    pub data: Arc<Vec<u8>>,
    /// Swash font reference for glyph operations
    pub font_ref: FontRef<'static>,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontData")
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl FontData {
    /// Create a new FontData from bytes using face index 0.
    ///
    /// Returns `None` if the bytes are not a parsable font.
    pub fn new(data: Vec<u8>) -> Option<Self> {
        Self::new_with_index(data, 0)
    }

    /// Create a new FontData from bytes with a specific face index.
    ///
    /// Needed for TrueType Collection (.ttc) files where several faces share
    /// one blob.
    pub fn new_with_index(data: Vec<u8>, face_index: usize) -> Option<Self> {
        let data_arc = Arc::new(data);

        // SAFETY: the bytes live in an Arc stored next to the FontRef and are
        // never mutated; both are dropped together.
        let font_ref = unsafe {
            let bytes = data_arc.as_slice();
            let static_bytes: &'static [u8] = std::mem::transmute(bytes);
            FontRef::from_index(static_bytes, face_index)?
        };

        Some(FontData {
            data: data_arc,
            font_ref,
        })
    }

    /// Whether the font maps `ch` to a real glyph.
    pub fn has_glyph(&self, ch: char) -> bool {
        self.font_ref.charmap().map(ch) != 0
    }
}
