//! Glyph atlas: a single RGBA texture holding every resident glyph.
//!
//! Glyphs are shelf-packed ([`shelf`]) and indexed by a stable table slot
//! that cell records refer to. Under space or table pressure the least
//! recently used glyph not referenced by the current frame is evicted.
//!
//! The atlas keeps a CPU copy of the texture. Every change is also queued as
//! an [`AtlasUpload`] or an entry-table update for the GPU renderer to apply
//! before its next draw.

pub mod shelf;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use termgrid_fonts::{GlyphKey, GlyphRasterizer, RasterizedGlyph};

use crate::error::RenderError;
use crate::layout::{AtlasEntry, GLYPH_INDEX_NONE};

pub use shelf::{Allocation, ShelfAllocator};

/// Atlas shared between the frame pipeline (writer) and renderers (readers).
pub type SharedAtlas = Arc<RwLock<GlyphAtlas>>;

/// A rectangle of texels to copy into the atlas texture.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasUpload {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

/// A glyph that is resident in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidentGlyph {
    pub index: u16,
    pub entry: AtlasEntry,
}

struct CachedGlyph {
    index: u16,
    entry: AtlasEntry,
    /// `None` for zero-area glyphs
    allocation: Option<Allocation>,
    prev: Option<GlyphKey>,
    next: Option<GlyphKey>,
    last_used: u64,
    epoch: u64,
}

pub struct GlyphAtlas {
    size: u32,
    padding: u32,
    max_glyphs: usize,
    packer: ShelfAllocator,
    pixels: Vec<u8>,

    glyph_cache: HashMap<GlyphKey, CachedGlyph>,
    /// Table slot -> resident key
    slots: Vec<Option<GlyphKey>>,
    free_slots: Vec<u16>,
    lru_head: Option<GlyphKey>,
    lru_tail: Option<GlyphKey>,

    tick: u64,
    epoch: u64,

    pending_uploads: Vec<AtlasUpload>,
    pending_entries: Vec<(u16, AtlasEntry)>,
}

impl GlyphAtlas {
    /// Create an empty `size x size` atlas.
    ///
    /// `max_glyphs` is clamped to `1..=0xFFFF`; index `0xFFFF` is the
    /// blank-cell sentinel and never handed out.
    pub fn new(size: u32, padding: u32, max_glyphs: usize) -> Self {
        let size = size.max(1);
        let max_glyphs = max_glyphs.clamp(1, GLYPH_INDEX_NONE as usize);
        log::info!(
            "Glyph atlas {}x{} (padding {}, {} table slots)",
            size,
            size,
            padding,
            max_glyphs
        );
        Self {
            size,
            padding,
            max_glyphs,
            packer: ShelfAllocator::new(size, size),
            pixels: vec![0; size as usize * size as usize * 4],
            glyph_cache: HashMap::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            lru_head: None,
            lru_tail: None,
            tick: 0,
            epoch: 1,
            pending_uploads: Vec::new(),
            pending_entries: Vec::new(),
        }
    }

    /// Start a new frame epoch. Glyphs used from now on are pinned until the
    /// next call.
    pub fn begin_frame(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Return the glyph's table index and entry, rasterizing and packing it
    /// on a miss.
    pub fn ensure_resident(
        &mut self,
        key: GlyphKey,
        rasterizer: &mut dyn GlyphRasterizer,
    ) -> Result<ResidentGlyph, RenderError> {
        if let Some(resident) = self.touch(key) {
            return Ok(resident);
        }

        let glyph = rasterizer
            .rasterize(key)
            .and_then(|glyph| glyph.validate(key).map(|()| glyph))
            .map_err(|source| RenderError::RasterizationFailure { glyph: key, source })?;

        self.insert(key, &glyph)
    }

    /// Mark a resident glyph as used in this frame.
    fn touch(&mut self, key: GlyphKey) -> Option<ResidentGlyph> {
        self.tick += 1;
        let (tick, epoch) = (self.tick, self.epoch);
        let cached = self.glyph_cache.get_mut(&key)?;
        cached.last_used = tick;
        cached.epoch = epoch;
        let resident = ResidentGlyph {
            index: cached.index,
            entry: cached.entry,
        };

        if self.lru_head != Some(key) {
            self.lru_remove(key);
            self.lru_push_front(key);
        }
        Some(resident)
    }

    fn insert(
        &mut self,
        key: GlyphKey,
        glyph: &RasterizedGlyph,
    ) -> Result<ResidentGlyph, RenderError> {
        let exhausted = || RenderError::AtlasExhausted {
            glyph: key,
            width: glyph.width,
            height: glyph.height,
        };

        let padded_w = glyph.width + self.padding;
        let padded_h = glyph.height + self.padding;
        if !glyph.is_empty() && (padded_w > self.size || padded_h > self.size) {
            return Err(exhausted());
        }

        let index = match self.acquire_slot() {
            Some(index) => index,
            None => return Err(exhausted()),
        };

        let allocation = if glyph.is_empty() {
            None
        } else {
            match self.allocate_space(padded_w, padded_h) {
                Some(allocation) => Some(allocation),
                None => {
                    self.free_slots.push(index);
                    return Err(exhausted());
                }
            }
        };

        let entry = match allocation {
            Some(alloc) => {
                self.write_glyph(alloc, glyph);
                let size = self.size as f32;
                AtlasEntry {
                    uv_rect: [
                        alloc.x as f32 / size,
                        alloc.y as f32 / size,
                        (alloc.x + glyph.width) as f32 / size,
                        (alloc.y + glyph.height) as f32 / size,
                    ],
                    bearing: [glyph.bearing_x, glyph.bearing_y],
                    size: [glyph.width as f32, glyph.height as f32],
                }
            }
            None => AtlasEntry {
                uv_rect: [0.0; 4],
                bearing: [glyph.bearing_x, glyph.bearing_y],
                size: [0.0; 2],
            },
        };

        self.tick += 1;
        self.glyph_cache.insert(
            key,
            CachedGlyph {
                index,
                entry,
                allocation,
                prev: None,
                next: None,
                last_used: self.tick,
                epoch: self.epoch,
            },
        );
        self.lru_push_front(key);
        self.slots[index as usize] = Some(key);
        self.pending_entries.push((index, entry));

        log::trace!("Atlas: packed {} at slot {}", key, index);
        Ok(ResidentGlyph { index, entry })
    }

    /// Take a free table slot, evicting when the table is full.
    fn acquire_slot(&mut self) -> Option<u16> {
        loop {
            if let Some(index) = self.free_slots.pop() {
                return Some(index);
            }
            if self.slots.len() < self.max_glyphs {
                self.slots.push(None);
                return Some((self.slots.len() - 1) as u16);
            }
            if !self.evict_one() {
                return None;
            }
        }
    }

    /// Shelf-allocate a padded rectangle, evicting until it fits.
    fn allocate_space(&mut self, width: u32, height: u32) -> Option<Allocation> {
        loop {
            if let Some(allocation) = self.packer.allocate(width, height) {
                return Some(allocation);
            }
            if !self.evict_one() {
                return None;
            }
        }
    }

    /// Evict the least recently used glyph outside the current frame epoch.
    ///
    /// Returns `false` when every resident glyph is pinned.
    fn evict_one(&mut self) -> bool {
        let mut cursor = self.lru_tail;
        while let Some(key) = cursor {
            let Some(cached) = self.glyph_cache.get(&key) else {
                return false;
            };
            if cached.epoch != self.epoch {
                self.evict(key);
                return true;
            }
            cursor = cached.prev;
        }
        false
    }

    fn evict(&mut self, key: GlyphKey) {
        self.lru_remove(key);
        let Some(cached) = self.glyph_cache.remove(&key) else {
            return;
        };
        if let Some(allocation) = cached.allocation {
            self.packer.deallocate(allocation);
        }
        self.slots[cached.index as usize] = None;
        self.free_slots.push(cached.index);
        log::debug!(
            "Atlas: evicted {} from slot {} (last used at tick {})",
            key,
            cached.index,
            cached.last_used
        );
    }

    /// Copy a glyph into the CPU store and queue the padded region upload.
    ///
    /// The padding texels are cleared so a previous occupant cannot bleed in.
    fn write_glyph(&mut self, alloc: Allocation, glyph: &RasterizedGlyph) {
        let region_w = alloc.width as usize;
        let region_h = alloc.height as usize;
        let glyph_w = glyph.width as usize;

        let mut region = vec![0u8; region_w * region_h * 4];
        for row in 0..glyph.height as usize {
            let src = &glyph.pixels[row * glyph_w * 4..(row + 1) * glyph_w * 4];
            region[row * region_w * 4..row * region_w * 4 + glyph_w * 4].copy_from_slice(src);
        }

        let stride = self.size as usize * 4;
        for row in 0..region_h {
            let dst_start = (alloc.y as usize + row) * stride + alloc.x as usize * 4;
            self.pixels[dst_start..dst_start + region_w * 4]
                .copy_from_slice(&region[row * region_w * 4..(row + 1) * region_w * 4]);
        }

        self.pending_uploads.push(AtlasUpload {
            x: alloc.x,
            y: alloc.y,
            width: alloc.width,
            height: alloc.height,
            pixels: region,
        });
    }

    fn lru_remove(&mut self, key: GlyphKey) {
        let Some(cached) = self.glyph_cache.get(&key) else {
            return;
        };
        let (prev, next) = (cached.prev, cached.next);

        match prev.and_then(|p| self.glyph_cache.get_mut(&p)) {
            Some(p) => p.next = next,
            None => self.lru_head = next,
        }
        match next.and_then(|n| self.glyph_cache.get_mut(&n)) {
            Some(n) => n.prev = prev,
            None => self.lru_tail = prev,
        }
    }

    fn lru_push_front(&mut self, key: GlyphKey) {
        let next = self.lru_head;
        match next.and_then(|n| self.glyph_cache.get_mut(&n)) {
            Some(n) => n.prev = Some(key),
            None => self.lru_tail = Some(key),
        }

        if let Some(cached) = self.glyph_cache.get_mut(&key) {
            cached.prev = None;
            cached.next = next;
        }
        self.lru_head = Some(key);
    }

    /// Drain queued texture uploads.
    pub fn take_pending_uploads(&mut self) -> Vec<AtlasUpload> {
        std::mem::take(&mut self.pending_uploads)
    }

    /// Drain queued entry-table updates.
    pub fn take_entry_updates(&mut self) -> Vec<(u16, AtlasEntry)> {
        std::mem::take(&mut self.pending_entries)
    }

    /// Drop every glyph and queue a full-texture clear.
    pub fn clear(&mut self) {
        self.glyph_cache.clear();
        self.slots.clear();
        self.free_slots.clear();
        self.lru_head = None;
        self.lru_tail = None;
        self.packer.clear();
        self.pixels.fill(0);
        self.pending_entries.clear();
        self.pending_uploads.clear();
        self.pending_uploads.push(AtlasUpload {
            x: 0,
            y: 0,
            width: self.size,
            height: self.size,
            pixels: vec![0; self.pixels.len()],
        });
        log::info!("Glyph atlas cleared");
    }

    /// Entry stored in table slot `index`, if occupied.
    pub fn entry(&self, index: u16) -> Option<AtlasEntry> {
        let key = self.slots.get(index as usize).copied().flatten()?;
        self.glyph_cache.get(&key).map(|cached| cached.entry)
    }

    /// Resident glyph for `key` without marking it used.
    pub fn get(&self, key: GlyphKey) -> Option<ResidentGlyph> {
        self.glyph_cache.get(&key).map(|cached| ResidentGlyph {
            index: cached.index,
            entry: cached.entry,
        })
    }

    pub fn contains(&self, key: GlyphKey) -> bool {
        self.glyph_cache.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.glyph_cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_cache.is_empty()
    }

    /// Texture edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn max_glyphs(&self) -> usize {
        self.max_glyphs
    }

    /// Number of table slots the GPU entry table must hold.
    pub fn table_capacity(&self) -> usize {
        self.max_glyphs
    }

    /// CPU copy of the texture, `size * size` RGBA8 texels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Every resident glyph with its slot and entry, ordered by slot.
    pub fn resident_entries(&self) -> Vec<(GlyphKey, u16, AtlasEntry)> {
        let mut entries: Vec<_> = self
            .glyph_cache
            .iter()
            .map(|(key, cached)| (*key, cached.index, cached.entry))
            .collect();
        entries.sort_by_key(|(_, index, _)| *index);
        entries
    }

    /// Resident glyphs from most to least recently used.
    pub fn lru_order(&self) -> Vec<GlyphKey> {
        let mut order = Vec::with_capacity(self.glyph_cache.len());
        let mut cursor = self.lru_head;
        while let Some(key) = cursor {
            order.push(key);
            cursor = self.glyph_cache.get(&key).and_then(|cached| cached.next);
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termgrid_fonts::{CellMetrics, RasterizeError};

    struct SquareRasterizer {
        side: u32,
        calls: usize,
    }

    impl GlyphRasterizer for SquareRasterizer {
        fn rasterize(&mut self, key: GlyphKey) -> Result<RasterizedGlyph, RasterizeError> {
            self.calls += 1;
            if key.ch == ' ' {
                return Ok(RasterizedGlyph::empty());
            }
            Ok(RasterizedGlyph {
                width: self.side,
                height: self.side,
                bearing_x: 0.0,
                bearing_y: 1.0,
                pixels: vec![key.ch as u8; (self.side * self.side * 4) as usize],
            })
        }

        fn cell_metrics(&self) -> CellMetrics {
            CellMetrics {
                width: self.side as f32,
                height: self.side as f32,
                baseline: self.side as f32,
            }
        }
    }

    #[test]
    fn test_hit_does_not_rasterize_again() {
        let mut atlas = GlyphAtlas::new(64, 2, 16);
        let mut raster = SquareRasterizer { side: 4, calls: 0 };
        let first = atlas.ensure_resident(GlyphKey::regular('a'), &mut raster).unwrap();
        let second = atlas.ensure_resident(GlyphKey::regular('a'), &mut raster).unwrap();
        assert_eq!(first, second);
        assert_eq!(raster.calls, 1);
    }

    #[test]
    fn test_zero_area_glyph_uses_no_space() {
        let mut atlas = GlyphAtlas::new(64, 2, 16);
        let mut raster = SquareRasterizer { side: 4, calls: 0 };
        let resident = atlas.ensure_resident(GlyphKey::regular(' '), &mut raster).unwrap();
        assert_eq!(resident.entry.uv_rect, [0.0; 4]);
        assert!(resident.entry.is_empty());
        assert!(atlas.take_pending_uploads().is_empty());
        assert_eq!(atlas.take_entry_updates().len(), 1);
    }

    #[test]
    fn test_lru_order_tracks_hits() {
        let mut atlas = GlyphAtlas::new(64, 0, 16);
        let mut raster = SquareRasterizer { side: 4, calls: 0 };
        for ch in ['a', 'b', 'c'] {
            atlas.ensure_resident(GlyphKey::regular(ch), &mut raster).unwrap();
        }
        atlas.ensure_resident(GlyphKey::regular('a'), &mut raster).unwrap();
        let order: String = atlas.lru_order().iter().map(|k| k.ch).collect();
        assert_eq!(order, "acb");
    }

    #[test]
    fn test_upload_clears_padding() {
        let mut atlas = GlyphAtlas::new(16, 1, 4);
        let mut raster = SquareRasterizer { side: 2, calls: 0 };
        atlas.ensure_resident(GlyphKey::regular('z'), &mut raster).unwrap();
        let uploads = atlas.take_pending_uploads();
        assert_eq!(uploads.len(), 1);
        let upload = &uploads[0];
        assert_eq!((upload.width, upload.height), (3, 3));
        // Right padding column of the first row is transparent
        assert_eq!(&upload.pixels[8..12], &[0, 0, 0, 0]);
        assert_eq!(&upload.pixels[0..4], &[b'z'; 4]);
    }
}
