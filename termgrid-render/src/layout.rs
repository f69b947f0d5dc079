//! Binary layouts shared by the CPU and `shaders/cell_grid.wgsl`.
//!
//! All structs are `#[repr(C)]` with `bytemuck::Pod` so they can be uploaded
//! to wgpu buffers with zero-copy. Sizes and field offsets are asserted at
//! compile time; changing any of them requires the matching shader change.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

/// Glyph index meaning "no glyph" (blank cell).
pub const GLYPH_INDEX_NONE: u16 = 0xFFFF;

/// One grid cell as read by the shader (16 bytes, one `vec4<u32>`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct CellRecord {
    /// Index into the atlas entry table, or [`GLYPH_INDEX_NONE`]
    pub glyph_index: u16,
    /// Foreground RGBA
    pub fg: [u8; 4],
    /// Background RGBA
    pub bg: [u8; 4],
    /// [`CellFlags`] bits
    pub flags: u16,
    pub padding: [u16; 2],
}

impl CellRecord {
    pub fn blank(fg: [u8; 4], bg: [u8; 4], flags: CellFlags) -> Self {
        Self {
            glyph_index: GLYPH_INDEX_NONE,
            fg,
            bg,
            flags: flags.bits(),
            padding: [0; 2],
        }
    }

    pub fn has_glyph(&self) -> bool {
        self.glyph_index != GLYPH_INDEX_NONE
    }

    /// Flags with reserved bits dropped.
    pub fn cell_flags(&self) -> CellFlags {
        CellFlags::from_bits_truncate(self.flags)
    }
}

/// Per-frame global parameters (40 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub viewport_size: [f32; 2],
    pub cell_size: [f32; 2],
    pub atlas_size: [f32; 2],
    pub cols: u32,
    pub rows: u32,
    /// Seconds since the renderer started
    pub time: f32,
    /// 1 while blinking text is visible
    pub blink_on: u32,
}

impl FrameUniforms {
    /// Number of cell records a frame with these uniforms must carry.
    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Location and placement of one resident glyph (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct AtlasEntry {
    /// (u0, v0, u1, v1) in normalized texture coordinates
    pub uv_rect: [f32; 4],
    /// Offset from the cell's top-left corner to the bitmap's top-left corner
    pub bearing: [f32; 2],
    /// Bitmap width and height in pixels
    pub size: [f32; 2],
}

impl AtlasEntry {
    pub fn is_empty(&self) -> bool {
        self.size[0] <= 0.0 || self.size[1] <= 0.0
    }
}

bitflags::bitflags! {
    /// Style flags stored in [`CellRecord::flags`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u16 {
        const BOLD          = 1 << 0;
        const ITALIC        = 1 << 1;
        const UNDERLINE     = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const INVERSE       = 1 << 4;
        const BLINK         = 1 << 5;
        const DIM           = 1 << 6;
    }
}

/// Logical style attributes of a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellAttributes {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub inverse: bool,
    pub blink: bool,
    pub dim: bool,
}

impl CellFlags {
    pub fn from_attributes(attrs: CellAttributes) -> Self {
        let mut flags = CellFlags::empty();
        flags.set(CellFlags::BOLD, attrs.bold);
        flags.set(CellFlags::ITALIC, attrs.italic);
        flags.set(CellFlags::UNDERLINE, attrs.underline);
        flags.set(CellFlags::STRIKETHROUGH, attrs.strikethrough);
        flags.set(CellFlags::INVERSE, attrs.inverse);
        flags.set(CellFlags::BLINK, attrs.blink);
        flags.set(CellFlags::DIM, attrs.dim);
        flags
    }

    pub fn attributes(self) -> CellAttributes {
        CellAttributes {
            bold: self.contains(CellFlags::BOLD),
            italic: self.contains(CellFlags::ITALIC),
            underline: self.contains(CellFlags::UNDERLINE),
            strikethrough: self.contains(CellFlags::STRIKETHROUGH),
            inverse: self.contains(CellFlags::INVERSE),
            blink: self.contains(CellFlags::BLINK),
            dim: self.contains(CellFlags::DIM),
        }
    }
}

// CellRecord: u16 glyph @0, u8x4 fg @2, u8x4 bg @6, u16 flags @10, u16x2 pad @12
const _: () = assert!(size_of::<CellRecord>() == 16);
const _: () = assert!(offset_of!(CellRecord, glyph_index) == 0);
const _: () = assert!(offset_of!(CellRecord, fg) == 2);
const _: () = assert!(offset_of!(CellRecord, bg) == 6);
const _: () = assert!(offset_of!(CellRecord, flags) == 10);
const _: () = assert!(offset_of!(CellRecord, padding) == 12);

const _: () = assert!(size_of::<FrameUniforms>() == 40);
const _: () = assert!(offset_of!(FrameUniforms, viewport_size) == 0);
const _: () = assert!(offset_of!(FrameUniforms, cell_size) == 8);
const _: () = assert!(offset_of!(FrameUniforms, atlas_size) == 16);
const _: () = assert!(offset_of!(FrameUniforms, cols) == 24);
const _: () = assert!(offset_of!(FrameUniforms, rows) == 28);
const _: () = assert!(offset_of!(FrameUniforms, time) == 32);
const _: () = assert!(offset_of!(FrameUniforms, blink_on) == 36);

const _: () = assert!(size_of::<AtlasEntry>() == 32);
const _: () = assert!(offset_of!(AtlasEntry, uv_rect) == 0);
const _: () = assert!(offset_of!(AtlasEntry, bearing) == 16);
const _: () = assert!(offset_of!(AtlasEntry, size) == 24);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_round_trip_all_combinations() {
        for bits in 0u16..128 {
            let flags = CellFlags::from_bits(bits).unwrap();
            let attrs = flags.attributes();
            assert_eq!(CellFlags::from_attributes(attrs), flags, "bits {bits:#09b}");
        }
    }

    #[test]
    fn test_fixed_bit_assignment() {
        let attrs = CellAttributes {
            underline: true,
            dim: true,
            ..Default::default()
        };
        assert_eq!(CellFlags::from_attributes(attrs).bits(), 0b100_0100);
        assert_eq!(CellFlags::all().bits(), 0x7F);
    }

    #[test]
    fn test_cell_record_little_endian_words() {
        let record = CellRecord {
            glyph_index: 0x0102,
            fg: [0x10, 0x20, 0x30, 0x40],
            bg: [0x50, 0x60, 0x70, 0x80],
            flags: CellFlags::INVERSE.bits(),
            padding: [0; 2],
        };
        let words: [u32; 4] = bytemuck::cast(record);
        // The shader unpacks these exact words
        assert_eq!(words[0], u32::from_le_bytes([0x02, 0x01, 0x10, 0x20]));
        assert_eq!(words[1], u32::from_le_bytes([0x30, 0x40, 0x50, 0x60]));
        assert_eq!(words[2], u32::from_le_bytes([0x70, 0x80, 0x10, 0x00]));
        assert_eq!(words[3], 0);
    }

    #[test]
    fn test_reserved_flag_bits_are_dropped() {
        let record = CellRecord {
            flags: 0xFF80 | CellFlags::BOLD.bits(),
            ..CellRecord::blank([0; 4], [0; 4], CellFlags::empty())
        };
        assert_eq!(record.cell_flags(), CellFlags::BOLD);
    }
}
