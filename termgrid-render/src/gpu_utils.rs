//! Small wgpu helpers shared by the driver.

use crate::error::RenderError;

/// Copy a tightly packed RGBA8 rectangle into `texture` at (`x`, `y`).
///
/// Empty rectangles are a no-op.
pub fn write_rgba_texture_region(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    data: &[u8],
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<(), RenderError> {
    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        return Err(RenderError::InvalidTextureData {
            expected,
            actual: data.len(),
        });
    }
    if width == 0 || height == 0 {
        return Ok(());
    }

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x, y, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    Ok(())
}

/// Round a buffer size up to a multiple of 16 bytes.
pub fn aligned_buffer_size(bytes: usize) -> u64 {
    (bytes.max(1) as u64).div_ceil(16) * 16
}
