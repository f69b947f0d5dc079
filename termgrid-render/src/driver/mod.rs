//! wgpu driver: owns the surface, the atlas texture and the per-slot
//! buffers, and draws [`PreparedFrame`]s.
//!
//! Each frame holds one slot of the [`FramePool`] from the moment its
//! buffers are written until the GPU reports the submission complete, so a
//! slot's buffers are never overwritten while a frame reading them is in
//! flight. Atlas texels and entry-table slots are written through the queue;
//! queue writes are ordered before later submissions, so a glyph evicted and
//! overwritten for frame N+1 is never observed by frame N.

mod surface;

use std::sync::Arc;
use std::time::Duration;

use termgrid_config::{Config, PowerPreference, VsyncMode, color_u8_to_f32};
use winit::window::Window;

use crate::buffer_pool::FramePool;
use crate::diagnostics::DiagnosticsSink;
use crate::error::RenderError;
use crate::frame::{FrameOutcome, PreparedFrame, admit_frame, drop_frame};
use crate::gpu_utils::write_rgba_texture_region;
use crate::layout::AtlasEntry;
use crate::pipeline::{self, SlotBuffers};

/// Maximum number of frames the surface may queue ahead of presentation.
const SURFACE_FRAME_LATENCY: u32 = 2;

/// Renderer construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererOptions {
    pub vsync_mode: VsyncMode,
    pub power_preference: PowerPreference,
    /// Preferred atlas edge; clamped to the device limit
    pub atlas_size: u32,
    pub max_glyphs: usize,
    pub frames_in_flight: usize,
    /// Longest wait for a free frame slot before the frame is dropped
    pub frame_acquire_timeout: Duration,
    /// Clear color for the area outside the grid
    pub background: [f32; 4],
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RendererOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            vsync_mode: config.vsync_mode,
            power_preference: config.power_preference,
            atlas_size: config.atlas_size,
            max_glyphs: config.max_glyphs as usize,
            frames_in_flight: config.frames_in_flight as usize,
            frame_acquire_timeout: Duration::from_millis(config.frame_acquire_timeout_ms),
            background: color_u8_to_f32(config.background),
        }
    }
}

pub struct GridRenderer {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    atlas_texture: wgpu::Texture,
    atlas_view: wgpu::TextureView,
    atlas_size: u32,
    entry_table: wgpu::Buffer,
    entry_capacity: usize,

    slots: Vec<SlotBuffers>,
    pool: FramePool,
    acquire_timeout: Duration,
    clear_color: wgpu::Color,
    diagnostics: Arc<dyn DiagnosticsSink>,

    frames_presented: u64,
    frames_dropped: u64,
}

impl GridRenderer {
    pub async fn new(
        window: Arc<Window>,
        options: &RendererOptions,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, RenderError> {
        // Windows: DX12 (Vulkan may not work in VMs)
        // macOS: Metal
        // Linux: Vulkan first, GL for VM compatibility
        #[cfg(target_os = "windows")]
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::DX12,
            ..Default::default()
        });
        #[cfg(target_os = "macos")]
        let instance = wgpu::Instance::default();
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::VULKAN | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference.to_wgpu(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterNotFound)?;
        log::info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("termgrid device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                ..Default::default()
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // Non-sRGB so shader output matches the software renderer byte for byte
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                RenderError::SurfaceCreation("surface reports no texture formats".to_string())
            })?;

        let present_mode = surface::select_present_mode(
            options.vsync_mode.to_present_mode(),
            &surface_caps.present_modes,
        );
        let alpha_mode = surface::select_alpha_mode(&surface_caps.alpha_modes);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: SURFACE_FRAME_LATENCY,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {}x{} {:?}, {:?}, {:?}",
            config.width,
            config.height,
            surface_format,
            present_mode,
            alpha_mode
        );

        let bind_group_layout = pipeline::create_grid_bind_group_layout(&device);
        let grid_pipeline =
            pipeline::create_grid_pipeline(&device, surface_format, &bind_group_layout);

        let atlas_size = pipeline::clamp_atlas_size(&device, options.atlas_size);
        let (atlas_texture, atlas_view) = pipeline::create_atlas_texture(&device, atlas_size);
        let entry_capacity = options.max_glyphs.clamp(1, crate::layout::GLYPH_INDEX_NONE as usize);
        let entry_table = pipeline::create_entry_table_buffer(&device, entry_capacity);

        let pool = FramePool::new(options.frames_in_flight);
        let slots = (0..pool.capacity())
            .map(|index| {
                SlotBuffers::new(
                    &device,
                    &bind_group_layout,
                    &entry_table,
                    &atlas_view,
                    index,
                    0,
                )
            })
            .collect();

        let [r, g, b, a] = options.background;
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline: grid_pipeline,
            bind_group_layout,
            atlas_texture,
            atlas_view,
            atlas_size,
            entry_table,
            entry_capacity,
            slots,
            pool,
            acquire_timeout: options.frame_acquire_timeout,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
            diagnostics,
            frames_presented: 0,
            frames_dropped: 0,
        })
    }

    /// Draw and present one frame.
    ///
    /// Degraded frames (grid/uniform mismatch, no free slot) are reported to
    /// the diagnostics sink and returned as [`FrameOutcome::Dropped`]; the
    /// render loop carries on. Surface errors are returned as `Err` so the
    /// host can reconfigure.
    pub fn render(&mut self, frame: &PreparedFrame) -> Result<FrameOutcome, RenderError> {
        // Atlas changes are applied even for dropped frames: the atlas
        // already assumes them.
        self.apply_atlas_changes(frame)?;

        if let Some(dropped) = admit_frame(frame, self.diagnostics.as_ref()) {
            self.frames_dropped += 1;
            return Ok(dropped);
        }

        let device = Arc::clone(&self.device);
        let Some(slot) = self.pool.acquire(self.acquire_timeout, || {
            let _ = device.poll(wgpu::PollType::Poll);
        }) else {
            let err = RenderError::FramePoolTimeout {
                waited: self.acquire_timeout,
            };
            self.frames_dropped += 1;
            return Ok(drop_frame(frame.frame_index, err, self.diagnostics.as_ref()));
        };
        let index = slot.index();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let cell_count = frame.cells.len();
        let buffers = &mut self.slots[index];
        buffers.ensure_cell_capacity(
            &self.device,
            &self.bind_group_layout,
            &self.entry_table,
            &self.atlas_view,
            index,
            cell_count,
        );
        self.queue
            .write_buffer(&buffers.frame_uniforms, 0, bytemuck::bytes_of(&frame.uniforms));
        self.queue.write_buffer(
            &buffers.shading_uniforms,
            0,
            bytemuck::bytes_of(&frame.shading),
        );
        if cell_count > 0 {
            self.queue
                .write_buffer(&buffers.cells, 0, bytemuck::cast_slice(&frame.cells));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cell grid encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cell grid render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if cell_count > 0 {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &buffers.bind_group, &[]);
                render_pass.draw(0..4, 0..cell_count as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        let release = slot.into_release();
        self.queue.on_submitted_work_done(move || release.release());
        output.present();

        self.frames_presented += 1;
        Ok(FrameOutcome::Presented)
    }

    fn apply_atlas_changes(&self, frame: &PreparedFrame) -> Result<(), RenderError> {
        for upload in &frame.atlas_uploads {
            if upload.x + upload.width > self.atlas_size || upload.y + upload.height > self.atlas_size
            {
                log::error!(
                    "Atlas upload {}x{} at ({}, {}) is outside the {}px atlas texture",
                    upload.width,
                    upload.height,
                    upload.x,
                    upload.y,
                    self.atlas_size
                );
                continue;
            }
            write_rgba_texture_region(
                &self.queue,
                &self.atlas_texture,
                &upload.pixels,
                upload.x,
                upload.y,
                upload.width,
                upload.height,
            )?;
        }

        let stride = std::mem::size_of::<AtlasEntry>() as u64;
        for (index, entry) in &frame.entry_updates {
            if *index as usize >= self.entry_capacity {
                log::error!(
                    "Atlas entry slot {} exceeds table capacity {}",
                    index,
                    self.entry_capacity
                );
                continue;
            }
            self.queue.write_buffer(
                &self.entry_table,
                *index as u64 * stride,
                bytemuck::bytes_of(entry),
            );
        }
        Ok(())
    }

    /// Atlas edge length in pixels; the glyph atlas feeding this renderer
    /// must be created with this size.
    pub fn atlas_size(&self) -> u32 {
        self.atlas_size
    }

    /// Entry-table slots available to the glyph atlas.
    pub fn entry_capacity(&self) -> usize {
        self.entry_capacity
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn frames_in_flight(&self) -> usize {
        self.pool.capacity()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}
