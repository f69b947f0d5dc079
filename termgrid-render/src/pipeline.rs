//! GPU pipeline and resource creation for the cell grid.
//!
//! The grid is drawn as one instanced triangle strip: four vertices per
//! cell, one instance per cell, no vertex buffers. Cell records, the atlas
//! entry table and the atlas texture are read in the shader.

use wgpu::*;

use crate::gpu_utils::aligned_buffer_size;
use crate::layout::{AtlasEntry, CellRecord, FrameUniforms};
use crate::shading::ShadingUniforms;

/// Bind group layout shared by every frame slot.
///
/// 0 frame uniforms, 1 cell records, 2 atlas entry table, 3 atlas texture,
/// 4 shading uniforms.
pub fn create_grid_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("cell grid bind group layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 3,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: false },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 4,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

/// Create the cell grid pipeline
pub fn create_grid_pipeline(
    device: &Device,
    surface_format: TextureFormat,
    layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(include_wgsl!("shaders/cell_grid.wgsl"));

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("cell grid pipeline layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("cell grid pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(ColorTargetState {
                format: surface_format,
                // The shader composites every layer itself
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Largest atlas edge the device supports, at most `preferred`.
pub fn clamp_atlas_size(device: &Device, preferred: u32) -> u32 {
    let max_texture_size = device.limits().max_texture_dimension_2d;
    let atlas_size = preferred.min(max_texture_size);
    if atlas_size < preferred {
        log::warn!(
            "GPU texture size limit ({}) is smaller than preferred atlas size ({})",
            max_texture_size,
            preferred
        );
    }
    atlas_size
}

/// Create the square RGBA atlas texture.
pub fn create_atlas_texture(device: &Device, atlas_size: u32) -> (Texture, TextureView) {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("glyph atlas texture"),
        size: Extent3d {
            width: atlas_size,
            height: atlas_size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8Unorm,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&TextureViewDescriptor::default());
    (texture, view)
}

/// Storage buffer holding one [`AtlasEntry`] per table slot.
pub fn create_entry_table_buffer(device: &Device, capacity: usize) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        label: Some("atlas entry table"),
        size: aligned_buffer_size(capacity.max(1) * std::mem::size_of::<AtlasEntry>()),
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// GPU buffers owned by one frame slot.
pub struct SlotBuffers {
    pub frame_uniforms: Buffer,
    pub shading_uniforms: Buffer,
    pub cells: Buffer,
    /// Cell records the `cells` buffer can hold
    pub cell_capacity: usize,
    pub bind_group: BindGroup,
}

impl SlotBuffers {
    pub fn new(
        device: &Device,
        layout: &BindGroupLayout,
        entry_table: &Buffer,
        atlas_view: &TextureView,
        index: usize,
        cell_capacity: usize,
    ) -> Self {
        let frame_uniforms = device.create_buffer(&BufferDescriptor {
            label: Some(&format!("frame uniforms {index}")),
            size: aligned_buffer_size(std::mem::size_of::<FrameUniforms>()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shading_uniforms = device.create_buffer(&BufferDescriptor {
            label: Some(&format!("shading uniforms {index}")),
            size: aligned_buffer_size(std::mem::size_of::<ShadingUniforms>()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let cell_capacity = cell_capacity.max(1);
        let cells = create_cell_buffer(device, index, cell_capacity);
        let bind_group = create_grid_bind_group(
            device,
            layout,
            &frame_uniforms,
            &cells,
            entry_table,
            atlas_view,
            &shading_uniforms,
        );

        Self {
            frame_uniforms,
            shading_uniforms,
            cells,
            cell_capacity,
            bind_group,
        }
    }

    /// Grow the cell buffer to hold at least `needed` records.
    ///
    /// Returns `true` when the buffer (and bind group) were recreated.
    pub fn ensure_cell_capacity(
        &mut self,
        device: &Device,
        layout: &BindGroupLayout,
        entry_table: &Buffer,
        atlas_view: &TextureView,
        index: usize,
        needed: usize,
    ) -> bool {
        if needed <= self.cell_capacity {
            return false;
        }
        let capacity = needed.next_power_of_two();
        log::debug!(
            "Growing cell buffer of slot {} from {} to {} records",
            index,
            self.cell_capacity,
            capacity
        );
        self.cells = create_cell_buffer(device, index, capacity);
        self.cell_capacity = capacity;
        self.bind_group = create_grid_bind_group(
            device,
            layout,
            &self.frame_uniforms,
            &self.cells,
            entry_table,
            atlas_view,
            &self.shading_uniforms,
        );
        true
    }
}

fn create_cell_buffer(device: &Device, index: usize, capacity: usize) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        label: Some(&format!("cell records {index}")),
        size: aligned_buffer_size(capacity * std::mem::size_of::<CellRecord>()),
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_grid_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    frame_uniforms: &Buffer,
    cells: &Buffer,
    entry_table: &Buffer,
    atlas_view: &TextureView,
    shading_uniforms: &Buffer,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some("cell grid bind group"),
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: frame_uniforms.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 1,
                resource: cells.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 2,
                resource: entry_table.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 3,
                resource: BindingResource::TextureView(atlas_view),
            },
            BindGroupEntry {
                binding: 4,
                resource: shading_uniforms.as_entire_binding(),
            },
        ],
    })
}
