//! Instanced cone rendering for Voronoi diagrams.

use super::mesh::vertex_layout;
use super::{GpuContext, GpuMesh, DEPTH_FORMAT};
use crate::error::GpuError;
use crate::mesh::MeshData;
use crate::shader::VORONOI_SHADER;
use crate::uniforms::ConeInstance;
use crate::voronoi::{ConeSite, ShadeMode};

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![2 => Float32x2, 3 => Float32x4];
const INSTANCE_BYTES: u64 = std::mem::size_of::<ConeInstance>() as u64;

/// One shared cone mesh drawn once per site.
pub struct VoronoiRenderer {
    cone: GpuMesh,
    instances: wgpu::Buffer,
    capacity: u32,
    /// Indexed by [`ShadeMode::index`].
    pipelines: Vec<wgpu::RenderPipeline>,
}

impl VoronoiRenderer {
    pub fn new(ctx: &GpuContext, cone: &MeshData, capacity: usize) -> Result<Self, GpuError> {
        let shader = ctx.compile_shader("Voronoi Shader", VORONOI_SHADER)?;

        let capacity = capacity.max(1) as u32;
        let instances = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cone Instance Buffer"),
            size: capacity as u64 * INSTANCE_BYTES,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pipelines = ShadeMode::ALL
            .iter()
            .map(|mode| cone_pipeline(ctx, &shader, *mode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cone: GpuMesh::upload(&ctx.device, "Cone Mesh", cone),
            instances,
            capacity,
            pipelines,
        })
    }

    /// Upload site `index`. Indices past the capacity are ignored.
    pub fn write_site(&self, queue: &wgpu::Queue, index: usize, site: &ConeSite) {
        if index as u32 >= self.capacity {
            log::warn!("cone {} exceeds instance capacity {}", index, self.capacity);
            return;
        }
        let instance = ConeInstance::new(site.offset, site.color);
        queue.write_buffer(
            &self.instances,
            index as u64 * INSTANCE_BYTES,
            bytemuck::bytes_of(&instance),
        );
    }

    /// Draw the first `count` sites.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mode: ShadeMode, count: usize) {
        let count = (count as u32).min(self.capacity);
        if count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipelines[mode.index()]);
        pass.set_vertex_buffer(1, self.instances.slice(..));
        self.cone.draw(pass, 0..count);
    }
}

fn cone_pipeline(
    ctx: &GpuContext,
    shader: &wgpu::ShaderModule,
    mode: ShadeMode,
) -> Result<wgpu::RenderPipeline, GpuError> {
    ctx.validated("Voronoi Pipeline", |device| {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Voronoi Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(mode.entry_point()),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    vertex_layout(),
                    wgpu::VertexBufferLayout {
                        array_stride: INSTANCE_BYTES,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(mode.entry_point()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    })
}
