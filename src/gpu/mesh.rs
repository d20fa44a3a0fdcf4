//! Static mesh buffers and the opaque scene pass.

use std::ops::Range;

use glam::Mat4;
use wgpu::util::DeviceExt;

use super::{uniform_layout, GpuContext, UniformSlot, DEPTH_FORMAT};
use crate::error::GpuError;
use crate::mesh::{MeshData, Placement, SceneObject, Vertex};
use crate::shader::MESH_SHADER;
use crate::uniforms::MeshUniforms;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

/// Vertex buffer layout for [`Vertex`].
pub(crate) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Vertex and index buffers for one uploaded mesh.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Bind to vertex slot 0 and draw `instances`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: Range<u32>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, instances);
    }
}

struct PlacedMesh {
    mesh: GpuMesh,
    placement: Placement,
    uniforms: UniformSlot<MeshUniforms>,
}

/// Draws a fixed set of opaque meshes with depth writes.
pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,
    objects: Vec<PlacedMesh>,
}

impl MeshRenderer {
    pub fn new(ctx: &GpuContext, scene: &[SceneObject]) -> Result<Self, GpuError> {
        let shader = ctx.compile_shader("Mesh Shader", MESH_SHADER)?;

        let bind_group_layout =
            uniform_layout(&ctx.device, "Mesh Bind Group Layout", wgpu::ShaderStages::VERTEX);

        let pipeline = ctx.validated("Mesh Pipeline", |device| {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Mesh Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Mesh Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.format(),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
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
        })?;

        let objects = scene
            .iter()
            .map(|object| PlacedMesh {
                mesh: GpuMesh::upload(&ctx.device, object.label, &object.mesh),
                placement: object.placement,
                uniforms: UniformSlot::new(
                    &ctx.device,
                    &bind_group_layout,
                    object.label,
                    &MeshUniforms::new(Mat4::IDENTITY, object.placement.at(0.0)),
                ),
            })
            .collect();

        Ok(Self { pipeline, objects })
    }

    /// Write every object's transform for this frame. `elapsed` drives
    /// spinning parts.
    pub fn update(&self, queue: &wgpu::Queue, view_proj: Mat4, elapsed: f32) {
        for object in &self.objects {
            let model = object.placement.at(elapsed);
            object
                .uniforms
                .write(queue, &MeshUniforms::new(view_proj, model));
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        for object in &self.objects {
            pass.set_bind_group(0, object.uniforms.bind_group(), &[]);
            object.mesh.draw(pass, 0..1);
        }
    }
}
