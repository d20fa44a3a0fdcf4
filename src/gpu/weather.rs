//! Precipitation and spark rendering.
//!
//! The particle pool is uploaded once. Every frame only the per-layer
//! uniforms change, plus whatever spark slots were emitted since the last
//! upload.

use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use super::{uniform_layout, GpuContext, UniformSlot, ADDITIVE_BLENDING, DEPTH_FORMAT};
use crate::camera::CameraView;
use crate::emitter::ParticleRing;
use crate::error::GpuError;
use crate::particles::PoolLayout;
use crate::shader::{RAIN_SHADER, SNOW_SHADER, SPARK_SHADER};
use crate::uniforms::{ParticleUniforms, SparkUniforms};
use crate::weather::{Precipitation, PrecipitationField};

const POSITION_ATTRIBUTE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const POSITION_BYTES: u64 = 12;

/// Colours and sizes of the weather effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherStyle {
    pub rain_color: Vec4,
    pub snow_color: Vec4,
    pub spark_color: Vec4,
    /// Seconds of motion covered by a rain streak.
    pub streak_length: f32,
    /// Flake half-size in world units.
    pub flake_size: f32,
    /// Spark half-size in clip space.
    pub spark_size: f32,
}

impl Default for WeatherStyle {
    fn default() -> Self {
        Self {
            rain_color: Vec4::new(0.65, 0.7, 0.85, 0.55),
            snow_color: Vec4::new(0.95, 0.95, 1.0, 0.9),
            spark_color: Vec4::new(1.0, 0.6, 0.2, 1.0),
            streak_length: 0.04,
            flake_size: 0.03,
            spark_size: 0.01,
        }
    }
}

/// GPU side of a [`PrecipitationField`] and a spark [`ParticleRing`].
pub struct WeatherRenderer {
    pool_buffer: wgpu::Buffer,
    vertex_count: u32,
    particle_count: u32,
    /// Rain needs (head, tail) pairs; a point pool is drawn as flakes.
    streaks: bool,
    rain_pipeline: wgpu::RenderPipeline,
    snow_pipeline: wgpu::RenderPipeline,
    layers: Vec<UniformSlot<ParticleUniforms>>,
    spark_buffer: wgpu::Buffer,
    spark_capacity: u32,
    spark_pipeline: wgpu::RenderPipeline,
    spark_uniforms: UniformSlot<SparkUniforms>,
    style: WeatherStyle,
}

impl WeatherRenderer {
    pub fn new(
        ctx: &GpuContext,
        field: &PrecipitationField,
        sparks: &ParticleRing,
        style: WeatherStyle,
    ) -> Result<Self, GpuError> {
        let pool = field.pool();
        let device = &ctx.device;

        let pool_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Precipitation Pool Buffer"),
            contents: pool.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let spark_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Spark Buffer"),
            contents: sparks.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let particle_layout = uniform_layout(
            device,
            "Particle Bind Group Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let spark_layout =
            uniform_layout(device, "Spark Bind Group Layout", wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT);

        let rain_shader = ctx.compile_shader("Rain Shader", RAIN_SHADER)?;
        let snow_shader = ctx.compile_shader("Snow Shader", SNOW_SHADER)?;
        let spark_shader = ctx.compile_shader("Spark Shader", SPARK_SHADER)?;

        let rain_pipeline = particle_pipeline(
            ctx,
            "Rain Pipeline",
            &rain_shader,
            &particle_layout,
            wgpu::VertexBufferLayout {
                array_stride: POSITION_BYTES,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &POSITION_ATTRIBUTE,
            },
            wgpu::PrimitiveTopology::LineList,
            wgpu::BlendState::ALPHA_BLENDING,
        )?;

        // One instance per logical particle; for streak pools this skips tails.
        let snow_pipeline = particle_pipeline(
            ctx,
            "Snow Pipeline",
            &snow_shader,
            &particle_layout,
            wgpu::VertexBufferLayout {
                array_stride: pool.particle_stride(),
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &POSITION_ATTRIBUTE,
            },
            wgpu::PrimitiveTopology::TriangleList,
            wgpu::BlendState::ALPHA_BLENDING,
        )?;

        let spark_pipeline = particle_pipeline(
            ctx,
            "Spark Pipeline",
            &spark_shader,
            &spark_layout,
            wgpu::VertexBufferLayout {
                array_stride: POSITION_BYTES,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &POSITION_ATTRIBUTE,
            },
            wgpu::PrimitiveTopology::TriangleList,
            ADDITIVE_BLENDING,
        )?;

        let camera = CameraView::default();
        let layers = field
            .frames(camera)
            .enumerate()
            .map(|(i, frame)| {
                let initial = ParticleUniforms::new(
                    Mat4::IDENTITY,
                    Mat4::IDENTITY,
                    camera,
                    frame,
                    field.box_size(),
                );
                UniformSlot::new(device, &particle_layout, &format!("Layer {} Uniforms", i), &initial)
            })
            .collect::<Vec<_>>();

        let spark_uniforms = UniformSlot::new(
            device,
            &spark_layout,
            "Spark Uniforms",
            &SparkUniforms::new(Mat4::IDENTITY, style.spark_color, style.spark_size, ctx.aspect()),
        );

        log::info!(
            "weather renderer: {} particles x {} layers, {} spark slots",
            pool.particle_count(),
            layers.len(),
            sparks.capacity()
        );

        Ok(Self {
            pool_buffer,
            vertex_count: pool.vertex_count() as u32,
            particle_count: pool.particle_count() as u32,
            streaks: pool.layout() == PoolLayout::Streaks,
            rain_pipeline,
            snow_pipeline,
            layers,
            spark_buffer,
            spark_capacity: sparks.capacity() as u32,
            spark_pipeline,
            spark_uniforms,
            style,
        })
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn style(&self) -> &WeatherStyle {
        &self.style
    }

    /// Write this frame's uniforms for every layer and the sparks.
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        field: &PrecipitationField,
        camera: CameraView,
        view_proj: Mat4,
        prev_view_proj: Mat4,
        aspect: f32,
    ) {
        let color = match field.mode() {
            Precipitation::Rain => self.style.rain_color,
            Precipitation::Snow => self.style.snow_color,
        };
        for (slot, frame) in self.layers.iter().zip(field.frames(camera)) {
            let uniforms =
                ParticleUniforms::new(view_proj, prev_view_proj, camera, frame, field.box_size())
                    .with_color(color)
                    .with_streak_length(self.style.streak_length)
                    .with_point_size(self.style.flake_size);
            slot.write(queue, &uniforms);
        }
        self.spark_uniforms.write(
            queue,
            &SparkUniforms::new(view_proj, self.style.spark_color, self.style.spark_size, aspect),
        );
    }

    /// Copy the slots emitted since the last call. Returns the number of
    /// contiguous writes issued (at most two).
    pub fn upload_sparks(&self, queue: &wgpu::Queue, sparks: &mut ParticleRing) -> usize {
        let spans: Vec<_> = sparks.drain_dirty().collect();
        for span in &spans {
            queue.write_buffer(
                &self.spark_buffer,
                ParticleRing::byte_offset(span.start),
                sparks.bytes(span.clone()),
            );
        }
        spans.len()
    }

    /// Draw every layer in the current mode, then the sparks.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mode: Precipitation) {
        pass.set_vertex_buffer(0, self.pool_buffer.slice(..));
        if mode == Precipitation::Rain && self.streaks {
            pass.set_pipeline(&self.rain_pipeline);
            for slot in &self.layers {
                pass.set_bind_group(0, slot.bind_group(), &[]);
                pass.draw(0..self.vertex_count, 0..1);
            }
        } else {
            pass.set_pipeline(&self.snow_pipeline);
            for slot in &self.layers {
                pass.set_bind_group(0, slot.bind_group(), &[]);
                pass.draw(0..6, 0..self.particle_count);
            }
        }

        pass.set_pipeline(&self.spark_pipeline);
        pass.set_bind_group(0, self.spark_uniforms.bind_group(), &[]);
        pass.set_vertex_buffer(0, self.spark_buffer.slice(..));
        pass.draw(0..6, 0..self.spark_capacity);
    }
}

/// Translucent pipeline that tests against the scene's depth without
/// writing it.
fn particle_pipeline(
    ctx: &GpuContext,
    label: &'static str,
    shader: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    buffer: wgpu::VertexBufferLayout<'_>,
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
) -> Result<wgpu::RenderPipeline, GpuError> {
    ctx.validated(label, |device| {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[buffer],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.format(),
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
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
