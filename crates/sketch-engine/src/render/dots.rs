use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{ColorRgba, Vec2};
use crate::target::RenderTarget;

use super::common::{premul_alpha_blend, QuadVertex, QUAD_INDICES, QUAD_VERTICES};

/// A filled, antialiased disc on the canvas.
///
/// `center` and `radius` are canvas pixels; `color` is linear straight alpha
/// (premultiplied on upload).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Dot {
    pub center: Vec2,
    pub radius: f32,
    pub color: ColorRgba,
}

impl Dot {
    #[inline]
    pub const fn new(center: Vec2, radius: f32, color: ColorRgba) -> Self {
        Self { center, radius, color }
    }
}

/// Paints dots into a [`RenderTarget`] through its transform uniforms.
///
/// This is the smallest consumer of the target's bind group; brush
/// renderers follow the same shape.
#[derive(Default)]
pub struct DotRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
}

impl DotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `dots` into the target's pending encoder.
    ///
    /// Opens the encoder if needed; does not commit. Returns the number of
    /// dots drawn (0 when none are drawable or the target has no texture).
    pub fn render(&mut self, target: &mut RenderTarget, dots: &[Dot]) -> usize {
        let instances = build_instances(dots);
        if instances.is_empty() {
            return 0;
        }
        if target.texture().is_none() {
            log::debug!("DotRenderer: target has no texture; skipped {} dots", instances.len());
            return 0;
        }

        self.ensure_pipeline(target);
        self.ensure_static_buffers(target.device());

        // Queue writes land at the next submit, so a shared buffer would be
        // clobbered by a second render before commit. One buffer per call.
        let instance_vbo = target
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sketch dots instance vbo"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let Some(pipeline) = self.pipeline.as_ref() else { return 0 };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return 0 };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return 0 };

        target.prepare_for_draw();
        let Some(mut tp) = target.begin_pass() else { return 0 };

        tp.pass.set_pipeline(pipeline);
        tp.pass.set_bind_group(0, tp.bind_group, &[]);
        tp.pass.set_vertex_buffer(0, quad_vbo.slice(..));
        tp.pass.set_vertex_buffer(1, instance_vbo.slice(..));
        tp.pass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        tp.pass.draw_indexed(0..6, 0, 0..instances.len() as u32);

        instances.len()
    }

    fn ensure_pipeline(&mut self, target: &RenderTarget) {
        let format = target.pixel_format();
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let device = target.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sketch dots shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/dots.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sketch dots pipeline layout"),
            bind_group_layouts: &[target.bind_group_layout()],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sketch dots pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), DotInstance::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("DotRenderer: built pipeline for {format:?}");

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
    }

    fn ensure_static_buffers(&mut self, device: &wgpu::Device) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sketch dots quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sketch dots quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Drops dots that would rasterize to nothing or to garbage.
fn build_instances(dots: &[Dot]) -> Vec<DotInstance> {
    dots.iter()
        .filter(|d| d.center.is_finite() && d.radius.is_finite() && d.radius > 0.0)
        .map(|d| DotInstance {
            center: d.center.to_array(),
            radius: d.radius,
            color: d.color.premultiplied().to_array(),
        })
        .collect()
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DotInstance {
    center: [f32; 2],
    radius: f32,
    color: [f32; 4],
}

impl DotInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        1 => Float32x2, // center
        2 => Float32,   // radius
        3 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DotInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}
