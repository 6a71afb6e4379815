use anyhow::Result;

use crate::coords::{ColorRgba, DrawableSize, Vec2};
use crate::device::Gpu;

use super::texture::create_empty_texture;
use super::uniforms::{ScaleUniform, ScrollingTransform};
use super::TargetConfig;

/// Uniform buffers are rewritten in place and can be copied out for inspection.
const UNIFORM_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::UNIFORM
    .union(wgpu::BufferUsages::COPY_DST)
    .union(wgpu::BufferUsages::COPY_SRC);

/// Render pass into a target's canvas, paired with the target's uniforms.
///
/// Both borrow the target, so the pass must be dropped before the target
/// can commit.
pub struct TargetPass<'a> {
    pub pass: wgpu::RenderPass<'a>,
    pub bind_group: &'a wgpu::BindGroup,
}

/// A canvas texture plus the transforms and commands that paint into it.
pub struct RenderTarget {
    device: wgpu::Device,
    queue: wgpu::Queue,

    texture: Option<wgpu::Texture>,

    /// Color attachment of the pass. Always a view of `texture`.
    view: Option<wgpu::TextureView>,

    pixel_format: wgpu::TextureFormat,
    drawable_size: DrawableSize,

    scale: f32,
    zoom: f32,
    content_offset: Vec2,
    native_scale: f32,

    clear_color: ColorRgba,
    label: &'static str,

    uniform_buffer: wgpu::Buffer,
    transform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,

    /// Pending commands. At most one at a time.
    encoder: Option<wgpu::CommandEncoder>,
}

impl RenderTarget {
    /// Creates a target of `size` physical pixels on `gpu`.
    ///
    /// A size the device cannot back leaves the target without a texture;
    /// construction still succeeds and passes are refused until the next
    /// [`clear`](Self::clear) with a valid size.
    pub fn new(gpu: &Gpu, size: DrawableSize, config: TargetConfig) -> Result<Self> {
        let device = gpu.device().clone();
        let queue = gpu.queue().clone();

        let TargetConfig {
            pixel_format,
            scale,
            zoom,
            content_offset,
            native_scale,
            clear_color,
            label,
        } = config;

        anyhow::ensure!(
            native_scale.is_finite() && native_scale > 0.0,
            "native scale must be finite and positive, got {native_scale}"
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sketch scale matrix ubo"),
            size: std::mem::size_of::<ScaleUniform>() as u64,
            usage: UNIFORM_USAGE,
            mapped_at_creation: false,
        });

        let transform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sketch scrolling transform ubo"),
            size: std::mem::size_of::<ScrollingTransform>() as u64,
            usage: UNIFORM_USAGE,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sketch target bgl"),
            entries: &[
                uniform_entry(0, wgpu::BufferSize::new(std::mem::size_of::<ScaleUniform>() as u64)),
                uniform_entry(
                    1,
                    wgpu::BufferSize::new(std::mem::size_of::<ScrollingTransform>() as u64),
                ),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sketch target bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: transform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut target = Self {
            device,
            queue,
            texture: None,
            view: None,
            pixel_format,
            drawable_size: size,
            scale,
            zoom,
            content_offset,
            native_scale,
            clear_color,
            label,
            uniform_buffer,
            transform_buffer,
            bind_group_layout,
            bind_group,
            encoder: None,
        };

        target.replace_texture();
        target.update_buffer(size);

        log::debug!(
            "{label}: created {}x{} {pixel_format:?}",
            size.width,
            size.height
        );

        Ok(target)
    }

    /// Discards the canvas contents and commits pending commands.
    ///
    /// Pending strokes still land on the previous texture, which is released
    /// once the GPU finishes with it.
    pub fn clear(&mut self) {
        self.replace_texture();
        self.commit_commands();
    }

    /// Sets the view scale and re-uploads the scrolling transform.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.update_transform_buffer();
    }

    /// Sets the zoom. Takes effect at the next [`update_buffer`](Self::update_buffer).
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    /// Sets the content offset and re-uploads the scrolling transform.
    pub fn set_content_offset(&mut self, offset: Vec2) {
        self.content_offset = offset;
        self.update_transform_buffer();
    }

    /// Sets physical pixels per logical pixel and re-uploads the scrolling transform.
    pub fn set_native_scale(&mut self, native_scale: f32) {
        if native_scale <= 0.0 || !native_scale.is_finite() {
            log::warn!("{}: ignoring native scale {native_scale}", self.label);
            return;
        }
        self.native_scale = native_scale;
        self.update_transform_buffer();
    }

    /// Records a new drawable size and recomputes both uniforms.
    ///
    /// The texture keeps its old size until the next [`clear`](Self::clear).
    pub fn update_buffer(&mut self, size: DrawableSize) {
        self.drawable_size = size;

        let uniform = ScaleUniform::new(size, self.zoom, self.scale);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        self.update_transform_buffer();
    }

    /// Uploads the current content offset and scale.
    pub fn update_transform_buffer(&mut self) {
        let transform = ScrollingTransform::new(self.content_offset, self.native_scale, self.scale);
        self.queue
            .write_buffer(&self.transform_buffer, 0, bytemuck::bytes_of(&transform));
    }

    /// Ensures a command encoder is pending.
    pub fn prepare_for_draw(&mut self) {
        if self.encoder.is_none() {
            self.encoder = Some(self.device.create_command_encoder(
                &wgpu::CommandEncoderDescriptor {
                    label: Some("sketch target encoder"),
                },
            ));
        }
    }

    /// Opens a render pass that loads and stores the canvas.
    ///
    /// Returns `None` without a pending encoder (see
    /// [`prepare_for_draw`](Self::prepare_for_draw)) or without a texture.
    pub fn make_command_encoder(&mut self) -> Option<wgpu::RenderPass<'_>> {
        self.begin_pass().map(|p| p.pass)
    }

    /// Like [`make_command_encoder`](Self::make_command_encoder), also lending
    /// the bind group that carries both uniforms.
    pub fn begin_pass(&mut self) -> Option<TargetPass<'_>> {
        let view = self.view.as_ref()?;
        let encoder = self.encoder.as_mut()?;

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sketch target pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        Some(TargetPass {
            pass,
            bind_group: &self.bind_group,
        })
    }

    /// Submits pending commands and forgets the encoder. No-op when nothing is pending.
    pub fn commit_commands(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    /// Allocates an empty canvas texture for the current drawable size.
    ///
    /// Failures are logged and yield `None`.
    pub fn make_empty_texture(&self) -> Option<(wgpu::Texture, wgpu::TextureView)> {
        match create_empty_texture(
            &self.device,
            &self.queue,
            self.drawable_size,
            self.pixel_format,
            self.clear_color,
            self.label,
        ) {
            Ok(pair) => Some(pair),
            Err(err) => {
                log::warn!("{}: cannot allocate canvas texture: {err}", self.label);
                None
            }
        }
    }

    fn replace_texture(&mut self) {
        let (texture, view) = self.make_empty_texture().unzip();
        self.texture = texture;
        self.view = view;
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.texture.as_ref()
    }

    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn content_offset(&self) -> Vec2 {
        self.content_offset
    }

    pub fn native_scale(&self) -> f32 {
        self.native_scale
    }

    pub fn pixel_format(&self) -> wgpu::TextureFormat {
        self.pixel_format
    }

    pub fn drawable_size(&self) -> DrawableSize {
        self.drawable_size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Scale matrix buffer (binding 0).
    pub fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniform_buffer
    }

    /// Scrolling transform buffer (binding 1).
    pub fn transform_buffer(&self) -> &wgpu::Buffer {
        &self.transform_buffer
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn has_pending_commands(&self) -> bool {
        self.encoder.is_some()
    }
}

fn uniform_entry(
    binding: u32,
    min_binding_size: Option<wgpu::BufferSize>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::GpuInit;

    // GPU-backed; returns None on machines without any adapter.
    fn gpu() -> Option<Gpu> {
        Gpu::new_blocking(GpuInit::default()).ok()
    }

    /// Copies `buffer` through a mappable staging buffer. Flushes pending queue writes.
    fn read_back(t: &RenderTarget, buffer: &wgpu::Buffer) -> Vec<u8> {
        let device = t.device();
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("test readback"),
            size: buffer.size(),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("test readback encoder"),
        });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, buffer.size());
        t.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        staging.slice(..).map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .expect("device poll");
        rx.recv().expect("map callback").expect("map readback buffer");

        let bytes = staging.slice(..).get_mapped_range().to_vec();
        staging.unmap();
        bytes
    }

    fn uploaded_transform(t: &RenderTarget) -> ScrollingTransform {
        bytemuck::pod_read_unaligned(&read_back(t, t.transform_buffer()))
    }

    fn uploaded_matrix(t: &RenderTarget) -> ScaleUniform {
        bytemuck::pod_read_unaligned(&read_back(t, t.uniform_buffer()))
    }

    fn target(gpu: &Gpu, w: f32, h: f32) -> RenderTarget {
        RenderTarget::new(gpu, DrawableSize::new(w, h), TargetConfig::default())
            .expect("target creation")
    }

    #[test]
    fn new_target_has_texture_and_no_pending_commands() {
        let Some(gpu) = gpu() else { return };
        let t = target(&gpu, 64.0, 32.0);

        let tex = t.texture().expect("texture");
        assert_eq!((tex.width(), tex.height()), (64, 32));
        assert_eq!(tex.format(), wgpu::TextureFormat::Bgra8Unorm);
        assert!(!t.has_pending_commands());
        assert_eq!(t.scale(), 1.0);
        assert_eq!(t.zoom(), 1.0);
    }

    #[test]
    fn empty_drawable_has_no_texture_and_refuses_passes() {
        let Some(gpu) = gpu() else { return };
        let mut t = target(&gpu, 0.0, 32.0);

        assert!(t.texture().is_none());
        t.prepare_for_draw();
        assert!(t.make_command_encoder().is_none());
        t.commit_commands();
        assert!(!t.has_pending_commands());
    }

    #[test]
    fn oversized_drawable_has_no_texture() {
        let Some(gpu) = gpu() else { return };
        let too_big = (gpu.max_texture_dimension_2d() + 1) as f32;
        let t = target(&gpu, too_big, 8.0);
        assert!(t.texture().is_none());
    }

    #[test]
    fn encoder_lifecycle() {
        let Some(gpu) = gpu() else { return };
        let mut t = target(&gpu, 16.0, 16.0);

        assert!(t.make_command_encoder().is_none());

        t.prepare_for_draw();
        t.prepare_for_draw();
        assert!(t.has_pending_commands());

        {
            let pass = t.make_command_encoder();
            assert!(pass.is_some());
        }

        t.commit_commands();
        assert!(!t.has_pending_commands());

        // Committing twice is harmless.
        t.commit_commands();
    }

    #[test]
    fn clear_swaps_texture_and_commits() {
        let Some(gpu) = gpu() else { return };
        let mut t = target(&gpu, 16.0, 16.0);
        let before = t.texture().cloned().expect("texture");
        let before_view = t.view().cloned().expect("view");

        t.prepare_for_draw();
        t.clear();

        let after = t.texture().expect("texture");
        assert_ne!(&before, after);
        assert_ne!(&before_view, t.view().expect("view"));
        assert!(!t.has_pending_commands());

        // The pass now targets the replacement view.
        t.prepare_for_draw();
        assert!(t.make_command_encoder().is_some());
        t.commit_commands();
    }

    #[test]
    fn clear_picks_up_new_drawable_size() {
        let Some(gpu) = gpu() else { return };
        let mut t = target(&gpu, 16.0, 16.0);

        t.update_buffer(DrawableSize::new(40.0, 20.0));
        assert_eq!(t.texture().map(|x| x.width()), Some(16));

        t.clear();
        assert_eq!(t.texture().map(|x| (x.width(), x.height())), Some((40, 20)));
    }

    #[test]
    fn setters_store_values() {
        let Some(gpu) = gpu() else { return };
        let mut t = target(&gpu, 16.0, 16.0);

        t.set_scale(2.0);
        t.set_zoom(3.0);
        t.set_content_offset(Vec2::new(5.0, 6.0));
        t.set_native_scale(-1.0);

        assert_eq!(t.scale(), 2.0);
        assert_eq!(t.zoom(), 3.0);
        assert_eq!(t.content_offset(), Vec2::new(5.0, 6.0));
        assert_eq!(t.native_scale(), 1.0);
    }

    #[test]
    fn rejects_non_positive_or_infinite_native_scale() {
        let Some(gpu) = gpu() else { return };
        for native_scale in [0.0, -2.0, f32::INFINITY, f32::NAN] {
            let config = TargetConfig {
                native_scale,
                ..Default::default()
            };
            assert!(
                RenderTarget::new(&gpu, DrawableSize::new(8.0, 8.0), config).is_err(),
                "{native_scale}"
            );
        }
    }

    #[test]
    fn unrenderable_format_has_no_texture() {
        let Some(gpu) = gpu() else { return };
        let config = TargetConfig {
            pixel_format: wgpu::TextureFormat::Rgb9e5Ufloat,
            ..Default::default()
        };
        let mut t = RenderTarget::new(&gpu, DrawableSize::new(16.0, 16.0), config)
            .expect("target creation");

        assert!(t.texture().is_none());
        assert!(t.view().is_none());

        t.prepare_for_draw();
        assert!(t.make_command_encoder().is_none());
        t.clear();
        assert!(t.texture().is_none());
        assert!(!t.has_pending_commands());
    }

    #[test]
    fn new_target_uploads_initial_uniforms() {
        let Some(gpu) = gpu() else { return };
        let size = DrawableSize::new(64.0, 32.0);
        let config = TargetConfig {
            scale: 2.0,
            zoom: 3.0,
            content_offset: Vec2::new(4.0, -1.0),
            native_scale: 2.0,
            ..Default::default()
        };
        let t = RenderTarget::new(&gpu, size, config).expect("target creation");

        assert_eq!(uploaded_matrix(&t), ScaleUniform::new(size, 3.0, 2.0));
        assert_eq!(
            uploaded_transform(&t),
            ScrollingTransform::new(Vec2::new(4.0, -1.0), 2.0, 2.0)
        );
    }

    #[test]
    fn transform_buffer_follows_scale_and_offset() {
        let Some(gpu) = gpu() else { return };
        let size = DrawableSize::new(32.0, 32.0);
        let mut t = target(&gpu, size.width, size.height);
        let initial_matrix = uploaded_matrix(&t);

        t.set_scale(2.0);
        assert_eq!(uploaded_transform(&t).scale, 2.0);
        // Scale alone does not rebuild the matrix.
        assert_eq!(uploaded_matrix(&t), initial_matrix);

        t.set_content_offset(Vec2::new(5.0, 6.0));
        assert_eq!(uploaded_transform(&t).offset, [5.0, 6.0]);

        t.set_native_scale(3.0);
        assert_eq!(uploaded_transform(&t).offset, [15.0, 18.0]);

        t.set_native_scale(0.0);
        assert_eq!(uploaded_transform(&t).offset, [15.0, 18.0]);

        t.update_buffer(size);
        assert_eq!(
            uploaded_transform(&t),
            ScrollingTransform::new(Vec2::new(5.0, 6.0), 3.0, 2.0)
        );
        assert_eq!(uploaded_matrix(&t), ScaleUniform::new(size, 1.0, 2.0));
    }

    #[test]
    fn zoom_reaches_matrix_only_on_update_buffer() {
        let Some(gpu) = gpu() else { return };
        let size = DrawableSize::new(40.0, 20.0);
        let mut t = target(&gpu, size.width, size.height);
        let initial_matrix = uploaded_matrix(&t);

        t.set_zoom(2.0);
        assert_eq!(uploaded_matrix(&t), initial_matrix);

        t.update_buffer(size);
        assert_eq!(uploaded_matrix(&t), ScaleUniform::new(size, 2.0, 1.0));
        assert_ne!(uploaded_matrix(&t), initial_matrix);
    }
}
