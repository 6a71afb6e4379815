use crate::coords::{ColorRgba, Vec2};

/// Construction parameters for a [`RenderTarget`](super::RenderTarget).
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Canvas texture format.
    pub pixel_format: wgpu::TextureFormat,

    /// Initial view scale. Scales everything drawn on the canvas.
    pub scale: f32,

    /// Initial zoom. Scales only the target, not the view.
    pub zoom: f32,

    /// Initial content offset, in logical pixels of the zoomed content.
    pub content_offset: Vec2,

    /// Physical pixels per logical pixel on the hosting display.
    ///
    /// The content offset is multiplied by this before upload.
    pub native_scale: f32,

    /// Color a fresh texture is cleared to.
    pub clear_color: ColorRgba,

    /// Debug label prefix for GPU objects.
    pub label: &'static str,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            pixel_format: wgpu::TextureFormat::Bgra8Unorm,
            scale: 1.0,
            zoom: 1.0,
            content_offset: Vec2::zero(),
            native_scale: 1.0,
            clear_color: ColorRgba::transparent(),
            label: "sketch target",
        }
    }
}
