use thiserror::Error;

/// Reasons a target cannot allocate its canvas texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    /// One side truncates to zero texels.
    #[error("drawable size {width}x{height} has no texels")]
    EmptyDrawable { width: u32, height: u32 },

    /// One side exceeds the device's 2D texture limit.
    #[error("drawable size {width}x{height} exceeds device limit {max}")]
    ExceedsDeviceLimit { width: u32, height: u32, max: u32 },

    /// The device cannot both render to and sample this format.
    #[error("format {format:?} cannot be rendered to and sampled on this device")]
    UnsupportedFormat { format: wgpu::TextureFormat },
}
