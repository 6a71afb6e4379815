use crate::coords::{ColorRgba, DrawableSize};

use super::TargetError;

/// Canvas usage: render attachment plus shader read for compositing.
pub const TEXTURE_USAGE: wgpu::TextureUsages =
    wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

/// Checks that `size` fits a non-empty texture under `max_dimension`.
///
/// Returns the whole-texel extent on success.
pub fn validate_extent(
    size: DrawableSize,
    max_dimension: u32,
) -> Result<(u32, u32), TargetError> {
    let (width, height) = size.texels();

    if width == 0 || height == 0 {
        return Err(TargetError::EmptyDrawable { width, height });
    }
    if width > max_dimension || height > max_dimension {
        return Err(TargetError::ExceedsDeviceLimit {
            width,
            height,
            max: max_dimension,
        });
    }

    Ok((width, height))
}

/// Checks that `format` is a color format the device can use as a canvas.
///
/// Only the usages guaranteed for `device_features` count; adapter-specific
/// extras are not requested by the device.
pub fn validate_format(
    format: wgpu::TextureFormat,
    device_features: wgpu::Features,
) -> Result<(), TargetError> {
    let supported = device_features.contains(format.required_features())
        && format.has_color_aspect()
        && !format.is_depth_stencil_format()
        && format
            .guaranteed_format_features(device_features)
            .allowed_usages
            .contains(TEXTURE_USAGE);

    if supported {
        Ok(())
    } else {
        Err(TargetError::UnsupportedFormat { format })
    }
}

/// Allocates an empty canvas texture and clears it on the GPU.
///
/// The clear is submitted immediately, ahead of any pending stroke commands.
pub(super) fn create_empty_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    size: DrawableSize,
    format: wgpu::TextureFormat,
    clear_color: ColorRgba,
    label: &str,
) -> Result<(wgpu::Texture, wgpu::TextureView), TargetError> {
    let (width, height) = validate_extent(size, device.limits().max_texture_dimension_2d)?;
    validate_format(format, device.features())?;

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: TEXTURE_USAGE,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("sketch texture clear encoder"),
    });
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sketch texture clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
    queue.submit(std::iter::once(encoder.finish()));

    log::debug!("allocated {width}x{height} {format:?} canvas texture");

    Ok((texture, view))
}
