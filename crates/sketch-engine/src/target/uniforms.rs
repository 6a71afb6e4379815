//! CPU-side layouts of the two uniforms a target exposes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::coords::{DrawableSize, Vec2};

/// Pixel-to-clip matrix, column-major (binding 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ScaleUniform {
    pub matrix: [[f32; 4]; 4],
}

impl ScaleUniform {
    pub fn new(size: DrawableSize, zoom: f32, scale: f32) -> Self {
        Self {
            matrix: scale_matrix(size, zoom, scale).to_cols_array_2d(),
        }
    }
}

/// Per-view scroll offset and scale (binding 1).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ScrollingTransform {
    pub offset: [f32; 2],
    pub scale: f32,
    pub _pad: f32, // 16-byte alignment
}

impl ScrollingTransform {
    /// `content_offset` is in logical pixels; it is uploaded in physical pixels.
    pub fn new(content_offset: Vec2, native_scale: f32, scale: f32) -> Self {
        Self {
            offset: (content_offset * native_scale).to_array(),
            scale,
            _pad: 0.0,
        }
    }
}

/// Builds the matrix that maps drawable pixels (top-left origin, +Y down)
/// into clip space, stretched by `zoom / scale`.
///
/// With `zoom == scale`, pixel (0, 0) lands on (-1, 1) and
/// (width, height) on (1, -1).
pub fn scale_matrix(size: DrawableSize, zoom: f32, scale: f32) -> Mat4 {
    let scale = if scale.abs() < f32::EPSILON { f32::EPSILON } else { scale };
    let zoom_uniform = 2.0 * zoom / scale;

    // NaN.max(1.0) is 1.0, so degenerate sizes still give a finite matrix.
    let width = size.width.max(1.0);
    let height = size.height.max(1.0);

    Mat4::from_cols(
        Vec4::new(zoom_uniform / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -zoom_uniform / height, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(-1.0, 1.0, 0.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_projects(m: Mat4, from: (f32, f32), to: (f32, f32)) {
        let p = m * Vec4::new(from.0, from.1, 0.0, 1.0);
        let (x, y) = (p.x / p.w, p.y / p.w);
        assert!(
            (x - to.0).abs() < 1e-5 && (y - to.1).abs() < 1e-5,
            "{from:?} projected to ({x}, {y}), expected {to:?}"
        );
    }

    #[test]
    fn identity_zoom_maps_corners_to_clip_corners() {
        let m = scale_matrix(DrawableSize::new(200.0, 100.0), 1.0, 1.0);
        assert_projects(m, (0.0, 0.0), (-1.0, 1.0));
        assert_projects(m, (200.0, 100.0), (1.0, -1.0));
        assert_projects(m, (100.0, 50.0), (0.0, 0.0));
    }

    #[test]
    fn zoom_two_doubles_extent() {
        let m = scale_matrix(DrawableSize::new(200.0, 100.0), 2.0, 1.0);
        // Half the drawable now reaches the far clip edge.
        assert_projects(m, (100.0, 50.0), (1.0, -1.0));
    }

    #[test]
    fn scale_two_halves_extent() {
        let m = scale_matrix(DrawableSize::new(200.0, 100.0), 1.0, 2.0);
        assert_projects(m, (200.0, 100.0), (0.0, 0.0));
    }

    #[test]
    fn degenerate_inputs_stay_finite() {
        let m = scale_matrix(DrawableSize::new(0.0, -5.0), 1.0, 0.0);
        assert!(m.is_finite());
    }

    #[test]
    fn uniform_layouts_match_shader_sizes() {
        assert_eq!(std::mem::size_of::<ScaleUniform>(), 64);
        assert_eq!(std::mem::size_of::<ScrollingTransform>(), 16);
    }

    #[test]
    fn transform_offset_is_in_physical_pixels() {
        let t = ScrollingTransform::new(Vec2::new(10.0, -4.0), 3.0, 1.5);
        assert_eq!(t.offset, [30.0, -12.0]);
        assert_eq!(t.scale, 1.5);
    }

    #[test]
    fn scale_uniform_is_column_major() {
        let u = ScaleUniform::new(DrawableSize::new(100.0, 100.0), 1.0, 1.0);
        // Translation lives in the last column.
        assert_eq!(u.matrix[3], [-1.0, 1.0, 0.0, 1.0]);
        assert_eq!(u.matrix[0][0], 0.02);
        assert_eq!(u.matrix[1][1], -0.02);
    }
}
