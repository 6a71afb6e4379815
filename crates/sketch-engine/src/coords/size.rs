/// Drawable size in physical pixels.
///
/// Kept as floats because callers derive it from view bounds times the
/// display scale; it is truncated to whole texels only when a texture is
/// allocated.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct DrawableSize {
    pub width: f32,
    pub height: f32,
}

impl DrawableSize {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whole-texel extent, truncated toward zero. Negative or NaN sides map to 0.
    #[inline]
    pub fn texels(self) -> (u32, u32) {
        (truncate(self.width), truncate(self.height))
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        let (w, h) = self.texels();
        w == 0 || h == 0
    }
}

fn truncate(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 { v as u32 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texels_truncate_fractional_sides() {
        assert_eq!(DrawableSize::new(10.9, 3.2).texels(), (10, 3));
    }

    #[test]
    fn negative_and_nan_sides_are_empty() {
        assert_eq!(DrawableSize::new(-4.0, 8.0).texels(), (0, 8));
        assert!(DrawableSize::new(f32::NAN, 8.0).is_empty());
        assert!(DrawableSize::new(0.5, 8.0).is_empty());
    }

    #[test]
    fn positive_size_is_not_empty() {
        assert!(!DrawableSize::new(1.0, 1.0).is_empty());
    }
}
