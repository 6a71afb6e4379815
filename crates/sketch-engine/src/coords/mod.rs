//! Coordinate and color types shared by the target and renderers.
//!
//! Canonical CPU space:
//! - Logical pixels for content offsets, physical pixels for drawable size
//! - Origin top-left
//! - +X right, +Y down

mod color;
mod size;
mod vec2;

pub use color::ColorRgba;
pub use size::DrawableSize;
pub use vec2::Vec2;
