//! GPU rendering into paint targets.
//!
//! Renderers own their pipelines and vertex buffers; the target owns the
//! canvas and the transform uniforms (bind group 0).
//!
//! Convention:
//! - CPU geometry is in canvas pixels (top-left origin, +Y down).
//! - Vertex shaders apply the scrolling transform, then the scale matrix.

mod common;
mod dots;

pub use dots::{Dot, DotRenderer};
