//! Offscreen paint target.
//!
//! A [`RenderTarget`] holds the canvas texture, the scale-matrix and
//! scrolling-transform uniforms brushes read, and at most one pending
//! command encoder. Strokes are recorded into a pass that loads and stores
//! the texture, then committed in one submission.

mod config;
mod error;
mod render_target;
mod texture;
mod uniforms;

pub use config::TargetConfig;
pub use error::TargetError;
pub use render_target::{RenderTarget, TargetPass};
pub use texture::{validate_extent, validate_format, TEXTURE_USAGE};
pub use uniforms::{scale_matrix, ScaleUniform, ScrollingTransform};
