//! Sketch engine crate.
//!
//! This crate owns the offscreen paint target used by the drawing layer:
//! one texture, the two transform uniforms that brushes read, and the
//! command encoder for the pass that paints into it.

pub mod device;
pub mod logging;
pub mod coords;
pub mod target;
pub mod render;
