//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - handing out cheap clones of the device and queue to render targets

mod gpu;
mod init;

pub use gpu::Gpu;
pub use init::GpuInit;
