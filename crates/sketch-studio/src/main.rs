mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use sketch_engine::coords::{ColorRgba, DrawableSize, Vec2};
use sketch_engine::device::{Gpu, GpuInit};
use sketch_engine::logging::{init_logging, LoggingConfig};
use sketch_engine::render::{Dot, DotRenderer};
use sketch_engine::target::{RenderTarget, TargetConfig};

use config::StudioConfig;

fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = StudioConfig::load(config_path.as_deref())?;

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..Default::default()
    });

    println!();
    println!("  sketch studio  ·  offscreen paint target");
    println!();

    let gpu = Gpu::new_blocking(GpuInit {
        force_fallback_adapter: config.fallback_adapter,
        ..Default::default()
    })?;

    let size = DrawableSize::new(config.width, config.height);
    let [r, g, b, a] = config.background;
    let mut target = RenderTarget::new(
        &gpu,
        size,
        TargetConfig {
            scale: config.scale,
            native_scale: config.native_scale,
            clear_color: ColorRgba::new(r, g, b, a),
            label: "studio canvas",
            ..Default::default()
        },
    )
    .context("failed to create canvas")?;

    // Zoom is only read when the scale matrix is rebuilt.
    target.set_zoom(config.zoom);
    target.update_buffer(size);
    target.set_content_offset(Vec2::new(config.offset[0], config.offset[1]));

    let dots: Vec<Dot> = config
        .dots
        .iter()
        .map(|d| {
            let [r, g, b, a] = d.color;
            Dot::new(Vec2::new(d.x, d.y), d.radius, ColorRgba::new(r, g, b, a))
        })
        .collect();

    let mut renderer = DotRenderer::new();
    let drawn = renderer.render(&mut target, &dots);
    target.commit_commands();

    match target.texture() {
        Some(tex) => log::info!(
            "painted {drawn}/{} dots on {}x{} {:?} canvas",
            dots.len(),
            tex.width(),
            tex.height(),
            target.pixel_format()
        ),
        None => log::warn!("no canvas texture; nothing painted"),
    }

    target.clear();
    log::info!("canvas cleared");

    Ok(())
}
