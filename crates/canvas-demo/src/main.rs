// File: crates/canvas-demo/src/main.rs
// Summary: Headless demo: deferred mount while the engine loads, a continuous loop driven frame by frame,
// scripted pointer input, then the final frame written to PNG.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use canvas_core::{
    Bounds, EngineHandle, FrameScheduler, InteractiveSurface, ManualScheduler, PointerKind, PointerSpace,
    RawPointerEvent, SurfaceManager, SurfaceOptions,
};
use canvas_demo::{draw, Scene};
use canvas_render_skia::{EngineOptions, SkiaEngine, SkiaTarget};
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Args: [output.png] [frames] [dpr]
    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/canvas-demo.png"));
    let frames: usize = match std::env::args().nth(2) {
        Some(s) => s.parse().with_context(|| format!("frames must be a number, got {s:?}"))?,
        None => 120,
    };
    let dpr: f32 = match std::env::args().nth(3) {
        Some(s) => s.parse().with_context(|| format!("dpr must be a number, got {s:?}"))?,
        None => 2.0,
    };

    let options = EngineOptions::from_env()?;
    let engine: EngineHandle<SkiaEngine> = EngineHandle::new();
    let ticket = engine.request(|r| {
        if let Ok(e) = r {
            info!("engine ready; default family {}", e.options().default_family);
        }
    });

    let sched = Rc::new(ManualScheduler::new());
    let opts = SurfaceOptions { continuous: true, ..SurfaceOptions::default() };
    let manager = SurfaceManager::new(
        SkiaTarget::raster(),
        engine.clone(),
        sched.clone() as Rc<dyn FrameScheduler>,
        Scene::new("canvas-demo"),
        draw,
        opts,
    )
    .with_dpr_source(move || dpr);
    let mut surface = InteractiveSurface::new(manager.clone(), Bounds::from_ltwh(0.0, 0.0, opts.width, opts.height));

    // Mount before the engine exists; it binds as soon as the load completes.
    if let Err(e) = manager.mount() {
        info!("mount deferred: {e}");
    }
    if let Some(ticket) = ticket {
        ticket.complete(SkiaEngine::load(options));
    }
    if let Some(err) = engine.error() {
        anyhow::bail!("engine failed to load: {err}");
    }
    info!("bound {:?} surface, {}x{} physical", manager.backend(), manager.physical_size().width, manager.physical_size().height);

    // Sweep a pointer across the plot, press halfway.
    for i in 0..frames {
        let x = 80.0 + (opts.width - 120.0) * i as f32 / frames.max(1) as f32;
        let y = opts.height / 2.0 + (i as f32 * 0.1).sin() * 120.0;
        let kind = if i == frames / 2 { PointerKind::Down } else { PointerKind::Move };
        surface.handle(RawPointerEvent::new(1, kind, x, y, PointerSpace::Client));
        sched.run_frame();
    }
    manager.stop_loop();
    info!("ran {} frames, {} paints", sched.frames_run(), manager.paint_count());

    manager
        .with_surface(|s| s.write_png(&out))
        .context("no live surface to snapshot")??;
    println!("Wrote {}", out.display());

    manager.teardown();
    Ok(())
}
