// File: crates/canvas-render-skia/tests/raster.rs
// Purpose: Drive the Skia engine through the lifecycle manager on CPU raster targets.

use std::cell::Cell;
use std::rc::Rc;

use canvas_core::{
    Backend, CanvasState, EngineError, EngineHandle, FrameScheduler, GraphicsEngine, ManualScheduler, PhysicalSize,
    SurfaceManager, SurfaceOptions,
};
use canvas_render_skia::{load_shared, EngineOptions, FrameBuffer, SkiaEngine, SkiaTarget};
use skia_safe as skia;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn half_blue(frame: canvas_core::Frame<'_, SkiaEngine, ()>) -> anyhow::Result<()> {
    frame.canvas.clear(skia::Color::RED);
    let mut paint = skia::Paint::default();
    paint.set_color(skia::Color::BLUE);
    frame.canvas.draw_rect(skia::Rect::from_xywh(0.0, 0.0, frame.width() / 2.0, frame.height()), &paint);
    Ok(())
}

fn manager(buffer: &FrameBuffer, dpr: f32, w: f32, h: f32) -> (SurfaceManager<SkiaEngine>, Rc<ManualScheduler>) {
    let sched = Rc::new(ManualScheduler::new());
    let engine = EngineHandle::ready(SkiaEngine::load(EngineOptions::default()).unwrap());
    let m = SurfaceManager::new(
        SkiaTarget::Raster(buffer.clone()),
        engine,
        sched.clone() as Rc<dyn FrameScheduler>,
        (),
        half_blue,
        SurfaceOptions { width: w, height: h, continuous: false },
    )
    .with_dpr_source(move || dpr);
    (m, sched)
}

#[test]
fn raster_target_falls_back_to_software_and_paints() {
    let buffer = FrameBuffer::new();
    let (m, _sched) = manager(&buffer, 1.0, 20.0, 10.0);
    assert_eq!(m.mount().unwrap(), Backend::Software);
    assert_eq!(m.state(), CanvasState::Ready);

    let px = buffer.pixels();
    assert_eq!((px.width, px.height), (20, 10));
    assert_eq!(px.pixel(0, 0), Some(BLUE));
    assert_eq!(px.pixel(9, 9), Some(BLUE));
    assert_eq!(px.pixel(10, 0), Some(RED));
    assert_eq!(px.pixel(19, 9), Some(RED));
}

#[test]
fn device_pixel_ratio_scales_the_buffer_not_the_drawing() {
    let buffer = FrameBuffer::new();
    let (m, _sched) = manager(&buffer, 2.0, 10.0, 10.0);
    m.mount().unwrap();
    assert_eq!(m.physical_size(), PhysicalSize::new(20, 20));

    let px = buffer.pixels();
    assert_eq!((px.width, px.height), (20, 20));
    assert_eq!(px.pixel(9, 19), Some(BLUE));
    assert_eq!(px.pixel(10, 0), Some(RED));
}

#[test]
fn resize_rebuilds_the_buffer() {
    let buffer = FrameBuffer::new();
    let (m, _sched) = manager(&buffer, 1.0, 10.0, 10.0);
    m.mount().unwrap();
    m.resize(40.0, 8.0).unwrap();
    assert_eq!(buffer.size(), (40, 8));
    assert_eq!(buffer.pixels().pixel(19, 7), Some(BLUE));
    assert_eq!(buffer.pixels().pixel(20, 7), Some(RED));
    assert_eq!(buffer.presents(), 2);
}

#[test]
fn presenter_runs_after_every_flush() {
    let seen = Rc::new(Cell::new(0u32));
    let s = seen.clone();
    let buffer = FrameBuffer::new().with_presenter(move |px| {
        assert_eq!(px.rgba.len(), (px.width * px.height * 4) as usize);
        s.set(s.get() + 1);
    });
    let (m, sched) = manager(&buffer, 1.0, 8.0, 8.0);
    m.mount().unwrap();
    m.start_loop();
    sched.run_frames(3);
    assert_eq!(seen.get(), 4);
}

#[test]
fn snapshot_encodes_a_decodable_png() {
    let buffer = FrameBuffer::new();
    let (m, _sched) = manager(&buffer, 1.0, 16.0, 12.0);
    m.mount().unwrap();
    let png = m.with_surface(|s| s.encode_png()).unwrap().unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (16, 12));
    assert_eq!(img.get_pixel(0, 0).0, BLUE);
    assert_eq!(img.get_pixel(15, 11).0, RED);
}

#[test]
fn missing_asset_directory_fails_the_load() {
    let opts = EngineOptions { asset_dir: Some("does/not/exist".into()), ..EngineOptions::default() };
    let handle = EngineHandle::new();
    let err = load_shared(&handle, opts).err().unwrap();
    assert!(matches!(err, EngineError::Load(_)));
    assert!(handle.error().is_some());
}

#[test]
fn raster_targets_have_no_hardware_path() {
    let engine = SkiaEngine::load(EngineOptions::default()).unwrap();
    let target = SkiaTarget::raster();
    let size = PhysicalSize::new(4, 4);
    assert!(engine.make_hardware_surface(&target, size).unwrap().is_none());
    let surface = engine.make_software_surface(&target, size).unwrap().unwrap();
    assert!(!surface.is_hardware());
    assert_eq!(surface.size(), size);
    assert_eq!(engine.hardware_surfaces(), 0);
}

#[test]
fn decoded_images_are_cached_by_path() {
    let dir = std::env::temp_dir().join(format!("canvas-render-skia-{}", std::process::id()));
    let path = dir.join("swatch.png");
    let buffer = FrameBuffer::new();
    let (m, _sched) = manager(&buffer, 1.0, 6.0, 6.0);
    m.mount().unwrap();
    m.with_surface(|s| s.write_png(&path)).unwrap().unwrap();

    let engine = SkiaEngine::load(EngineOptions::default()).unwrap();
    let a = engine.image(&path).unwrap();
    let b = engine.image(&path).unwrap();
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!((a.width(), a.height()), (6, 6));
    assert!(matches!(engine.image(dir.join("missing.png")), Err(EngineError::Load(_))));
    let _ = std::fs::remove_dir_all(&dir);
}
