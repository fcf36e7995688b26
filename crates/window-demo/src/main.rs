// File: crates/window-demo/src/main.rs
// Summary: Windowed demo; renders the demo scene through canvas-core into a winit window via softbuffer blit (CPU)
// or, with `--gpu` and the `gpu-gl-demo` feature, straight into a GL framebuffer.

mod app;
#[cfg(feature = "gpu-gl-demo")]
mod gpu_gl_demo;

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use canvas_render_skia::{FrameBuffer, Pixels, SkiaTarget};
use log::warn;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let gpu = std::env::args().skip(1).any(|a| a == "--gpu");
    let event_loop = EventLoop::new();

    #[cfg(feature = "gpu-gl-demo")]
    if gpu {
        let (window, target, on_resize) = gpu_gl_demo::build(&event_loop)?;
        return app::run(event_loop, window, target, Some(on_resize));
    }
    #[cfg(not(feature = "gpu-gl-demo"))]
    if gpu {
        warn!("built without the gpu-gl-demo feature; using the CPU path");
    }

    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Constellation Canvas - Window Demo")
            .with_inner_size(winit::dpi::LogicalSize::new(1024.0, 640.0))
            .build(&event_loop)?,
    );
    let target = softbuffer_target(&window)?;
    app::run(event_loop, window, target, None)
}

/// Raster target whose pixels are blitted into the window after every flush.
fn softbuffer_target(window: &Rc<Window>) -> Result<SkiaTarget> {
    let context = unsafe { softbuffer::Context::new(window.as_ref()) }.map_err(|e| anyhow!("softbuffer context: {e}"))?;
    let surface = unsafe { softbuffer::Surface::new(&context, window.as_ref()) }
        .map_err(|e| anyhow!("softbuffer surface: {e}"))?;
    // The context must outlive the surface.
    let window_buffer = RefCell::new((context, surface));
    let buffer = FrameBuffer::new().with_presenter(move |px| {
        if let Err(e) = blit(&mut window_buffer.borrow_mut().1, px) {
            warn!("present error: {e}");
        }
    });
    Ok(SkiaTarget::Raster(buffer))
}

fn blit(surface: &mut softbuffer::Surface, px: &Pixels) -> Result<(), softbuffer::SoftBufferError> {
    let (Some(w), Some(h)) = (NonZeroU32::new(px.width), NonZeroU32::new(px.height)) else { return Ok(()) };
    surface.resize(w, h)?;
    let mut frame = surface.buffer_mut()?;
    for (dst, p) in frame.iter_mut().zip(px.rgba.chunks_exact(4)) {
        // softbuffer wants 0RGB
        *dst = ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32;
    }
    frame.present()
}
