// File: crates/window-demo/src/gpu_gl_demo.rs
// Summary: Feature-gated GL setup (glutin + skia-safe GL interface) producing a hardware target for the demo window.

use std::ffi::CString;
use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use canvas_render_skia::{GlTarget, SkiaTarget};
use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use crate::app::ResizeHook;

pub fn build(event_loop: &EventLoop<()>) -> Result<(Rc<Window>, SkiaTarget, ResizeHook)> {
    let wb = WindowBuilder::new()
        .with_title("Constellation Canvas - GPU (GL)")
        .with_inner_size(LogicalSize::new(1024.0, 640.0));
    let (maybe_window, gl_config) = glutin_winit::DisplayBuilder::new()
        .with_window_builder(Some(wb))
        .build(event_loop, ConfigTemplateBuilder::new(), |configs| {
            // Prefer multisampling when offered.
            configs
                .reduce(|a, b| if b.num_samples() > a.num_samples() { b } else { a })
                .expect("glutin offers at least one config")
        })
        .map_err(|e| anyhow!("GL display: {e}"))?;
    let window = maybe_window.ok_or_else(|| anyhow!("failed to create winit window"))?;

    let raw_handle = window.raw_window_handle();
    let gl_display = gl_config.display();

    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .build(Some(raw_handle));
    let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
        .map_err(|e| anyhow!("create_context: {e}"))?;

    let size = window.inner_size();
    let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_handle,
        NonZeroU32::new(size.width).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(size.height).unwrap_or(NonZeroU32::MIN),
    );
    let gl_surface: Surface<WindowSurface> = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
        .map_err(|e| anyhow!("create_window_surface: {e}"))?;
    let gl_context = not_current.make_current(&gl_surface).map_err(|e| anyhow!("make_current: {e}"))?;

    // Load GL and create Skia interface
    let interface = skia_safe::gpu::gl::Interface::new_load_with(|s| {
        CString::new(s).map(|name| gl_display.get_proc_address(&name)).unwrap_or(std::ptr::null()) as _
    })
    .ok_or_else(|| anyhow!("Skia GL interface creation failed"))?;
    let direct = skia_safe::gpu::direct_contexts::make_gl(interface, None)
        .ok_or_else(|| anyhow!("Skia DirectContext creation failed"))?;

    let gl_surface = Rc::new(gl_surface);
    let gl_context = Rc::new(gl_context);
    let (s, c) = (gl_surface.clone(), gl_context.clone());
    // Framebuffer 0 is the window's default framebuffer.
    let target = GlTarget::new(direct, 0).with_presenter(move || s.swap_buffers(&c).map_err(|e| e.to_string()));

    let on_resize: ResizeHook = Box::new(move |size| {
        if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            gl_surface.resize(&gl_context, w, h);
        }
    });
    Ok((Rc::new(window), SkiaTarget::Gl(target), on_resize))
}
