// File: crates/window-demo/src/app.rs
// Summary: Winit event loop driving one interactive surface: frames on redraw, pointer bridging, resize.

use std::rc::Rc;

use anyhow::Result;
use canvas_core::{
    Bounds, EngineHandle, FrameScheduler, FrameToken, InteractiveSurface, ManualScheduler, PointerKind, PointerSpace,
    RawPointerEvent, SurfaceManager, SurfaceOptions,
};
use canvas_demo::{draw, Scene};
use canvas_render_skia::{load_shared, EngineOptions, SkiaEngine, SkiaTarget};
use log::{error, info};
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::Window;

/// Called with the new physical window size before the surface is rebuilt.
pub type ResizeHook = Box<dyn Fn(PhysicalSize<u32>)>;

/// Frame callbacks run on the next `RedrawRequested`; scheduling asks winit for one.
pub struct WinitScheduler {
    queue: ManualScheduler,
    window: Rc<Window>,
}

impl WinitScheduler {
    pub fn new(window: Rc<Window>) -> Self { Self { queue: ManualScheduler::new(), window } }

    pub fn run_frame(&self) -> usize { self.queue.run_frame() }
}

impl FrameScheduler for WinitScheduler {
    fn schedule(&self, callback: Box<dyn FnOnce()>) -> FrameToken {
        let token = self.queue.schedule(callback);
        self.window.request_redraw();
        token
    }

    fn cancel(&self, token: FrameToken) { self.queue.cancel(token) }
}

type Surface = InteractiveSurface<SkiaEngine, Scene>;

pub fn run(event_loop: EventLoop<()>, window: Rc<Window>, target: SkiaTarget, on_resize: Option<ResizeHook>) -> Result<()> {
    let engine = EngineHandle::new();
    load_shared(&engine, EngineOptions::from_env()?)?;

    let sched = Rc::new(WinitScheduler::new(window.clone()));
    let logical: LogicalSize<f32> = window.inner_size().to_logical(window.scale_factor());
    let w = window.clone();
    let manager = SurfaceManager::new(
        target,
        engine,
        sched.clone() as Rc<dyn FrameScheduler>,
        Scene::new("Constellation Canvas"),
        draw,
        SurfaceOptions { width: logical.width, height: logical.height, continuous: true },
    )
    .with_dpr_source(move || w.scale_factor() as f32);
    let mut surface = InteractiveSurface::new(manager.clone(), Bounds::from_ltwh(0.0, 0.0, logical.width, logical.height));
    let backend = manager.mount()?;
    info!("mounted {backend:?} surface at dpr {}", manager.dpr().get());

    let mut cursor: Option<PhysicalPosition<f64>> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;
        match event {
            Event::RedrawRequested(_) => {
                sched.run_frame();
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    manager.teardown();
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    apply_resize(&mut surface, size, window.scale_factor(), false, &on_resize);
                }
                WindowEvent::ScaleFactorChanged { scale_factor, new_inner_size } => {
                    apply_resize(&mut surface, *new_inner_size, scale_factor, true, &on_resize);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = Some(position);
                    surface.handle(pointer(PointerKind::Move, position));
                }
                WindowEvent::CursorLeft { .. } => {
                    let last = cursor.take().unwrap_or(PhysicalPosition::new(-1.0, -1.0));
                    surface.handle(pointer(PointerKind::Leave, last));
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some(p) = cursor {
                        let kind = if state == ElementState::Pressed { PointerKind::Down } else { PointerKind::Up };
                        surface.handle(pointer(kind, p).with_button(button_code(button)));
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    if let Some(p) = cursor {
                        let (dx, dy) = match delta {
                            MouseScrollDelta::LineDelta(x, y) => (x, y),
                            MouseScrollDelta::PixelDelta(d) => (d.x as f32 / 40.0, d.y as f32 / 40.0),
                        };
                        surface.handle(pointer(PointerKind::Wheel, p).with_delta(dx, dy));
                    }
                }
                WindowEvent::KeyboardInput { input, .. } => {
                    if input.state != ElementState::Pressed { return; }
                    match input.virtual_keycode {
                        Some(VirtualKeyCode::Space) => {
                            if manager.is_looping() {
                                manager.stop_loop();
                            } else {
                                manager.start_loop();
                            }
                        }
                        Some(VirtualKeyCode::R) => manager.invalidate(),
                        Some(VirtualKeyCode::Escape) => {
                            manager.teardown();
                            *control_flow = ControlFlow::Exit;
                        }
                        _ => {}
                    }
                }
                _ => {}
            },
            _ => {}
        }
    });
}

fn pointer(kind: PointerKind, p: PhysicalPosition<f64>) -> RawPointerEvent {
    RawPointerEvent::new(1, kind, p.x as f32, p.y as f32, PointerSpace::Physical)
}

fn button_code(button: MouseButton) -> u16 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::Other(n) => n,
    }
}

fn apply_resize(surface: &mut Surface, size: PhysicalSize<u32>, scale: f64, scale_changed: bool, hook: &Option<ResizeHook>) {
    // Minimized
    if size.width == 0 || size.height == 0 {
        return;
    }
    if let Some(hook) = hook {
        hook(size);
    }
    let logical: LogicalSize<f32> = size.to_logical(scale);
    let bounds = Bounds::from_ltwh(0.0, 0.0, logical.width, logical.height);
    let result = if bounds != surface.bounds() {
        surface.set_bounds(bounds)
    } else if scale_changed {
        surface.manager().resize(logical.width, logical.height)
    } else {
        Ok(())
    };
    if let Err(e) = result {
        error!("resize to {}x{} failed: {e}", size.width, size.height);
    }
}
