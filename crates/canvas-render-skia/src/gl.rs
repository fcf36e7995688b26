// File: crates/canvas-render-skia/src/gl.rs
// Summary: GL framebuffer target wrapped by Skia's GPU backend (feature `gpu-gl`).

use std::cell::RefCell;
use std::rc::Rc;

use canvas_core::{EngineError, PhysicalSize};
use skia_safe as skia;
use skia::gpu;

use crate::surface::FrameBuffer;

/// A GL framebuffer plus the Skia context that renders into it.
///
/// The host owns the GL context and makes it current; `present` is where it swaps buffers.
#[derive(Clone)]
pub struct GlTarget {
    direct: Rc<RefCell<gpu::DirectContext>>,
    fboid: u32,
    present: Option<Rc<dyn Fn() -> Result<(), String>>>,
    fallback: Option<FrameBuffer>,
}

impl GlTarget {
    pub fn new(direct: gpu::DirectContext, fboid: u32) -> Self {
        Self { direct: Rc::new(RefCell::new(direct)), fboid, present: None, fallback: None }
    }

    /// Called after every flush.
    pub fn with_presenter(mut self, present: impl Fn() -> Result<(), String> + 'static) -> Self {
        self.present = Some(Rc::new(present));
        self
    }

    /// CPU buffer used when no GL surface can be built.
    pub fn with_fallback(mut self, buffer: FrameBuffer) -> Self {
        self.fallback = Some(buffer);
        self
    }

    pub fn fallback(&self) -> Option<&FrameBuffer> { self.fallback.as_ref() }

    pub fn is_abandoned(&self) -> bool {
        self.direct.try_borrow_mut().map(|mut d| d.abandoned()).unwrap_or(false)
    }

    pub(crate) fn make_surface(&self, size: PhysicalSize) -> Result<Option<skia::Surface>, EngineError> {
        let mut direct = self
            .direct
            .try_borrow_mut()
            .map_err(|_| EngineError::Backend("GL context busy".to_string()))?;
        if direct.abandoned() {
            return Err(EngineError::ContextLost);
        }
        let fb_info = gpu::gl::FramebufferInfo {
            fboid: self.fboid,
            format: gpu::gl::Format::RGBA8.into(),
            protected: gpu::Protected::No,
        };
        let backend_rt = gpu::backend_render_targets::make_gl((size.width, size.height), None, 8, fb_info);
        Ok(gpu::surfaces::wrap_backend_render_target(
            &mut direct,
            &backend_rt,
            gpu::SurfaceOrigin::BottomLeft,
            skia::ColorType::RGBA8888,
            None,
            None,
        ))
    }

    pub(crate) fn flush_and_present(&self) -> Result<(), EngineError> {
        {
            let mut direct = self
                .direct
                .try_borrow_mut()
                .map_err(|_| EngineError::Backend("GL context busy".to_string()))?;
            if direct.abandoned() {
                return Err(EngineError::ContextLost);
            }
            direct.flush_and_submit();
        }
        match &self.present {
            Some(present) => present().map_err(EngineError::Backend),
            None => Ok(()),
        }
    }
}
