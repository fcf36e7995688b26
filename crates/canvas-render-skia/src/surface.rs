// File: crates/canvas-render-skia/src/surface.rs
// Summary: Output targets (CPU frame buffer, GL framebuffer) and the Skia-backed render surface.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use canvas_core::{EngineError, PhysicalSize, RenderSurface};
use log::debug;
use skia_safe as skia;

#[cfg(feature = "gpu-gl")]
use crate::gl::GlTarget;

/// RGBA8 pixels (unpremultiplied, row-major, no padding).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Pixels {
    /// RGBA of one pixel, `None` when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

type Presenter = Rc<dyn Fn(&Pixels)>;

/// CPU-side output target. Each flush copies the surface's pixels here and then calls the
/// presenter, if one is set.
#[derive(Clone, Default)]
pub struct FrameBuffer {
    pixels: Rc<RefCell<Pixels>>,
    presenter: Option<Presenter>,
    presents: Rc<Cell<u64>>,
}

impl FrameBuffer {
    pub fn new() -> Self { Self::default() }

    /// Run `present` after every flush, e.g. to blit into a window.
    pub fn with_presenter(mut self, present: impl Fn(&Pixels) + 'static) -> Self {
        self.presenter = Some(Rc::new(present));
        self
    }

    pub fn pixels(&self) -> Ref<'_, Pixels> { self.pixels.borrow() }

    pub fn size(&self) -> (u32, u32) {
        let p = self.pixels.borrow();
        (p.width, p.height)
    }

    /// Number of completed flushes.
    pub fn presents(&self) -> u64 { self.presents.get() }

    fn copy_from(&self, surface: &mut skia::Surface, size: PhysicalSize) -> Result<(), EngineError> {
        let (w, h) = (size.width.max(1) as u32, size.height.max(1) as u32);
        let info = skia::ImageInfo::new(
            (w as i32, h as i32),
            skia::ColorType::RGBA8888,
            skia::AlphaType::Unpremul,
            None,
        );
        let row_bytes = w as usize * 4;
        {
            let mut px = self.pixels.borrow_mut();
            px.rgba.resize(row_bytes * h as usize, 0);
            if !surface.read_pixels(&info, &mut px.rgba, row_bytes, (0, 0)) {
                return Err(EngineError::Backend("read_pixels failed".to_string()));
            }
            px.width = w;
            px.height = h;
        }
        self.presents.set(self.presents.get() + 1);
        if let Some(present) = &self.presenter {
            present(&self.pixels.borrow());
        }
        Ok(())
    }
}

/// Where a surface's pixels end up.
#[derive(Clone)]
pub enum SkiaTarget {
    /// Software only; no hardware path.
    Raster(FrameBuffer),
    #[cfg(feature = "gpu-gl")]
    Gl(GlTarget),
}

impl SkiaTarget {
    pub fn raster() -> Self { SkiaTarget::Raster(FrameBuffer::new()) }

    /// The CPU buffer a software surface for this target writes into.
    pub fn frame_buffer(&self) -> Option<&FrameBuffer> {
        match self {
            SkiaTarget::Raster(fb) => Some(fb),
            #[cfg(feature = "gpu-gl")]
            SkiaTarget::Gl(gl) => gl.fallback(),
        }
    }
}

enum Output {
    Raster(FrameBuffer),
    #[cfg(feature = "gpu-gl")]
    Gl { target: GlTarget, budget: Rc<Cell<usize>> },
}

/// A Skia surface bound to one target.
pub struct SkiaSurface {
    surface: skia::Surface,
    size: PhysicalSize,
    output: Output,
}

impl SkiaSurface {
    pub(crate) fn raster(size: PhysicalSize, buffer: FrameBuffer) -> Option<Self> {
        let surface = skia::surfaces::raster_n32_premul((size.width, size.height))?;
        debug!("raster surface {}x{}", size.width, size.height);
        Some(Self { surface, size, output: Output::Raster(buffer) })
    }

    #[cfg(feature = "gpu-gl")]
    pub(crate) fn gl(surface: skia::Surface, size: PhysicalSize, target: GlTarget, budget: Rc<Cell<usize>>) -> Self {
        budget.set(budget.get() + 1);
        Self { surface, size, output: Output::Gl { target, budget } }
    }

    pub fn size(&self) -> PhysicalSize { self.size }

    fn check_context(&self) -> Result<(), EngineError> {
        match &self.output {
            Output::Raster(_) => Ok(()),
            #[cfg(feature = "gpu-gl")]
            Output::Gl { target, .. } if target.is_abandoned() => Err(EngineError::ContextLost),
            #[cfg(feature = "gpu-gl")]
            Output::Gl { .. } => Ok(()),
        }
    }

    pub fn is_hardware(&self) -> bool { !matches!(self.output, Output::Raster(_)) }

    /// Current contents encoded as PNG.
    pub fn encode_png(&mut self) -> Result<Vec<u8>> {
        let image = self.surface.image_snapshot();
        #[allow(deprecated)]
        let data = image
            .encode_to_data(skia::EncodedImageFormat::PNG)
            .ok_or_else(|| anyhow!("encode PNG failed"))?;
        Ok(data.as_bytes().to_vec())
    }

    pub fn write_png(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.encode_png()?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl RenderSurface for SkiaSurface {
    type Canvas = skia::Canvas;

    fn canvas(&mut self) -> Result<&skia::Canvas, EngineError> {
        self.check_context()?;
        Ok(self.surface.canvas())
    }

    fn flush(&mut self) -> Result<(), EngineError> {
        match &self.output {
            Output::Raster(buffer) => buffer.copy_from(&mut self.surface, self.size),
            #[cfg(feature = "gpu-gl")]
            Output::Gl { target, .. } => target.flush_and_present(),
        }
    }

    fn release(&mut self) -> Result<(), EngineError> {
        match &self.output {
            Output::Raster(_) => Ok(()),
            #[cfg(feature = "gpu-gl")]
            Output::Gl { target, budget } => {
                budget.set(budget.get().saturating_sub(1));
                debug!("GL surface released; {} hardware surface(s) live", budget.get());
                if target.is_abandoned() {
                    return Err(EngineError::ContextLost);
                }
                Ok(())
            }
        }
    }
}
