// File: crates/canvas-render-skia/src/lib.rs
// Summary: Skia engine for canvas-core. Hosts CPU/GPU surfaces, shared typeface/image caches, and text shaping.

pub mod engine;
#[cfg(feature = "gpu-gl")]
pub mod gl;
pub mod options;
pub mod surface;
pub mod text;

pub use engine::SkiaEngine;
#[cfg(feature = "gpu-gl")]
pub use gl::GlTarget;
pub use options::{ConfigError, EngineOptions};
pub use surface::{FrameBuffer, Pixels, SkiaSurface, SkiaTarget};
pub use text::TextShaper;

use canvas_core::{EngineError, EngineHandle};

/// Handle whose engine is loaded from `options` on first request.
///
/// Only the first caller loads; everyone else shares the result.
pub fn load_shared(handle: &EngineHandle<SkiaEngine>, options: EngineOptions) -> Result<std::rc::Rc<SkiaEngine>, EngineError> {
    handle.load_with(|| SkiaEngine::load(options))
}
