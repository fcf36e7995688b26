// File: crates/canvas-core/src/engine.rs
// Summary: Engine/surface/canvas traits the lifecycle core drives, plus the owning surface slot.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{debug, warn};

use crate::error::{EngineError, SurfaceError};
use crate::types::PhysicalSize;

/// External graphics engine capable of building surfaces for an output target.
///
/// Both constructors may raise (`Err`) or decline (`Ok(None)`); the manager treats the
/// two the same way when deciding whether to fall back.
pub trait GraphicsEngine {
    type Target;
    type Surface: RenderSurface;

    fn make_hardware_surface(
        &self,
        target: &Self::Target,
        size: PhysicalSize,
    ) -> Result<Option<Self::Surface>, EngineError>;

    fn make_software_surface(
        &self,
        target: &Self::Target,
        size: PhysicalSize,
    ) -> Result<Option<Self::Surface>, EngineError>;
}

/// Engine-side drawable buffer bound to one target.
pub trait RenderSurface {
    type Canvas: CanvasScale;

    fn canvas(&mut self) -> Result<&Self::Canvas, EngineError>;
    /// Make everything drawn since the last flush visible on the target.
    fn flush(&mut self) -> Result<(), EngineError>;
    /// Free engine resources. May fail when the handle was invalidated out-of-band.
    fn release(&mut self) -> Result<(), EngineError>;
}

/// The only drawing calls the core itself issues: a uniform DPR scale around the callback.
pub trait CanvasScale {
    fn save_scaled(&self, scale: f32);
    fn restore(&self);
}

/// Which construction strategy produced the live surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Hardware,
    Software,
}

/// Owns at most one live surface and releases it exactly once.
///
/// Release happens on `release`, on `replace`, and on drop; a failing release is a
/// stale handle and is logged, never propagated.
pub struct SurfaceSlot<S: RenderSurface> {
    live: Option<(S, Backend)>,
}

impl<S: RenderSurface> SurfaceSlot<S> {
    pub fn empty() -> Self { Self { live: None } }

    pub fn is_live(&self) -> bool { self.live.is_some() }

    pub fn backend(&self) -> Option<Backend> { self.live.as_ref().map(|(_, b)| *b) }

    pub fn get_mut(&mut self) -> Option<&mut S> { self.live.as_mut().map(|(s, _)| s) }

    pub fn get(&self) -> Option<&S> { self.live.as_ref().map(|(s, _)| s) }

    /// Install a new surface, releasing the previous one first.
    pub fn replace(&mut self, surface: S, backend: Backend) {
        self.release();
        self.live = Some((surface, backend));
    }

    /// Release the live surface, if any. Returns the swallowed stale-handle error for callers
    /// that want to observe it; the slot is empty afterwards either way.
    pub fn release(&mut self) -> Option<SurfaceError> {
        let (mut surface, backend) = self.live.take()?;
        match contain_on(&mut surface, |s| s.release()) {
            Ok(()) => {
                debug!("released {backend:?} surface");
                None
            }
            Err(e) => {
                warn!("ignoring failure releasing {backend:?} surface: {e}");
                Some(SurfaceError::StaleHandle(e))
            }
        }
    }
}

impl<S: RenderSurface> Default for SurfaceSlot<S> {
    fn default() -> Self { Self::empty() }
}

impl<S: RenderSurface> Drop for SurfaceSlot<S> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Run an engine call, turning a panic into `EngineError::Backend`.
pub(crate) fn contain<R>(op: impl FnOnce() -> Result<R, EngineError>) -> Result<R, EngineError> {
    catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|payload| Err(EngineError::Backend(panic_message(payload.as_ref()))))
}

/// [`contain`] for a call on a surface whose result may borrow from it.
pub(crate) fn contain_on<'s, S, R>(
    surface: &'s mut S,
    op: impl FnOnce(&'s mut S) -> Result<R, EngineError>,
) -> Result<R, EngineError> {
    contain(move || op(surface))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(feature = "skia")]
impl CanvasScale for skia_safe::Canvas {
    fn save_scaled(&self, scale: f32) {
        self.save();
        self.scale((scale, scale));
    }

    fn restore(&self) {
        skia_safe::Canvas::restore(self);
    }
}
