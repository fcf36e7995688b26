// File: crates/canvas-core/src/manager.rs
// Summary: Surface lifecycle manager: acquisition with hardware/software fallback, DPR-scaled
// painting, continuous render loop, coalesced redraws, resize and teardown.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use log::{debug, error, warn};

use crate::engine::{contain, contain_on, panic_message, Backend, CanvasScale, GraphicsEngine, RenderSurface, SurfaceSlot};
use crate::error::{PaintFailure, SurfaceError};
use crate::handle::{EngineHandle, EngineStatus};
use crate::interaction::InteractionState;
use crate::scheduler::{FrameScheduler, FrameToken};
use crate::types::{Dpr, LogicalSize, PhysicalSize, HEIGHT, WIDTH};

pub type CanvasOf<E> = <<E as GraphicsEngine>::Surface as RenderSurface>::Canvas;

/// Everything a draw callback sees for one paint. The canvas is already scaled by the
/// device pixel ratio, so all drawing happens in logical units of `size`.
pub struct Frame<'a, E: GraphicsEngine, A> {
    pub canvas: &'a CanvasOf<E>,
    pub engine: &'a E,
    pub size: LogicalSize,
    pub dpr: Dpr,
    pub aux: &'a A,
    /// Pointer snapshot; `None` unless the surface is interactive.
    pub interaction: Option<InteractionState>,
}

impl<E: GraphicsEngine, A> Frame<'_, E, A> {
    pub fn width(&self) -> f32 { self.size.width }
    pub fn height(&self) -> f32 { self.size.height }
}

pub type DrawFn<E, A> = Box<dyn FnMut(Frame<'_, E, A>) -> anyhow::Result<()>>;

#[derive(Clone, Copy, Debug)]
pub struct SurfaceOptions {
    pub width: f32,
    pub height: f32,
    /// Repaint on every display refresh instead of only on demand.
    pub continuous: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self { width: WIDTH, height: HEIGHT, continuous: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasState {
    /// No live surface.
    Unbound,
    /// Surface live, painting on demand.
    Ready,
    /// Surface live, a tick is scheduled.
    Looping,
}

struct Inner<E: GraphicsEngine + 'static, A: 'static> {
    target: E::Target,
    engine: EngineHandle<E>,
    scheduler: Rc<dyn FrameScheduler>,
    dpr_source: Box<dyn Fn() -> Dpr>,
    draw: DrawFn<E, A>,
    aux: A,
    interaction: Option<InteractionState>,
    size: LogicalSize,
    dpr: Dpr,
    slot: SurfaceSlot<E::Surface>,
    continuous: bool,
    looping: bool,
    loop_gen: u64,
    loop_token: Option<FrameToken>,
    redraw_token: Option<FrameToken>,
    mount_pending: bool,
    paints: u64,
}

impl<E: GraphicsEngine + 'static, A: 'static> Inner<E, A> {
    fn state(&self) -> CanvasState {
        match (self.slot.is_live(), self.looping) {
            (false, _) => CanvasState::Unbound,
            (true, true) => CanvasState::Looping,
            (true, false) => CanvasState::Ready,
        }
    }

    fn acquire(&mut self) -> Result<Backend, SurfaceError> {
        let Some(engine) = self.engine.get() else {
            debug!("acquire skipped: engine not ready");
            return Err(SurfaceError::NotReady);
        };
        self.slot.release();
        self.dpr = (self.dpr_source)();
        let physical = self.size.to_physical(self.dpr);
        debug!("acquiring {}x{} surface (dpr {})", physical.width, physical.height, self.dpr.get());

        let hardware = match contain(|| engine.make_hardware_surface(&self.target, physical)) {
            Ok(Some(surface)) => {
                self.slot.replace(surface, Backend::Hardware);
                return Ok(Backend::Hardware);
            }
            Ok(None) => None,
            Err(e) => Some(e),
        };
        match &hardware {
            Some(e) => warn!("hardware surface failed ({e}); falling back to software"),
            None => debug!("no hardware surface; falling back to software"),
        }

        let software = match contain(|| engine.make_software_surface(&self.target, physical)) {
            Ok(Some(surface)) => {
                self.slot.replace(surface, Backend::Software);
                return Ok(Backend::Software);
            }
            Ok(None) => None,
            Err(e) => Some(e),
        };

        let err = SurfaceError::Acquisition { hardware, software };
        error!("{err}");
        self.stop_loop();
        Err(err)
    }

    fn paint(&mut self) -> Result<(), SurfaceError> {
        let Some(engine) = self.engine.get() else { return Ok(()) };
        let Some(surface) = self.slot.get_mut() else { return Ok(()) };
        let result = paint_surface::<E, A>(
            surface,
            &*engine,
            &mut self.draw,
            &self.aux,
            self.interaction,
            self.size,
            self.dpr,
        );
        match result {
            Ok(()) => {
                self.paints += 1;
                Ok(())
            }
            Err(failure) => {
                // A failed loop tick ends the loop and its surface; an on-demand paint keeps a
                // surface the engine still considers valid.
                let surface_lost = matches!(failure, PaintFailure::Canvas(_) | PaintFailure::Flush(_));
                if self.looping || surface_lost {
                    warn!("paint failed, unbinding surface: {failure}");
                    self.stop_loop();
                    self.cancel_redraw();
                    self.slot.release();
                } else {
                    warn!("paint failed, keeping surface: {failure}");
                }
                Err(failure.into())
            }
        }
    }

    /// Cancel the outstanding tick and invalidate any tick already running.
    fn stop_loop(&mut self) {
        if let Some(token) = self.loop_token.take() {
            self.scheduler.cancel(token);
        }
        self.looping = false;
        self.loop_gen += 1;
    }

    fn cancel_redraw(&mut self) {
        if let Some(token) = self.redraw_token.take() {
            self.scheduler.cancel(token);
        }
    }
}

impl<E: GraphicsEngine + 'static, A: 'static> Drop for Inner<E, A> {
    fn drop(&mut self) {
        self.stop_loop();
        self.cancel_redraw();
    }
}

/// Binds one output target to a live engine surface and drives its painting.
///
/// Cheap to clone; clones share the same binding. All methods run on the UI thread.
/// The draw callback must not call back into the manager.
pub struct SurfaceManager<E: GraphicsEngine + 'static, A: 'static = ()> {
    inner: Rc<RefCell<Inner<E, A>>>,
}

impl<E: GraphicsEngine + 'static, A: 'static> Clone for SurfaceManager<E, A> {
    fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<E: GraphicsEngine + 'static, A: 'static> SurfaceManager<E, A> {
    pub fn new(
        target: E::Target,
        engine: EngineHandle<E>,
        scheduler: Rc<dyn FrameScheduler>,
        aux: A,
        draw: impl FnMut(Frame<'_, E, A>) -> anyhow::Result<()> + 'static,
        opts: SurfaceOptions,
    ) -> Self {
        let inner = Inner {
            target,
            engine,
            scheduler,
            dpr_source: Box::new(|| Dpr::ONE),
            draw: Box::new(draw),
            aux,
            interaction: None,
            size: LogicalSize::new(opts.width, opts.height),
            dpr: Dpr::ONE,
            slot: SurfaceSlot::empty(),
            continuous: opts.continuous,
            looping: false,
            loop_gen: 0,
            loop_token: None,
            redraw_token: None,
            mount_pending: false,
            paints: 0,
        };
        Self { inner: Rc::new(RefCell::new(inner)) }
    }

    /// Where the device pixel ratio is read from on every acquisition.
    pub fn with_dpr_source(self, source: impl Fn() -> f32 + 'static) -> Self {
        self.inner.borrow_mut().dpr_source = Box::new(move || Dpr::new(source()));
        self
    }

    pub fn state(&self) -> CanvasState { self.inner.borrow().state() }
    pub fn backend(&self) -> Option<Backend> { self.inner.borrow().slot.backend() }
    pub fn is_looping(&self) -> bool { self.inner.borrow().looping }
    pub fn logical_size(&self) -> LogicalSize { self.inner.borrow().size }
    /// Ratio read at the last acquisition.
    pub fn dpr(&self) -> Dpr { self.inner.borrow().dpr }
    pub fn physical_size(&self) -> PhysicalSize {
        let inner = self.inner.borrow();
        inner.size.to_physical(inner.dpr)
    }
    /// Number of successful paints so far.
    pub fn paint_count(&self) -> u64 { self.inner.borrow().paints }

    pub fn target(&self) -> E::Target
    where
        E::Target: Clone,
    {
        self.inner.borrow().target.clone()
    }

    pub fn with_target<R>(&self, f: impl FnOnce(&E::Target) -> R) -> R {
        f(&self.inner.borrow().target)
    }

    /// Run `f` against the live surface, if there is one.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut E::Surface) -> R) -> Option<R> {
        self.inner.borrow_mut().slot.get_mut().map(f)
    }

    pub fn set_aux(&self, aux: A) { self.inner.borrow_mut().aux = aux; }

    pub fn set_draw(&self, draw: impl FnMut(Frame<'_, E, A>) -> anyhow::Result<()> + 'static) {
        self.inner.borrow_mut().draw = Box::new(draw);
    }

    pub(crate) fn set_interaction(&self, state: InteractionState) {
        self.inner.borrow_mut().interaction = Some(state);
    }

    /// Build a surface for the target, replacing any live one.
    ///
    /// Tries hardware first and software once when hardware raises or declines.
    /// `NotReady` when the engine is not loaded yet.
    pub fn acquire(&self) -> Result<Backend, SurfaceError> {
        self.inner.borrow_mut().acquire()
    }

    /// Paint once. A no-op without a live surface. Failures are contained; a lost canvas or
    /// flush, or any failure while looping, unbinds the surface.
    pub fn paint(&self) -> Result<(), SurfaceError> {
        self.inner.borrow_mut().paint()
    }

    /// Imperative immediate repaint.
    pub fn redraw(&self) -> Result<(), SurfaceError> { self.paint() }

    /// Acquire, paint once, and start the loop in continuous mode. While the engine is
    /// still loading, the same sequence runs once it becomes ready.
    pub fn mount(&self) -> Result<Backend, SurfaceError> {
        let engine = self.inner.borrow().engine.clone();
        match engine.status() {
            EngineStatus::Ready => self.bind(),
            EngineStatus::Failed => {
                warn!("mount skipped: engine failed to load");
                Err(SurfaceError::NotReady)
            }
            EngineStatus::Uninitialized | EngineStatus::Loading => {
                let already = std::mem::replace(&mut self.inner.borrow_mut().mount_pending, true);
                if !already {
                    let weak = Rc::downgrade(&self.inner);
                    engine.on_ready(move |res| {
                        let Some(inner) = weak.upgrade() else { return };
                        let manager = SurfaceManager { inner };
                        let pending = std::mem::replace(&mut manager.inner.borrow_mut().mount_pending, false);
                        if pending && res.is_ok() {
                            let _ = manager.bind();
                        }
                    });
                }
                debug!("mount deferred until the engine is ready");
                Err(SurfaceError::NotReady)
            }
        }
    }

    fn bind(&self) -> Result<Backend, SurfaceError> {
        let (backend, continuous) = {
            let mut inner = self.inner.borrow_mut();
            inner.mount_pending = false;
            let backend = inner.acquire()?;
            inner.paint()?;
            (backend, inner.continuous)
        };
        if continuous {
            self.restart_loop();
        }
        Ok(backend)
    }

    /// Repaint on every frame until stopped. Without a live surface the request is kept
    /// and honored by the next successful mount or resize.
    pub fn start_loop(&self) -> bool {
        self.inner.borrow_mut().continuous = true;
        self.restart_loop()
    }

    /// Stop repainting on every frame. A tick already running finishes without rescheduling.
    pub fn stop_loop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.continuous = false;
        inner.stop_loop();
    }

    fn restart_loop(&self) -> bool {
        let gen = {
            let mut inner = self.inner.borrow_mut();
            inner.stop_loop();
            inner.cancel_redraw();
            if !inner.slot.is_live() {
                debug!("loop requested without a live surface; deferred");
                return false;
            }
            inner.looping = true;
            inner.loop_gen
        };
        self.schedule_tick(gen);
        true
    }

    fn schedule_tick(&self, gen: u64) {
        let scheduler = {
            let inner = self.inner.borrow();
            if !inner.looping || inner.loop_gen != gen {
                return;
            }
            inner.scheduler.clone()
        };
        let weak: Weak<RefCell<Inner<E, A>>> = Rc::downgrade(&self.inner);
        let token = scheduler.schedule(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                SurfaceManager { inner }.tick(gen);
            }
        }));
        let mut inner = self.inner.borrow_mut();
        if inner.looping && inner.loop_gen == gen {
            inner.loop_token = Some(token);
        } else {
            scheduler.cancel(token);
        }
    }

    fn tick(&self, gen: u64) {
        let painted = {
            let mut inner = self.inner.borrow_mut();
            if !inner.looping || inner.loop_gen != gen {
                return;
            }
            inner.loop_token = None;
            inner.paint().is_ok()
        };
        if painted {
            self.schedule_tick(gen);
        }
    }

    /// Mark the surface dirty. Any number of calls between frames yields one paint on the
    /// next frame; a no-op while looping or unbound.
    pub fn invalidate(&self) {
        let scheduler = {
            let inner = self.inner.borrow();
            if inner.looping || inner.redraw_token.is_some() || !inner.slot.is_live() {
                return;
            }
            inner.scheduler.clone()
        };
        let weak = Rc::downgrade(&self.inner);
        let token = scheduler.schedule(Box::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            let mut inner = inner.borrow_mut();
            inner.redraw_token = None;
            if !inner.looping {
                let _ = inner.paint();
            }
        }));
        self.inner.borrow_mut().redraw_token = Some(token);
    }

    /// Rebuild the surface at a new logical size, re-reading the DPR, paint once, and
    /// restart the loop against the new surface in continuous mode.
    pub fn resize(&self, width: f32, height: f32) -> Result<(), SurfaceError> {
        let continuous = {
            let mut inner = self.inner.borrow_mut();
            inner.stop_loop();
            inner.cancel_redraw();
            inner.slot.release();
            inner.size = LogicalSize::new(width, height);
            inner.acquire()?;
            inner.paint()?;
            inner.continuous
        };
        if continuous {
            self.restart_loop();
        }
        Ok(())
    }

    /// Unmount: cancel the loop and pending redraws and release the surface. Idempotent.
    pub fn teardown(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.mount_pending = false;
        inner.stop_loop();
        inner.cancel_redraw();
        inner.slot.release();
        debug!("surface torn down");
    }
}

fn paint_surface<E: GraphicsEngine, A>(
    surface: &mut E::Surface,
    engine: &E,
    draw: &mut DrawFn<E, A>,
    aux: &A,
    interaction: Option<InteractionState>,
    size: LogicalSize,
    dpr: Dpr,
) -> Result<(), PaintFailure> {
    let canvas = contain_on(&mut *surface, |s| s.canvas()).map_err(PaintFailure::Canvas)?;
    canvas.save_scaled(dpr.get());
    let frame = Frame { canvas, engine, size, dpr, aux, interaction };
    let outcome = catch_unwind(AssertUnwindSafe(|| (*draw)(frame)));
    canvas.restore();
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(PaintFailure::Callback(format!("{e:#}"))),
        Err(payload) => return Err(PaintFailure::Panicked(panic_message(payload.as_ref()))),
    }
    contain_on(surface, |s| s.flush()).map_err(PaintFailure::Flush)
}
