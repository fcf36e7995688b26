// File: crates/canvas-core/tests/common/mod.rs
// Purpose: Scriptable fake engine, surface, and draw recorder shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use canvas_core::{
    Backend, CanvasScale, EngineError, EngineHandle, Frame, FrameScheduler, GraphicsEngine, InteractionState,
    LogicalSize, ManualScheduler, PhysicalSize, RenderSurface, SurfaceManager, SurfaceOptions,
};

/// What a constructor does when asked for a surface.
#[derive(Clone, Debug)]
pub enum Outcome {
    Surface,
    NoSurface,
    Raise(EngineError),
    Panic,
}

#[derive(Default)]
pub struct Faults {
    pub canvas_fails: bool,
    pub flush_fails: bool,
    pub release_fails: bool,
    pub canvas_panics: bool,
    pub flush_panics: bool,
    pub release_panics: bool,
}

pub struct FakeEngine {
    pub hardware: RefCell<Outcome>,
    pub software: RefCell<Outcome>,
    /// Every constructor call, in order.
    pub requests: RefCell<Vec<(Backend, PhysicalSize)>>,
    pub faults: Rc<RefCell<Faults>>,
    pub live: Rc<Cell<i32>>,
    pub released: Rc<Cell<u32>>,
    pub flushes: Rc<Cell<u32>>,
    next_id: Cell<u32>,
}

impl FakeEngine {
    pub fn new(hardware: Outcome, software: Outcome) -> Self {
        Self {
            hardware: RefCell::new(hardware),
            software: RefCell::new(software),
            requests: RefCell::new(Vec::new()),
            faults: Rc::new(RefCell::new(Faults::default())),
            live: Rc::new(Cell::new(0)),
            released: Rc::new(Cell::new(0)),
            flushes: Rc::new(Cell::new(0)),
            next_id: Cell::new(0),
        }
    }

    pub fn hardware_ok() -> Self { Self::new(Outcome::Surface, Outcome::Surface) }

    pub fn requests_of(&self, backend: Backend) -> usize {
        self.requests.borrow().iter().filter(|(b, _)| *b == backend).count()
    }

    fn build(&self, backend: Backend, outcome: Outcome, size: PhysicalSize) -> Result<Option<FakeSurface>, EngineError> {
        self.requests.borrow_mut().push((backend, size));
        match outcome {
            Outcome::Surface => {
                let id = self.next_id.get() + 1;
                self.next_id.set(id);
                self.live.set(self.live.get() + 1);
                Ok(Some(FakeSurface {
                    canvas: FakeCanvas { surface_id: id, physical: size, scales: RefCell::new(Vec::new()) },
                    faults: self.faults.clone(),
                    live: self.live.clone(),
                    released: self.released.clone(),
                    flushes: self.flushes.clone(),
                }))
            }
            Outcome::NoSurface => Ok(None),
            Outcome::Raise(e) => Err(e),
            Outcome::Panic => panic!("driver crashed"),
        }
    }
}

impl GraphicsEngine for FakeEngine {
    type Target = String;
    type Surface = FakeSurface;

    fn make_hardware_surface(&self, _target: &String, size: PhysicalSize) -> Result<Option<FakeSurface>, EngineError> {
        let outcome = self.hardware.borrow().clone();
        self.build(Backend::Hardware, outcome, size)
    }

    fn make_software_surface(&self, _target: &String, size: PhysicalSize) -> Result<Option<FakeSurface>, EngineError> {
        let outcome = self.software.borrow().clone();
        self.build(Backend::Software, outcome, size)
    }
}

pub struct FakeCanvas {
    pub surface_id: u32,
    pub physical: PhysicalSize,
    scales: RefCell<Vec<f32>>,
}

impl FakeCanvas {
    pub fn scale(&self) -> f32 { self.scales.borrow().iter().product() }
}

impl CanvasScale for FakeCanvas {
    fn save_scaled(&self, scale: f32) { self.scales.borrow_mut().push(scale); }
    fn restore(&self) { self.scales.borrow_mut().pop(); }
}

pub struct FakeSurface {
    canvas: FakeCanvas,
    faults: Rc<RefCell<Faults>>,
    live: Rc<Cell<i32>>,
    released: Rc<Cell<u32>>,
    flushes: Rc<Cell<u32>>,
}

impl FakeSurface {
    pub fn id(&self) -> u32 { self.canvas.surface_id }
    pub fn scale_depth(&self) -> usize { self.canvas.scales.borrow().len() }
}

impl RenderSurface for FakeSurface {
    type Canvas = FakeCanvas;

    fn canvas(&mut self) -> Result<&FakeCanvas, EngineError> {
        if self.faults.borrow().canvas_panics {
            panic!("canvas lookup crashed");
        }
        if self.faults.borrow().canvas_fails {
            return Err(EngineError::ContextLost);
        }
        Ok(&self.canvas)
    }

    fn flush(&mut self) -> Result<(), EngineError> {
        if self.faults.borrow().flush_panics {
            panic!("flush crashed");
        }
        if self.faults.borrow().flush_fails {
            return Err(EngineError::ContextLost);
        }
        self.flushes.set(self.flushes.get() + 1);
        Ok(())
    }

    fn release(&mut self) -> Result<(), EngineError> {
        self.live.set(self.live.get() - 1);
        self.released.set(self.released.get() + 1);
        if self.faults.borrow().release_panics {
            panic!("release crashed");
        }
        if self.faults.borrow().release_fails {
            return Err(EngineError::ContextLost);
        }
        Ok(())
    }
}

/// One observed draw callback invocation.
#[derive(Clone, Debug)]
pub struct Seen {
    pub size: LogicalSize,
    pub scale: f32,
    pub surface_id: u32,
    pub physical: PhysicalSize,
    pub interaction: Option<InteractionState>,
}

/// Draw callback that records what it saw and fails or panics on request.
#[derive(Default)]
pub struct Recorder {
    pub frames: RefCell<Vec<Seen>>,
    /// 1-based call number that returns an error.
    pub fail_at: Cell<Option<usize>>,
    /// 1-based call number that panics.
    pub panic_at: Cell<Option<usize>>,
    calls: Cell<usize>,
}

impl Recorder {
    pub fn new() -> Rc<Self> { Rc::new(Self::default()) }

    pub fn calls(&self) -> usize { self.calls.get() }

    pub fn last(&self) -> Option<Seen> { self.frames.borrow().last().cloned() }

    pub fn draw_fn(self: &Rc<Self>) -> impl FnMut(Frame<'_, FakeEngine, ()>) -> anyhow::Result<()> + 'static {
        let rec = self.clone();
        move |frame: Frame<'_, FakeEngine, ()>| {
            let n = rec.calls.get() + 1;
            rec.calls.set(n);
            if rec.panic_at.get() == Some(n) {
                panic!("draw panicked on call {n}");
            }
            if rec.fail_at.get() == Some(n) {
                anyhow::bail!("draw failed on call {n}");
            }
            rec.frames.borrow_mut().push(Seen {
                size: frame.size,
                scale: frame.canvas.scale(),
                surface_id: frame.canvas.surface_id,
                physical: frame.canvas.physical,
                interaction: frame.interaction,
            });
            Ok(())
        }
    }
}

pub struct Rig {
    pub engine: EngineHandle<FakeEngine>,
    pub sched: Rc<ManualScheduler>,
    pub rec: Rc<Recorder>,
    pub manager: SurfaceManager<FakeEngine>,
    pub dpr: Rc<Cell<f32>>,
}

impl Rig {
    pub fn new(engine: FakeEngine, opts: SurfaceOptions) -> Self {
        Self::with_handle(EngineHandle::ready(engine), opts)
    }

    pub fn with_handle(engine: EngineHandle<FakeEngine>, opts: SurfaceOptions) -> Self {
        let sched = Rc::new(ManualScheduler::new());
        let rec = Recorder::new();
        let dpr = Rc::new(Cell::new(1.0));
        let d = dpr.clone();
        let manager = SurfaceManager::new(
            "canvas".to_string(),
            engine.clone(),
            sched.clone() as Rc<dyn FrameScheduler>,
            (),
            rec.draw_fn(),
            opts,
        )
        .with_dpr_source(move || d.get());
        Self { engine, sched, rec, manager, dpr }
    }

    pub fn fake(&self) -> Rc<FakeEngine> {
        self.engine.get().expect("engine ready")
    }
}

pub fn opts(width: f32, height: f32, continuous: bool) -> SurfaceOptions {
    SurfaceOptions { width, height, continuous }
}
