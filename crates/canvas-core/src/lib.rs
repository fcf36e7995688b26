// File: crates/canvas-core/src/lib.rs
// Summary: Core library entry point; exports the surface lifecycle manager and its collaborators.

pub mod cache;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod interaction;
pub mod manager;
pub mod scheduler;
pub mod types;

pub use cache::ResourceCache;
pub use engine::{Backend, CanvasScale, GraphicsEngine, RenderSurface, SurfaceSlot};
pub use error::{EngineError, PaintFailure, SurfaceError};
pub use geometry::{Bounds, Point};
pub use handle::{EngineHandle, EngineStatus, LoadTicket};
pub use interaction::{InteractionState, InteractiveSurface, PointerEvent, PointerId, PointerKind, PointerSpace, RawPointerEvent};
pub use manager::{CanvasOf, CanvasState, DrawFn, Frame, SurfaceManager, SurfaceOptions};
pub use scheduler::{FrameScheduler, FrameToken, ManualScheduler};
pub use types::{Dpr, LogicalSize, PhysicalSize};
