// File: crates/canvas-core/src/interaction.rs
// Summary: Pointer-interactive decorator: normalizes pointer events into logical coordinates,
// tracks hover/press/capture, and repaints on change when not looping.

use crate::engine::GraphicsEngine;
use crate::error::SurfaceError;
use crate::geometry::{Bounds, Point};
use crate::manager::SurfaceManager;
use crate::types::Dpr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// Per-frame pointer snapshot handed to draw callbacks by value.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct InteractionState {
    pub hovered: bool,
    pub pressed: bool,
    /// Last known position in logical, target-local units.
    pub position: Option<Point>,
    pub pointer_id: Option<PointerId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
    Wheel,
}

/// Coordinate space of a raw pointer position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerSpace {
    /// Logical units in the host window (DOM `clientX/Y` style). The DPR does not apply.
    Client,
    /// Device pixels in the host window; divided by the DPR before use.
    Physical,
}

/// Pointer event as delivered by the host windowing system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawPointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub position: Point,
    pub space: PointerSpace,
    pub button: Option<u16>,
    /// Scroll amount for `Wheel` events.
    pub delta: Point,
}

impl RawPointerEvent {
    pub fn new(id: u64, kind: PointerKind, x: f32, y: f32, space: PointerSpace) -> Self {
        Self { id: PointerId(id), kind, position: Point::new(x, y), space, button: None, delta: Point::default() }
    }

    pub fn with_button(mut self, button: u16) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_delta(mut self, dx: f32, dy: f32) -> Self {
        self.delta = Point::new(dx, dy);
        self
    }
}

/// Pointer event in logical, target-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub position: Point,
    /// Whether the position lies inside the target's bounds.
    pub inside: bool,
    pub button: Option<u16>,
    pub delta: Point,
}

/// Map a raw position into target-local logical units.
///
/// Client positions: `position - origin`. Physical positions: `position / dpr - origin`.
pub fn normalize(position: Point, space: PointerSpace, bounds: &Bounds, dpr: Dpr) -> Point {
    let p = match space {
        PointerSpace::Client => position,
        PointerSpace::Physical => Point::new(position.x / dpr.get(), position.y / dpr.get()),
    };
    Point::new(p.x - bounds.left, p.y - bounds.top)
}

type Handler = Option<Box<dyn FnMut(&PointerEvent)>>;

#[derive(Default)]
struct Handlers {
    down: Handler,
    moved: Handler,
    up: Handler,
    leave: Handler,
    wheel: Handler,
}

/// A [`SurfaceManager`] that also owns pointer state for its target.
///
/// Every state change is stored on the manager; when it is not looping the surface is
/// repainted right away, otherwise the next tick picks the snapshot up.
pub struct InteractiveSurface<E: GraphicsEngine + 'static, A: 'static = ()> {
    manager: SurfaceManager<E, A>,
    bounds: Bounds,
    state: InteractionState,
    captured: Option<PointerId>,
    handlers: Handlers,
}

impl<E: GraphicsEngine + 'static, A: 'static> InteractiveSurface<E, A> {
    /// `bounds` is the target's on-screen box in the host's logical space.
    pub fn new(manager: SurfaceManager<E, A>, bounds: Bounds) -> Self {
        let state = InteractionState::default();
        manager.set_interaction(state);
        Self { manager, bounds, state, captured: None, handlers: Handlers::default() }
    }

    pub fn manager(&self) -> &SurfaceManager<E, A> { &self.manager }
    pub fn state(&self) -> InteractionState { self.state }
    pub fn bounds(&self) -> Bounds { self.bounds }
    pub fn captured(&self) -> Option<PointerId> { self.captured }

    /// Move or resize the on-screen box. A size change resizes the surface.
    pub fn set_bounds(&mut self, bounds: Bounds) -> Result<(), SurfaceError> {
        let resized = bounds.width != self.bounds.width || bounds.height != self.bounds.height;
        self.bounds = bounds;
        if resized {
            self.manager.resize(bounds.width, bounds.height)?;
        }
        Ok(())
    }

    pub fn on_pointer_down(&mut self, f: impl FnMut(&PointerEvent) + 'static) { self.handlers.down = Some(Box::new(f)); }
    pub fn on_pointer_move(&mut self, f: impl FnMut(&PointerEvent) + 'static) { self.handlers.moved = Some(Box::new(f)); }
    pub fn on_pointer_up(&mut self, f: impl FnMut(&PointerEvent) + 'static) { self.handlers.up = Some(Box::new(f)); }
    pub fn on_pointer_leave(&mut self, f: impl FnMut(&PointerEvent) + 'static) { self.handlers.leave = Some(Box::new(f)); }
    pub fn on_wheel(&mut self, f: impl FnMut(&PointerEvent) + 'static) { self.handlers.wheel = Some(Box::new(f)); }

    /// Feed one raw event. Returns the normalized event when it was delivered to this
    /// target (inside its bounds, or from the captured pointer).
    ///
    /// One pointer at a time: while a pointer holds the capture, events from any other
    /// pointer are dropped.
    pub fn handle(&mut self, raw: RawPointerEvent) -> Option<PointerEvent> {
        if self.captured.is_some_and(|owner| owner != raw.id) {
            return None;
        }
        let local = normalize(raw.position, raw.space, &self.bounds, self.manager.dpr());
        let inside = self.bounds.contains_local(local);
        let captured = self.captured == Some(raw.id);
        let mut event = PointerEvent { id: raw.id, kind: raw.kind, position: local, inside, button: raw.button, delta: raw.delta };
        let mut next = self.state;

        match raw.kind {
            PointerKind::Down => {
                if !inside {
                    return None;
                }
                self.captured = Some(raw.id);
                next = InteractionState { hovered: true, pressed: true, position: Some(local), pointer_id: Some(raw.id) };
            }
            PointerKind::Move if inside || captured => {
                next.hovered = inside;
                next.position = Some(local);
                next.pointer_id = Some(raw.id);
            }
            PointerKind::Move => {
                // Uncaptured pointer crossed out of the bounds.
                if !self.state.hovered {
                    return None;
                }
                event.kind = PointerKind::Leave;
                next = InteractionState::default();
            }
            PointerKind::Up | PointerKind::Cancel => {
                if !inside && !captured {
                    return None;
                }
                if captured {
                    self.captured = None;
                }
                next.pressed = false;
                next.hovered = inside;
                next.position = Some(local);
                next.pointer_id = Some(raw.id);
            }
            PointerKind::Leave => {
                if captured {
                    next.hovered = false;
                } else {
                    next = InteractionState::default();
                }
            }
            PointerKind::Wheel => {
                if !inside {
                    return None;
                }
                next.hovered = true;
                next.position = Some(local);
                next.pointer_id = Some(raw.id);
            }
        }

        let handler = match event.kind {
            PointerKind::Down => &mut self.handlers.down,
            PointerKind::Move => &mut self.handlers.moved,
            PointerKind::Up | PointerKind::Cancel => &mut self.handlers.up,
            PointerKind::Leave => &mut self.handlers.leave,
            PointerKind::Wheel => &mut self.handlers.wheel,
        };
        if let Some(h) = handler.as_mut() {
            h(&event);
        }

        if next != self.state {
            self.state = next;
            self.manager.set_interaction(next);
            if !self.manager.is_looping() {
                // Contained and logged by the manager.
                let _ = self.manager.redraw();
            }
        }
        Some(event)
    }
}
