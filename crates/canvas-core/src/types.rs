// File: crates/canvas-core/src/types.rs
// Summary: Shared types and constants (logical/physical sizes, device pixel ratio).

/// Default logical surface width.
pub const WIDTH: f32 = 1024.0;
/// Default logical surface height.
pub const HEIGHT: f32 = 640.0;

/// Device pixel ratio: physical pixels per logical unit.
/// Contract: always finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dpr(f32);

impl Dpr {
    pub const ONE: Dpr = Dpr(1.0);

    /// Create a ratio; non-finite or non-positive input falls back to 1.0.
    pub fn new(ratio: f32) -> Self {
        if ratio.is_finite() && ratio > 0.0 { Self(ratio) } else { Self::ONE }
    }

    pub fn get(self) -> f32 { self.0 }
}

impl Default for Dpr {
    fn default() -> Self { Self::ONE }
}

impl From<f64> for Dpr {
    fn from(v: f64) -> Self { Dpr::new(v as f32) }
}

/// Size in device-independent units, as seen by draw callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogicalSize {
    pub width: f32,
    pub height: f32,
}

impl LogicalSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Physical buffer size for this logical size: `ceil(w*dpr) x ceil(h*dpr)`, at least 1x1.
    pub fn to_physical(self, dpr: Dpr) -> PhysicalSize {
        let w = (self.width.max(0.0) * dpr.get()).ceil() as i32;
        let h = (self.height.max(0.0) * dpr.get()).ceil() as i32;
        PhysicalSize::new(w.max(1), h.max(1))
    }
}

impl Default for LogicalSize {
    fn default() -> Self { Self::new(WIDTH, HEIGHT) }
}

/// Size of the backing buffer in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: i32,
    pub height: i32,
}

impl PhysicalSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl From<PhysicalSize> for (i32, i32) {
    fn from(s: PhysicalSize) -> Self { (s.width, s.height) }
}
