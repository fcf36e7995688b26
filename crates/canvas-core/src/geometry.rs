// File: crates/canvas-core/src/geometry.rs
// Summary: Lightweight geometry helpers for pointer math in logical units.

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self { Self { x, y } }
}

/// On-screen bounding box of a target, in the host's logical coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn from_ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
    pub const fn origin(&self) -> Point { Point::new(self.left, self.top) }
    pub fn right(&self) -> f32 { self.left + self.width }
    pub fn bottom(&self) -> f32 { self.top + self.height }

    /// Whether a point already made local to these bounds lies inside them.
    #[inline]
    pub fn contains_local(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width && p.y < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_containment_is_half_open() {
        let b = Bounds::from_ltwh(20.0, 10.0, 100.0, 50.0);
        assert!(b.contains_local(Point::new(0.0, 0.0)));
        assert!(b.contains_local(Point::new(99.9, 49.9)));
        assert!(!b.contains_local(Point::new(100.0, 10.0)));
        assert!(!b.contains_local(Point::new(-0.1, 10.0)));
        assert_eq!(b.right(), 120.0);
        assert_eq!(b.bottom(), 60.0);
    }
}
