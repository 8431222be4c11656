//! Axis-aligned rectangle geometry and clipping
//!
//! Everything in the platformer is an axis-aligned rectangle: the player,
//! solids, anti-rects, the goal, checkpoints and the scrolling window. The
//! helpers here are shared by the collision resolver and the level controller
//! so that "touching" means the same thing everywhere.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis index (0 = x, 1 = y)
pub type Axis = usize;

/// An axis-aligned rectangle: top-left corner plus size
///
/// Width and height are expected to be positive. Serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle from a position and a size
    pub fn from_pos_size(pos: DVec2, size: DVec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Rectangle spanning two corners (min corner first)
    pub fn from_corners(min: DVec2, max: DVec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    #[inline]
    pub fn pos(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.w, self.h)
    }

    pub fn centre(&self) -> DVec2 {
        DVec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Whether both dimensions are strictly positive
    pub fn is_valid(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Coordinate of the near edge on an axis
    #[inline]
    pub fn start(&self, axis: Axis) -> f64 {
        if axis == 0 { self.x } else { self.y }
    }

    /// Extent on an axis
    #[inline]
    pub fn extent(&self, axis: Axis) -> f64 {
        if axis == 0 { self.w } else { self.h }
    }

    /// Coordinate of the far edge on an axis
    #[inline]
    pub fn end(&self, axis: Axis) -> f64 {
        self.start(axis) + self.extent(axis)
    }

    /// Shift the rectangle in place along one axis
    #[inline]
    pub fn shift(&mut self, axis: Axis, amount: f64) {
        if axis == 0 {
            self.x += amount;
        } else {
            self.y += amount;
        }
    }

    /// Translated copy
    pub fn translated(&self, by: DVec2) -> Self {
        Self::new(self.x + by.x, self.y + by.y, self.w, self.h)
    }

    /// Copy with every component rounded to the nearest integer (screen space)
    pub fn rounded(&self) -> Self {
        Self::new(self.x.round(), self.y.round(), self.w.round(), self.h.round())
    }
}

impl From<[f64; 4]> for Rect {
    fn from([x, y, w, h]: [f64; 4]) -> Self {
        Self::new(x, y, w, h)
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x, r.y, r.w, r.h]
    }
}

/// Overlapping region of two rectangles
///
/// Returns `None` unless the overlap is strictly wider and strictly taller
/// than `epsilon`, so rectangles that only share an edge or a corner do not
/// clip at `epsilon = 0`.
pub fn clip(r1: &Rect, r2: &Rect, epsilon: f64) -> Option<Rect> {
    let x0 = r1.left().max(r2.left());
    let y0 = r1.top().max(r2.top());
    let x1 = r1.right().min(r2.right());
    let y1 = r1.bottom().min(r2.bottom());
    let (w, h) = (x1 - x0, y1 - y0);
    if w > epsilon && h > epsilon {
        Some(Rect::new(x0, y0, w, h))
    } else {
        None
    }
}

/// Whether two rectangles overlap with positive area
#[inline]
pub fn overlaps(r1: &Rect, r2: &Rect) -> bool {
    clip(r1, r2, 0.0).is_some()
}

/// The region of `bounds` outside `window`
///
/// Splits `bounds` into the 3x3 grid formed by the window's edges and returns
/// the (up to 8) cells other than the window itself. Cells with no area are
/// omitted. Column-major order: left column top to bottom, then the middle
/// column, then the right column.
pub fn window_inverse(window: &Rect, bounds: &Rect) -> Vec<Rect> {
    let mut cells = Vec::with_capacity(8);
    for px in 0..3 {
        for py in 0..3 {
            if px == 1 && py == 1 {
                continue;
            }
            let (x, w) = grid_span(px, window.left(), window.right(), bounds.left(), bounds.right());
            let (y, h) = grid_span(py, window.top(), window.bottom(), bounds.top(), bounds.bottom());
            if w > 0.0 && h > 0.0 {
                cells.push(Rect::new(x, y, w, h));
            }
        }
    }
    cells
}

/// Start and length of grid cell `index` along one axis
fn grid_span(index: usize, w0: f64, w1: f64, b0: f64, b1: f64) -> (f64, f64) {
    match index {
        0 => (b0, w0 - b0),
        1 => (w0, w1 - w0),
        _ => (w1, b1 - w1),
    }
}

/// Direction in which an overlapping rectangle gets pushed out
///
/// The discriminants match the order in which the push-out candidates are
/// compared, so ties resolve toward the lower value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Push {
    /// Toward -x (mover's right edge was inside the obstacle's left edge)
    Left = 0,
    /// Toward -y; the obstacle acts as a floor
    Up = 1,
    /// Toward +x
    Right = 2,
    /// Toward +y; the obstacle acts as a ceiling
    Down = 3,
}

impl Push {
    pub const ALL: [Push; 4] = [Push::Left, Push::Up, Push::Right, Push::Down];

    #[inline]
    pub fn axis(self) -> Axis {
        self as usize % 2
    }

    /// Sign of the displacement along the axis
    #[inline]
    pub fn sign(self) -> f64 {
        if (self as usize) >= 2 { 1.0 } else { -1.0 }
    }
}

/// Smallest push that separates `mover` from `obstacle`
///
/// Candidates are `(mover.right - obstacle.left, mover.bottom - obstacle.top,
/// obstacle.right - mover.left, obstacle.bottom - mover.top)`; the minimum
/// wins, ties going to the earlier candidate.
pub fn min_penetration(mover: &Rect, obstacle: &Rect) -> (f64, Push) {
    let depths = penetrations(mover, obstacle);
    let mut best = (depths[0], Push::Left);
    for (&depth, push) in depths.iter().zip(Push::ALL).skip(1) {
        if depth < best.0 {
            best = (depth, push);
        }
    }
    best
}

/// Push-out distance for each [`Push`], indexed by its discriminant
pub fn penetrations(mover: &Rect, obstacle: &Rect) -> [f64; 4] {
    [
        mover.right() - obstacle.left(),
        mover.bottom() - obstacle.top(),
        obstacle.right() - mover.left(),
        obstacle.bottom() - mover.top(),
    ]
}
