//! Shapes built from axis-aligned solid lines
//!
//! Every line has a direction: the side of the line against which collisions
//! can happen. A rectangle is four lines, one per side, each solid outward; a
//! two-sided line is a pair of opposing lines at the same position.
//!
//! Once a shape is handed to a [`CollisionHandler`](super::CollisionHandler)
//! its lines live in a [`LineArena`] and the body keeps stable [`LineId`]s, so
//! anything caching a line (the touching map, in particular) always sees the
//! line's current position after the shape moves.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geom::{Axis, Rect};

/// Solid side of a line, clockwise from left
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Top,
        Direction::Right,
        Direction::Bottom,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 2) % 4]
    }

    /// Axis along which a collision through this line happens (the axis
    /// perpendicular to the line)
    #[inline]
    pub fn axis(self) -> Axis {
        self.index() % 2
    }

    /// Sign of the outward normal along [`axis`](Self::axis)
    #[inline]
    pub fn sign(self) -> f64 {
        if self.index() >= 2 { 1.0 } else { -1.0 }
    }
}

/// One axis-aligned line: its position on the perpendicular axis and its span
/// on the parallel axis (`para0 <= para1`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub perp: f64,
    pub para0: f64,
    pub para1: f64,
}

impl Segment {
    /// Endpoints are swapped if given in descending order
    pub fn new(perp: f64, para0: f64, para1: f64) -> Self {
        let (para0, para1) = if para0 > para1 { (para1, para0) } else { (para0, para1) };
        Self { perp, para0, para1 }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.para1 - self.para0
    }

    /// Whether the parallel spans overlap with positive length
    #[inline]
    pub fn spans_overlap(&self, other: &Segment) -> bool {
        self.para0 < other.para1 && other.para0 < self.para1
    }

    /// Shift by a world-space vector, given the axis this line collides along
    #[inline]
    fn shift(&mut self, axis: Axis, by: DVec2) {
        self.perp += by[axis];
        self.para0 += by[1 - axis];
        self.para1 += by[1 - axis];
    }
}

/// Stable handle to a line stored in a [`LineArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(u32);

/// Storage for every placed line; ids stay valid until released
#[derive(Debug, Clone, Default)]
pub struct LineArena {
    slots: Vec<Segment>,
    free: Vec<LineId>,
}

impl LineArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, segment: Segment) -> LineId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0 as usize] = segment;
                id
            }
            None => {
                self.slots.push(segment);
                LineId((self.slots.len() - 1) as u32)
            }
        }
    }

    pub fn release(&mut self, id: LineId) {
        self.free.push(id);
    }

    #[inline]
    pub fn get(&self, id: LineId) -> Segment {
        self.slots[id.0 as usize]
    }

    /// Number of live lines
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn shift(&mut self, id: LineId, axis: Axis, by: DVec2) {
        self.slots[id.0 as usize].shift(axis, by);
    }
}

/// What a shape was built as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rect,
    /// Two-sided line
    Line,
    /// One-sided line
    HalfLine,
    Custom,
}

/// Read access to a shape's lines, with the derived geometry every shape has
pub trait Lines {
    fn kind(&self) -> ShapeKind;

    fn count(&self, direction: Direction) -> usize;

    fn segment(&self, direction: Direction, index: usize) -> Segment;

    fn segments(&self) -> Vec<(Direction, Segment)> {
        Direction::ALL
            .iter()
            .flat_map(|&dir| (0..self.count(dir)).map(move |i| (dir, self.segment(dir, i))))
            .collect()
    }

    /// Bounding rectangle of every line (zero-width for a vertical line)
    fn bounds(&self) -> Rect {
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for (dir, seg) in self.segments() {
            let axis = dir.axis();
            let mut a = DVec2::ZERO;
            let mut b = DVec2::ZERO;
            a[axis] = seg.perp;
            b[axis] = seg.perp;
            a[1 - axis] = seg.para0;
            b[1 - axis] = seg.para1;
            min = min.min(a).min(b);
            max = max.max(a).max(b);
        }
        Rect::from_corners(min, max)
    }

    fn left(&self) -> f64 {
        self.bounds().left()
    }

    fn top(&self) -> f64 {
        self.bounds().top()
    }

    fn right(&self) -> f64 {
        self.bounds().right()
    }

    fn bottom(&self) -> f64 {
        self.bounds().bottom()
    }

    fn centre(&self) -> DVec2 {
        self.bounds().centre()
    }

    fn size(&self) -> DVec2 {
        self.bounds().size()
    }

    fn area(&self) -> f64 {
        self.bounds().area()
    }

    /// Length of the first line (the only one for line shapes)
    fn length(&self) -> f64 {
        Direction::ALL
            .iter()
            .find(|&&dir| self.count(dir) > 0)
            .map(|&dir| self.segment(dir, 0).length())
            .unwrap_or(0.0)
    }

    /// Endpoints of the first line, smallest coordinates first
    fn ends(&self) -> Option<(DVec2, DVec2)> {
        let dir = *Direction::ALL.iter().find(|&&dir| self.count(dir) > 0)?;
        let seg = self.segment(dir, 0);
        let axis = dir.axis();
        let mut a = DVec2::ZERO;
        a[axis] = seg.perp;
        a[1 - axis] = seg.para0;
        let mut b = a;
        b[1 - axis] = seg.para1;
        Some((a, b))
    }
}

/// Shape description, owned by the caller until added to a handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    kind: ShapeKind,
    lines: [Vec<Segment>; 4],
}

impl Shape {
    /// Arbitrary set of `(direction, perp, para0, para1)` lines
    pub fn from_segments(lines: impl IntoIterator<Item = (Direction, f64, f64, f64)>) -> Self {
        Self::build(ShapeKind::Custom, lines)
    }

    fn build(kind: ShapeKind, lines: impl IntoIterator<Item = (Direction, f64, f64, f64)>) -> Self {
        let mut shape = Self {
            kind,
            lines: Default::default(),
        };
        for (dir, perp, para0, para1) in lines {
            shape.lines[dir.index()].push(Segment::new(perp, para0, para1));
        }
        shape
    }

    /// Solid rectangle from its min and max corners
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        debug_assert!(x1 > x0 && y1 > y0, "degenerate rect");
        Self::build(
            ShapeKind::Rect,
            [
                (Direction::Left, x0, y0, y1),
                (Direction::Top, y0, x0, x1),
                (Direction::Right, x1, y0, y1),
                (Direction::Bottom, y1, x0, x1),
            ],
        )
    }

    /// Solid rectangle from a [`Rect`]
    pub fn from_rect(r: &Rect) -> Self {
        Self::rect(r.left(), r.top(), r.right(), r.bottom())
    }

    /// Two-sided vertical line at `x` spanning `y0..y1`
    pub fn vertical_line(x: f64, y0: f64, y1: f64) -> Self {
        Self::build(
            ShapeKind::Line,
            [(Direction::Left, x, y0, y1), (Direction::Right, x, y0, y1)],
        )
    }

    /// Two-sided horizontal line at `y` spanning `x0..x1`
    pub fn horizontal_line(y: f64, x0: f64, x1: f64) -> Self {
        Self::build(
            ShapeKind::Line,
            [(Direction::Top, y, x0, x1), (Direction::Bottom, y, x0, x1)],
        )
    }

    /// One-sided line, solid toward `direction`
    pub fn half_line(direction: Direction, perp: f64, para0: f64, para1: f64) -> Self {
        Self::build(ShapeKind::HalfLine, [(direction, perp, para0, para1)])
    }

    /// Place every line into `arena`
    pub(crate) fn place(self, arena: &mut LineArena) -> PlacedShape {
        let lines = self.lines.map(|segs| segs.into_iter().map(|s| arena.alloc(s)).collect());
        PlacedShape {
            kind: self.kind,
            lines,
        }
    }
}

impl Lines for Shape {
    fn kind(&self) -> ShapeKind {
        self.kind
    }

    fn count(&self, direction: Direction) -> usize {
        self.lines[direction.index()].len()
    }

    fn segment(&self, direction: Direction, index: usize) -> Segment {
        self.lines[direction.index()][index]
    }
}

/// A shape whose lines live in an arena
#[derive(Debug, Clone)]
pub(crate) struct PlacedShape {
    pub kind: ShapeKind,
    pub lines: [Vec<LineId>; 4],
}

impl PlacedShape {
    /// Move every line by `by`
    pub fn translate(&self, arena: &mut LineArena, by: DVec2) {
        for dir in Direction::ALL {
            for &id in &self.lines[dir.index()] {
                arena.shift(id, dir.axis(), by);
            }
        }
    }

    /// Shift along one axis only
    pub fn shift(&self, arena: &mut LineArena, axis: Axis, amount: f64) {
        let mut by = DVec2::ZERO;
        by[axis] = amount;
        self.translate(arena, by);
    }

    pub fn release(self, arena: &mut LineArena) {
        for id in self.lines.into_iter().flatten() {
            arena.release(id);
        }
    }

    pub fn line_ids(&self, direction: Direction) -> &[LineId] {
        &self.lines[direction.index()]
    }

    /// Copy the current geometry back out of the arena
    pub fn snapshot(&self, arena: &LineArena) -> Shape {
        Shape {
            kind: self.kind,
            lines: self.lines.clone().map(|ids| ids.into_iter().map(|id| arena.get(id)).collect()),
        }
    }
}

/// Borrowed view of a placed shape
#[derive(Clone, Copy)]
pub struct ShapeView<'a> {
    pub(crate) shape: &'a PlacedShape,
    pub(crate) arena: &'a LineArena,
}

impl Lines for ShapeView<'_> {
    fn kind(&self) -> ShapeKind {
        self.shape.kind
    }

    fn count(&self, direction: Direction) -> usize {
        self.shape.lines[direction.index()].len()
    }

    fn segment(&self, direction: Direction, index: usize) -> Segment {
        self.arena.get(self.shape.lines[direction.index()][index])
    }
}
