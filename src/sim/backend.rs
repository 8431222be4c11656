//! Front-end facing game interface
//!
//! A driver owns a `Box<dyn GameBackend>` and calls `update` then `draw`
//! once per frame. Backends that can be paused expose that through
//! [`GameBackend::as_pausable`].

use serde::{Deserialize, Serialize};

use super::level::{Level, LevelStatus};
use super::tick::{FrameReport, TickInput, tick};
use crate::geom::{Rect, clip};

/// Draw layer, in back-to-front order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Void,
    VRect,
    Window,
    Rect,
    ARect,
    Goal,
    Checkpoint { current: bool },
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawItem {
    pub layer: Layer,
    pub rect: Rect,
}

/// Rectangles to draw this frame, back to front, in screen pixels
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, layer: Layer, rect: Rect) {
        self.items.push(DrawItem { layer, rect });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items on one layer
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &Rect> {
        self.items.iter().filter(move |i| i.layer == layer).map(|i| &i.rect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawResult {
    /// The list was rebuilt
    Drawn,
    /// Nothing changed since the last draw; the list was left alone
    Unchanged,
}

/// A game the driver can update and draw
pub trait GameBackend {
    fn update(&mut self, input: &TickInput) -> FrameReport;

    fn draw(&mut self, out: &mut DrawList) -> DrawResult;

    fn as_pausable(&mut self) -> Option<&mut dyn Pausable> {
        None
    }
}

pub trait Pausable {
    fn pause(&mut self);

    /// Resume; the next update ignores window movement requested while paused
    fn resume(&mut self);

    fn is_paused(&self) -> bool;
}

impl GameBackend for Level {
    fn update(&mut self, input: &TickInput) -> FrameReport {
        tick(self, input)
    }

    fn draw(&mut self, out: &mut DrawList) -> DrawResult {
        if self.paused {
            if self.drawn_paused {
                return DrawResult::Unchanged;
            }
            self.drawn_paused = true;
        }
        out.clear();

        let window = self.window();
        out.push(Layer::Void, self.settings().screen());
        for r in &self.data().vrects {
            out.push(Layer::VRect, r.rounded());
        }
        out.push(Layer::Window, window);
        for r in self.visible_rects() {
            out.push(Layer::Rect, r.rounded());
        }
        for r in &self.data().arects {
            out.push(Layer::ARect, r.rounded());
        }
        if let Some(goal) = clip(&window, &self.goal(), 0.0) {
            out.push(Layer::Goal, goal.rounded());
        }
        let current = self.current_checkpoint();
        for (i, cp) in self.checkpoints().iter().enumerate() {
            if let Some(c) = clip(&window, cp, 0.0) {
                let layer = Layer::Checkpoint {
                    current: current == Some(i),
                };
                out.push(layer, c.rounded());
            }
        }
        if !matches!(self.status(), LevelStatus::Dying { .. }) {
            out.push(Layer::Player, self.player.rect.rounded());
        }
        DrawResult::Drawn
    }

    fn as_pausable(&mut self) -> Option<&mut dyn Pausable> {
        Some(self)
    }
}

impl Pausable for Level {
    fn pause(&mut self) {
        if !self.paused {
            log::debug!("Paused level {}", self.index());
        }
        self.paused = true;
        self.drawn_paused = false;
    }

    fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.resumed = true;
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
