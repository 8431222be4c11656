//! Level data and the live level controller

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::resolver::{Death, Resolution, SweptAxisResolver};
use crate::error::{Error, Result};
use crate::geom::{Axis, Push, Rect, clip, window_inverse};
use crate::settings::{GameContext, Settings};

/// Static description of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Player spawn (top-left)
    pub player_pos: DVec2,
    /// Goal position (top-left); its size comes from settings
    pub goal: DVec2,
    /// Solids that only exist inside the window
    #[serde(default)]
    pub rects: Vec<Rect>,
    /// Solids that only exist outside the window
    #[serde(default)]
    pub vrects: Vec<Rect>,
    /// Solids that exist everywhere
    #[serde(default)]
    pub arects: Vec<Rect>,
    /// Checkpoint positions, in the order they must be reached
    #[serde(default)]
    pub checkpoints: Vec<DVec2>,
}

impl LevelData {
    /// Reject rectangles without positive area
    pub fn validate(&self) -> Result<()> {
        let groups = [("rects", &self.rects), ("vrects", &self.vrects), ("arects", &self.arects)];
        for (name, rects) in groups {
            if let Some((i, r)) = rects.iter().enumerate().find(|(_, r)| !r.is_valid()) {
                return Err(Error::InvalidLevel(format!(
                    "{name}[{i}] has non-positive size {}x{}",
                    r.w, r.h
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelStatus {
    Playing,
    /// Death animation running; the attempt restarts when it ends
    Dying { ticks_left: u32, death: Death },
    /// Goal reached; the level no longer changes
    Won,
}

/// A level being played
#[derive(Debug, Clone)]
pub struct Level {
    settings: Settings,
    data: LevelData,
    index: usize,
    can_jump: bool,
    can_move: bool,
    resolver: SweptAxisResolver,
    pub player: Player,
    /// Scrolling window, always on whole pixels
    window: Rect,
    /// `data.rects` clipped to the window
    rects: Vec<Rect>,
    /// `data.vrects` clipped to the area outside the window
    vrects: Vec<Rect>,
    goal: Rect,
    checkpoints: Vec<Rect>,
    current_checkpoint: Option<usize>,
    status: LevelStatus,
    /// Last vertical push this frame
    pub(crate) vertical: Option<Push>,
    pub(crate) paused: bool,
    /// Unpaused since the last tick
    pub(crate) resumed: bool,
    /// A frame was drawn since pausing
    pub(crate) drawn_paused: bool,
}

impl Level {
    /// Start level `index`, spawning at `checkpoint` if given
    pub fn new(ctx: &GameContext, index: usize, checkpoint: Option<usize>) -> Result<Self> {
        let data = ctx.level(index)?.clone();
        data.validate()?;
        if let Some(i) = checkpoint.filter(|&i| i >= data.checkpoints.len()) {
            return Err(Error::InvalidLevel(format!("level {index} has no checkpoint {i}")));
        }
        let settings = ctx.settings.clone();
        let goal = Rect::from_pos_size(data.goal, settings.goal_size);
        let checkpoints = data
            .checkpoints
            .iter()
            .map(|&p| Rect::from_pos_size(p, settings.checkpoint_size))
            .collect();

        let mut level = Self {
            resolver: SweptAxisResolver::new(&settings),
            player: Player::new(data.player_pos, settings.player_size),
            can_jump: ctx.can_jump(index),
            can_move: ctx.can_move(index),
            window: Rect::default(),
            rects: Vec::new(),
            vrects: Vec::new(),
            goal,
            checkpoints,
            current_checkpoint: checkpoint,
            status: LevelStatus::Playing,
            vertical: None,
            paused: false,
            resumed: false,
            drawn_paused: false,
            settings,
            data,
            index,
        };
        level.reset();
        log::info!("Started level {index}");
        Ok(level)
    }

    /// Respawn at the current checkpoint (or the level start)
    pub fn reset(&mut self) {
        let size = self.settings.player_size;
        let pos = match self.current_checkpoint {
            Some(i) => self.data.checkpoints[i] + (self.settings.checkpoint_size - size) / 2.0,
            None => self.data.player_pos,
        };
        self.player = Player::new(pos, size);
        self.window = spawn_window(&self.player.rect, self.settings.half_window_size);
        self.status = LevelStatus::Playing;
        self.vertical = None;
        self.update_rects();
    }

    /// Recompute which solids currently exist
    pub fn update_rects(&mut self) {
        let window = self.window;
        self.rects = self.data.rects.iter().filter_map(|r| clip(r, &window, 0.0)).collect();
        let outside = window_inverse(&window, &self.settings.screen());
        self.vrects = self
            .data
            .vrects
            .iter()
            .flat_map(|r| outside.iter().filter_map(move |cell| clip(r, cell, 0.0)))
            .collect();
    }

    /// Move the window one pixel and refresh the solids
    pub fn step_window(&mut self, axis: Axis, dir: i32) {
        self.window.shift(axis, dir.signum() as f64);
        self.update_rects();
    }

    /// Resolve the player against every current solid, dying if crushed
    pub fn handle_collisions(&mut self) -> Resolution {
        let solids = [self.rects.as_slice(), self.vrects.as_slice(), self.data.arects.as_slice()];
        let res = self.resolver.resolve(&mut self.player, &solids);
        if res.vertical.is_some() {
            self.vertical = res.vertical;
        }
        if let Some(death) = res.death {
            self.die(death);
        }
        res
    }

    /// Start the death countdown; only the first death of an attempt counts
    pub fn die(&mut self, death: Death) -> bool {
        if self.status != LevelStatus::Playing {
            return false;
        }
        log::info!("Player died on level {} ({:?})", self.index, death.cause);
        self.status = LevelStatus::Dying {
            ticks_left: self.settings.die_time,
            death,
        };
        true
    }

    /// The player together with the settings that drive it
    pub(crate) fn player_and_settings(&mut self) -> (&mut Player, &Settings) {
        (&mut self.player, &self.settings)
    }

    pub(crate) fn set_status(&mut self, status: LevelStatus) {
        self.status = status;
    }

    pub(crate) fn set_checkpoint(&mut self, index: usize) {
        self.current_checkpoint = Some(index);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn data(&self) -> &LevelData {
        &self.data
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_jump(&self) -> bool {
        self.can_jump
    }

    pub fn can_move(&self) -> bool {
        self.can_move
    }

    pub fn status(&self) -> LevelStatus {
        self.status
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.status == LevelStatus::Playing
    }

    pub fn is_won(&self) -> bool {
        self.status == LevelStatus::Won
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn window(&self) -> Rect {
        self.window
    }

    /// Solids currently inside the window
    pub fn visible_rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Solids currently outside the window
    pub fn visible_vrects(&self) -> &[Rect] {
        &self.vrects
    }

    pub fn goal(&self) -> Rect {
        self.goal
    }

    pub fn checkpoints(&self) -> &[Rect] {
        &self.checkpoints
    }

    pub fn current_checkpoint(&self) -> Option<usize> {
        self.current_checkpoint
    }
}

/// Window centred on the player's pixel-rounded box
fn spawn_window(player: &Rect, half: DVec2) -> Rect {
    let r = player.rounded();
    let centre = DVec2::new(r.x + (r.w / 2.0).floor(), r.y + (r.h / 2.0).floor());
    Rect::from_pos_size(centre - half, half * 2.0)
}
