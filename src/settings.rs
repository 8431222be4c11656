//! Game tunables and the explicit context handed to every level
//!
//! Nothing in the simulation reads global state: a [`GameContext`] (settings
//! plus level data) is passed in when a level is created.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::sim::LevelData;

/// A map with a fixed fallback value for keys it does not contain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedDefault<K: Ord, V> {
    pub default: V,
    #[serde(default)]
    pub overrides: BTreeMap<K, V>,
}

impl<K: Ord, V> KeyedDefault<K, V> {
    pub fn new(default: V) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Builder-style override for one key
    pub fn with(mut self, key: K, value: V) -> Self {
        self.overrides.insert(key, value);
        self
    }

    pub fn set(&mut self, key: K, value: V) {
        self.overrides.insert(key, value);
    }

    /// Value for `key`, or the default when there is no override
    pub fn get_or_default(&self, key: &K) -> &V {
        self.overrides.get(key).unwrap_or(&self.default)
    }
}

/// Spread parameters for death particles, in the `0..1` angle space the
/// presentation layer maps onto `0..pi/2`
///
/// These are tuned by feel. `horizontal` is used when the player died
/// overlapping only along x, `vertical` when only along y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathSpread {
    pub both_axes: f64,
    pub horizontal: f64,
    pub vertical: f64,
    pub out_of_bounds: f64,
}

impl Default for DeathSpread {
    fn default() -> Self {
        Self {
            both_axes: 0.5,
            horizontal: 0.95,
            vertical: 0.1,
            out_of_bounds: 0.5,
        }
    }
}

/// Physics and gameplay tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// Screen size; the player is clamped to its horizontal extent and dies
    /// below its bottom
    pub resolution: DVec2,
    /// Half the size of the scrolling window
    pub half_window_size: DVec2,
    /// Most pixel steps the window may take per axis per frame
    pub max_window_steps: u32,

    // === Player ===
    pub player_size: DVec2,
    /// Horizontal speed added per frame of movement on the ground
    pub player_speed: f64,
    /// Horizontal speed added per frame of movement in the air
    pub player_air_speed: f64,
    /// Rate at which velocity follows actual displacement (0..1)
    pub launch_speed: f64,
    pub initial_jump: f64,
    /// Extra upward speed per frame while the jump key stays held during a jump
    pub continue_jump: f64,
    /// Frames after a jump during which it counts as jumping
    pub jump_time: u32,
    /// Frames the player counts as grounded after floor contact
    pub on_ground_time: u32,

    // === Physics ===
    pub gravity: f64,
    /// Fraction of horizontal speed lost per frame on the ground
    pub friction: f64,
    /// Quadratic air resistance coefficient
    pub air_resistance: f64,
    /// Overlap still tolerated after collision resolution before death
    pub death_tolerance: f64,
    /// Velocity change at or above which an impact counts as a hit
    pub hit_threshold: f64,

    // === Level ===
    pub goal_size: DVec2,
    pub checkpoint_size: DVec2,
    /// Frames between death and the attempt restarting
    pub die_time: u32,
    /// Skipping the death animation is allowed once the countdown is below this
    pub die_skip_threshold: u32,
    pub death_spread: DeathSpread,

    // === Capabilities (keyed by level index) ===
    pub can_jump: KeyedDefault<usize, bool>,
    pub can_move: KeyedDefault<usize, bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resolution: RESOLUTION,
            half_window_size: HALF_WINDOW_SIZE,
            max_window_steps: MAX_WINDOW_STEPS,

            player_size: PLAYER_SIZE,
            player_speed: PLAYER_SPEED,
            player_air_speed: PLAYER_AIR_SPEED,
            launch_speed: LAUNCH_SPEED,
            initial_jump: INITIAL_JUMP,
            continue_jump: CONTINUE_JUMP,
            jump_time: JUMP_TIME,
            on_ground_time: ON_GROUND_TIME,

            gravity: GRAVITY,
            friction: FRICTION,
            air_resistance: AIR_RESISTANCE,
            death_tolerance: DEATH_TOLERANCE,
            hit_threshold: HIT_THRESHOLD,

            goal_size: GOAL_SIZE,
            checkpoint_size: CHECKPOINT_SIZE,
            die_time: DIE_TIME,
            die_skip_threshold: DIE_SKIP_THRESHOLD,
            death_spread: DeathSpread::default(),

            can_jump: KeyedDefault::new(true),
            can_move: KeyedDefault::new(true),
        }
    }
}

impl Settings {
    /// Parse settings from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings");
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// The full screen as a rectangle
    pub fn screen(&self) -> crate::geom::Rect {
        crate::geom::Rect::from_pos_size(DVec2::ZERO, self.resolution)
    }

    pub fn window_size(&self) -> DVec2 {
        self.half_window_size * 2.0
    }
}

/// Settings plus the ordered level list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameContext {
    #[serde(default)]
    pub settings: Settings,
    pub levels: Vec<LevelData>,
}

impl GameContext {
    pub fn new(settings: Settings, levels: Vec<LevelData>) -> Self {
        Self { settings, levels }
    }

    /// Parse and validate a context from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let ctx: Self = serde_json::from_str(json)?;
        for level in &ctx.levels {
            level.validate()?;
        }
        log::info!("Loaded {} levels", ctx.levels.len());
        Ok(ctx)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn level(&self, index: usize) -> Result<&LevelData> {
        self.levels.get(index).ok_or(Error::UnknownLevel(index))
    }

    pub fn can_jump(&self, level: usize) -> bool {
        *self.settings.can_jump.get_or_default(&level)
    }

    pub fn can_move(&self, level: usize) -> bool {
        *self.settings.can_move.get_or_default(&level)
    }

    /// Whether `level` is the final one
    pub fn is_last(&self, level: usize) -> bool {
        level + 1 >= self.levels.len()
    }
}
