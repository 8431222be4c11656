//! World View of a Slime - collision and physics core
//!
//! Core modules:
//! - `geom`: Rectangle clipping shared by everything else
//! - `sim`: The platformer (player, swept per-axis resolver, level controller)
//! - `rigid`: Exact swept collision handler for rigid bodies made of
//!   axis-aligned lines
//! - `settings`: Tunables and the explicit game context

pub mod error;
pub mod geom;
pub mod rigid;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use geom::{Rect, clip, window_inverse};
pub use settings::{GameContext, KeyedDefault, Settings};

/// Default tunables (one frame is one simulation step)
pub mod consts {
    use glam::DVec2;

    /// Screen resolution in pixels
    pub const RESOLUTION: DVec2 = DVec2::new(960.0, 540.0);
    /// Scrolling window half size
    pub const HALF_WINDOW_SIZE: DVec2 = DVec2::new(125.0, 75.0);
    /// Pixel steps per axis per frame before window motion is truncated
    pub const MAX_WINDOW_STEPS: u32 = 256;

    /// Player bounding box (sizes are whole pixels)
    pub const PLAYER_SIZE: DVec2 = DVec2::new(15.0, 30.0);
    pub const PLAYER_SPEED: f64 = 1.0;
    pub const PLAYER_AIR_SPEED: f64 = 0.2;
    pub const LAUNCH_SPEED: f64 = 0.5;
    pub const INITIAL_JUMP: f64 = 5.0;
    pub const CONTINUE_JUMP: f64 = 0.7;
    pub const JUMP_TIME: u32 = 10;
    /// One frame of grace after leaving the floor
    pub const ON_GROUND_TIME: u32 = 2;

    pub const GRAVITY: f64 = 0.5;
    pub const FRICTION: f64 = 0.15;
    pub const AIR_RESISTANCE: f64 = 0.0025;
    pub const DEATH_TOLERANCE: f64 = 1e-10;
    pub const HIT_THRESHOLD: f64 = 2.0;

    pub const GOAL_SIZE: DVec2 = DVec2::new(5.0, 60.0);
    pub const CHECKPOINT_SIZE: DVec2 = DVec2::new(10.0, 10.0);
    /// Two seconds at 60 fps
    pub const DIE_TIME: u32 = 120;
    pub const DIE_SKIP_THRESHOLD: u32 = 100;
}
