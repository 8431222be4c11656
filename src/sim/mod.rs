//! Deterministic platformer simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick is one frame)
//! - Stable iteration order (level data order)
//! - No rendering or platform dependencies

pub mod backend;
pub mod level;
pub mod player;
pub mod resolver;
pub mod tick;

pub use backend::{DrawItem, DrawList, DrawResult, GameBackend, Layer, Pausable};
pub use level::{Level, LevelData, LevelStatus};
pub use player::{Impact, Player};
pub use resolver::{Death, DeathCause, Resolution, SweptAxisResolver};
pub use tick::{FrameReport, LevelEvent, TickInput, tick};
