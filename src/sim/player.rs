//! The player avatar: intents, integration and velocity smoothing

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geom::{Axis, Rect};
use crate::settings::Settings;

/// A velocity change on one axis, reported so the presentation layer can play
/// hit sounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub axis: Axis,
    /// New velocity minus old velocity
    pub delta: f64,
    /// `|delta|` reached the hit threshold
    pub hit: bool,
}

impl Impact {
    pub fn new(axis: Axis, delta: f64, threshold: f64) -> Self {
        Self {
            axis,
            delta,
            hit: delta.abs() >= threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub rect: Rect,
    pub vel: DVec2,
    /// Frames left during which the player counts as grounded
    pub on_ground: u32,
    /// Frames left in the current jump
    pub jumping: u32,
    /// Jump key held this frame during a jump
    pub jumped: bool,
    /// Position at the last velocity smoothing
    old_pos: DVec2,
    /// Net movement intent gathered this frame
    to_move: i32,
}

impl Player {
    pub fn new(pos: DVec2, size: DVec2) -> Self {
        Self {
            rect: Rect::from_pos_size(pos, size),
            vel: DVec2::ZERO,
            on_ground: 0,
            jumping: 0,
            jumped: false,
            old_pos: pos,
            to_move: 0,
        }
    }

    #[inline]
    pub fn is_on_ground(&self) -> bool {
        self.on_ground > 0
    }

    /// Where the player was at the end of the previous frame
    pub fn start_rect(&self) -> Rect {
        Rect::from_pos_size(self.old_pos, self.rect.size())
    }

    /// Register a movement intent for this frame
    pub fn move_dir(&mut self, right: bool) {
        self.to_move += if right { 1 } else { -1 };
    }

    /// Jump key input: `press` for the initial press, otherwise the key is
    /// being held
    ///
    /// Returns the impact of the initial jump impulse, if one was applied.
    pub fn jump(&mut self, press: bool, settings: &Settings) -> Option<Impact> {
        if press {
            if self.is_on_ground() && self.jumping == 0 {
                let delta = -settings.initial_jump;
                self.vel.y += delta;
                self.jumping = settings.jump_time;
                self.on_ground = 0;
                return Some(Impact::new(1, delta, settings.hit_threshold));
            }
        } else if self.jumping > 0 {
            self.jumped = true;
        }
        None
    }

    /// Advance velocity and position by one frame
    pub fn integrate(&mut self, settings: &Settings) {
        let mut vel = self.vel;

        if self.to_move != 0 {
            let speed = if self.is_on_ground() {
                settings.player_speed
            } else {
                settings.player_air_speed
            };
            vel.x += self.to_move.signum() as f64 * speed;
        }
        self.to_move = 0;

        vel.y += settings.gravity;
        if self.is_on_ground() {
            vel.x *= 1.0 - settings.friction;
        }
        vel.x = air_drag(vel.x, settings.air_resistance);
        vel.y = air_drag(vel.y, settings.air_resistance);

        if self.jumped {
            vel.y -= settings.continue_jump;
        }
        self.jumped = false;

        self.vel = vel;
        self.rect = self.rect.translated(vel);
        self.on_ground = self.on_ground.saturating_sub(1);
        self.jumping = self.jumping.saturating_sub(1);
    }

    /// Set the velocity on one axis, reporting the change
    pub fn impact(&mut self, axis: Axis, vel: f64, threshold: f64) -> Impact {
        let delta = vel - self.vel[axis];
        self.vel[axis] = vel;
        Impact::new(axis, delta, threshold)
    }

    /// Pull velocity toward the displacement actually made since the last
    /// call, so being shoved by geometry flings the player
    pub fn update_vel(&mut self, launch_speed: f64) {
        let moved = self.rect.pos() - self.old_pos;
        self.vel += launch_speed * (moved - self.vel);
        self.old_pos = self.rect.pos();
    }
}

/// Quadratic drag toward zero that never flips the sign
fn air_drag(v: f64, k: f64) -> f64 {
    let d = if v > 0.0 { 1.0 } else { -1.0 };
    let v = v - d * k * v * v;
    d * (d * v).max(0.0)
}
