//! Fixed timestep level update
//!
//! One call to [`tick`] is one frame: player intents and integration, the
//! window sweep with collision resolution after every pixel step, then the
//! death, goal and checkpoint checks.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::level::{Level, LevelStatus};
use super::player::Impact;
use super::resolver::{Death, DeathCause};
use crate::geom::{Push, Rect, clip};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Move left key held
    pub move_left: bool,
    /// Move right key held
    pub move_right: bool,
    /// Jump key went down this frame
    pub jump_pressed: bool,
    /// Jump key is held (without a new press)
    pub jump_held: bool,
    /// Requested window movement in whole pixels
    pub window_delta: IVec2,
    /// Restart from the current checkpoint
    pub reset: bool,
    /// Skip the rest of the death animation
    pub skip: bool,
}

/// Something that happened during a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelEvent {
    Jumped,
    /// A velocity change big enough to be heard
    Hit(Impact),
    Died(Death),
    /// The player was put back at the current checkpoint
    Respawned,
    Checkpoint(usize),
    Won,
}

/// What a frame did, for the presentation layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub events: Vec<LevelEvent>,
    pub on_ground: bool,
}

impl FrameReport {
    pub fn death(&self) -> Option<Death> {
        self.events.iter().find_map(|e| match e {
            LevelEvent::Died(d) => Some(*d),
            _ => None,
        })
    }

    pub fn won(&self) -> bool {
        self.events.contains(&LevelEvent::Won)
    }

    pub fn respawned(&self) -> bool {
        self.events.contains(&LevelEvent::Respawned)
    }
}

/// Advance the level by one frame
pub fn tick(level: &mut Level, input: &TickInput) -> FrameReport {
    let mut report = FrameReport::default();
    if level.is_paused() {
        return report;
    }

    match level.status() {
        LevelStatus::Won => return report,
        LevelStatus::Dying { ticks_left, .. }
            if input.skip && ticks_left < level.settings().die_skip_threshold =>
        {
            respawn(level, &mut report);
        }
        _ if input.reset => respawn(level, &mut report),
        _ => {}
    }

    if level.is_playing() {
        let (can_move, can_jump) = (level.can_move(), level.can_jump());
        let (player, settings) = level.player_and_settings();
        if can_move {
            if input.move_left {
                player.move_dir(false);
            }
            if input.move_right {
                player.move_dir(true);
            }
        }
        if can_jump {
            if input.jump_pressed {
                if let Some(impact) = player.jump(true, settings) {
                    report.events.push(LevelEvent::Jumped);
                    push_hit(&mut report, impact);
                }
            } else if input.jump_held {
                player.jump(false, settings);
            }
        }
        player.integrate(settings);
    }

    // window sweep, one pixel at a time
    level.vertical = None;
    let delta = if std::mem::take(&mut level.resumed) {
        IVec2::ZERO
    } else {
        let max = level.settings().max_window_steps as i32;
        let clamped = input.window_delta.clamp(IVec2::splat(-max), IVec2::splat(max));
        if clamped != input.window_delta {
            log::debug!("window delta {} truncated to {}", input.window_delta, clamped);
        }
        clamped
    };
    let mut stepped = false;
    for axis in 0..2 {
        for _ in 0..delta[axis].unsigned_abs() {
            stepped = true;
            level.step_window(axis, delta[axis]);
            if level.is_playing() {
                collide(level, &mut report);
            }
        }
    }

    if let LevelStatus::Dying { ticks_left, death } = level.status() {
        let ticks_left = ticks_left.saturating_sub(1);
        if ticks_left == 0 {
            respawn(level, &mut report);
        } else {
            level.set_status(LevelStatus::Dying { ticks_left, death });
        }
        return report;
    }

    if !stepped {
        collide(level, &mut report);
        if !level.is_playing() {
            return report;
        }
    }

    let settings = level.settings();
    let (on_ground_time, launch_speed, bottom) =
        (settings.on_ground_time, settings.launch_speed, settings.resolution.y);
    let oob_spread = settings.death_spread.out_of_bounds;

    if level.vertical == Some(Push::Up) {
        level.player.on_ground = on_ground_time;
    }
    level.player.update_vel(launch_speed);
    report.on_ground = level.player.is_on_ground();

    if level.player.rect.y > bottom {
        let death = Death {
            cause: DeathCause::OutOfBounds,
            spread: oob_spread,
        };
        if level.die(death) {
            report.events.push(LevelEvent::Died(death));
        }
        return report;
    }

    // goal and checkpoints only count where the player touches them inside
    // the window
    let (player, window) = (level.player.rect, level.window());
    let reached = |target: &Rect| {
        clip(&player, target, 0.0).is_some_and(|c| clip(&window, &c, 0.0).is_some())
    };

    if reached(&level.goal()) {
        level.set_status(LevelStatus::Won);
        log::info!("Level {} complete", level.index());
        report.events.push(LevelEvent::Won);
        return report;
    }

    let first = level.current_checkpoint().map_or(0, |c| c + 1);
    let latest = (first..level.checkpoints().len())
        .filter(|&i| reached(&level.checkpoints()[i]))
        .last();
    if let Some(i) = latest {
        level.set_checkpoint(i);
        log::debug!("Checkpoint {i} reached");
        report.events.push(LevelEvent::Checkpoint(i));
    }

    report
}

fn collide(level: &mut Level, report: &mut FrameReport) {
    let res = level.handle_collisions();
    for impact in res.impacts {
        push_hit(report, impact);
    }
    if let Some(death) = res.death {
        report.events.push(LevelEvent::Died(death));
    }
}

fn push_hit(report: &mut FrameReport, impact: Impact) {
    if impact.hit {
        report.events.push(LevelEvent::Hit(impact));
    }
}

fn respawn(level: &mut Level, report: &mut FrameReport) {
    level.reset();
    report.events.push(LevelEvent::Respawned);
}
