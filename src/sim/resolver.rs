//! Per-frame collision resolution for the player
//!
//! Resolution is swept per axis: the level moves the window one pixel at a
//! time and resolves after each step, so each call only ever has to undo a
//! small overlap. Every overlapping solid pushes the player out along its
//! shallowest axis, toward a side the player came from when it started the
//! frame clear of the solid. A solid the player jumped clean over in one
//! frame pushes it back to the side it entered from. Whatever still overlaps
//! afterwards crushes the player.

use serde::{Deserialize, Serialize};

use super::player::{Impact, Player};
use crate::geom::{Push, Rect, clip, min_penetration, overlaps, penetrations};
use crate::settings::{DeathSpread, Settings};

/// Why the player died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Still overlapping solids after resolution, on the flagged axes
    Crushed { horizontal: bool, vertical: bool },
    /// Fell below the bottom of the screen
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Death {
    pub cause: DeathCause,
    /// Particle spread hint in `0..1`
    pub spread: f64,
}

/// Result of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Last vertical push applied; `Push::Up` means the player stands on
    /// something
    pub vertical: Option<Push>,
    pub impacts: Vec<Impact>,
    pub death: Option<Death>,
}

/// Pushes the player out of solids, clamps it to the screen and detects
/// crushing
#[derive(Debug, Clone)]
pub struct SweptAxisResolver {
    screen_width: f64,
    death_tolerance: f64,
    hit_threshold: f64,
    spread: DeathSpread,
}

impl SweptAxisResolver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            screen_width: settings.resolution.x,
            death_tolerance: settings.death_tolerance,
            hit_threshold: settings.hit_threshold,
            spread: settings.death_spread,
        }
    }

    /// Resolve the player against every rect in `groups`, in order
    pub fn resolve(&self, player: &mut Player, groups: &[&[Rect]]) -> Resolution {
        let mut res = Resolution::default();
        let solids = || groups.iter().flat_map(|g| g.iter());
        let start = player.start_rect();

        for r in solids() {
            let Some((depth, push)) = push_out(&start, &player.rect, r) else {
                continue;
            };
            let axis = push.axis();
            player.rect.shift(axis, push.sign() * depth);
            res.impacts.push(player.impact(axis, 0.0, self.hit_threshold));
            if axis == 1 {
                res.vertical = Some(push);
            }
        }

        let max_x = self.screen_width - player.rect.w;
        if player.rect.x < 0.0 || player.rect.x > max_x {
            player.rect.x = player.rect.x.clamp(0.0, max_x.max(0.0));
            res.impacts.push(player.impact(0, 0.0, self.hit_threshold));
        }

        let (mut horizontal, mut vertical) = (false, false);
        for r in solids() {
            if clip(r, &player.rect, self.death_tolerance).is_some() {
                match min_penetration(&player.rect, r).1.axis() {
                    0 => horizontal = true,
                    _ => vertical = true,
                }
            }
        }
        if horizontal || vertical {
            let spread = match (horizontal, vertical) {
                (true, true) => self.spread.both_axes,
                (true, false) => self.spread.horizontal,
                _ => self.spread.vertical,
            };
            res.death = Some(Death {
                cause: DeathCause::Crushed { horizontal, vertical },
                spread,
            });
        }
        res
    }
}

/// How far and which way to move `now` out of `solid`, given the frame
/// started at `start`
fn push_out(start: &Rect, now: &Rect, solid: &Rect) -> Option<(f64, Push)> {
    if !overlaps(solid, now) {
        return passed_through(start, now, solid);
    }
    // sides of the solid the player started fully outside of
    let clear = [
        start.right() <= solid.left(),
        start.bottom() <= solid.top(),
        start.left() >= solid.right(),
        start.top() >= solid.bottom(),
    ];
    if !clear.contains(&true) {
        return Some(min_penetration(now, solid));
    }
    let depths = penetrations(now, solid);
    Push::ALL
        .into_iter()
        .filter(|&p| clear[p as usize])
        .map(|p| (depths[p as usize], p))
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

/// Push back to the entry side when the straight move from `start` to `now`
/// crossed all of `solid` on some axis
fn passed_through(start: &Rect, now: &Rect, solid: &Rect) -> Option<(f64, Push)> {
    let travel = now.pos() - start.pos();
    let mut entry: Option<(f64, Push)> = None;
    for axis in 0..2 {
        let d = travel[axis];
        let crossing = if d > 0.0 && start.end(axis) <= solid.start(axis) && now.start(axis) >= solid.end(axis) {
            ((solid.start(axis) - start.end(axis)) / d, if axis == 0 { Push::Left } else { Push::Up })
        } else if d < 0.0 && start.start(axis) >= solid.end(axis) && now.end(axis) <= solid.start(axis) {
            ((solid.end(axis) - start.start(axis)) / d, if axis == 0 { Push::Right } else { Push::Down })
        } else {
            continue;
        };
        if entry.is_none_or(|(t, _)| crossing.0 > t) {
            entry = Some(crossing);
        }
    }

    let (t, push) = entry?;
    let axis = push.axis();
    let other = 1 - axis;
    // the other axis must overlap at the moment of entry
    let at = start.translated(travel * t);
    if at.end(other) <= solid.start(other) || solid.end(other) <= at.start(other) {
        return None;
    }
    let depth = if push.sign() < 0.0 {
        now.end(axis) - solid.start(axis)
    } else {
        solid.end(axis) - now.start(axis)
    };
    Some((depth, push))
}
