//! Pushing overlapping bodies apart after a discontinuous change
//!
//! Each shape is treated as its bounding rectangle. The smallest push that
//! separates any overlapping pair is applied first; a `(pushed, other, axis)`
//! push is never repeated, so a scene that keeps overlapping once every
//! distinct push has been tried is reported as unresolvable.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec2;

use super::body::BodyId;
use super::shape::{LineArena, Lines, PlacedShape, ShapeView};
use crate::error::{Error, Result};
use crate::geom::Axis;

/// What the separation pass needs to know about one body
pub(crate) struct Participant<'a> {
    pub id: BodyId,
    pub shape: &'a PlacedShape,
    pub layer: u32,
    pub moving: bool,
    pub infinite: bool,
}

struct Candidate {
    depth: f64,
    shift: DVec2,
    axis: Axis,
    pushed: usize,
    other: usize,
}

/// Move moving bodies until no two interacting bodies overlap
///
/// Moving participants must come first in `bodies`. Returns the body that
/// could not be freed on failure; shapes keep whatever pushes were applied.
pub(crate) fn separate(bodies: &[Participant<'_>], arena: &mut LineArena) -> Result<()> {
    let mut resolved: BTreeMap<usize, BTreeSet<(usize, Axis)>> = BTreeMap::new();
    let mut pushes = 0usize;

    loop {
        let mut overlaps = find_overlaps(bodies, arena);
        if overlaps.is_empty() {
            if pushes > 0 {
                log::debug!("separated overlapping bodies with {pushes} pushes");
            }
            return Ok(());
        }
        overlaps.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        let mut chosen = None;
        for c in overlaps.iter() {
            let done = |s: usize, o: usize| resolved.get(&s).is_some_and(|r| r.contains(&(o, c.axis)));
            if !done(c.pushed, c.other) {
                chosen = Some((c.pushed, c.other, c.shift, c.axis));
                break;
            }
            if bodies[c.other].moving && !done(c.other, c.pushed) {
                chosen = Some((c.other, c.pushed, -c.shift, c.axis));
                break;
            }
        }

        let Some((pushed, other, shift, axis)) = chosen else {
            let body = bodies[overlaps[0].pushed].id;
            log::warn!("cannot separate {body} from {}", bodies[overlaps[0].other].id);
            return Err(Error::UnresolvableOverlap { body });
        };

        bodies[pushed].shape.translate(arena, shift);
        resolved.entry(pushed).or_default().insert((other, axis));
        pushes += 1;
    }
}

fn find_overlaps(bodies: &[Participant<'_>], arena: &LineArena) -> Vec<Candidate> {
    let bounds: Vec<_> = bodies
        .iter()
        .map(|p| ShapeView { shape: p.shape, arena }.bounds())
        .collect();

    let mut overlaps = Vec::new();
    for (i, b1) in bodies.iter().enumerate() {
        if !b1.moving {
            continue;
        }
        for (j, b2) in bodies.iter().enumerate() {
            // each moving pair once, and never a body against itself
            if b2.moving && j <= i {
                continue;
            }
            if b1.layer & b2.layer == 0 || (b1.infinite && b2.infinite) {
                continue;
            }
            let (r1, r2) = (&bounds[i], &bounds[j]);
            let depths = [
                r2.right() - r1.left(),
                r2.bottom() - r1.top(),
                r1.right() - r2.left(),
                r1.bottom() - r2.top(),
            ];
            if depths.iter().copied().fold(f64::INFINITY, f64::min) <= 0.0 {
                continue;
            }
            for (k, &depth) in depths.iter().enumerate() {
                let axis = k % 2;
                let mut shift = DVec2::ZERO;
                shift[axis] = if k < 2 { depth } else { -depth };
                overlaps.push(Candidate {
                    depth,
                    shift,
                    axis,
                    pushed: i,
                    other: j,
                });
            }
        }
    }
    overlaps
}
