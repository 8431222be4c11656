//! Exact swept collisions between bodies made of axis-aligned lines
//!
//! Each update moves every moving body by its velocity for one time unit. The
//! earliest collision among all converging line pairs is found, everything is
//! advanced to that moment, the collision is resolved, and the scan repeats
//! with the time left until nothing more collides.

use std::collections::BTreeMap;

use glam::DVec2;

use super::body::{Body, BodyId, Mass};
use super::impulse;
use super::listener::{Contact, ContactListener, ContactResponse, Verdict};
use super::overlap::{self, Participant};
use super::shape::{Direction, LineArena, LineId, PlacedShape, Shape, ShapeView};
use crate::error::{Error, Result};

/// Collision passes allowed in one update
pub const DEFAULT_MAX_PASSES: usize = 1000;

struct Entry {
    body: Body,
    shape: PlacedShape,
}

/// A line as seen by the per-direction index
#[derive(Clone, Copy)]
struct LineRef {
    body: BodyId,
    index: usize,
    line: LineId,
    moving: bool,
}

struct Candidate {
    t: f64,
    contact: Contact,
    lines: (LineId, LineId),
    moving2: bool,
    /// The lines only meet end to end at `t`
    corner: bool,
}

/// Owns every body and advances the moving ones
pub struct CollisionHandler<L: ContactListener = ()> {
    bodies: BTreeMap<BodyId, Entry>,
    arena: LineArena,
    next_id: u32,
    /// Receives collision and contact callbacks
    pub listener: L,
    /// Largest gap at which two lines still count as touching
    pub tolerance: f64,
    pub max_passes: usize,
    moving: Vec<BodyId>,
    lines: [Vec<LineRef>; 4],
    touching: BTreeMap<Contact, (LineId, LineId)>,
    /// Bodies were added, removed or teleported since the last reinit
    stale: bool,
}

impl Default for CollisionHandler<()> {
    fn default() -> Self {
        Self::new((), 0.0)
    }
}

impl<L: ContactListener> CollisionHandler<L> {
    pub fn new(listener: L, tolerance: f64) -> Self {
        Self {
            bodies: BTreeMap::new(),
            arena: LineArena::new(),
            next_id: 0,
            listener,
            tolerance,
            max_passes: DEFAULT_MAX_PASSES,
            moving: Vec::new(),
            lines: Default::default(),
            touching: BTreeMap::new(),
            stale: false,
        }
    }

    /// Create a handler holding `bodies` and run [`reinit`](Self::reinit)
    pub fn with_bodies(
        bodies: impl IntoIterator<Item = (Shape, Body)>,
        listener: L,
        tolerance: f64,
    ) -> Result<(Self, Vec<BodyId>)> {
        let mut handler = Self::new(listener, tolerance);
        let ids = bodies
            .into_iter()
            .map(|(shape, body)| handler.add_body(shape, body))
            .collect();
        handler.reinit()?;
        Ok((handler, ids))
    }

    /// Add a body; call [`reinit`](Self::reinit) before the next update
    pub fn add_body(&mut self, shape: Shape, body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        let shape = shape.place(&mut self.arena);
        self.bodies.insert(id, Entry { body, shape });
        self.stale = true;
        log::debug!("added body {id}");
        id
    }

    /// Remove a body, returning its current shape and properties
    pub fn remove_body(&mut self, id: BodyId) -> Result<(Shape, Body)> {
        let entry = self.bodies.remove(&id).ok_or(Error::UnknownBody(id))?;
        let shape = entry.shape.snapshot(&self.arena);
        entry.shape.release(&mut self.arena);
        self.touching.retain(|contact, _| !contact.involves(id));
        self.stale = true;
        log::debug!("removed body {id}");
        Ok((shape, entry.body))
    }

    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.bodies.get(&id).map(|e| &e.body).ok_or(Error::UnknownBody(id))
    }

    /// Mutable access to a body's properties
    ///
    /// Velocity and coefficients can change freely between updates. Turning a
    /// static body into a moving one (or back) is picked up by the next
    /// update, but only [`reinit`](Self::reinit) refreshes resting contacts.
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body> {
        self.bodies.get_mut(&id).map(|e| &mut e.body).ok_or(Error::UnknownBody(id))
    }

    pub fn shape(&self, id: BodyId) -> Result<ShapeView<'_>> {
        let entry = self.bodies.get(&id).ok_or(Error::UnknownBody(id))?;
        Ok(ShapeView {
            shape: &entry.shape,
            arena: &self.arena,
        })
    }

    /// Teleport a body; call [`reinit`](Self::reinit) before the next update
    pub fn translate(&mut self, id: BodyId, by: DVec2) -> Result<()> {
        let entry = self.bodies.get(&id).ok_or(Error::UnknownBody(id))?;
        entry.shape.translate(&mut self.arena, by);
        self.stale = true;
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Pairs in contact after the last update or reinit
    pub fn touching_contacts(&self) -> impl Iterator<Item = &Contact> {
        self.touching.keys()
    }

    /// Rebuild caches after bodies were added, removed or moved by hand
    ///
    /// Overlapping bodies are pushed apart first. On
    /// [`Error::UnresolvableOverlap`] the handler is still usable, but some
    /// bodies remain overlapping; what that means for the game is up to the
    /// caller.
    pub fn reinit(&mut self) -> Result<()> {
        self.cache_lines();
        let separated = {
            let mut participants: Vec<_> = self
                .bodies
                .iter()
                .map(|(&id, e)| Participant {
                    id,
                    shape: &e.shape,
                    layer: e.body.layer,
                    moving: !e.body.is_static(),
                    infinite: e.body.mass().is_infinite(),
                })
                .collect();
            participants.sort_by_key(|p| !p.moving);
            overlap::separate(&participants, &mut self.arena)
        };
        self.update_contact();
        separated
    }

    fn cache_lines(&mut self) {
        self.moving = self
            .bodies
            .iter()
            .filter(|(_, e)| !e.body.is_static())
            .map(|(&id, _)| id)
            .collect();
        for dir in Direction::ALL {
            let refs = &mut self.lines[dir.index()];
            refs.clear();
            for (&id, e) in &self.bodies {
                for (index, &line) in e.shape.line_ids(dir).iter().enumerate() {
                    refs.push(LineRef {
                        body: id,
                        index,
                        line,
                        moving: !e.body.is_static(),
                    });
                }
            }
        }
        self.stale = false;
    }

    /// A body was made static or moving through [`body_mut`](Self::body_mut)
    /// since the lines were cached
    fn moving_changed(&self) -> bool {
        let now = self.bodies.iter().filter(|(_, e)| !e.body.is_static()).map(|(&id, _)| id);
        !now.eq(self.moving.iter().copied())
    }

    /// Whether two cached lines may ever collide
    fn can_pair(&self, r1: &LineRef, r2: &LineRef, i: usize, j: usize) -> bool {
        // moving pairs are seen once, from the lower direction
        if (r2.moving && j < i) || r1.body == r2.body {
            return false;
        }
        match (self.bodies.get(&r1.body), self.bodies.get(&r2.body)) {
            (Some(e1), Some(e2)) => {
                let infinite2 = !r2.moving || e2.body.mass().is_infinite();
                e1.body.interacts_with(&e2.body) && !(e1.body.mass().is_infinite() && infinite2)
            }
            _ => false,
        }
    }

    fn update_contact(&mut self) {
        self.touching.clear();
        for dir in Direction::ALL {
            let (i, j) = (dir.index(), dir.opposite().index());
            for r1 in self.lines[i].iter().filter(|r| r.moving) {
                let a = self.arena.get(r1.line);
                for r2 in &self.lines[j] {
                    if !self.can_pair(r1, r2, i, j) {
                        continue;
                    }
                    let b = self.arena.get(r2.line);
                    if (a.perp - b.perp).abs() <= self.tolerance && a.spans_overlap(&b) {
                        let contact = Contact {
                            direction: dir,
                            body1: r1.body,
                            line1: r1.index,
                            body2: r2.body,
                            line2: r2.index,
                        };
                        self.touching.insert(contact, (r1.line, r2.line));
                    }
                }
            }
        }
    }

    fn vel(&self, id: BodyId) -> DVec2 {
        self.bodies.get(&id).map_or(DVec2::ZERO, |e| e.body.vel())
    }

    /// Every collision that would happen if all moving bodies travelled
    /// `frac` of their velocity in a straight line
    fn find_candidates(&self, frac: f64) -> Vec<Candidate> {
        let mut found = Vec::new();
        for dir in Direction::ALL {
            let (i, j) = (dir.index(), dir.opposite().index());
            let axis = dir.axis();
            let sign = dir.sign();
            for r1 in self.lines[i].iter().filter(|r| r.moving) {
                let v1 = self.vel(r1.body) * frac;
                let (v1pr, v1pl) = (sign * v1[axis], v1[1 - axis]);
                let l1 = self.arena.get(r1.line);
                let l10pr = sign * l1.perp;
                let l11pr = l10pr + v1pr;

                for r2 in &self.lines[j] {
                    if !self.can_pair(r1, r2, i, j) {
                        continue;
                    }
                    let v2 = if r2.moving { self.vel(r2.body) * frac } else { DVec2::ZERO };
                    let (v2pr, v2pl) = (sign * v2[axis], v2[1 - axis]);
                    // not closing
                    if v1pr <= v2pr {
                        continue;
                    }
                    let l2 = self.arena.get(r2.line);
                    let l20pr = sign * l2.perp;
                    let l21pr = l20pr + v2pr;
                    // already past each other, or never meeting this step
                    if l10pr > l20pr || l11pr <= l21pr {
                        continue;
                    }
                    let d = l11pr - l10pr - l21pr + l20pr;
                    if d == 0.0 {
                        continue;
                    }
                    let t = (l20pr - l10pr) / d;
                    let (a0, a1) = (l1.para0 + t * v1pl, l1.para1 + t * v1pl);
                    let (b0, b1) = (l2.para0 + t * v2pl, l2.para1 + t * v2pl);
                    let corner = a1 <= b0 || b1 <= a0;
                    if corner && !self.slides_into(a0, a1, b0, b1, v1pl - v2pl) {
                        continue;
                    }
                    found.push(Candidate {
                        t,
                        contact: Contact {
                            direction: dir,
                            body1: r1.body,
                            line1: r1.index,
                            body2: r2.body,
                            line2: r2.index,
                        },
                        lines: (r1.line, r2.line),
                        moving2: r2.moving,
                        corner,
                    });
                }
            }
        }
        found.sort_by(|a, b| {
            a.t.total_cmp(&b.t)
                .then(a.corner.cmp(&b.corner))
                .then_with(|| a.contact.cmp(&b.contact))
        });
        found
    }

    /// Whether two lines whose spans `a0..a1` and `b0..b1` meet end to end
    /// are sliding into each other at relative speed `rel`
    fn slides_into(&self, a0: f64, a1: f64, b0: f64, b1: f64, rel: f64) -> bool {
        if a1 <= b0 {
            b0 - a1 <= self.tolerance && rel > 0.0
        } else {
            a0 - b1 <= self.tolerance && rel < 0.0
        }
    }

    /// Offer candidates in time order until the listener accepts one
    fn select(&mut self, candidates: Vec<Candidate>) -> Option<(Candidate, ContactResponse)> {
        for c in candidates {
            let (Some(e1), Some(e2)) = (self.bodies.get(&c.contact.body1), self.bodies.get(&c.contact.body2)) else {
                continue;
            };
            let mut response = ContactResponse {
                elasticity: e1.body.elasticity * e2.body.elasticity,
                friction: e1.body.friction * e2.body.friction,
            };
            match self.listener.before_collision(&c.contact, (&e1.body, &e2.body), &mut response) {
                Verdict::Handle => return Some((c, response)),
                Verdict::Skip => continue,
            }
        }
        None
    }

    /// Move every moving body by `frac` of its velocity
    fn advance(&mut self, frac: f64) {
        for id in &self.moving {
            if let Some(e) = self.bodies.get(id) {
                let by = e.body.vel() * frac;
                if by != DVec2::ZERO {
                    e.shape.translate(&mut self.arena, by);
                }
            }
        }
    }

    fn record_touching(&mut self, contact: Contact, lines: (LineId, LineId)) {
        let reversed = contact.reversed();
        if self.touching.contains_key(&reversed) {
            self.touching.insert(reversed, (lines.1, lines.0));
        } else {
            self.touching.insert(contact, lines);
        }
    }

    /// Apply the collision response to the two bodies of `hit`
    fn resolve(&mut self, hit: &Candidate, response: ContactResponse) {
        let Contact { direction, body1, body2, .. } = hit.contact;
        let axis = direction.axis();
        let (Some(b1), Some(b2)) = (self.bodies.get(&body1).map(|e| e.body), self.bodies.get(&body2).map(|e| e.body))
        else {
            return;
        };
        let (m1, u1) = (b1.mass(), b1.vel());
        let (m2, u2) = if hit.moving2 {
            (b2.mass(), b2.vel())
        } else {
            (Mass::Infinite, DVec2::ZERO)
        };

        if hit.moving2 {
            // rounding can leave the lines slightly apart; close the gap by
            // moving whichever body can be deflected
            let gap = self.arena.get(hit.lines.1).perp - self.arena.get(hit.lines.0).perp;
            if gap != 0.0 {
                let (id, amount) = if m1.is_infinite() { (body2, -gap) } else { (body1, gap) };
                if let Some(e) = self.bodies.get(&id) {
                    e.shape.shift(&mut self.arena, axis, amount);
                }
            }
        }

        let out = impulse::respond(axis, response, m1, u1, m2, u2);
        if let Some(e) = self.bodies.get_mut(&body1) {
            e.body.set_vel(out.vel1);
        }
        if hit.moving2 {
            if let Some(e) = self.bodies.get_mut(&body2) {
                e.body.set_vel(out.vel2);
            }
        }

        if let (Some(e1), Some(e2)) = (self.bodies.get(&body1), self.bodies.get(&body2)) {
            self.listener
                .after_collision(&hit.contact, (&e1.body, &e2.body), out.impulse);
        }
    }

    /// Move all moving bodies by their velocities, resolving every collision
    /// on the way
    pub fn update(&mut self) {
        if self.stale {
            log::warn!("bodies changed without reinit; rebuilding line cache");
            self.cache_lines();
        } else if self.moving_changed() {
            log::debug!("bodies started or stopped moving; rebuilding line cache");
            self.cache_lines();
        }

        // every moving body still has `vel * frac` to travel
        let mut frac = 1.0;
        let mut passes = 0;
        loop {
            if passes == self.max_passes {
                log::warn!("collision pass limit ({}) reached; dropping remaining motion", self.max_passes);
                break;
            }
            passes += 1;

            let candidates = self.find_candidates(frac);
            let Some((hit, response)) = self.select(candidates) else {
                self.advance(frac);
                break;
            };

            if hit.t != 0.0 {
                self.advance(frac * hit.t);
                frac *= 1.0 - hit.t;
            }
            self.record_touching(hit.contact, hit.lines);
            self.resolve(&hit, response);
        }

        self.sweep_touching();
    }

    /// Drop pairs that drifted apart and report the rest
    fn sweep_touching(&mut self) {
        let arena = &self.arena;
        let tolerance = self.tolerance;
        let listener = &mut self.listener;
        self.touching.retain(|contact, &mut (l1, l2)| {
            let (a, b) = (arena.get(l1), arena.get(l2));
            let still = (a.perp - b.perp).abs() <= tolerance && a.spans_overlap(&b);
            if still {
                listener.touching(contact);
            }
            still
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Rect, clip};
    use crate::rigid::body::Dynamics;
    use crate::rigid::shape::Lines;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Recorder {
        skip_all: bool,
        before: Vec<Contact>,
        after: Vec<(Contact, f64)>,
        touching: Vec<Contact>,
    }

    impl ContactListener for Recorder {
        fn before_collision(&mut self, contact: &Contact, _: (&Body, &Body), _: &mut ContactResponse) -> Verdict {
            self.before.push(*contact);
            if self.skip_all { Verdict::Skip } else { Verdict::Handle }
        }

        fn after_collision(&mut self, contact: &Contact, _: (&Body, &Body), impulse: f64) {
            self.after.push((*contact, impulse));
        }

        fn touching(&mut self, contact: &Contact) {
            self.touching.push(*contact);
        }
    }

    fn floor() -> (Shape, Body) {
        (Shape::rect(-100.0, 100.0, 100.0, 200.0), Body::fixed().with_elasticity(1.0).with_friction(1.0))
    }

    fn falling_box(vel: DVec2) -> (Shape, Body) {
        (Shape::rect(0.0, 80.0, 10.0, 90.0), Body::moving(Mass::Finite(1.0), vel).with_friction(1.0))
    }

    fn bounds<L: ContactListener>(h: &CollisionHandler<L>, id: BodyId) -> Rect {
        h.shape(id).unwrap().bounds()
    }

    #[test]
    fn test_head_on_elastic_swap() {
        let a = (Shape::rect(0.0, 0.0, 10.0, 10.0), Body::moving(Mass::Finite(1.0), DVec2::new(5.0, 0.0)).with_elasticity(1.0));
        let b = (Shape::rect(15.0, 0.0, 25.0, 10.0), Body::moving(Mass::Finite(1.0), DVec2::new(-5.0, 0.0)).with_elasticity(1.0));
        let (mut h, ids) = CollisionHandler::with_bodies([a, b], Recorder::default(), 0.0).unwrap();
        h.update();

        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::new(-5.0, 0.0));
        assert_eq!(h.body(ids[1]).unwrap().vel(), DVec2::new(5.0, 0.0));
        assert_eq!(bounds(&h, ids[0]).x, 0.0);
        assert_eq!(bounds(&h, ids[1]).x, 15.0);

        assert_eq!(h.listener.after.len(), 1);
        let (contact, impulse) = h.listener.after[0];
        assert!(contact.involves(ids[0]) && contact.involves(ids[1]));
        assert!((impulse - 10.0).abs() < 1e-9);
        // they bounced apart
        assert_eq!(h.touching_contacts().count(), 0);
    }

    #[test]
    fn test_landing_with_friction() {
        let (mut h, ids) =
            CollisionHandler::with_bodies([falling_box(DVec2::new(4.0, 20.0)), floor()], Recorder::default(), 0.0).unwrap();
        h.body_mut(ids[0]).unwrap().elasticity = 0.0;
        h.body_mut(ids[1]).unwrap().friction = 0.25;
        h.update();

        // lands halfway through the step: friction 0.25 * 20 removes 5 of
        // the 4 horizontal speed, so the slide stops
        let r = bounds(&h, ids[0]);
        assert_eq!(r.bottom(), 100.0);
        assert_eq!(r.x, 2.0);
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::ZERO);
        assert_eq!(h.listener.touching.len(), 1);
        assert_eq!(h.listener.touching[0].direction, Direction::Bottom);
    }

    #[test]
    fn test_resting_contact_keeps_touching() {
        let (mut h, ids) =
            CollisionHandler::with_bodies([falling_box(DVec2::new(0.0, 20.0)), floor()], Recorder::default(), 0.0).unwrap();
        h.body_mut(ids[0]).unwrap().elasticity = 0.0;
        h.update();
        h.update();
        assert_eq!(h.listener.after.len(), 1);
        assert_eq!(h.listener.touching.len(), 2);
        assert_eq!(bounds(&h, ids[0]).bottom(), 100.0);

        // lifting off ends the contact
        h.body_mut(ids[0]).unwrap().set_vel(DVec2::new(0.0, -1.0));
        h.update();
        assert_eq!(h.listener.touching.len(), 2);
        assert_eq!(h.touching_contacts().count(), 0);
    }

    #[test]
    fn test_reinit_finds_existing_contact() {
        let resting = (Shape::rect(0.0, 90.0, 10.0, 100.0), Body::moving(Mass::Finite(1.0), DVec2::ZERO));
        let (h, _) = CollisionHandler::with_bodies([resting, floor()], (), 0.0).unwrap();
        assert_eq!(h.touching_contacts().count(), 1);
    }

    #[test]
    fn test_skipped_collision_passes_through() {
        let mut recorder = Recorder::default();
        recorder.skip_all = true;
        let (mut h, ids) = CollisionHandler::with_bodies([falling_box(DVec2::new(0.0, 20.0)), floor()], recorder, 0.0).unwrap();
        h.update();
        assert_eq!(h.listener.before.len(), 1);
        assert!(h.listener.after.is_empty());
        assert_eq!(bounds(&h, ids[0]).y, 100.0);
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::new(0.0, 20.0));
    }

    #[test]
    fn test_listener_can_change_response() {
        struct Bouncy;
        impl ContactListener for Bouncy {
            fn before_collision(&mut self, _: &Contact, _: (&Body, &Body), response: &mut ContactResponse) -> Verdict {
                response.elasticity = 1.0;
                response.friction = 0.0;
                Verdict::Handle
            }
        }
        let (mut h, ids) = CollisionHandler::with_bodies([falling_box(DVec2::new(0.0, 20.0)), floor()], Bouncy, 0.0).unwrap();
        h.update();
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::new(0.0, -20.0));
        assert_eq!(bounds(&h, ids[0]).y, 80.0);
    }

    #[test]
    fn test_layers_pass_through() {
        let (shape, body) = falling_box(DVec2::new(0.0, 20.0));
        let (mut h, ids) = CollisionHandler::with_bodies([(shape, body.with_layer(0b10)), floor()], (), 0.0).unwrap();
        h.update();
        assert_eq!(bounds(&h, ids[0]).y, 100.0);
    }

    #[test]
    fn test_platform_carries_box() {
        let platform = (Shape::rect(0.0, 50.0, 100.0, 60.0), Body::moving(Mass::Infinite, DVec2::new(0.0, -1.0)));
        let crate_box = (Shape::rect(10.0, 40.0, 20.0, 50.0), Body::moving(Mass::Finite(3.0), DVec2::ZERO));
        let (mut h, ids) = CollisionHandler::with_bodies([platform, crate_box], (), 0.0).unwrap();
        for _ in 0..3 {
            h.update();
        }
        assert_eq!(bounds(&h, ids[0]).y, 47.0);
        assert_eq!(bounds(&h, ids[1]).bottom(), 47.0);
        assert_eq!(h.body(ids[1]).unwrap().vel(), DVec2::new(0.0, -1.0));
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::new(0.0, -1.0));
    }

    #[test]
    fn test_platform_ignores_static_bodies() {
        let platform = (Shape::rect(0.0, 50.0, 100.0, 60.0), Body::moving(Mass::Infinite, DVec2::new(0.0, 20.0)));
        let wall = (Shape::rect(0.0, 65.0, 100.0, 70.0), Body::fixed());
        let (mut h, ids) = CollisionHandler::with_bodies([platform, wall], (), 0.0).unwrap();
        h.update();
        assert_eq!(bounds(&h, ids[0]).y, 70.0);
    }

    #[test]
    fn test_reinit_separates_and_reports_failure() {
        let (mut h, ids) = CollisionHandler::with_bodies([falling_box(DVec2::ZERO), floor()], (), 0.0).unwrap();
        h.translate(ids[0], DVec2::new(0.0, 15.0)).unwrap();
        h.reinit().unwrap();
        assert_eq!(bounds(&h, ids[0]).bottom(), 100.0);
        assert_eq!(h.touching_contacts().count(), 1);

        let mut h: CollisionHandler = CollisionHandler::default();
        let boxed = h.add_body(Shape::rect(0.0, 0.0, 10.0, 10.0), Body::moving(Mass::Finite(1.0), DVec2::ZERO));
        h.add_body(Shape::rect(-100.0, -100.0, 2.0, 100.0), Body::fixed());
        h.add_body(Shape::rect(8.0, -100.0, 100.0, 100.0), Body::fixed());
        h.add_body(Shape::rect(-5.0, 100.0, 100.0, 200.0), Body::fixed());
        assert!(matches!(h.reinit(), Err(Error::UnresolvableOverlap { body }) if body == boxed));
    }

    #[test]
    fn test_remove_body() {
        let (mut h, ids) = CollisionHandler::with_bodies(
            [(Shape::rect(0.0, 90.0, 10.0, 100.0), Body::moving(Mass::Finite(1.0), DVec2::ZERO)), floor()],
            (),
            0.0,
        )
        .unwrap();
        assert_eq!(h.touching_contacts().count(), 1);
        let (shape, body) = h.remove_body(ids[1]).unwrap();
        assert_eq!(shape.bounds(), Rect::new(-100.0, 100.0, 200.0, 100.0));
        assert!(body.is_static());
        assert_eq!(h.touching_contacts().count(), 0);
        assert_eq!(h.len(), 1);
        assert!(matches!(h.remove_body(ids[1]), Err(Error::UnknownBody(_))));
        assert!(h.body(ids[1]).is_err());

        // the box now falls freely
        h.reinit().unwrap();
        h.body_mut(ids[0]).unwrap().set_vel(DVec2::new(0.0, 50.0));
        h.update();
        assert_eq!(bounds(&h, ids[0]).y, 140.0);
    }

    #[test]
    fn test_thin_line_stops_fast_box() {
        let line = (Shape::horizontal_line(100.0, -100.0, 100.0), Body::fixed());
        let (mut h, ids) = CollisionHandler::with_bodies([falling_box(DVec2::new(0.0, 500.0)), line], (), 0.0).unwrap();
        h.update();
        assert!((bounds(&h, ids[0]).bottom() - 100.0).abs() < 1e-9);
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::ZERO);
    }

    #[test]
    fn test_box_squeezed_between_walls() {
        // box hits the right wall, bounces into the left one, and so on
        let walls = [
            (Shape::rect(-10.0, 0.0, 0.0, 100.0), Body::fixed().with_elasticity(1.0)),
            (Shape::rect(30.0, 0.0, 40.0, 100.0), Body::fixed().with_elasticity(1.0)),
        ];
        let boxed = (Shape::rect(10.0, 40.0, 20.0, 50.0), Body::moving(Mass::Finite(1.0), DVec2::new(45.0, 0.0)).with_elasticity(1.0));
        let [left, right] = walls;
        let (mut h, ids) = CollisionHandler::with_bodies([boxed, left, right], Recorder::default(), 0.0).unwrap();
        h.update();
        // 10 right, 20 left, 15 right
        assert!((bounds(&h, ids[0]).x - 15.0).abs() < 1e-9);
        assert_eq!(h.listener.after.len(), 2);
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::new(45.0, 0.0));
    }

    #[test]
    fn test_diagonal_corner_hit() {
        let boxed = (Shape::rect(0.0, 0.0, 10.0, 10.0), Body::moving(Mass::Finite(1.0), DVec2::new(20.0, 20.0)));
        let block = (Shape::rect(20.0, 20.0, 30.0, 30.0), Body::fixed());
        let (mut h, ids) = CollisionHandler::with_bodies([boxed, block], Recorder::default(), 0.0).unwrap();
        h.update();

        // stopped on x at the corner, then slid down the block's left face
        assert_eq!(h.listener.after.len(), 1);
        assert_eq!(h.listener.after[0].0.direction, Direction::Right);
        assert_eq!(bounds(&h, ids[0]), Rect::new(10.0, 20.0, 10.0, 10.0));
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::new(0.0, 20.0));
        assert!(clip(&bounds(&h, ids[0]), &bounds(&h, ids[1]), 0.0).is_none());
    }

    #[test]
    fn test_sliding_over_a_seam_does_not_snag() {
        let tiles = [
            (Shape::rect(-100.0, 100.0, 10.0, 200.0), Body::fixed()),
            (Shape::rect(10.0, 100.0, 100.0, 200.0), Body::fixed()),
        ];
        let boxed = (Shape::rect(0.0, 90.0, 10.0, 100.0), Body::moving(Mass::Finite(1.0), DVec2::new(5.0, 1.0)));
        let [left, right] = tiles;
        let (mut h, ids) = CollisionHandler::with_bodies([boxed, left, right], (), 0.0).unwrap();
        h.update();
        assert_eq!(bounds(&h, ids[0]), Rect::new(5.0, 90.0, 10.0, 10.0));
        assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::new(5.0, 0.0));
    }

    #[test]
    fn test_body_made_moving_without_reinit() {
        let (mut h, ids) =
            CollisionHandler::with_bodies([(Shape::rect(0.0, 0.0, 10.0, 10.0), Body::fixed())], (), 0.0).unwrap();
        h.body_mut(ids[0]).unwrap().dynamics = Some(Dynamics {
            mass: Mass::Finite(1.0),
            vel: DVec2::new(3.0, 0.0),
        });
        h.update();
        assert_eq!(bounds(&h, ids[0]).x, 3.0);

        h.body_mut(ids[0]).unwrap().dynamics = None;
        h.update();
        assert_eq!(bounds(&h, ids[0]).x, 3.0);
    }

    #[test]
    fn test_pass_limit_stops_motion() {
        let (mut h, ids) = CollisionHandler::with_bodies([falling_box(DVec2::new(0.0, 20.0)), floor()], (), 0.0).unwrap();
        h.max_passes = 0;
        h.update();
        assert_eq!(bounds(&h, ids[0]).y, 80.0);
    }

    fn kinetic_energy<L: ContactListener>(h: &CollisionHandler<L>, ids: &[BodyId]) -> f64 {
        ids.iter()
            .filter_map(|&id| h.body(id).ok())
            .map(|b| match b.mass() {
                Mass::Finite(m) => 0.5 * m * b.vel().length_squared(),
                Mass::Infinite => 0.0,
            })
            .sum()
    }

    proptest! {
        #[test]
        fn resting_box_never_moves(x in -90.0f64..80.0, frames in 1usize..20) {
            let resting = (Shape::rect(x, 90.0, x + 10.0, 100.0), Body::moving(Mass::Finite(1.0), DVec2::ZERO));
            let (mut h, ids) = CollisionHandler::with_bodies([resting, floor()], (), 0.0).unwrap();
            let before = bounds(&h, ids[0]);
            for _ in 0..frames {
                h.update();
            }
            prop_assert_eq!(bounds(&h, ids[0]), before);
            prop_assert_eq!(h.body(ids[0]).unwrap().vel(), DVec2::ZERO);
        }

        #[test]
        fn no_tunneling_through_floor_or_line(
            x in -80.0f64..70.0,
            y in 0.0f64..80.0,
            vx in -50.0f64..50.0,
            vy in -50.0f64..50.0,
            e in 0.0f64..1.0,
            f in 0.0f64..1.0,
            thin in any::<bool>(),
        ) {
            let obstacle = if thin {
                Shape::horizontal_line(100.0, -1000.0, 1000.0)
            } else {
                Shape::rect(-1000.0, 100.0, 1000.0, 200.0)
            };
            let boxed = (
                Shape::rect(x, y, x + 10.0, y + 10.0),
                Body::moving(Mass::Finite(1.0), DVec2::new(vx, vy)).with_elasticity(e).with_friction(f),
            );
            let ground = (obstacle, Body::fixed().with_elasticity(1.0).with_friction(1.0));
            let (mut h, ids) = CollisionHandler::with_bodies([boxed, ground], (), 0.0).unwrap();
            for _ in 0..5 {
                h.update();
                let r = bounds(&h, ids[0]);
                prop_assert!(r.bottom() <= 100.0 + 1e-9, "box ended at {:?}", r);
            }
        }

        #[test]
        fn diagonal_approach_onto_corner_never_enters(
            v in 1.0f64..50.0,
            reach in 0.0f64..1.0,
            e in 0.0f64..1.0,
            f in 0.0f64..1.0,
        ) {
            // the box's corner travels exactly onto the block's corner
            let g = reach * v;
            let boxed = (
                Shape::rect(0.0, 0.0, 10.0, 10.0),
                Body::moving(Mass::Finite(1.0), DVec2::new(v, v)).with_elasticity(e).with_friction(f),
            );
            let block = (
                Shape::rect(10.0 + g, 10.0 + g, 60.0 + g, 60.0 + g),
                Body::fixed().with_elasticity(1.0).with_friction(1.0),
            );
            let (mut h, ids) = CollisionHandler::with_bodies([boxed, block], (), 1e-9).unwrap();
            for _ in 0..3 {
                h.update();
                let (ra, rb) = (bounds(&h, ids[0]), bounds(&h, ids[1]));
                prop_assert!(clip(&ra, &rb, 1e-6).is_none(), "{:?} overlaps {:?}", ra, rb);
            }
        }

        #[test]
        fn moving_boxes_never_interpenetrate(
            ax in -60.0f64..-20.0,
            bx in 20.0f64..60.0,
            ay in -5.0f64..5.0,
            vax in 0.0f64..50.0,
            vbx in -50.0f64..0.0,
            vay in -5.0f64..5.0,
            m1 in 0.5f64..10.0,
            m2 in 0.5f64..10.0,
            e in 0.0f64..1.0,
        ) {
            let a = (
                Shape::rect(ax, ay, ax + 10.0, ay + 10.0),
                Body::moving(Mass::Finite(m1), DVec2::new(vax, vay)).with_elasticity(e),
            );
            let b = (
                Shape::rect(bx, 0.0, bx + 10.0, 10.0),
                Body::moving(Mass::Finite(m2), DVec2::new(vbx, 0.0)).with_elasticity(1.0),
            );
            let (mut h, ids) = CollisionHandler::with_bodies([a, b], (), 1e-9).unwrap();
            for _ in 0..3 {
                h.update();
                let (ra, rb) = (bounds(&h, ids[0]), bounds(&h, ids[1]));
                prop_assert!(clip(&ra, &rb, 1e-6).is_none(), "{:?} overlaps {:?}", ra, rb);
            }
        }

        #[test]
        fn elastic_head_on_conserves_momentum(
            m1 in 0.5f64..10.0,
            m2 in 0.5f64..10.0,
            u1 in 1.0f64..40.0,
            u2 in -40.0f64..-1.0,
        ) {
            let a = (Shape::rect(0.0, 0.0, 10.0, 10.0), Body::moving(Mass::Finite(m1), DVec2::new(u1, 0.0)).with_elasticity(1.0));
            let b = (Shape::rect(40.0, 0.0, 50.0, 10.0), Body::moving(Mass::Finite(m2), DVec2::new(u2, 0.0)).with_elasticity(1.0));
            let (mut h, ids) = CollisionHandler::with_bodies([a, b], Recorder::default(), 0.0).unwrap();
            let p_before = m1 * u1 + m2 * u2;
            let ke_before = kinetic_energy(&h, &ids);
            h.update();
            let p_after: f64 = ids.iter().map(|&id| h.body(id).unwrap().momentum().x).sum();
            prop_assert!((p_before - p_after).abs() < 1e-9 * (1.0 + 40.0 * (m1 + m2)));
            let ke_after = kinetic_energy(&h, &ids);
            prop_assert!((ke_before - ke_after).abs() < 1e-6 * (1.0 + ke_before));
        }

        #[test]
        fn inelastic_collision_loses_energy(
            m1 in 0.5f64..10.0,
            m2 in 0.5f64..10.0,
            u1 in 1.0f64..40.0,
            u2 in -40.0f64..-1.0,
            e in 0.0f64..0.95,
        ) {
            let a = (Shape::rect(0.0, 0.0, 10.0, 10.0), Body::moving(Mass::Finite(m1), DVec2::new(u1, 0.0)).with_elasticity(e));
            let b = (Shape::rect(40.0, 0.0, 50.0, 10.0), Body::moving(Mass::Finite(m2), DVec2::new(u2, 0.0)).with_elasticity(1.0));
            let (mut h, ids) = CollisionHandler::with_bodies([a, b], Recorder::default(), 0.0).unwrap();
            let ke_before = kinetic_energy(&h, &ids);
            h.update();
            let ke_after = kinetic_energy(&h, &ids);
            if h.listener.after.is_empty() {
                prop_assert!((ke_before - ke_after).abs() < 1e-12);
            } else {
                prop_assert!(ke_after < ke_before);
            }
        }
    }
}
