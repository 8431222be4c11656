//! Collision callbacks
//!
//! Listeners see bodies only through shared references, so they cannot change
//! positions or velocities while the handler is mid-update.

use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId};
use super::shape::Direction;

/// Two lines in (or about to be in) contact
///
/// `direction` is the solid side of `body1`'s line; `body2`'s line faces the
/// opposite way. `line1`/`line2` index the lines of that direction in each
/// body's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Contact {
    pub direction: Direction,
    pub body1: BodyId,
    pub line1: usize,
    pub body2: BodyId,
    pub line2: usize,
}

impl Contact {
    /// Same contact seen from the other body
    pub fn reversed(&self) -> Contact {
        Contact {
            direction: self.direction.opposite(),
            body1: self.body2,
            line1: self.line2,
            body2: self.body1,
            line2: self.line1,
        }
    }

    pub fn involves(&self, body: BodyId) -> bool {
        self.body1 == body || self.body2 == body
    }
}

/// Combined coefficients used for one collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResponse {
    pub elasticity: f64,
    pub friction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Resolve the collision
    Handle,
    /// Let the pair pass through each other this time
    Skip,
}

/// Observer hooks for [`CollisionHandler`](super::CollisionHandler)
///
/// Every method has a no-op default.
pub trait ContactListener {
    /// Called before a collision is resolved, in time order. May veto it or
    /// adjust the coefficients used for this contact only.
    fn before_collision(
        &mut self,
        _contact: &Contact,
        _bodies: (&Body, &Body),
        _response: &mut ContactResponse,
    ) -> Verdict {
        Verdict::Handle
    }

    /// Called after a collision with the magnitude of the first body's change
    /// in momentum (friction included)
    fn after_collision(&mut self, _contact: &Contact, _bodies: (&Body, &Body), _impulse: f64) {}

    /// Called once per update for every pair still in contact at the end
    fn touching(&mut self, _contact: &Contact) {}
}

impl ContactListener for () {}
