//! Physical properties of colliding bodies

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Stable handle to a body inside a [`CollisionHandler`](super::CollisionHandler)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mass of a moving body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mass {
    /// Positive, non-zero
    Finite(f64),
    /// Moves but is never deflected (a moving platform)
    Infinite,
}

impl Mass {
    pub fn finite(self) -> Option<f64> {
        match self {
            Mass::Finite(m) => Some(m),
            Mass::Infinite => None,
        }
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Mass::Infinite)
    }
}

/// Mass and velocity of a body that moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dynamics {
    pub mass: Mass,
    pub vel: DVec2,
}

/// Collision properties of a body
///
/// When two bodies collide, the product of their elasticities is the fraction
/// of closing speed kept (0 = no bounce, 1 = no loss) and the product of their
/// frictions bounds the loss of sliding speed. Bodies only interact if their
/// layer masks share a bit: layer 0 collides with nothing, `u32::MAX` with
/// everything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub elasticity: f64,
    pub friction: f64,
    pub layer: u32,
    /// `None` for immovable bodies
    pub dynamics: Option<Dynamics>,
}

impl Body {
    /// A body that never moves
    pub fn fixed() -> Self {
        Self {
            elasticity: 0.0,
            friction: 0.0,
            layer: 1,
            dynamics: None,
        }
    }

    /// A body that moves with `vel` each update
    pub fn moving(mass: Mass, vel: DVec2) -> Self {
        if let Mass::Finite(m) = mass {
            debug_assert!(m > 0.0, "mass must be positive");
        }
        Self {
            dynamics: Some(Dynamics { mass, vel }),
            ..Self::fixed()
        }
    }

    pub fn with_elasticity(mut self, elasticity: f64) -> Self {
        self.elasticity = elasticity;
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.dynamics.is_none()
    }

    /// Current velocity (zero for static bodies)
    #[inline]
    pub fn vel(&self) -> DVec2 {
        self.dynamics.map_or(DVec2::ZERO, |d| d.vel)
    }

    /// Set the velocity of a moving body; ignored for static ones
    pub fn set_vel(&mut self, vel: DVec2) {
        if let Some(d) = self.dynamics.as_mut() {
            d.vel = vel;
        }
    }

    /// Mass, with static bodies counting as infinite
    pub fn mass(&self) -> Mass {
        self.dynamics.map_or(Mass::Infinite, |d| d.mass)
    }

    #[inline]
    pub fn interacts_with(&self, other: &Body) -> bool {
        self.layer & other.layer != 0
    }

    /// Momentum (zero for anything of infinite mass)
    pub fn momentum(&self) -> DVec2 {
        match self.dynamics {
            Some(Dynamics { mass: Mass::Finite(m), vel }) => vel * m,
            _ => DVec2::ZERO,
        }
    }
}
