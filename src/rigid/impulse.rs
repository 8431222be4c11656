//! Velocity response to a single collision
//!
//! Along the collision axis velocities follow the 1D restitution formulas;
//! across it friction removes sliding speed in proportion to the normal
//! velocity change, never reversing the slide.

use glam::DVec2;

use super::body::Mass;
use super::listener::ContactResponse;
use crate::geom::Axis;

/// New velocities and the first body's momentum change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub vel1: DVec2,
    pub vel2: DVec2,
    pub impulse: f64,
}

/// Resolve a collision along `axis` between two bodies
///
/// Static bodies are passed as infinite mass with zero velocity. Two
/// infinite masses never exchange anything.
pub fn respond(axis: Axis, response: ContactResponse, m1: Mass, u1: DVec2, m2: Mass, u2: DVec2) -> Outcome {
    match (m1, m2) {
        (Mass::Finite(m1), Mass::Finite(m2)) => two_body(axis, response, m1, u1, m2, u2),
        (Mass::Finite(m1), Mass::Infinite) => {
            let (vel1, impulse) = against_unyielding(axis, response, m1, u1, u2);
            Outcome { vel1, vel2: u2, impulse }
        }
        (Mass::Infinite, Mass::Finite(m2)) => {
            let (vel2, impulse) = against_unyielding(axis, response, m2, u2, u1);
            Outcome { vel1: u1, vel2, impulse }
        }
        (Mass::Infinite, Mass::Infinite) => Outcome {
            vel1: u1,
            vel2: u2,
            impulse: 0.0,
        },
    }
}

/// A finite mass `m` moving at `u` hits something moving at `w` that cannot
/// be deflected
fn against_unyielding(axis: Axis, response: ContactResponse, m: f64, u: DVec2, w: DVec2) -> (DVec2, f64) {
    let ContactResponse { elasticity: e, friction: f } = response;
    let perp = 1 - axis;
    let mut v = u;

    let closing = u[axis] - w[axis];
    v[axis] = w[axis] - e * closing;
    let dv = (closing + e * closing).abs();
    let i_para = m * dv;

    let i_perp = if f != 0.0 {
        let slide = u[perp] - w[perp];
        let d = if slide > 0.0 { 1.0 } else { -1.0 };
        let remaining = (d * slide - f * dv).max(0.0);
        v[perp] = w[perp] + d * remaining;
        m * (v[perp] - u[perp]).abs()
    } else {
        0.0
    };

    (v, i_para.hypot(i_perp))
}

fn two_body(axis: Axis, response: ContactResponse, m1: f64, u1: DVec2, m2: f64, u2: DVec2) -> Outcome {
    let ContactResponse { elasticity: e, friction: f } = response;
    let perp = 1 - axis;
    let (mut v1, mut v2) = (u1, u2);
    let m = m1 + m2;

    let p0 = m1 * u1[axis] + m2 * u2[axis];
    v1[axis] = (p0 + (u2[axis] - u1[axis]) * e * m2) / m;
    v2[axis] = (p0 + (u1[axis] - u2[axis]) * e * m1) / m;
    let i_para = m1 * (v1[axis] - u1[axis]).abs();

    let i_perp = if f != 0.0 {
        // work in the centre-of-mass frame across the axis
        let budget = f * i_para;
        let v0 = (m1 * u1[perp] + m2 * u2[perp]) / m;
        for (mass, v) in [(m1, &mut v1), (m2, &mut v2)] {
            let up = v[perp];
            let d = if up > v0 { 1.0 } else { -1.0 };
            let rel = (d * (up - v0) - budget / mass).max(0.0);
            v[perp] = d * rel + v0;
        }
        m1 * (v1[perp] - u1[perp]).abs()
    } else {
        0.0
    };

    Outcome {
        vel1: v1,
        vel2: v2,
        impulse: i_para.hypot(i_perp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coeffs(elasticity: f64, friction: f64) -> ContactResponse {
        ContactResponse { elasticity, friction }
    }

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_bounce_off_static() {
        let out = respond(1, coeffs(1.0, 0.0), Mass::Finite(2.0), DVec2::new(2.0, 5.0), Mass::Infinite, DVec2::ZERO);
        assert!(close(out.vel1, DVec2::new(2.0, -5.0)));
        assert_eq!(out.vel2, DVec2::ZERO);
        assert!((out.impulse - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_bounce() {
        let out = respond(0, coeffs(0.5, 0.0), Mass::Finite(1.0), DVec2::new(-4.0, 1.0), Mass::Infinite, DVec2::ZERO);
        assert!(close(out.vel1, DVec2::new(2.0, 1.0)));
    }

    #[test]
    fn test_static_friction_reduces_slide() {
        let out = respond(1, coeffs(0.0, 0.5), Mass::Finite(1.0), DVec2::new(4.0, 6.0), Mass::Infinite, DVec2::ZERO);
        assert!(close(out.vel1, DVec2::new(1.0, 0.0)));
        assert!((out.impulse - 6.0f64.hypot(3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_static_friction_never_reverses() {
        let out = respond(1, coeffs(0.0, 1.0), Mass::Finite(1.0), DVec2::new(-2.0, 6.0), Mass::Infinite, DVec2::ZERO);
        assert!(close(out.vel1, DVec2::ZERO));
    }

    #[test]
    fn test_moving_platform_carries_body() {
        // platform rising at 1, body falling at 2
        let out = respond(
            1,
            coeffs(0.0, 0.0),
            Mass::Finite(1.0),
            DVec2::new(0.0, 2.0),
            Mass::Infinite,
            DVec2::new(0.0, -1.0),
        );
        assert!(close(out.vel1, DVec2::new(0.0, -1.0)));
        assert_eq!(out.vel2, DVec2::new(0.0, -1.0));

        // same thing with the roles swapped
        let out = respond(
            1,
            coeffs(0.0, 0.0),
            Mass::Infinite,
            DVec2::new(0.0, -1.0),
            Mass::Finite(1.0),
            DVec2::new(0.0, 2.0),
        );
        assert!(close(out.vel2, DVec2::new(0.0, -1.0)));
    }

    #[test]
    fn test_head_on_equal_masses_swap() {
        let out = respond(0, coeffs(1.0, 0.0), Mass::Finite(1.0), DVec2::new(5.0, 0.0), Mass::Finite(1.0), DVec2::new(-5.0, 0.0));
        assert!(close(out.vel1, DVec2::new(-5.0, 0.0)));
        assert!(close(out.vel2, DVec2::new(5.0, 0.0)));
        assert!((out.impulse - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_inelastic_equal_masses_stop() {
        let out = respond(0, coeffs(0.0, 0.0), Mass::Finite(1.0), DVec2::new(5.0, 0.0), Mass::Finite(1.0), DVec2::new(-5.0, 0.0));
        assert!(close(out.vel1, DVec2::ZERO));
        assert!(close(out.vel2, DVec2::ZERO));
    }

    #[test]
    fn test_two_body_friction_matches_slides() {
        let out = respond(1, coeffs(0.0, 0.5), Mass::Finite(1.0), DVec2::new(2.0, 3.0), Mass::Finite(1.0), DVec2::new(0.0, -3.0));
        assert!(close(out.vel1, DVec2::new(1.0, 0.0)));
        assert!(close(out.vel2, DVec2::new(1.0, 0.0)));
        assert!((out.impulse - 3.0f64.hypot(1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_two_infinite_masses_untouched() {
        let out = respond(0, coeffs(1.0, 1.0), Mass::Infinite, DVec2::X, Mass::Infinite, -DVec2::X);
        assert_eq!(out.vel1, DVec2::X);
        assert_eq!(out.vel2, -DVec2::X);
        assert_eq!(out.impulse, 0.0);
    }

    proptest! {
        #[test]
        fn elastic_collision_conserves_momentum_and_energy(
            m1 in 0.1f64..100.0,
            m2 in 0.1f64..100.0,
            u1 in -50.0f64..50.0,
            u2 in -50.0f64..50.0,
        ) {
            let out = respond(0, coeffs(1.0, 0.0), Mass::Finite(m1), DVec2::new(u1, 0.0), Mass::Finite(m2), DVec2::new(u2, 0.0));
            let p_before = m1 * u1 + m2 * u2;
            let p_after = m1 * out.vel1.x + m2 * out.vel2.x;
            prop_assert!((p_before - p_after).abs() <= 1e-9 * (1.0 + p_before.abs().max(m1 * 50.0 + m2 * 50.0)));
            let ke_before = 0.5 * (m1 * u1 * u1 + m2 * u2 * u2);
            let ke_after = 0.5 * (m1 * out.vel1.x.powi(2) + m2 * out.vel2.x.powi(2));
            prop_assert!((ke_before - ke_after).abs() <= 1e-6 * (1.0 + ke_before));
        }

        #[test]
        fn inelastic_collision_loses_energy(
            m1 in 0.1f64..100.0,
            m2 in 0.1f64..100.0,
            u1 in 1.0f64..50.0,
            u2 in -50.0f64..-1.0,
            e in 0.0f64..0.99,
        ) {
            // u1 > u2, so the bodies are closing
            let out = respond(0, coeffs(e, 0.0), Mass::Finite(m1), DVec2::new(u1, 0.0), Mass::Finite(m2), DVec2::new(u2, 0.0));
            let ke_before = m1 * u1 * u1 + m2 * u2 * u2;
            let ke_after = m1 * out.vel1.x.powi(2) + m2 * out.vel2.x.powi(2);
            prop_assert!(ke_after < ke_before);
            let p_before = m1 * u1 + m2 * u2;
            let p_after = m1 * out.vel1.x + m2 * out.vel2.x;
            prop_assert!((p_before - p_after).abs() <= 1e-9 * (1.0 + m1 * 50.0 + m2 * 50.0));
        }
    }
}
