//! Exact swept collision handling for rigid bodies
//!
//! Bodies are rigid collections of axis-aligned solid lines: no rotation, no
//! deformation. Collision times are computed exactly, so nothing tunnels
//! through thin walls and falling bodies land on the ground rather than
//! hovering above it.

pub mod body;
pub mod handler;
pub mod impulse;
pub mod listener;
mod overlap;
pub mod shape;

pub use body::{Body, BodyId, Dynamics, Mass};
pub use handler::{CollisionHandler, DEFAULT_MAX_PASSES};
pub use listener::{Contact, ContactListener, ContactResponse, Verdict};
pub use shape::{Direction, LineArena, LineId, Lines, Segment, Shape, ShapeKind, ShapeView};
