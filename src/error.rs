//! Crate error type
//!
//! Gameplay events (death, collisions, winning) are ordinary state changes and
//! never show up here.

use thiserror::Error;

use crate::rigid::BodyId;

#[derive(Debug, Error)]
pub enum Error {
    /// Overlapping bodies could not all be pushed apart
    #[error("bodies could not be separated; body {body} is still overlapping")]
    UnresolvableOverlap { body: BodyId },

    #[error("no body with id {0}")]
    UnknownBody(BodyId),

    #[error("no level with index {0}")]
    UnknownLevel(usize),

    #[error("invalid level data: {0}")]
    InvalidLevel(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
