//! Error types for the partitioning core.
//!
//! Follows the hand-rolled `Display`/`Error` pattern used throughout this
//! codebase (see `common::scene::SceneLoadError` in the upstream simulator
//! this crate is descended from) rather than pulling in a derive-macro
//! error crate.

use std::fmt;

/// Failure modes that can be surfaced as a `Result` rather than aborting.
///
/// Programmer errors (wrong rank role, negative safety factor, calling
/// `compute_bounding_box` before `communicate_bounding_box` on the master)
/// are *not* represented here: per the protocol's failure semantics those
/// abort via `assert!`/`panic!` at the point of violation instead of
/// unwinding through a `Result`.
#[derive(Debug)]
pub enum PartitionError {
    /// A value supplied at construction or load time violates a
    /// precondition the caller could reasonably have checked first
    /// (e.g. a negative `safety_factor` loaded from a config file).
    Precondition(String),
    /// A send/receive/broadcast on the m2n or intra-participant channel
    /// failed. Fatal to the coupling; never retried at this layer.
    Transport(String),
    /// Malformed wire data encountered while decoding a `BoundingBoxMap`
    /// or `FeedbackMap` (size/rank mismatches, truncated payloads).
    Codec(String),
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionError::Precondition(msg) => write!(f, "precondition violated: {}", msg),
            PartitionError::Transport(msg) => write!(f, "transport error: {}", msg),
            PartitionError::Codec(msg) => write!(f, "codec error: {}", msg),
        }
    }
}

impl std::error::Error for PartitionError {}
