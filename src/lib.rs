//! Received-bounding-box partitioning core for a parallel multi-physics
//! coupling runtime.
//!
//! Two independently parallelized simulation codes (participants) must
//! learn, before any field exchange, which ranks on the other side own
//! mesh data that geometrically overlaps their own subdomain. This crate
//! implements that connectivity discovery: a two-level (master↔slaves
//! within a participant, master↔master between participants) collective
//! protocol culminating in a per-rank feedback map of overlapping remote
//! ranks.
//!
//! ## Module map
//!
//! - [`geometry`]: bounding boxes, local-BB construction with safety-factor
//!   dilation, and the overlap predicate.
//! - [`bbm`] / [`feedback`]: the two wire value types and their codecs.
//! - [`mesh`]: the read-only mesh/mapping collaborator interfaces.
//! - [`channel`]: the m2n and intra-participant transport interfaces, plus
//!   an in-process implementation used by tests and the demo binary.
//! - [`protocol`]: `ReceivedBoundingBox`, the two-phase protocol driver.
//! - [`config`]: loading the one tunable (`safety_factor`) from TOML.
//! - [`error`]: the crate's error type.

pub mod bbm;
pub mod channel;
pub mod config;
pub mod error;
pub mod feedback;
pub mod geometry;
pub mod mesh;
pub mod protocol;

pub use bbm::BoundingBoxMap;
pub use error::PartitionError;
pub use feedback::FeedbackMap;
pub use geometry::{overlapping, prepare_bounding_box, BoundingBox};
pub use protocol::{ReceivedBoundingBox, Role};
