//! Transport collaborator interfaces: the m2n master↔master
//! channel and the intra-participant master↔slaves channel. Both are
//! blocking from the caller's perspective — these traits use
//! plain synchronous `fn`s, not `async fn`s, because every rank in this
//! model is single-threaded with respect to the partitioning core.

pub mod local;

use crate::bbm::BoundingBoxMap;
use crate::error::PartitionError;
use crate::feedback::FeedbackMap;

/// Point-to-point channel between the local master (LM) and the remote
/// master (RM) of the peer participant.
pub trait M2NMasterChannel {
    fn receive_i32(&self) -> Result<i32, PartitionError>;
    fn send_i32(&self, value: i32) -> Result<(), PartitionError>;

    fn receive_bounding_box_map(&self, dimensions: usize) -> Result<BoundingBoxMap, PartitionError>;
    fn send_bounding_box_map(&self, bbm: &BoundingBoxMap, dimensions: usize) -> Result<(), PartitionError>;

    fn send_feedback_map(&self, feedback: &FeedbackMap) -> Result<(), PartitionError>;
    fn receive_feedback_map(&self) -> Result<FeedbackMap, PartitionError>;
}

/// One-to-many channel within a single participant, with the local master
/// (LM) as root.
pub trait IntraParticipantChannel {
    fn rank(&self) -> u32;
    fn size(&self) -> u32;

    /// Root-only: fan a value out to every slave.
    fn broadcast_send_i32(&self, value: i32) -> Result<(), PartitionError>;
    /// Non-root-only: receive the value the root broadcast.
    fn broadcast_receive_i32(&self) -> Result<i32, PartitionError>;

    fn broadcast_send_bounding_box_map(&self, bbm: &BoundingBoxMap, dimensions: usize) -> Result<(), PartitionError>;
    fn broadcast_receive_bounding_box_map(&self, dimensions: usize) -> Result<BoundingBoxMap, PartitionError>;

    /// Used for slave→master feedback: a slave sends its
    /// overlap-list length unconditionally, then the list itself only if
    /// non-empty.
    fn send_int(&self, dest: u32, value: i32) -> Result<(), PartitionError>;
    /// Root-only: receive a single int sent by `source`.
    fn receive_int(&self, source: u32) -> Result<i32, PartitionError>;
    fn send_ints(&self, dest: u32, values: &[i32]) -> Result<(), PartitionError>;
    /// Root-only: receive exactly `count` ints sent by `source`.
    fn receive_ints(&self, source: u32, count: usize) -> Result<Vec<i32>, PartitionError>;
}
