//! In-process implementations of the two channel traits, standing in for a
//! real m2n/transport layer in tests and the demo binary.
//!
//! Grounded in the upstream simulator's channel-pair pattern
//! (`simulation::types::{NodeInputQueue, NodesOutputQueue}`): a fixed-size
//! `embassy_sync::channel::Channel` per link, leaked to `'static` exactly as
//! that codebase leaks its per-node radio queues ("provides `'static`
//! lifetimes... these queues live for the entire simulation lifetime").
//! Every rank here is driven synchronously rather than as an Embassy task,
//! so the async channel operations are resolved with `futures::executor::block_on`
//! to present a blocking interface to callers.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures::executor::block_on;

use crate::bbm::{self, BoundingBoxMap};
use crate::channel::{IntraParticipantChannel, M2NMasterChannel};
use crate::error::PartitionError;
use crate::feedback::{self, FeedbackMap};

const LINK_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
enum M2NWireMsg {
    Int(i32),
    Bbm(Vec<u8>),
    Feedback(Vec<u8>),
}

type M2NLink = Channel<CriticalSectionRawMutex, M2NWireMsg, LINK_CAPACITY>;

/// One side of an in-process m2n link. Construct a pair with
/// [`LocalM2NChannel::pair`]; one end plays the local master, the other the
/// remote master.
pub struct LocalM2NChannel {
    outbound: &'static M2NLink,
    inbound: &'static M2NLink,
}

impl LocalM2NChannel {
    /// Build both ends of a link at once. `(a, b)`: what `a` sends, `b`
    /// receives, and vice versa.
    pub fn pair() -> (LocalM2NChannel, LocalM2NChannel) {
        let a_to_b: &'static M2NLink = Box::leak(Box::new(Channel::new()));
        let b_to_a: &'static M2NLink = Box::leak(Box::new(Channel::new()));

        let a = LocalM2NChannel {
            outbound: a_to_b,
            inbound: b_to_a,
        };
        let b = LocalM2NChannel {
            outbound: b_to_a,
            inbound: a_to_b,
        };
        (a, b)
    }
}

impl M2NMasterChannel for LocalM2NChannel {
    fn receive_i32(&self) -> Result<i32, PartitionError> {
        match block_on(self.inbound.receive()) {
            M2NWireMsg::Int(v) => Ok(v),
            other => Err(PartitionError::Transport(format!("expected Int on m2n channel, got {:?}", other))),
        }
    }

    fn send_i32(&self, value: i32) -> Result<(), PartitionError> {
        block_on(self.outbound.send(M2NWireMsg::Int(value)));
        Ok(())
    }

    fn receive_bounding_box_map(&self, dimensions: usize) -> Result<BoundingBoxMap, PartitionError> {
        match block_on(self.inbound.receive()) {
            M2NWireMsg::Bbm(bytes) => bbm::decode(&bytes, dimensions),
            other => Err(PartitionError::Transport(format!("expected Bbm on m2n channel, got {:?}", other))),
        }
    }

    fn send_bounding_box_map(&self, bbm_value: &BoundingBoxMap, dimensions: usize) -> Result<(), PartitionError> {
        let bytes = bbm::encode(bbm_value, dimensions);
        block_on(self.outbound.send(M2NWireMsg::Bbm(bytes)));
        Ok(())
    }

    fn send_feedback_map(&self, feedback_value: &FeedbackMap) -> Result<(), PartitionError> {
        let bytes = feedback::encode(feedback_value);
        block_on(self.outbound.send(M2NWireMsg::Feedback(bytes)));
        Ok(())
    }

    fn receive_feedback_map(&self) -> Result<FeedbackMap, PartitionError> {
        match block_on(self.inbound.receive()) {
            M2NWireMsg::Feedback(bytes) => feedback::decode(&bytes),
            other => Err(PartitionError::Transport(format!("expected Feedback on m2n channel, got {:?}", other))),
        }
    }
}

#[derive(Debug, Clone)]
enum IntraDownMsg {
    Int(i32),
    Bbm(Vec<u8>),
}

#[derive(Debug, Clone)]
enum IntraUpMsg {
    Int(i32),
    Ints(Vec<i32>),
}

type DownLink = Channel<CriticalSectionRawMutex, IntraDownMsg, LINK_CAPACITY>;
type UpLink = Channel<CriticalSectionRawMutex, IntraUpMsg, LINK_CAPACITY>;

/// A complete in-process intra-participant network for `size` ranks.
/// Rank 0 is the master; ranks `1..size` are slaves.
pub struct LocalIntraNetwork {
    downs: Vec<&'static DownLink>,
    ups: Vec<&'static UpLink>,
    size: u32,
}

impl LocalIntraNetwork {
    pub fn new(size: u32) -> Self {
        assert!(size >= 1, "participant size must be at least 1");
        let downs = (0..size).map(|_| Box::leak(Box::new(Channel::new())) as &'static DownLink).collect();
        let ups = (0..size).map(|_| Box::leak(Box::new(Channel::new())) as &'static UpLink).collect();
        LocalIntraNetwork { downs, ups, size }
    }

    pub fn endpoint(&self, rank: u32) -> LocalIntraEndpoint {
        assert!(rank < self.size, "rank {} out of range for size {}", rank, self.size);
        LocalIntraEndpoint {
            rank,
            size: self.size,
            downs: self.downs.clone(),
            ups: self.ups.clone(),
        }
    }
}

/// One rank's view of a [`LocalIntraNetwork`]. The master's endpoint (rank
/// 0) can reach every `down`/`up` link; a slave's endpoint only uses its
/// own pair, but holds references to all of them so the type is uniform.
#[derive(Clone)]
pub struct LocalIntraEndpoint {
    rank: u32,
    size: u32,
    downs: Vec<&'static DownLink>,
    ups: Vec<&'static UpLink>,
}

impl LocalIntraEndpoint {
    fn is_root(&self) -> bool {
        self.rank == 0
    }
}

impl IntraParticipantChannel for LocalIntraEndpoint {
    fn rank(&self) -> u32 {
        self.rank
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn broadcast_send_i32(&self, value: i32) -> Result<(), PartitionError> {
        if !self.is_root() {
            return Err(PartitionError::Transport("broadcast_send_i32 called on a non-root rank".into()));
        }
        for slave in 1..self.size {
            block_on(self.downs[slave as usize].send(IntraDownMsg::Int(value)));
        }
        Ok(())
    }

    fn broadcast_receive_i32(&self) -> Result<i32, PartitionError> {
        if self.is_root() {
            return Err(PartitionError::Transport("broadcast_receive_i32 called on the root rank".into()));
        }
        match block_on(self.downs[self.rank as usize].receive()) {
            IntraDownMsg::Int(v) => Ok(v),
            other => Err(PartitionError::Transport(format!("expected Int on intra channel, got {:?}", other))),
        }
    }

    fn broadcast_send_bounding_box_map(&self, bbm_value: &BoundingBoxMap, dimensions: usize) -> Result<(), PartitionError> {
        if !self.is_root() {
            return Err(PartitionError::Transport("broadcast_send_bounding_box_map called on a non-root rank".into()));
        }
        let bytes = bbm::encode(bbm_value, dimensions);
        for slave in 1..self.size {
            block_on(self.downs[slave as usize].send(IntraDownMsg::Bbm(bytes.clone())));
        }
        Ok(())
    }

    fn broadcast_receive_bounding_box_map(&self, dimensions: usize) -> Result<BoundingBoxMap, PartitionError> {
        if self.is_root() {
            return Err(PartitionError::Transport("broadcast_receive_bounding_box_map called on the root rank".into()));
        }
        match block_on(self.downs[self.rank as usize].receive()) {
            IntraDownMsg::Bbm(bytes) => bbm::decode(&bytes, dimensions),
            other => Err(PartitionError::Transport(format!("expected Bbm on intra channel, got {:?}", other))),
        }
    }

    fn send_int(&self, dest: u32, value: i32) -> Result<(), PartitionError> {
        if self.is_root() {
            return Err(PartitionError::Transport("send_int called on the root rank".into()));
        }
        let _ = dest;
        block_on(self.ups[self.rank as usize].send(IntraUpMsg::Int(value)));
        Ok(())
    }

    fn receive_int(&self, source: u32) -> Result<i32, PartitionError> {
        if !self.is_root() {
            return Err(PartitionError::Transport("receive_int called on a non-root rank".into()));
        }
        match block_on(self.ups[source as usize].receive()) {
            IntraUpMsg::Int(v) => Ok(v),
            other => Err(PartitionError::Transport(format!(
                "expected Int from rank {} on intra channel, got {:?}",
                source, other
            ))),
        }
    }

    fn send_ints(&self, dest: u32, values: &[i32]) -> Result<(), PartitionError> {
        if self.is_root() {
            return Err(PartitionError::Transport("send_ints called on the root rank".into()));
        }
        let _ = dest;
        block_on(self.ups[self.rank as usize].send(IntraUpMsg::Ints(values.to_vec())));
        Ok(())
    }

    fn receive_ints(&self, source: u32, count: usize) -> Result<Vec<i32>, PartitionError> {
        if !self.is_root() {
            return Err(PartitionError::Transport("receive_ints called on a non-root rank".into()));
        }
        match block_on(self.ups[source as usize].receive()) {
            IntraUpMsg::Ints(values) if values.len() == count => Ok(values),
            other => Err(PartitionError::Transport(format!(
                "expected {} ints from rank {} on intra channel, got {:?}",
                count, source, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    #[test]
    fn m2n_round_trips_int_bbm_and_feedback() {
        let (lm, rm) = LocalM2NChannel::pair();

        lm.send_i32(3).unwrap();
        assert_eq!(rm.receive_i32().unwrap(), 3);

        let mut sent = BoundingBoxMap::new();
        sent.insert(0, BoundingBox::from_bounds(&[(0.0, 1.0)]));
        rm.send_bounding_box_map(&sent, 1).unwrap();
        let received = lm.receive_bounding_box_map(1).unwrap();
        assert_eq!(received.get(0), sent.get(0));

        let mut feedback = FeedbackMap::new();
        feedback.insert(0, vec![1, 2]);
        lm.send_feedback_map(&feedback).unwrap();
        assert_eq!(rm.receive_feedback_map().unwrap(), feedback);
    }

    #[test]
    fn intra_broadcast_reaches_every_slave() {
        let net = LocalIntraNetwork::new(3);
        let master = net.endpoint(0);
        let slave1 = net.endpoint(1);
        let slave2 = net.endpoint(2);

        master.broadcast_send_i32(42).unwrap();
        assert_eq!(slave1.broadcast_receive_i32().unwrap(), 42);
        assert_eq!(slave2.broadcast_receive_i32().unwrap(), 42);
    }

    #[test]
    fn intra_feedback_path_carries_length_then_ints() {
        let net = LocalIntraNetwork::new(2);
        let master = net.endpoint(0);
        let slave = net.endpoint(1);

        slave.send_int(0, 2).unwrap();
        slave.send_ints(0, &[5, 6]).unwrap();

        assert_eq!(master.receive_int(1).unwrap(), 2);
        assert_eq!(master.receive_ints(1, 2).unwrap(), vec![5, 6]);
    }

    #[test]
    fn root_only_operations_reject_non_root_callers() {
        let net = LocalIntraNetwork::new(2);
        let slave = net.endpoint(1);
        assert!(slave.broadcast_send_i32(1).is_err());
        assert!(slave.receive_int(0).is_err());
    }
}
