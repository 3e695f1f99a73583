//! The two-level connectivity protocol: `ReceivedBoundingBox`,
//! its state machine, and the `communicate_bounding_box` /
//! `compute_bounding_box` phases.

use crate::bbm::BoundingBoxMap;
use crate::channel::{IntraParticipantChannel, M2NMasterChannel};
use crate::error::PartitionError;
use crate::feedback::{FeedbackMap, NO_FEEDBACK_SENTINEL};
use crate::geometry::{self, BoundingBox};
use crate::mesh::Mapping;

/// A rank's role within its own participant's rank group.
/// `Solo` (single-rank participant) is out of scope and has no variant
/// here: constructing against an intra-participant channel of size 1 is
/// treated as a precondition violation, not a silently-supported mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

impl Role {
    /// Derive a role from an intra-participant channel's own rank, rather
    /// than dispatching off a process-global master/slave singleton.
    pub fn from_rank(rank: u32) -> Role {
        if rank == 0 { Role::Master } else { Role::Slave }
    }
}

/// `Fresh → BBReceived → Computed → Sealed`.
/// Transitions are linear; each advances exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolState {
    Fresh,
    BbReceived,
    Computed,
    Sealed,
}

/// One participant's view of the received-bounding-box partitioning core
/// for one coupled mesh. Channels and meshes are not stored as
/// fields — they are non-owning references passed to each phase call,
/// which keeps this struct free of the trait-object lifetime parameters a
/// stored-reference design would otherwise require while preserving an
/// "owns no collaborator" lifecycle.
pub struct ReceivedBoundingBox {
    role: Role,
    dimensions: usize,
    safety_factor: f64,
    state: ProtocolState,
    bb: BoundingBox,
    remote_bbm: BoundingBoxMap,
    remote_participant_size: u32,
}

impl ReceivedBoundingBox {
    /// `safety_factor < 0` is a programmer error: this asserts rather than
    /// returning a `Result`.
    pub fn new(role: Role, dimensions: usize, safety_factor: f64) -> Self {
        assert!(
            safety_factor >= 0.0,
            "safety_factor must be non-negative, got {}",
            safety_factor
        );
        ReceivedBoundingBox {
            role,
            dimensions,
            safety_factor,
            state: ProtocolState::Fresh,
            bb: BoundingBox::empty(dimensions),
            remote_bbm: BoundingBoxMap::new(),
            remote_participant_size: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// This rank's local bounding box, populated by `compute_bounding_box`.
    /// Empty (the sentinel) before that call.
    pub fn local_bounding_box(&self) -> &BoundingBox {
        &self.bb
    }

    /// Phase 1: master-only inter-participant exchange. No-op
    /// on a `Slave` — slaves skip Phase 1 entirely and enter `BBReceived`
    /// implicitly during Phase 2, so calling this is idempotent either way.
    pub fn communicate_bounding_box(&mut self, m2n: &dyn M2NMasterChannel) -> Result<(), PartitionError> {
        if self.role != Role::Master {
            return Ok(());
        }
        assert_eq!(
            self.state,
            ProtocolState::Fresh,
            "communicate_bounding_box must be called exactly once, before compute_bounding_box"
        );

        log::info!("received-bbox: master receiving remote participant size over m2n");
        let remote_size = m2n.receive_i32().map_err(|e| {
            log::error!("received-bbox: failed to receive remote participant size: {}", e);
            e
        })?;
        if remote_size < 0 {
            return Err(PartitionError::Codec(format!("negative remote participant size: {}", remote_size)));
        }

        // Pre-size with the placeholder; the receive below immediately
        // overwrites it with the real map.
        self.remote_bbm = BoundingBoxMap::uninitialized(remote_size as u32, self.dimensions);
        self.remote_bbm = m2n.receive_bounding_box_map(self.dimensions).map_err(|e| {
            log::error!("received-bbox: failed to receive remote bounding box map: {}", e);
            e
        })?;
        self.remote_participant_size = remote_size as u32;
        self.state = ProtocolState::BbReceived;
        Ok(())
    }

    /// Phase 2: local BB construction, intra-participant
    /// broadcast/gather, and — on the master only — the feedback map sent
    /// back to the remote master. Returns `Some(feedback_map)` on the
    /// master (the value it just sent to RM), `None` on slaves (which have
    /// no feedback map of their own to return).
    ///
    /// Calling this on the master before `communicate_bounding_box` has
    /// run is a programmer error and asserts.
    pub fn compute_bounding_box(
        &mut self,
        intra: &dyn IntraParticipantChannel,
        from_mapping: Option<&dyn Mapping>,
        to_mapping: Option<&dyn Mapping>,
        m2n: &dyn M2NMasterChannel,
    ) -> Result<Option<FeedbackMap>, PartitionError> {
        assert!(
            intra.size() > 1,
            "serial participant (solo, size 1) mode is unimplemented"
        );

        self.bb = geometry::prepare_bounding_box(from_mapping, to_mapping, self.dimensions, self.safety_factor);

        match self.role {
            Role::Master => assert_eq!(intra.rank(), 0, "master role must correspond to intra-participant rank 0"),
            Role::Slave => assert_ne!(intra.rank(), 0, "slave role must not correspond to intra-participant rank 0"),
        }

        match self.role {
            Role::Master => {
                assert_eq!(
                    self.state,
                    ProtocolState::BbReceived,
                    "compute_bounding_box on the master must follow communicate_bounding_box"
                );
                intra.broadcast_send_i32(self.remote_participant_size as i32)?;
                intra.broadcast_send_bounding_box_map(&self.remote_bbm, self.dimensions)?;
            }
            Role::Slave => {
                assert_eq!(self.state, ProtocolState::Fresh, "compute_bounding_box must be called exactly once");
                let size = intra.broadcast_receive_i32()?;
                if size < 0 {
                    return Err(PartitionError::Codec(format!("negative remote participant size: {}", size)));
                }
                self.remote_participant_size = size as u32;
                self.remote_bbm = intra.broadcast_receive_bounding_box_map(self.dimensions)?;
                self.state = ProtocolState::BbReceived;
            }
        }

        // Ascending-rank iteration (BoundingBoxMap is a BTreeMap) gives a
        // deterministic overlap list for free.
        let overlaps: Vec<i32> = self
            .remote_bbm
            .iter()
            .filter(|(_, remote_bb)| geometry::overlapping(&self.bb, remote_bb))
            .map(|(rank, _)| rank as i32)
            .collect();

        match self.role {
            Role::Slave => {
                let k = overlaps.len() as i32;
                intra.send_int(0, k)?;
                if k > 0 {
                    intra.send_ints(0, &overlaps)?;
                }
                self.state = ProtocolState::Sealed;
                Ok(None)
            }
            Role::Master => {
                let local_size = intra.size();
                let mut feedback = FeedbackMap::new();
                for r in 1..local_size {
                    feedback.insert(r, vec![NO_FEEDBACK_SENTINEL]);
                }
                if !overlaps.is_empty() {
                    feedback.insert(0, overlaps);
                }
                for r in 1..local_size {
                    let k_r = intra.receive_int(r)?;
                    if k_r < 0 {
                        return Err(PartitionError::Codec(format!("negative overlap count from rank {}: {}", r, k_r)));
                    }
                    if k_r > 0 {
                        let ids = intra.receive_ints(r, k_r as usize)?;
                        feedback.insert(r, ids);
                    }
                    // k_r == 0: leave the sentinel already inserted above in place.
                }

                if feedback.is_empty() {
                    log::warn!("received-bbox: empty feedback map — no geometric overlap found with peer participant");
                }

                let total = feedback.len() as i32;
                m2n.send_i32(total)?;
                if total != 0 {
                    m2n.send_feedback_map(&feedback)?;
                }

                self.state = ProtocolState::Sealed;
                Ok(Some(feedback))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::local::{LocalIntraNetwork, LocalM2NChannel};
    use crate::geometry::BoundingBox;
    use crate::mesh::{StaticMapping, StaticMesh};

    /// Drives both sides of a full two-level protocol run for one
    /// participant against a peer whose only observable surface is its m2n
    /// `_remoteBBM`/size and a channel to receive the feedback map back on.
    /// This exercises a one-overlap-each run and a no-overlap-anywhere run
    /// end to end.
    fn run_participant(
        local_size: u32,
        local_boxes: &[(f64, f64, f64, f64)],
        remote_size: u32,
        remote_boxes: &[(u32, f64, f64, f64, f64)],
        safety_factor: f64,
    ) -> FeedbackMap {
        let dimensions = 2;
        let intra_net = LocalIntraNetwork::new(local_size);
        let (lm_channel, rm_channel) = LocalM2NChannel::pair();
        let remote_boxes: Vec<(u32, f64, f64, f64, f64)> = remote_boxes.to_vec();

        // Stand in for the remote master: send size + bbm, then receive
        // the feedback map size + payload back.
        let remote_thread = std::thread::spawn(move || {
            rm_channel.send_i32(remote_size as i32).unwrap();
            let mut bbm = BoundingBoxMap::new();
            for &(rank, lo_x, hi_x, lo_y, hi_y) in remote_boxes.iter() {
                bbm.insert(rank, BoundingBox::from_bounds(&[(lo_x, hi_x), (lo_y, hi_y)]));
            }
            rm_channel.send_bounding_box_map(&bbm, 2).unwrap();

            let total = rm_channel.receive_i32().unwrap();
            if total == 0 {
                FeedbackMap::new()
            } else {
                rm_channel.receive_feedback_map().unwrap()
            }
        });

        let mut handles = Vec::new();
        for rank in 1..local_size {
            let endpoint = intra_net.endpoint(rank);
            let (lo_x, hi_x, lo_y, hi_y) = local_boxes[rank as usize];
            handles.push(std::thread::spawn(move || {
                let mesh = StaticMesh::new(dimensions, BoundingBox::from_bounds(&[(lo_x, hi_x), (lo_y, hi_y)]));
                let mapping = StaticMapping::from_output(mesh);
                let mut rbb = ReceivedBoundingBox::new(Role::Slave, dimensions, safety_factor);
                rbb.compute_bounding_box(&endpoint, Some(&mapping), None, &lm_channel_unused()).unwrap();
            }));
        }

        // Master runs on this thread.
        let master_endpoint = intra_net.endpoint(0);
        let (lo_x, hi_x, lo_y, hi_y) = local_boxes[0];
        let mesh = StaticMesh::new(dimensions, BoundingBox::from_bounds(&[(lo_x, hi_x), (lo_y, hi_y)]));
        let mapping = StaticMapping::from_output(mesh);
        let mut rbb = ReceivedBoundingBox::new(Role::Master, dimensions, safety_factor);
        rbb.communicate_bounding_box(&lm_channel).unwrap();
        let feedback = rbb
            .compute_bounding_box(&master_endpoint, Some(&mapping), None, &lm_channel)
            .unwrap()
            .expect("master always returns a feedback map");

        for h in handles {
            h.join().unwrap();
        }
        let _ = remote_thread.join().unwrap();
        feedback
    }

    // Slave threads don't use the m2n channel at all; this stub only
    // exists so `compute_bounding_box`'s signature can be satisfied without
    // threading an `Option`. See `compute_bounding_box`'s `m2n` parameter.
    fn lm_channel_unused() -> NoopM2N {
        NoopM2N
    }

    struct NoopM2N;
    impl M2NMasterChannel for NoopM2N {
        fn receive_i32(&self) -> Result<i32, PartitionError> {
            unreachable!("slaves never use the m2n channel")
        }
        fn send_i32(&self, _value: i32) -> Result<(), PartitionError> {
            unreachable!("slaves never use the m2n channel")
        }
        fn receive_bounding_box_map(&self, _dimensions: usize) -> Result<BoundingBoxMap, PartitionError> {
            unreachable!("slaves never use the m2n channel")
        }
        fn send_bounding_box_map(&self, _bbm: &BoundingBoxMap, _dimensions: usize) -> Result<(), PartitionError> {
            unreachable!("slaves never use the m2n channel")
        }
        fn send_feedback_map(&self, _feedback: &FeedbackMap) -> Result<(), PartitionError> {
            unreachable!("slaves never use the m2n channel")
        }
        fn receive_feedback_map(&self) -> Result<FeedbackMap, PartitionError> {
            unreachable!("slaves never use the m2n channel")
        }
    }

    #[test]
    fn two_ranks_two_remotes_one_overlap_each() {
        let feedback = run_participant(
            2,
            &[(0.0, 1.0, 0.0, 1.0), (2.0, 3.0, 0.0, 1.0)],
            2,
            &[(0, 0.5, 1.5, 0.0, 1.0), (1, 2.5, 2.9, 0.0, 1.0)],
            0.0,
        );
        assert_eq!(feedback.get(0), Some([0].as_slice()));
        assert_eq!(feedback.get(1), Some([1].as_slice()));
        assert_eq!(feedback.len(), 2);
    }

    #[test]
    fn no_overlap_anywhere() {
        let feedback = run_participant(
            2,
            &[(0.0, 1.0, 0.0, 1.0), (2.0, 3.0, 0.0, 1.0)],
            2,
            &[(0, 10.0, 11.0, 10.0, 11.0), (1, 20.0, 21.0, 20.0, 21.0)],
            0.0,
        );
        // Master's own overlap is empty so its key is absent; the slave's
        // is represented by the literal [-1] sentinel.
        assert_eq!(feedback.get(0), None);
        assert_eq!(feedback.get(1), Some([NO_FEEDBACK_SENTINEL].as_slice()));
        assert_eq!(feedback.len(), 1);
    }

    #[test]
    fn three_slaves_concurrent_with_distinct_overlap_counts_route_to_correct_ranks() {
        // local_size = 4: master + three slaves, each with a different
        // overlap-list length, driven concurrently. This exercises that the
        // master's receive_int/receive_ints(r) actually pulls rank r's data
        // rather than whatever happened to land next in a shared queue.
        let feedback = run_participant(
            4,
            &[
                (0.0, 1.0, 0.0, 1.0),   // master: overlaps remote 0
                (10.0, 11.0, 0.0, 1.0), // slave 1: overlaps remote 1 and 2
                (20.0, 21.0, 0.0, 1.0), // slave 2: overlaps nothing
                (30.0, 31.0, 0.0, 1.0), // slave 3: overlaps remote 3
            ],
            4,
            &[
                (0, 0.5, 1.5, 0.0, 1.0),
                (1, 10.5, 11.5, 0.0, 1.0),
                (2, 10.6, 11.6, 0.0, 1.0),
                (3, 30.5, 31.5, 0.0, 1.0),
            ],
            0.0,
        );

        assert_eq!(feedback.get(0), Some([0].as_slice()));
        assert_eq!(feedback.get(1), Some([1, 2].as_slice()));
        assert_eq!(feedback.get(2), Some([NO_FEEDBACK_SENTINEL].as_slice()));
        assert_eq!(feedback.get(3), Some([3].as_slice()));
        assert_eq!(feedback.len(), 4);
    }

    #[test]
    #[should_panic]
    fn compute_before_communicate_on_master_asserts() {
        let intra_net = LocalIntraNetwork::new(2);
        let master_endpoint = intra_net.endpoint(0);
        let (_lm, _rm) = LocalM2NChannel::pair();
        let mut rbb = ReceivedBoundingBox::new(Role::Master, 2, 0.0);
        // No communicate_bounding_box call first: must assert.
        let _ = rbb.compute_bounding_box(&master_endpoint, None, None, &_lm);
    }

    #[test]
    #[should_panic]
    fn new_with_negative_safety_factor_asserts() {
        let _ = ReceivedBoundingBox::new(Role::Master, 2, -1.0);
    }
}
