//! `FeedbackMap` — local rank → overlapping remote ranks, plus its wire
//! codec.

use std::collections::BTreeMap;

use crate::error::PartitionError;

/// The on-wire sentinel meaning "the master received no feedback from this
/// slave". Distinct from a slave genuinely reporting an empty overlap
/// list, which the wire format cannot distinguish from this sentinel —
/// preserved here rather than redesigned, since both sides of a coupling
/// must agree on the wire contract.
pub const NO_FEEDBACK_SENTINEL: i32 = -1;

/// Maps a dense `[0, local_size)` rank space to the list of remote ranks
/// each local rank overlaps. Backed by a `BTreeMap` for deterministic
/// ascending-rank iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackMap {
    entries: BTreeMap<u32, Vec<i32>>,
}

impl FeedbackMap {
    pub fn new() -> Self {
        FeedbackMap::default()
    }

    pub fn insert(&mut self, rank: u32, overlaps: Vec<i32>) {
        self.entries.insert(rank, overlaps);
    }

    pub fn get(&self, rank: u32) -> Option<&[i32]> {
        self.entries.get(&rank).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[i32])> {
        self.entries.iter().map(|(&rank, v)| (rank, v.as_slice()))
    }

    /// Whether `rank` resolves to "no overlap known", treating both an
    /// absent key and the `[-1]` sentinel as empty.
    pub fn overlap_ranks(&self, rank: u32) -> &[i32] {
        match self.get(rank) {
            Some(ranks) if is_sentinel(ranks) => &[],
            Some(ranks) => ranks,
            None => &[],
        }
    }
}

fn is_sentinel(ranks: &[i32]) -> bool {
    ranks == [NO_FEEDBACK_SENTINEL]
}

/// Encode as `size:i32` followed by `size` records of
/// `(rank:i32, k:i32, ids:i32×k)`.
pub fn encode(feedback: &FeedbackMap) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(feedback.len() as i32).to_le_bytes());

    for (rank, ranks) in feedback.iter() {
        buf.extend_from_slice(&(rank as i32).to_le_bytes());
        buf.extend_from_slice(&(ranks.len() as i32).to_le_bytes());
        for &id in ranks {
            buf.extend_from_slice(&id.to_le_bytes());
        }
    }
    buf
}

pub fn decode(bytes: &[u8]) -> Result<FeedbackMap, PartitionError> {
    let mut cursor = Cursor::new(bytes);
    let size = cursor.read_i32()?;
    if size < 0 {
        return Err(PartitionError::Codec(format!("negative FeedbackMap size: {}", size)));
    }

    let mut map = FeedbackMap::new();
    for _ in 0..size {
        let rank = cursor.read_i32()?;
        if rank < 0 {
            return Err(PartitionError::Codec(format!("negative rank in FeedbackMap: {}", rank)));
        }
        let k = cursor.read_i32()?;
        if k < 0 {
            return Err(PartitionError::Codec(format!("negative overlap count in FeedbackMap: {}", k)));
        }
        let mut ids = Vec::with_capacity(k as usize);
        for _ in 0..k {
            ids.push(cursor.read_i32()?);
        }
        map.insert(rank as u32, ids);
    }
    Ok(map)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn read_i32(&mut self) -> Result<i32, PartitionError> {
        let chunk = self
            .bytes
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| PartitionError::Codec("truncated i32 in FeedbackMap payload".into()))?;
        self.pos += 4;
        Ok(i32::from_le_bytes(chunk.try_into().unwrap()))
    }
}
