//! `BoundingBoxMap` — remote rank → bounding box, plus its wire codec.

use std::collections::BTreeMap;

use crate::error::PartitionError;
use crate::geometry::BoundingBox;

/// Maps a dense `[0, remote_participant_size)` rank space to each rank's
/// bounding box. Backed by a `BTreeMap` so iteration is always ascending by
/// rank, which is what the protocol's deterministic overlap-list
/// construction relies on.
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxMap {
    entries: BTreeMap<u32, BoundingBox>,
}

impl BoundingBoxMap {
    pub fn new() -> Self {
        BoundingBoxMap::default()
    }

    /// Pre-size a map with `size` entries, each mapped to the `[-1,-1]`
    /// placeholder.
    pub fn uninitialized(size: u32, dimensions: usize) -> Self {
        let mut map = BoundingBoxMap::new();
        for rank in 0..size {
            map.entries.insert(rank, BoundingBox::uninitialized(dimensions));
        }
        map
    }

    pub fn insert(&mut self, rank: u32, bb: BoundingBox) {
        self.entries.insert(rank, bb);
    }

    pub fn get(&self, rank: u32) -> Option<&BoundingBox> {
        self.entries.get(&rank)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &BoundingBox)> {
        self.entries.iter().map(|(&rank, bb)| (rank, bb))
    }
}

/// Encode as `size:i32` followed by `size` records of
/// `(rank:i32, [lo_d:f64, hi_d:f64] × dimensions)`.
pub fn encode(bbm: &BoundingBoxMap, dimensions: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(bbm.len() as i32).to_le_bytes());

    for (rank, bb) in bbm.iter() {
        buf.extend_from_slice(&(rank as i32).to_le_bytes());
        for d in 0..dimensions {
            let interval = bb.interval(d);
            buf.extend_from_slice(&interval.lo.to_le_bytes());
            buf.extend_from_slice(&interval.hi.to_le_bytes());
        }
    }
    buf
}

/// Decode the format written by [`encode`]. `dimensions` must be known out
/// of band (it is a per-mesh constant, not carried on the wire).
pub fn decode(bytes: &[u8], dimensions: usize) -> Result<BoundingBoxMap, PartitionError> {
    let mut cursor = Cursor::new(bytes);
    let size = cursor.read_i32()?;
    if size < 0 {
        return Err(PartitionError::Codec(format!("negative BoundingBoxMap size: {}", size)));
    }

    let mut map = BoundingBoxMap::new();
    for _ in 0..size {
        let rank = cursor.read_i32()?;
        if rank < 0 {
            return Err(PartitionError::Codec(format!("negative rank in BoundingBoxMap: {}", rank)));
        }
        let mut bounds = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            let lo = cursor.read_f64()?;
            let hi = cursor.read_f64()?;
            bounds.push((lo, hi));
        }
        map.insert(rank as u32, BoundingBox::from_bounds(&bounds));
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
            .ok_or_else(|| PartitionError::Codec("truncated i32 in BoundingBoxMap payload".into()))?;
        self.pos += 4;
        Ok(i32::from_le_bytes(chunk.try_into().unwrap()))
    }

    fn read_f64(&mut self) -> Result<f64, PartitionError> {
        let chunk = self
            .bytes
            .get(self.pos..self.pos + 8)
            .ok_or_else(|| PartitionError::Codec("truncated f64 in BoundingBoxMap payload".into()))?;
        self.pos += 8;
        Ok(f64::from_le_bytes(chunk.try_into().unwrap()))
    }
}
