//! Bounding box data model, union/dilation (C1), and the overlap predicate (C2).
//!
//! Mirrors `simulation::geometry` in the upstream radio simulator this crate
//! grew out of: small geometric primitives and pure predicate functions, each
//! with its own focused unit tests.

use crate::mesh::Mapping;

/// A single closed interval `[lo, hi]` along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    fn empty() -> Self {
        Interval {
            lo: f64::INFINITY,
            hi: f64::NEG_INFINITY,
        }
    }

    fn uninitialized() -> Self {
        Interval { lo: -1.0, hi: -1.0 }
    }

    fn union(&mut self, other: &Interval) {
        self.lo = self.lo.min(other.lo);
        self.hi = self.hi.max(other.hi);
    }
}

/// An axis-aligned bounding box with `D` dimensions, `D` fixed per instance
/// at construction (mesh dimensionality is a runtime property, not a const
/// generic).
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    intervals: Vec<Interval>,
}

impl BoundingBox {
    /// The empty sentinel: `lo = +inf, hi = -inf` per dimension. Never
    /// overlaps any valid box.
    pub fn empty(dimensions: usize) -> Self {
        BoundingBox {
            intervals: vec![Interval::empty(); dimensions],
        }
    }

    /// The `lo = hi = -1` placeholder used to pre-size a `BoundingBoxMap`
    /// entry before the real value is received over the wire.
    pub fn uninitialized(dimensions: usize) -> Self {
        BoundingBox {
            intervals: vec![Interval::uninitialized(); dimensions],
        }
    }

    /// Construct directly from per-dimension `(lo, hi)` pairs.
    pub fn from_bounds(bounds: &[(f64, f64)]) -> Self {
        BoundingBox {
            intervals: bounds.iter().map(|&(lo, hi)| Interval { lo, hi }).collect(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.intervals.len()
    }

    pub fn interval(&self, dim: usize) -> Interval {
        self.intervals[dim]
    }

    /// Componentwise min-of-lower / max-of-upper union. Unioning with an
    /// `empty` box is the identity.
    pub fn union(&mut self, other: &BoundingBox) {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        for (a, b) in self.intervals.iter_mut().zip(other.intervals.iter()) {
            a.union(b);
        }
    }

    /// Symmetric dilation by `safety_factor * maxSide`, where `maxSide` is
    /// the longest side of the box floored at `1e-6` so that degenerate
    /// (point or line) boxes still receive a non-zero dilation.
    ///
    /// `safety_factor < 0` is a programmer error; this asserts rather than
    /// returning a `Result`, per the protocol's failure semantics for
    /// in-process invariant violations.
    pub fn dilate(&mut self, safety_factor: f64) {
        assert!(safety_factor >= 0.0, "safety_factor must be non-negative, got {}", safety_factor);

        let max_side = self
            .intervals
            .iter()
            .map(|i| i.hi - i.lo)
            .fold(1e-6_f64, f64::max);
        let delta = safety_factor * max_side;

        for interval in &mut self.intervals {
            interval.lo -= delta;
            interval.hi += delta;
        }
    }
}

/// C1 — produce this rank's dilated local bounding box from whichever
/// mappings are attached.
///
/// Unions the output mesh's box (if `from_mapping` is attached) and the
/// input mesh's box (if `to_mapping` is attached), then dilates the result.
/// If neither is attached, the union stays the empty sentinel and dilation
/// yields `[-1e-6, 1e-6]` per dimension — a questionable fallback kept for
/// behavioral parity rather than turned into a rejection.
pub fn prepare_bounding_box(
    from_mapping: Option<&dyn Mapping>,
    to_mapping: Option<&dyn Mapping>,
    dimensions: usize,
    safety_factor: f64,
) -> BoundingBox {
    let mut bb = BoundingBox::empty(dimensions);

    if let Some(mapping) = from_mapping {
        if let Some(mesh) = mapping.output_mesh() {
            bb.union(&mesh.bounding_box());
        }
    }
    if let Some(mapping) = to_mapping {
        if let Some(mesh) = mapping.input_mesh() {
            bb.union(&mesh.bounding_box());
        }
    }

    bb.dilate(safety_factor);
    bb
}

/// C2 — the overlap predicate.
///
/// Two boxes overlap iff every dimension's intervals overlap. A dimension's
/// intervals are declared non-overlapping iff both endpoints of one lie
/// strictly below the lower endpoint of the other — the asymmetric
/// formulation that makes sentinel/placeholder boxes (`hi < lo`) never
/// overlap a valid box, while still treating boundary touches as overlap.
pub fn overlapping(a: &BoundingBox, b: &BoundingBox) -> bool {
    debug_assert_eq!(a.dimensions(), b.dimensions(), "overlap test across mismatched dimensionality");

    for d in 0..a.dimensions() {
        let ia = a.interval(d);
        let ib = b.interval(d);

        let disjoint = (ia.lo < ib.lo && ia.hi < ib.lo) || (ib.lo < ia.lo && ib.hi < ia.lo);
        if disjoint {
            return false;
        }
    }
    true
}
