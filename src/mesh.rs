//! Read-only collaborator interfaces this crate consumes but does not own:
//! the mesh data structure and the mapping objects that connect two meshes.
//! Only the bounding-box accessors this core needs are exposed.

use crate::geometry::BoundingBox;

/// A mesh partition owned by some rank. Read-only from this core's
/// perspective; its construction and ownership assignment are out of scope
/// for this crate.
pub trait Mesh {
    fn dimensions(&self) -> usize;
    fn bounding_box(&self) -> BoundingBox;
}

/// One of up to two mappings attached to a `ReceivedBoundingBox` instance.
/// A mapping's direction determines which accessor is populated; the other
/// returns `None`.
pub trait Mapping {
    fn output_mesh(&self) -> Option<&dyn Mesh>;
    fn input_mesh(&self) -> Option<&dyn Mesh>;
}

/// Minimal `Mesh` implementation backed by a fixed bounding box, used by
/// tests and the demo binary in place of a real mesh data structure.
pub struct StaticMesh {
    dimensions: usize,
    bounding_box: BoundingBox,
}

impl StaticMesh {
    pub fn new(dimensions: usize, bounding_box: BoundingBox) -> Self {
        assert_eq!(dimensions, bounding_box.dimensions());
        StaticMesh { dimensions, bounding_box }
    }
}

impl Mesh for StaticMesh {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bounding_box.clone()
    }
}

/// Minimal `Mapping` implementation: wraps a single `StaticMesh` as either
/// the output side or the input side of the mapping.
pub struct StaticMapping {
    output: Option<StaticMesh>,
    input: Option<StaticMesh>,
}

impl StaticMapping {
    pub fn from_output(mesh: StaticMesh) -> Self {
        StaticMapping {
            output: Some(mesh),
            input: None,
        }
    }

    pub fn from_input(mesh: StaticMesh) -> Self {
        StaticMapping {
            output: None,
            input: Some(mesh),
        }
    }
}

impl Mapping for StaticMapping {
    fn output_mesh(&self) -> Option<&dyn Mesh> {
        self.output.as_ref().map(|m| m as &dyn Mesh)
    }

    fn input_mesh(&self) -> Option<&dyn Mesh> {
        self.input.as_ref().map(|m| m as &dyn Mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_mapping_exposes_only_its_own_direction() {
        let mesh = StaticMesh::new(1, BoundingBox::from_bounds(&[(0.0, 1.0)]));
        let output = StaticMapping::from_output(mesh);
        assert!(output.output_mesh().is_some());
        assert!(output.input_mesh().is_none());

        let mesh2 = StaticMesh::new(1, BoundingBox::from_bounds(&[(0.0, 1.0)]));
        let input = StaticMapping::from_input(mesh2);
        assert!(input.output_mesh().is_none());
        assert!(input.input_mesh().is_some());
    }
}
