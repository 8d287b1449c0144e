//! Topology entities and the collections that own them.
//!
//! Topology links (`Edge::faces`, `Face::outer_loop`, ...) are maintained by
//! [`Model`](crate::Model) and exposed read-only. Display properties (flags,
//! materials, layers) are plain public fields.

use nalgebra::{Point3, Vector3};

use crate::handles::{ContainerId, DefinitionId, EdgeId, Entity, FaceId, LayerId, MaterialId, VertexId};
use crate::material::UvMapping;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fixed position shared by edges and faces.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in model space. Never changes during an edit.
    pub position: Point3<f64>,
    pub(crate) edges: Vec<EdgeId>,
}

impl Vertex {
    pub(crate) const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            edges: Vec::new(),
        }
    }

    /// Edges that use this vertex. May include erased edges; check liveness.
    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

/// A straight edge between two vertices.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) start: VertexId,
    pub(crate) end: VertexId,
    pub(crate) faces: Vec<FaceId>,
    pub(crate) parent: ContainerId,
    /// Hidden flag.
    pub hidden: bool,
    /// Soft flag: the edge is not drawn but still separates faces.
    pub soft: bool,
    /// Smooth flag: shading is blended across the edge.
    pub smooth: bool,
    /// Edge color material.
    pub material: Option<MaterialId>,
    /// Layer; `None` is the default layer.
    pub layer: Option<LayerId>,
}

impl Edge {
    pub(crate) const fn new(start: VertexId, end: VertexId, parent: ContainerId) -> Self {
        Self {
            start,
            end,
            faces: Vec::new(),
            parent,
            hidden: false,
            soft: false,
            smooth: false,
            material: None,
            layer: None,
        }
    }

    /// Start vertex.
    #[must_use]
    pub const fn start(&self) -> VertexId {
        self.start
    }

    /// End vertex.
    #[must_use]
    pub const fn end(&self) -> VertexId {
        self.end
    }

    /// Both endpoints, start first.
    #[must_use]
    pub const fn vertices(&self) -> [VertexId; 2] {
        [self.start, self.end]
    }

    /// Adjacent face references in attachment order.
    ///
    /// Normally 0, 1 or 2 entries. A face that runs along the edge twice is
    /// listed twice.
    #[must_use]
    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    /// Container the edge lives in.
    #[must_use]
    pub const fn parent(&self) -> ContainerId {
        self.parent
    }

    /// Whether the edge connects `a` and `b` in either direction.
    #[must_use]
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// The endpoint opposite `v`, if `v` is an endpoint.
    #[must_use]
    pub fn other_vertex(&self, v: VertexId) -> Option<VertexId> {
        if v == self.start {
            Some(self.end)
        } else if v == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

/// A planar polygon bounded by one outer loop.
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) outer_loop: Vec<VertexId>,
    pub(crate) edges: Vec<EdgeId>,
    pub(crate) normal: Vector3<f64>,
    pub(crate) parent: ContainerId,
    /// Front material.
    pub material: Option<MaterialId>,
    /// Back material.
    pub back_material: Option<MaterialId>,
    /// Explicit front texture projection; `None` uses the planar default.
    pub front_mapping: Option<UvMapping>,
    /// Explicit back texture projection; `None` uses the planar default.
    pub back_mapping: Option<UvMapping>,
    /// Layer; `None` is the default layer.
    pub layer: Option<LayerId>,
    /// Hidden flag.
    pub hidden: bool,
}

impl Face {
    /// Outer loop vertices in winding order (counter-clockwise about the normal).
    #[must_use]
    pub fn outer_loop(&self) -> &[VertexId] {
        &self.outer_loop
    }

    /// Outer loop edges; `edges()[i]` joins `outer_loop()[i]` and `outer_loop()[i + 1]`.
    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Unit normal.
    #[must_use]
    pub const fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Container the face lives in.
    #[must_use]
    pub const fn parent(&self) -> ContainerId {
        self.parent
    }
}

/// One side of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    /// The side the normal points away from.
    Front,
    /// The opposite side.
    Back,
}

/// A placed copy of a component definition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instance {
    pub(crate) definition: DefinitionId,
    pub(crate) parent: ContainerId,
    /// Material applied to untextured faces inside the instance.
    pub material: Option<MaterialId>,
    /// Layer; `None` is the default layer.
    pub layer: Option<LayerId>,
    /// Hidden flag.
    pub hidden: bool,
}

impl Instance {
    /// Definition this instance places.
    #[must_use]
    pub const fn definition(&self) -> DefinitionId {
        self.definition
    }

    /// Container the instance lives in.
    #[must_use]
    pub const fn parent(&self) -> ContainerId {
        self.parent
    }
}

/// A named visibility group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layer {
    /// Layer name.
    pub name: String,
    /// Whether entities on this layer are drawn.
    pub visible: bool,
}

impl Layer {
    /// Create a visible layer.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
        }
    }

    /// Create a hidden layer.
    #[must_use]
    pub fn hidden(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: false,
        }
    }
}

/// Reusable geometry owned once and placed by any number of instances.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComponentDefinition {
    /// Name; unique within a healthy model.
    pub name: String,
    /// The component cuts an opening in the face it is glued to.
    pub cuts_opening: bool,
    pub(crate) entities: Vec<Entity>,
}

impl ComponentDefinition {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            cuts_opening: false,
            entities: Vec::new(),
        }
    }
}
