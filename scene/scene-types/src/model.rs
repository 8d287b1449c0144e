//! The scene model: entity arenas, containers and topology-preserving edits.

use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};

use crate::entities::{ComponentDefinition, Edge, Face, Instance, Layer, Side, Vertex};
use crate::error::{SceneError, SceneResult};
use crate::handles::{
    Arena, ContainerId, DefinitionId, EdgeId, Entity, FaceId, Handle, InstanceId, LayerId,
    MaterialId, VertexId,
};
use crate::library::Materials;
use crate::loops::{collapse_spurs, union_loops};
use crate::material::{Material, UvMapping};
use crate::plane::{polygon_area, polygon_normal};

/// Relative slack when checking that a dissolve keeps the area of both faces.
const UNION_AREA_TOLERANCE: f64 = 1e-6;

/// A B-rep scene.
///
/// Vertices are shared model-wide. Edges, faces and instances each belong to
/// exactly one container: the root or a component definition. Every entity is
/// addressed by a handle that stays valid (but dead) after the entity is
/// erased.
///
/// # Example
///
/// ```
/// use scene_types::{ContainerId, Model, Point3};
///
/// let mut model = Model::new();
/// let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
///     .iter()
///     .map(|&(x, y)| model.add_vertex(Point3::new(x, y, 0.0)))
///     .collect();
/// let face = model.add_face(ContainerId::Root, &v).unwrap();
///
/// assert_eq!(model.face_count(), 1);
/// assert_eq!(model.edge_count(), 4);
/// assert!(model.face(face).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    vertices: Arena<VertexId, Vertex>,
    edges: Arena<EdgeId, Edge>,
    faces: Arena<FaceId, Face>,
    instances: Arena<InstanceId, Instance>,
    pub(crate) definitions: Arena<DefinitionId, ComponentDefinition>,
    pub(crate) layers: Arena<LayerId, Layer>,
    pub(crate) materials: Materials,
    root: Vec<Entity>,
    selection: Vec<Entity>,
    active_context: Option<DefinitionId>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create an empty model holding only the default layer.
    #[must_use]
    pub fn new() -> Self {
        let mut layers = Arena::new();
        layers.insert(Layer::new("Layer0"));
        Self {
            vertices: Arena::new(),
            edges: Arena::new(),
            faces: Arena::new(),
            instances: Arena::new(),
            definitions: Arena::new(),
            layers,
            materials: Materials::new(),
            root: Vec::new(),
            selection: Vec::new(),
            active_context: None,
        }
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Add a vertex.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        self.vertices.insert(Vertex::new(position))
    }

    /// Add an edge between `a` and `b`, or return the existing one.
    ///
    /// # Errors
    ///
    /// Fails on a dead container or vertex, or when `a == b`.
    pub fn add_edge(&mut self, container: ContainerId, a: VertexId, b: VertexId) -> SceneResult<EdgeId> {
        self.check_container(container)?;
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b {
            return Err(SceneError::DegenerateEdge { vertex: a.index() });
        }
        if let Some(existing) = self.find_edge(container, a, b) {
            return Ok(existing);
        }

        let id = self.edges.insert(Edge::new(a, b, container));
        for v in [a, b] {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.edges.push(id);
            }
        }
        self.push_entity(container, Entity::Edge(id));
        Ok(id)
    }

    /// Add a face bounded by `loop_vertices`, creating missing edges.
    ///
    /// The normal follows the loop's winding (right-hand rule).
    ///
    /// # Errors
    ///
    /// Fails on a dead container or vertex, fewer than three vertices,
    /// repeated consecutive vertices, or a loop that spans no plane.
    pub fn add_face(&mut self, container: ContainerId, loop_vertices: &[VertexId]) -> SceneResult<FaceId> {
        self.check_container(container)?;
        let n = loop_vertices.len();
        if n < 3 {
            return Err(SceneError::InvalidLoop {
                reason: format!("needs at least 3 vertices, got {n}"),
            });
        }
        for &v in loop_vertices {
            self.check_vertex(v)?;
        }
        if let Some(i) = (0..n).find(|&i| loop_vertices[i] == loop_vertices[(i + 1) % n]) {
            return Err(SceneError::DegenerateEdge {
                vertex: loop_vertices[i].index(),
            });
        }

        let points: Vec<Point3<f64>> = loop_vertices
            .iter()
            .filter_map(|&v| self.vertices.get(v).map(|vertex| vertex.position))
            .collect();
        let normal = polygon_normal(&points).ok_or(SceneError::DegenerateFace)?;

        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            edges.push(self.add_edge(container, loop_vertices[i], loop_vertices[(i + 1) % n])?);
        }

        let id = self.faces.insert(Face {
            outer_loop: loop_vertices.to_vec(),
            edges: edges.clone(),
            normal,
            parent: container,
            material: None,
            back_material: None,
            front_mapping: None,
            back_mapping: None,
            layer: None,
            hidden: false,
        });
        for e in edges {
            if let Some(edge) = self.edges.get_mut(e) {
                edge.faces.push(id);
            }
        }
        self.push_entity(container, Entity::Face(id));
        Ok(id)
    }

    /// Add a material to the managed list.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.add(material)
    }

    /// Store a material outside the managed list (an orphan once referenced).
    pub fn add_unlisted_material(&mut self, material: Material) -> MaterialId {
        self.materials.add_unlisted(material)
    }

    /// Add a layer.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        self.layers.insert(layer)
    }

    /// Add an empty component definition.
    ///
    /// Name uniqueness is not enforced here; imported models can violate it.
    pub fn add_definition(&mut self, name: impl Into<String>) -> DefinitionId {
        self.definitions.insert(ComponentDefinition::new(name.into()))
    }

    /// Place `definition` inside `container`.
    ///
    /// # Errors
    ///
    /// Fails on dead handles, or when the placement would make a definition
    /// contain itself.
    pub fn add_instance(&mut self, container: ContainerId, definition: DefinitionId) -> SceneResult<InstanceId> {
        self.check_container(container)?;
        let def = self
            .definitions
            .get(definition)
            .ok_or_else(|| SceneError::stale(DefinitionId::KIND, definition.index()))?;
        if let ContainerId::Definition(outer) = container {
            if outer == definition || self.definition_contains(definition, outer) {
                return Err(SceneError::RecursiveInstance { name: def.name.clone() });
            }
        }

        let id = self.instances.insert(Instance {
            definition,
            parent: container,
            material: None,
            layer: None,
            hidden: false,
        });
        self.push_entity(container, Entity::Instance(id));
        Ok(id)
    }

    // ---------------------------------------------------------------------
    // Access
    // ---------------------------------------------------------------------

    /// Borrow a vertex.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Borrow an edge.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Mutably borrow an edge's display properties.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    /// Borrow a face.
    #[must_use]
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    /// Mutably borrow a face's display properties.
    pub fn face_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(id)
    }

    /// Borrow an instance.
    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    /// Mutably borrow an instance's display properties.
    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id)
    }

    /// Borrow a definition.
    #[must_use]
    pub fn definition(&self, id: DefinitionId) -> Option<&ComponentDefinition> {
        self.definitions.get(id)
    }

    /// Mutably borrow a definition.
    pub fn definition_mut(&mut self, id: DefinitionId) -> Option<&mut ComponentDefinition> {
        self.definitions.get_mut(id)
    }

    /// Live definitions in creation order.
    pub fn definitions(&self) -> impl Iterator<Item = (DefinitionId, &ComponentDefinition)> + '_ {
        self.definitions.iter()
    }

    /// Borrow a layer.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Mutably borrow a layer.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    /// Live layers in creation order; the default layer comes first.
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &Layer)> + '_ {
        self.layers.iter()
    }

    /// The material collection.
    #[must_use]
    pub const fn materials(&self) -> &Materials {
        &self.materials
    }

    /// The material collection, mutably.
    pub fn materials_mut(&mut self) -> &mut Materials {
        &mut self.materials
    }

    /// Shorthand for `materials().get(id)`.
    #[must_use]
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Number of live edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of live faces.
    #[must_use]
    pub const fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of live instances.
    #[must_use]
    pub const fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of live definitions.
    #[must_use]
    pub const fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Number of live layers, including the default layer.
    #[must_use]
    pub const fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// All live edges in creation order.
    #[must_use]
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.handles()
    }

    /// All live faces in creation order.
    #[must_use]
    pub fn face_ids(&self) -> Vec<FaceId> {
        self.faces.handles()
    }

    /// All live instances in creation order.
    #[must_use]
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.instances.handles()
    }

    /// Whether the entity is still alive.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        match entity {
            Entity::Edge(id) => self.edges.is_alive(id),
            Entity::Face(id) => self.faces.is_alive(id),
            Entity::Instance(id) => self.instances.is_alive(id),
        }
    }

    /// Whether the container still exists.
    #[must_use]
    pub fn container_alive(&self, container: ContainerId) -> bool {
        match container {
            ContainerId::Root => true,
            ContainerId::Definition(d) => self.definitions.is_alive(d),
        }
    }

    /// The root followed by every live definition's contents.
    #[must_use]
    pub fn containers(&self) -> Vec<ContainerId> {
        std::iter::once(ContainerId::Root)
            .chain(self.definitions.handles().into_iter().map(ContainerId::Definition))
            .collect()
    }

    /// Snapshot of the live entities directly inside `container`, in insertion order.
    #[must_use]
    pub fn entities(&self, container: ContainerId) -> Vec<Entity> {
        self.container_entities(container)
            .map(|list| list.iter().copied().filter(|&e| self.is_alive(e)).collect())
            .unwrap_or_default()
    }

    /// Container the entity lives in.
    #[must_use]
    pub fn parent_of(&self, entity: Entity) -> Option<ContainerId> {
        match entity {
            Entity::Edge(id) => self.edges.get(id).map(|e| e.parent),
            Entity::Face(id) => self.faces.get(id).map(|f| f.parent),
            Entity::Instance(id) => self.instances.get(id).map(|i| i.parent),
        }
    }

    /// Live instances of `definition` anywhere in the model.
    #[must_use]
    pub fn instances_of(&self, definition: DefinitionId) -> Vec<InstanceId> {
        self.instances
            .iter()
            .filter(|(_, i)| i.definition == definition)
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether `outer` places `target` anywhere in its nested contents.
    #[must_use]
    pub fn definition_contains(&self, outer: DefinitionId, target: DefinitionId) -> bool {
        let mut stack = vec![outer];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            for entity in self.entities(ContainerId::Definition(current)) {
                let Some(instance) = entity.as_instance().and_then(|i| self.instances.get(i)) else {
                    continue;
                };
                if instance.definition == target {
                    return true;
                }
                stack.push(instance.definition);
            }
        }
        false
    }

    /// Existing edge joining `a` and `b` inside `container`.
    #[must_use]
    pub fn find_edge(&self, container: ContainerId, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let vertex = self.vertices.get(a)?;
        vertex.edges.iter().copied().find(|&e| {
            self.edges
                .get(e)
                .is_some_and(|edge| edge.parent == container && edge.connects(a, b))
        })
    }

    /// Positions of a face's outer loop.
    #[must_use]
    pub fn face_points(&self, face: FaceId) -> Vec<Point3<f64>> {
        self.faces
            .get(face)
            .map(|f| self.loop_points(&f.outer_loop))
            .unwrap_or_default()
    }

    /// Positions of a vertex loop. Dead vertices are skipped.
    fn loop_points(&self, loop_vertices: &[VertexId]) -> Vec<Point3<f64>> {
        loop_vertices
            .iter()
            .filter_map(|&v| self.vertices.get(v).map(|vertex| vertex.position))
            .collect()
    }

    /// Position of a vertex.
    #[must_use]
    pub fn position(&self, vertex: VertexId) -> Option<Point3<f64>> {
        self.vertices.get(vertex).map(|v| v.position)
    }

    /// Texture projection used on one side of a face.
    ///
    /// An explicit mapping wins; otherwise the planar default is sized by the
    /// side's material texture (unit tiles when untextured).
    #[must_use]
    pub fn uv_mapping(&self, face: FaceId, side: Side) -> Option<UvMapping> {
        let f = self.faces.get(face)?;
        let (explicit, material, normal) = match side {
            Side::Front => (f.front_mapping, f.material, f.normal),
            Side::Back => (f.back_mapping, f.back_material, -f.normal),
        };
        if explicit.is_some() {
            return explicit;
        }
        let (width, height) = material
            .and_then(|m| self.materials.get(m))
            .and_then(|m| m.texture.as_ref())
            .map_or((1.0, 1.0), |t| (t.width, t.height));
        Some(UvMapping::planar(&normal, width, height))
    }

    /// Texture coordinate `(u, v, q)` a face assigns to `point` on `side`.
    #[must_use]
    pub fn uvq(&self, face: FaceId, side: Side, point: &Point3<f64>) -> Option<Vector3<f64>> {
        self.uv_mapping(face, side).map(|m| m.uvq(point))
    }

    // ---------------------------------------------------------------------
    // Per-entity display properties
    // ---------------------------------------------------------------------

    /// Material of an edge, face (front) or instance.
    #[must_use]
    pub fn material_of(&self, entity: Entity) -> Option<MaterialId> {
        match entity {
            Entity::Edge(id) => self.edges.get(id)?.material,
            Entity::Face(id) => self.faces.get(id)?.material,
            Entity::Instance(id) => self.instances.get(id)?.material,
        }
    }

    /// Set the material of an edge, face (front) or instance.
    pub fn set_material(&mut self, entity: Entity, material: Option<MaterialId>) -> bool {
        let updated = match entity {
            Entity::Edge(id) => self.edges.get_mut(id).map(|e| e.material = material),
            Entity::Face(id) => self.faces.get_mut(id).map(|f| f.material = material),
            Entity::Instance(id) => self.instances.get_mut(id).map(|i| i.material = material),
        };
        updated.is_some()
    }

    /// Back material; only faces have one.
    #[must_use]
    pub fn back_material_of(&self, entity: Entity) -> Option<MaterialId> {
        self.faces.get(entity.as_face()?)?.back_material
    }

    /// Set the back material of a face. No-op for other entities.
    pub fn set_back_material(&mut self, entity: Entity, material: Option<MaterialId>) -> bool {
        entity
            .as_face()
            .and_then(|id| self.faces.get_mut(id))
            .map(|f| f.back_material = material)
            .is_some()
    }

    /// Layer of an entity; `None` is the default layer.
    #[must_use]
    pub fn layer_of(&self, entity: Entity) -> Option<LayerId> {
        match entity {
            Entity::Edge(id) => self.edges.get(id)?.layer,
            Entity::Face(id) => self.faces.get(id)?.layer,
            Entity::Instance(id) => self.instances.get(id)?.layer,
        }
    }

    /// Move an entity to a layer.
    pub fn set_layer(&mut self, entity: Entity, layer: Option<LayerId>) -> bool {
        let updated = match entity {
            Entity::Edge(id) => self.edges.get_mut(id).map(|e| e.layer = layer),
            Entity::Face(id) => self.faces.get_mut(id).map(|f| f.layer = layer),
            Entity::Instance(id) => self.instances.get_mut(id).map(|i| i.layer = layer),
        };
        updated.is_some()
    }

    /// Hidden flag of an entity. Dead entities report `false`.
    #[must_use]
    pub fn is_hidden(&self, entity: Entity) -> bool {
        match entity {
            Entity::Edge(id) => self.edges.get(id).is_some_and(|e| e.hidden),
            Entity::Face(id) => self.faces.get(id).is_some_and(|f| f.hidden),
            Entity::Instance(id) => self.instances.get(id).is_some_and(|i| i.hidden),
        }
    }

    /// Set the hidden flag of an entity.
    pub fn set_hidden(&mut self, entity: Entity, hidden: bool) -> bool {
        let updated = match entity {
            Entity::Edge(id) => self.edges.get_mut(id).map(|e| e.hidden = hidden),
            Entity::Face(id) => self.faces.get_mut(id).map(|f| f.hidden = hidden),
            Entity::Instance(id) => self.instances.get_mut(id).map(|i| i.hidden = hidden),
        };
        updated.is_some()
    }

    /// Whether a layer reference is drawn. The default layer and dead layers
    /// count as visible.
    #[must_use]
    pub fn layer_visible(&self, layer: Option<LayerId>) -> bool {
        self.layers
            .get(layer.unwrap_or(LayerId::DEFAULT))
            .is_none_or(|l| l.visible)
    }

    // ---------------------------------------------------------------------
    // Selection and edit context
    // ---------------------------------------------------------------------

    /// Current selection, filtered to live entities.
    #[must_use]
    pub fn selection(&self) -> Vec<Entity> {
        self.selection.iter().copied().filter(|&e| self.is_alive(e)).collect()
    }

    /// Replace the selection.
    pub fn set_selection(&mut self, selection: Vec<Entity>) {
        self.selection = selection;
    }

    /// Definition currently open for editing; `None` means the root.
    #[must_use]
    pub fn active_context(&self) -> Option<DefinitionId> {
        self.active_context.filter(|&d| self.definitions.is_alive(d))
    }

    /// Open a definition for editing, or return to the root with `None`.
    pub fn set_active_context(&mut self, context: Option<DefinitionId>) {
        self.active_context = context;
    }

    /// Container the user is currently editing.
    #[must_use]
    pub fn active_entities(&self) -> ContainerId {
        self.active_context().map_or(ContainerId::Root, ContainerId::Definition)
    }

    // ---------------------------------------------------------------------
    // Erasure
    // ---------------------------------------------------------------------

    /// Erase one entity.
    ///
    /// Erasing an edge erases the faces it bounds; a face that runs along the
    /// edge twice has that spur folded out instead. Erasing a face leaves its
    /// edges. Returns `false` for dead handles.
    pub fn erase_entity(&mut self, entity: Entity) -> bool {
        match entity {
            Entity::Edge(id) => self.erase_edge(id),
            Entity::Face(id) => self.erase_face(id),
            Entity::Instance(id) => self.instances.remove(id).is_some(),
        }
    }

    /// Erase many entities in one call. Dead handles are skipped.
    ///
    /// Returns how many of the given entities were alive and got erased;
    /// faces removed as a side effect of erasing their edges are not counted.
    pub fn erase_entities(&mut self, entities: &[Entity]) -> usize {
        let mut touched = HashSet::new();
        let mut count = 0;
        for &entity in entities {
            let parent = self.parent_of(entity);
            if self.erase_entity(entity) {
                count += 1;
                if let Some(parent) = parent {
                    touched.insert(parent);
                }
            }
        }
        for container in touched {
            self.compact(container);
        }
        count
    }

    /// Remove the edge shared by exactly two faces and join the faces into
    /// the first one.
    ///
    /// The surviving face keeps its own properties and winding. Returns
    /// `false` (leaving the model untouched) when the edge does not border two
    /// distinct faces, the joined boundary would not be a simple loop, or the
    /// joined loop would not cover both faces. The last happens when the faces
    /// overlap on the same side of the edge or are not coplanar.
    pub fn dissolve_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.edges.get(id) else {
            return false;
        };
        let &[f1, f2] = edge.faces.as_slice() else {
            return false;
        };
        if f1 == f2 {
            return false;
        }
        let (a, b, container) = (edge.start, edge.end, edge.parent);
        let (Some(face1), Some(face2)) = (self.faces.get(f1), self.faces.get(f2)) else {
            return false;
        };
        if face1.parent != face2.parent {
            return false;
        }
        let Some(union) = union_loops(&face1.outer_loop, &face2.outer_loop, a, b) else {
            return false;
        };
        let parts = polygon_area(&self.loop_points(&face1.outer_loop))
            + polygon_area(&self.loop_points(&face2.outer_loop));
        let joined = polygon_area(&self.loop_points(&union.vertices));
        if (joined - parts).abs() > UNION_AREA_TOLERANCE * parts {
            return false;
        }
        let Some(loop_edges) = self.loop_edges(container, &union.vertices) else {
            return false;
        };
        let second_edges = face2.edges.clone();

        self.remove_edge_record(id);
        for e in second_edges {
            if let Some(edge) = self.edges.get_mut(e) {
                for f in &mut edge.faces {
                    if *f == f2 {
                        *f = f1;
                    }
                }
            }
        }
        for &(base, tip) in &union.spurs {
            if let Some(edge) = self
                .find_edge(container, base, tip)
                .and_then(|e| self.edges.get_mut(e))
            {
                edge.faces.retain(|&f| f != f1);
            }
        }
        self.faces.remove(f2);
        if let Some(face) = self.faces.get_mut(f1) {
            face.outer_loop = union.vertices;
            face.edges = loop_edges;
        }
        true
    }

    /// Erase a definition together with its contents. Instances placing it
    /// elsewhere are left dangling and should be erased first.
    pub fn erase_definition(&mut self, id: DefinitionId) -> bool {
        self.drop_definition(id)
    }

    fn erase_face(&mut self, id: FaceId) -> bool {
        let Some(face) = self.faces.remove(id) else {
            return false;
        };
        for e in face.edges {
            if let Some(edge) = self.edges.get_mut(e) {
                edge.faces.retain(|&f| f != id);
            }
        }
        true
    }

    fn erase_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.remove_edge_record(id) else {
            return false;
        };
        let mut faces = edge.faces;
        faces.sort_unstable();
        faces.dedup();
        for f in faces {
            let uses = self
                .faces
                .get(f)
                .map_or(0, |face| face.edges.iter().filter(|&&e| e == id).count());
            match uses {
                0 => {}
                1 => {
                    self.erase_face(f);
                }
                _ => {
                    if !self.fold_spurs(f) {
                        self.erase_face(f);
                    }
                }
            }
        }
        true
    }

    /// Drop an edge from its arena and its vertices' incidence lists.
    fn remove_edge_record(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        for v in edge.vertices() {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.edges.retain(|&e| e != id);
            }
        }
        Some(edge)
    }

    /// Fold back-tracking spurs out of a face loop.
    fn fold_spurs(&mut self, id: FaceId) -> bool {
        let Some(face) = self.faces.get(id) else {
            return false;
        };
        let container = face.parent;
        let mut folded = face.outer_loop.clone();
        let spurs = collapse_spurs(&mut folded);
        if spurs.is_empty() || folded.len() < 3 {
            return false;
        }
        let Some(loop_edges) = self.loop_edges(container, &folded) else {
            return false;
        };
        for (base, tip) in spurs {
            if let Some(edge) = self
                .find_edge(container, base, tip)
                .and_then(|e| self.edges.get_mut(e))
            {
                edge.faces.retain(|&f| f != id);
            }
        }
        if let Some(face) = self.faces.get_mut(id) {
            face.outer_loop = folded;
            face.edges = loop_edges;
        }
        true
    }

    /// Edges along a closed loop, if every side exists.
    pub(crate) fn loop_edges(&self, container: ContainerId, loop_vertices: &[VertexId]) -> Option<Vec<EdgeId>> {
        let n = loop_vertices.len();
        (0..n)
            .map(|i| self.find_edge(container, loop_vertices[i], loop_vertices[(i + 1) % n]))
            .collect()
    }

    /// Rewrite an edge's endpoints and a face loop after a split vertex has
    /// been merged away.
    pub(crate) fn reattach_edge(&mut self, id: EdgeId, from: VertexId, to: VertexId) {
        let Some(edge) = self.edges.get_mut(id) else {
            return;
        };
        if edge.start == from {
            edge.start = to;
        } else if edge.end == from {
            edge.end = to;
        } else {
            return;
        }
        if let Some(vertex) = self.vertices.get_mut(from) {
            vertex.edges.retain(|&e| e != id);
        }
        if let Some(vertex) = self.vertices.get_mut(to) {
            vertex.edges.push(id);
        }
    }

    /// Drop `vertex` from a face loop and rebuild the face's edge list.
    pub(crate) fn remove_loop_vertex(&mut self, face: FaceId, vertex: VertexId) -> bool {
        let Some(f) = self.faces.get(face) else {
            return false;
        };
        let container = f.parent;
        let trimmed: Vec<VertexId> = f.outer_loop.iter().copied().filter(|&v| v != vertex).collect();
        if trimmed.len() < 3 {
            return false;
        }
        let Some(loop_edges) = self.loop_edges(container, &trimmed) else {
            return false;
        };
        if let Some(f) = self.faces.get_mut(face) {
            f.outer_loop = trimmed;
            f.edges = loop_edges;
        }
        true
    }

    /// Erase an edge record without touching its faces.
    pub(crate) fn drop_edge(&mut self, id: EdgeId) {
        self.remove_edge_record(id);
    }

    /// Erase a definition and everything inside it.
    pub(crate) fn drop_definition(&mut self, id: DefinitionId) -> bool {
        let Some(definition) = self.definitions.remove(id) else {
            return false;
        };
        // Faces first so edge erasure does not fold loops that are going away.
        for entity in &definition.entities {
            if let Entity::Face(f) = *entity {
                self.erase_face(f);
            }
        }
        for entity in definition.entities {
            match entity {
                Entity::Edge(e) => {
                    self.erase_edge(e);
                }
                Entity::Instance(i) => {
                    self.instances.remove(i);
                }
                Entity::Face(_) => {}
            }
        }
        if self.active_context == Some(id) {
            self.active_context = None;
        }
        true
    }

    /// Every live edge, face and instance.
    pub(crate) fn all_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.edges
            .iter()
            .map(|(id, _)| Entity::Edge(id))
            .chain(self.faces.iter().map(|(id, _)| Entity::Face(id)))
            .chain(self.instances.iter().map(|(id, _)| Entity::Instance(id)))
    }

    fn compact(&mut self, container: ContainerId) {
        let alive: Vec<Entity> = self.entities(container);
        if let Some(list) = self.container_entities_mut(container) {
            *list = alive;
        }
    }

    fn container_entities(&self, container: ContainerId) -> Option<&Vec<Entity>> {
        match container {
            ContainerId::Root => Some(&self.root),
            ContainerId::Definition(d) => self.definitions.get(d).map(|def| &def.entities),
        }
    }

    fn container_entities_mut(&mut self, container: ContainerId) -> Option<&mut Vec<Entity>> {
        match container {
            ContainerId::Root => Some(&mut self.root),
            ContainerId::Definition(d) => self.definitions.get_mut(d).map(|def| &mut def.entities),
        }
    }

    fn push_entity(&mut self, container: ContainerId, entity: Entity) {
        if let Some(list) = self.container_entities_mut(container) {
            list.push(entity);
        }
    }

    fn check_container(&self, container: ContainerId) -> SceneResult<()> {
        match container {
            ContainerId::Definition(d) if !self.definitions.is_alive(d) => {
                Err(SceneError::stale(DefinitionId::KIND, d.index()))
            }
            _ => Ok(()),
        }
    }

    fn check_vertex(&self, v: VertexId) -> SceneResult<()> {
        if self.vertices.is_alive(v) {
            Ok(())
        } else {
            Err(SceneError::stale(VertexId::KIND, v.index()))
        }
    }
}
