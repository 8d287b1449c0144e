//! Host-native maintenance: purging unused resources, unique names and
//! split-edge repair.

use hashbrown::HashSet;
use nalgebra::Point3;

use crate::handles::{ContainerId, DefinitionId, EdgeId, Entity, FaceId, LayerId, MaterialId, VertexId};
use crate::model::Model;

/// Generate a name not rejected by `taken`.
///
/// Returns `base` when it is free. Otherwise any trailing `#n` suffix is
/// stripped and `#1`, `#2`, ... are tried in turn.
///
/// ```
/// use scene_types::unique_name;
///
/// let taken = ["Door", "Door#1"];
/// assert_eq!(unique_name("Door", |n| taken.contains(&n)), "Door#2");
/// assert_eq!(unique_name("Window", |n| taken.contains(&n)), "Window");
/// ```
pub fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let stem = match base.rsplit_once('#') {
        Some((stem, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => stem,
        _ => base,
    };
    (1..)
        .map(|n| format!("{stem}#{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| stem.to_string())
}

impl Model {
    /// A definition name not used by any live definition.
    #[must_use]
    pub fn unique_definition_name(&self, base: &str) -> String {
        let names: HashSet<&str> = self.definitions.iter().map(|(_, d)| d.name.as_str()).collect();
        unique_name(base, |candidate| names.contains(candidate))
    }

    /// A material name not used by any stored material.
    #[must_use]
    pub fn unique_material_name(&self, base: &str) -> String {
        unique_name(base, |candidate| self.materials.name_taken(candidate))
    }

    /// Erase definitions that no placed instance reaches from the root or the
    /// open edit context, together with their contents. The open context
    /// itself always stays. Returns the number of definitions removed.
    pub fn purge_unused_definitions(&mut self) -> usize {
        let mut reached: HashSet<DefinitionId> = HashSet::new();
        let mut stack = vec![ContainerId::Root];
        if let Some(active) = self.active_context() {
            reached.insert(active);
            stack.push(ContainerId::Definition(active));
        }
        while let Some(container) = stack.pop() {
            for entity in self.entities(container) {
                let Some(definition) = entity
                    .as_instance()
                    .and_then(|i| self.instance(i))
                    .map(crate::entities::Instance::definition)
                else {
                    continue;
                };
                if reached.insert(definition) {
                    stack.push(ContainerId::Definition(definition));
                }
            }
        }

        let unused: Vec<DefinitionId> = self
            .definitions
            .handles()
            .into_iter()
            .filter(|d| !reached.contains(d))
            .collect();
        unused.into_iter().filter(|&d| self.drop_definition(d)).count()
    }

    /// Remove layers no live entity is on. The default layer always stays.
    pub fn purge_unused_layers(&mut self) -> usize {
        let used: HashSet<LayerId> = self.all_entities().filter_map(|e| self.layer_of(e)).collect();
        let unused: Vec<LayerId> = self
            .layers
            .handles()
            .into_iter()
            .filter(|&l| l != LayerId::DEFAULT && !used.contains(&l))
            .collect();
        for &layer in &unused {
            self.layers.remove(layer);
        }
        unused.len()
    }

    /// Drop materials no live entity references, listed or not.
    ///
    /// Returns the number of listed materials removed.
    pub fn purge_unused_materials(&mut self) -> usize {
        let used: HashSet<MaterialId> = self
            .all_entities()
            .flat_map(|e| [self.material_of(e), self.back_material_of(e)])
            .flatten()
            .collect();
        let mut removed = 0;
        for id in self.materials.all_ids() {
            if used.contains(&id) {
                continue;
            }
            let listed = self.materials.contains(id);
            if self.materials.delete(id).is_some() && listed {
                removed += 1;
            }
        }
        removed
    }

    /// Merge pairs of collinear edges split by a vertex nothing else uses.
    ///
    /// Both edges must border the same faces and carry the same flags,
    /// material and layer. The vertex is dropped from the bordering loops.
    /// Returns the number of edges removed.
    pub fn repair_split_edges(&mut self, container: ContainerId) -> usize {
        let mut candidates: Vec<VertexId> = Vec::new();
        let mut seen = HashSet::new();
        for entity in self.entities(container) {
            let Some(edge) = entity.as_edge().and_then(|e| self.edge(e)) else {
                continue;
            };
            for v in edge.vertices() {
                if seen.insert(v) {
                    candidates.push(v);
                }
            }
        }

        let mut merged = 0;
        for v in candidates {
            if self.merge_at_vertex(container, v) {
                merged += 1;
            }
        }
        merged
    }

    fn merge_at_vertex(&mut self, container: ContainerId, v: VertexId) -> bool {
        let Some((keep, drop, a, b)) = self.split_pair(container, v) else {
            return false;
        };
        let mut faces: Vec<FaceId> = self.edge(keep).map(|e| e.faces().to_vec()).unwrap_or_default();
        faces.sort_unstable();
        faces.dedup();

        self.drop_edge(drop);
        self.reattach_edge(keep, v, b);
        for face in faces {
            self.remove_loop_vertex(face, v);
        }
        tracing::trace!(vertex = %v, from = %a, to = %b, "merged split edge");
        true
    }

    /// The two edges meeting at a split vertex: `(keep, drop, far_a, far_b)`.
    fn split_pair(&self, container: ContainerId, v: VertexId) -> Option<(EdgeId, EdgeId, VertexId, VertexId)> {
        let incident: Vec<EdgeId> = self
            .vertex(v)?
            .edges()
            .iter()
            .copied()
            .filter(|&e| self.edge(e).is_some_and(|edge| edge.parent() == container))
            .collect();
        let &[e1, e2] = incident.as_slice() else {
            return None;
        };
        // Used elsewhere in the model (another container) keeps the vertex.
        if self.vertex(v)?.edges().iter().any(|&e| e != e1 && e != e2 && self.is_alive(Entity::Edge(e))) {
            return None;
        }
        let (edge1, edge2) = (self.edge(e1)?, self.edge(e2)?);
        let a = edge1.other_vertex(v)?;
        let b = edge2.other_vertex(v)?;
        if a == b || self.find_edge(container, a, b).is_some() {
            return None;
        }

        let same_props = edge1.hidden == edge2.hidden
            && edge1.soft == edge2.soft
            && edge1.smooth == edge2.smooth
            && edge1.material == edge2.material
            && edge1.layer == edge2.layer;
        if !same_props {
            return None;
        }
        let mut faces1 = edge1.faces().to_vec();
        let mut faces2 = edge2.faces().to_vec();
        faces1.sort_unstable();
        faces2.sort_unstable();
        if faces1 != faces2 {
            return None;
        }

        let (pa, pv, pb) = (self.position(a)?, self.position(v)?, self.position(b)?);
        collinear_between(&pa, &pv, &pb).then_some((e1, e2, a, b))
    }
}

/// Whether `mid` lies on the segment `a`–`b`, strictly between the ends.
fn collinear_between(a: &Point3<f64>, mid: &Point3<f64>, b: &Point3<f64>) -> bool {
    let to_mid = mid - a;
    let to_end = b - mid;
    let scale = to_mid.norm() * to_end.norm();
    if scale < f64::EPSILON {
        return false;
    }
    to_mid.cross(&to_end).norm() <= 1e-9 * scale && to_mid.dot(&to_end) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Layer;
    use crate::material::{Color, Material};

    #[test]
    fn unique_name_suffixes() {
        let taken = ["Chair", "Chair#1", "Chair#2"];
        assert_eq!(unique_name("Chair", |n| taken.contains(&n)), "Chair#3");
        assert_eq!(unique_name("Chair#1", |n| taken.contains(&n)), "Chair#3");
        assert_eq!(unique_name("Table", |n| taken.contains(&n)), "Table");
    }

    #[test]
    fn unique_definition_name_avoids_live_names() {
        let mut model = Model::new();
        model.add_definition("Door");
        model.add_definition("Door");
        assert_eq!(model.unique_definition_name("Door"), "Door#1");
    }

    #[test]
    fn purge_definitions_follows_nesting() {
        let mut model = Model::new();
        let used = model.add_definition("used");
        let nested = model.add_definition("nested");
        let unused = model.add_definition("unused");
        let unused_child = model.add_definition("unused child");
        assert!(model.add_instance(ContainerId::Root, used).is_ok());
        assert!(model.add_instance(ContainerId::Definition(used), nested).is_ok());
        assert!(model.add_instance(ContainerId::Definition(unused), unused_child).is_ok());

        assert_eq!(model.purge_unused_definitions(), 2);
        assert!(model.definition(used).is_some());
        assert!(model.definition(nested).is_some());
        assert!(model.definition(unused).is_none());
        assert_eq!(model.instance_count(), 2);
    }

    #[test]
    fn purge_definitions_keeps_what_edit_context_places() {
        let mut model = Model::new();
        let open = model.add_definition("open");
        let part = model.add_definition("part");
        let stray = model.add_definition("stray");
        let placed = model
            .add_instance(ContainerId::Definition(open), part)
            .unwrap_or_else(|e| panic!("{e}"));
        model.set_active_context(Some(open));

        assert_eq!(model.purge_unused_definitions(), 1);
        assert!(model.definition(open).is_some());
        assert!(model.definition(part).is_some());
        assert!(model.definition(stray).is_none());
        let target = model.instance(placed).map(crate::entities::Instance::definition);
        assert_eq!(target, Some(part));
    }

    #[test]
    fn purge_definition_erases_contents() {
        let mut model = Model::new();
        let def = model.add_definition("loose");
        let container = ContainerId::Definition(def);
        let v: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| model.add_vertex(Point3::new(x, y, 0.0)))
            .collect();
        assert!(model.add_face(container, &v).is_ok());
        assert_eq!(model.purge_unused_definitions(), 1);
        assert_eq!(model.face_count(), 0);
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn purge_layers_keeps_default_and_used() {
        let mut model = Model::new();
        let used = model.add_layer(Layer::new("walls"));
        let unused = model.add_layer(Layer::new("empty"));
        let a = model.add_vertex(Point3::origin());
        let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let edge = model.add_edge(ContainerId::Root, a, b).unwrap_or_else(|e| panic!("{e}"));
        model.set_layer(Entity::Edge(edge), Some(used));

        assert_eq!(model.purge_unused_layers(), 1);
        assert!(model.layer(used).is_some());
        assert!(model.layer(unused).is_none());
        assert!(model.layer(LayerId::DEFAULT).is_some());
    }

    #[test]
    fn purge_materials_counts_listed_only() {
        let mut model = Model::new();
        let used = model.add_material(Material::new("used", Color::WHITE));
        model.add_material(Material::new("unused", Color::WHITE));
        model.add_unlisted_material(Material::new("stray", Color::WHITE));
        let a = model.add_vertex(Point3::origin());
        let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let edge = model.add_edge(ContainerId::Root, a, b).unwrap_or_else(|e| panic!("{e}"));
        model.set_material(Entity::Edge(edge), Some(used));

        assert_eq!(model.purge_unused_materials(), 1);
        assert_eq!(model.materials().all_ids(), vec![used]);
    }

    #[test]
    fn repair_split_edge_under_face() {
        let mut model = Model::new();
        let p = |m: &mut Model, x: f64, y: f64| m.add_vertex(Point3::new(x, y, 0.0));
        let v0 = p(&mut model, 0.0, 0.0);
        let mid = p(&mut model, 1.0, 0.0);
        let v1 = p(&mut model, 2.0, 0.0);
        let v2 = p(&mut model, 2.0, 2.0);
        let v3 = p(&mut model, 0.0, 2.0);
        let face = model
            .add_face(ContainerId::Root, &[v0, mid, v1, v2, v3])
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(model.repair_split_edges(ContainerId::Root), 1);
        assert_eq!(model.edge_count(), 4);
        assert_eq!(model.face(face).map(|f| f.outer_loop().to_vec()), Some(vec![v0, v1, v2, v3]));
        let bottom = model.find_edge(ContainerId::Root, v0, v1);
        assert_eq!(bottom.and_then(|e| model.edge(e)).map(|e| e.faces().to_vec()), Some(vec![face]));
    }

    #[test]
    fn repair_skips_corners_and_differing_edges() {
        let mut model = Model::new();
        let p = |m: &mut Model, x: f64, y: f64| m.add_vertex(Point3::new(x, y, 0.0));
        let v0 = p(&mut model, 0.0, 0.0);
        let mid = p(&mut model, 1.0, 0.0);
        let v1 = p(&mut model, 2.0, 0.0);
        let e1 = model.add_edge(ContainerId::Root, v0, mid).unwrap_or_else(|e| panic!("{e}"));
        model.add_edge(ContainerId::Root, mid, v1).unwrap_or_else(|e| panic!("{e}"));
        if let Some(edge) = model.edge_mut(e1) {
            edge.soft = true;
        }
        assert_eq!(model.repair_split_edges(ContainerId::Root), 0);
        assert_eq!(model.edge_count(), 2);
    }
}
