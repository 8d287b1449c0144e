//! Model validation and health reporting.
//!
//! Checks the invariants the cleanup passes rely on and reports violations.

use hashbrown::{HashMap, HashSet};
use scene_types::{Entity, FaceId, Model};
use tracing::debug;

/// Report of model validation results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReport {
    /// Live edges.
    pub edge_count: usize,
    /// Live faces.
    pub face_count: usize,
    /// Live instances.
    pub instance_count: usize,
    /// Live component definitions.
    pub definition_count: usize,
    /// Layers, including the default layer.
    pub layer_count: usize,
    /// Materials on the managed list.
    pub material_count: usize,

    /// Definitions whose name an earlier definition already uses.
    pub duplicate_definition_names: usize,
    /// Material references that point outside the managed list.
    pub orphan_material_references: usize,
    /// References to erased vertices, edges, faces, definitions or layers,
    /// and face/edge links that are not mutual.
    pub dangling_references: usize,
    /// Edges that list the same face more than once.
    pub anomalous_edges: usize,
}

impl ModelReport {
    /// Check if the model has any issues.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }

    /// Get a count of total issues found.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.duplicate_definition_names
            + self.orphan_material_references
            + self.dangling_references
            + self.anomalous_edges
    }

    /// Whether the model satisfies every checked invariant.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.has_issues()
    }
}

impl std::fmt::Display for ModelReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Model Report:")?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Instances: {}", self.instance_count)?;
        writeln!(f, "  Definitions: {}", self.definition_count)?;
        writeln!(f, "  Layers: {}", self.layer_count)?;
        writeln!(f, "  Materials: {}", self.material_count)?;

        if self.has_issues() {
            writeln!(f)?;
            writeln!(f, "  Issues:")?;
            if self.duplicate_definition_names > 0 {
                writeln!(f, "    Duplicate definition names: {}", self.duplicate_definition_names)?;
            }
            if self.orphan_material_references > 0 {
                writeln!(f, "    Orphan material references: {}", self.orphan_material_references)?;
            }
            if self.dangling_references > 0 {
                writeln!(f, "    Dangling references: {}", self.dangling_references)?;
            }
            if self.anomalous_edges > 0 {
                writeln!(f, "    Anomalous edges: {}", self.anomalous_edges)?;
            }
        } else {
            writeln!(f, "  Status: Valid")?;
        }
        Ok(())
    }
}

/// Validate a model and return a report of any issues.
#[must_use]
pub fn validate_model(model: &Model) -> ModelReport {
    let mut report = ModelReport {
        edge_count: model.edge_count(),
        face_count: model.face_count(),
        instance_count: model.instance_count(),
        definition_count: model.definition_count(),
        layer_count: model.layer_count(),
        material_count: model.materials().len(),
        ..ModelReport::default()
    };

    let mut seen_names: HashSet<&str> = HashSet::new();
    for (_, definition) in model.definitions() {
        if !seen_names.insert(definition.name.as_str()) {
            report.duplicate_definition_names += 1;
        }
    }

    for id in model.edge_ids() {
        let Some(edge) = model.edge(id) else {
            continue;
        };
        report.dangling_references += edge.vertices().iter().filter(|&&v| model.vertex(v).is_none()).count();
        let mut uses: HashMap<FaceId, usize> = HashMap::new();
        for &f in edge.faces() {
            *uses.entry(f).or_default() += 1;
            match model.face(f) {
                Some(face) if face.edges().contains(&id) => {}
                _ => report.dangling_references += 1,
            }
        }
        if uses.values().any(|&n| n > 1) {
            report.anomalous_edges += 1;
        }
    }

    for id in model.face_ids() {
        let Some(face) = model.face(id) else {
            continue;
        };
        report.dangling_references += face
            .edges()
            .iter()
            .filter(|&&e| !model.edge(e).is_some_and(|edge| edge.faces().contains(&id)))
            .count();
    }

    for id in model.instance_ids() {
        if model.instance(id).is_some_and(|i| model.definition(i.definition()).is_none()) {
            report.dangling_references += 1;
        }
    }

    let entities = model
        .edge_ids()
        .into_iter()
        .map(Entity::Edge)
        .chain(model.face_ids().into_iter().map(Entity::Face))
        .chain(model.instance_ids().into_iter().map(Entity::Instance));
    for entity in entities {
        if model.layer_of(entity).is_some_and(|l| model.layer(l).is_none()) {
            report.dangling_references += 1;
        }
        for material in [model.material_of(entity), model.back_material_of(entity)].into_iter().flatten() {
            if !model.materials().contains(material) {
                report.orphan_material_references += 1;
            }
        }
    }

    debug!(issues = report.issue_count(), "validated model");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_types::{Color, ContainerId, Material, Point3};

    #[test]
    fn clean_model_is_valid() {
        let mut model = Model::new();
        let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| model.add_vertex(Point3::new(x, y, 0.0)))
            .collect();
        assert!(model.add_face(ContainerId::Root, &v).is_ok());
        let report = validate_model(&model);
        assert!(report.is_valid());
        assert_eq!(report.face_count, 1);
        assert_eq!(report.edge_count, 3);
        assert!(report.to_string().contains("Status: Valid"));
    }

    #[test]
    fn duplicate_names_and_orphans_are_reported() {
        let mut model = Model::new();
        model.add_definition("Door");
        model.add_definition("Door");
        let orphan = model.add_unlisted_material(Material::new("image", Color::WHITE));
        let a = model.add_vertex(Point3::origin());
        let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let edge = model.add_edge(ContainerId::Root, a, b).unwrap_or_else(|e| panic!("{e}"));
        model.set_material(Entity::Edge(edge), Some(orphan));

        let report = validate_model(&model);
        assert_eq!(report.duplicate_definition_names, 1);
        assert_eq!(report.orphan_material_references, 1);
        assert_eq!(report.issue_count(), 2);
        assert!(report.to_string().contains("Duplicate definition names: 1"));
    }

    #[test]
    fn erased_layer_reference_dangles() {
        let mut model = Model::new();
        let a = model.add_vertex(Point3::origin());
        let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let edge = model.add_edge(ContainerId::Root, a, b).unwrap_or_else(|e| panic!("{e}"));
        let layer = model.add_layer(scene_types::Layer::new("temp"));
        model.set_layer(Entity::Edge(edge), Some(layer));
        assert!(validate_model(&model).is_valid());

        model.set_layer(Entity::Edge(edge), None);
        assert_eq!(model.purge_unused_layers(), 1);
        model.set_layer(Entity::Edge(edge), Some(layer));
        assert_eq!(validate_model(&model).dangling_references, 1);
    }
}
