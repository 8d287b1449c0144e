//! Final per-entity touch-ups: default layer, edge materials and smoothing.

use scene_types::{Entity, Model};
use tracing::debug;

use crate::host::Progress;
use crate::params::CleanupParams;

/// Angle in degrees between the normals of the two faces an edge borders.
///
/// `None` unless the edge borders exactly two live faces.
#[must_use]
pub fn edge_face_angle(model: &Model, entity: Entity) -> Option<f64> {
    let edge = model.edge(entity.as_edge()?)?;
    let &[a, b] = edge.faces() else {
        return None;
    };
    let (fa, fb) = (model.face(a)?, model.face(b)?);
    Some(fa.normal().angle(&fb.normal()).to_degrees())
}

/// Apply the post-processing options to one entity. Returns whether
/// anything changed.
///
/// Edges and faces moved to the default layer keep their effective
/// visibility: an entity leaving an invisible layer is hidden. Edges may
/// lose their material and are smoothed and softened when the faces they
/// border meet within the smoothing angle.
pub fn post_process(model: &mut Model, entity: Entity, params: &CleanupParams) -> bool {
    if !model.is_alive(entity) {
        return false;
    }
    let mut changed = false;

    if params.geometry_to_default_layer && matches!(entity, Entity::Edge(_) | Entity::Face(_)) {
        let layer = model.layer_of(entity);
        if !model.layer_visible(layer) {
            changed |= model.set_hidden(entity, true);
        }
        if layer.is_some() {
            changed |= model.set_layer(entity, None);
        }
    }

    let Entity::Edge(id) = entity else {
        return changed;
    };
    if params.remove_edge_materials && model.material_of(entity).is_some() {
        changed |= model.set_material(entity, None);
    }
    if params.smooth_angle_degrees > 0.0 {
        let within = edge_face_angle(model, entity).is_some_and(|angle| angle.abs() <= params.smooth_angle_degrees);
        if within {
            if let Some(edge) = model.edge_mut(id) {
                changed |= !(edge.smooth && edge.soft);
                edge.smooth = true;
                edge.soft = true;
            }
        }
    }
    changed
}

/// Post-process every entity among `entities`. Returns the number changed.
pub fn post_process_entities<P: Progress + ?Sized>(
    model: &mut Model,
    entities: &[Entity],
    params: &CleanupParams,
    progress: &mut P,
) -> usize {
    let mut changed = 0;
    for &entity in entities {
        progress.advance();
        if post_process(model, entity, params) {
            changed += 1;
        }
    }
    debug!(changed, "post-processed entities");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scene_types::{Color, ContainerId, EdgeId, Layer, Material, Point3};

    /// Two faces folded along the x axis by `degrees`.
    fn hinge(degrees: f64) -> (Model, EdgeId) {
        let mut model = Model::new();
        let (s, c) = degrees.to_radians().sin_cos();
        let a = model.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let flat = model.add_vertex(Point3::new(0.5, 1.0, 0.0));
        let bent = model.add_vertex(Point3::new(0.5, -c, s));
        assert!(model.add_face(ContainerId::Root, &[a, b, flat]).is_ok());
        assert!(model.add_face(ContainerId::Root, &[b, a, bent]).is_ok());
        let hinge = model.find_edge(ContainerId::Root, a, b).unwrap_or_else(|| panic!("hinge"));
        (model, hinge)
    }

    #[test]
    fn face_angle_of_a_hinge() {
        let (model, edge) = hinge(30.0);
        let angle = edge_face_angle(&model, Entity::Edge(edge)).unwrap_or_default();
        assert_relative_eq!(angle, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn shallow_hinges_are_smoothed() {
        let (mut model, edge) = hinge(10.0);
        let params = CleanupParams::default().with_smooth_angle(15.0);
        assert!(post_process(&mut model, Entity::Edge(edge), &params));
        let e = model.edge(edge).unwrap_or_else(|| panic!("edge"));
        assert!(e.smooth && e.soft);
    }

    #[test]
    fn sharp_hinges_and_zero_angle_are_left_alone() {
        let (mut model, edge) = hinge(40.0);
        assert!(!post_process(&mut model, Entity::Edge(edge), &CleanupParams::default().with_smooth_angle(15.0)));
        let (mut model, edge) = hinge(10.0);
        assert!(!post_process(&mut model, Entity::Edge(edge), &CleanupParams::default()));
        assert!(model.edge(edge).is_some_and(|e| !e.smooth));
    }

    #[test]
    fn geometry_to_default_layer_keeps_visibility() {
        let (mut model, edge) = hinge(90.0);
        let hidden = model.add_layer(Layer::hidden("old"));
        let shown = model.add_layer(Layer::new("walls"));
        let face = model.face_ids()[0];
        model.set_layer(Entity::Edge(edge), Some(hidden));
        model.set_layer(Entity::Face(face), Some(shown));

        let params = CleanupParams::default().with_geometry_to_default_layer(true);
        let entities = model.entities(ContainerId::Root);
        post_process_entities(&mut model, &entities, &params, &mut crate::host::NoProgress);

        assert_eq!(model.layer_of(Entity::Edge(edge)), None);
        assert!(model.is_hidden(Entity::Edge(edge)));
        assert_eq!(model.layer_of(Entity::Face(face)), None);
        assert!(!model.is_hidden(Entity::Face(face)));
    }

    #[test]
    fn edge_materials_removed() {
        let (mut model, edge) = hinge(90.0);
        let red = model.add_material(Material::new("red", Color::rgb(255, 0, 0)));
        model.set_material(Entity::Edge(edge), Some(red));
        let params = CleanupParams::default().with_remove_edge_materials(true);
        assert!(post_process(&mut model, Entity::Edge(edge), &params));
        assert_eq!(model.material_of(Entity::Edge(edge)), None);
    }
}
