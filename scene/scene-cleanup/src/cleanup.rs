//! The cleanup pipeline.

use std::time::Instant;

use scene_types::Model;
use tracing::info;

use crate::coplanar::merge_coplanar_faces;
use crate::definitions::fix_component_names;
use crate::duplicate::erase_duplicate_faces;
use crate::error::CleanupResult;
use crate::hidden::erase_hidden;
use crate::host::{CleanupHost, ModelHost};
use crate::lonely::erase_lonely_edges;
use crate::materials::merge_similar_materials;
use crate::orphan::fix_orphan_materials;
use crate::params::{CleanupParams, OrphanMaterialMode};
use crate::postprocess::post_process_entities;
use crate::report::CleanupReport;
use crate::scope::{Scope, count_scope_entity, model_entities, scope_containers, scope_entities};

/// Name of the undoable operation wrapping a run.
pub const OPERATION_NAME: &str = "Cleanup Model";

/// Run the full cleanup pipeline on `model`.
///
/// Stages run in a fixed order: erase hidden entities, purge unused
/// definitions, fix duplicate definition names (whole-model scope only), fix
/// orphan materials, merge identical materials, merge coplanar faces, erase
/// duplicate faces and merge again, erase lonely edges, repair split edges,
/// post-process, then purge definitions, layers and materials. All of it
/// happens inside one host operation. Statistics are handed to the host and
/// the validity check is scheduled only after that operation commits.
///
/// Material merging and orphan repair touch the whole model regardless of
/// [`CleanupParams::scope`].
///
/// # Errors
///
/// Returns an error if `params` fails [`CleanupParams::validate`]; the model
/// is untouched in that case.
///
/// # Example
///
/// ```
/// use scene_cleanup::{CleanupParams, ModelHost, cleanup};
/// use scene_types::{ContainerId, Model, Point3};
///
/// let mut model = Model::new();
/// let a = model.add_vertex(Point3::new(0.0, 0.0, 1.0));
/// let b = model.add_vertex(Point3::new(1.0, 0.0, 1.0));
/// model.add_edge(ContainerId::Root, a, b).unwrap();
///
/// let mut host = ModelHost::new();
/// let report = cleanup(&mut model, &CleanupParams::default(), &mut host).unwrap();
/// assert_eq!(report.edges_reduced, Some(1));
/// assert_eq!(model.edge_count(), 0);
/// ```
pub fn cleanup<H: CleanupHost + ?Sized>(
    model: &mut Model,
    params: &CleanupParams,
    host: &mut H,
) -> CleanupResult<CleanupReport> {
    params.validate()?;
    let started = Instant::now();
    let scope = params.scope;
    let mut report = CleanupReport::new();
    info!(%scope, "starting cleanup");
    host.start_operation(OPERATION_NAME);

    if params.erase_hidden {
        stage(host, "Erasing hidden entities", count_scope_entity(model, scope));
        let entities = scope_entities(model, scope);
        report.hidden_entities_erased = Some(erase_hidden(model, &entities, host));
    }

    if params.purge_unused {
        stage(host, "Purging components", 0);
        report.purged_components = Some(host.purge_definitions(model));
    }

    if scope == Scope::WholeModel {
        stage(host, "Looking for duplicate component names", model.definition_count());
        report.duplicate_component_names_fixed = Some(fix_component_names(model, host));
    }

    if params.orphan_materials != OrphanMaterialMode::Ignore {
        stage(host, "Looking for orphan materials", model_entities(model).len());
        report.orphan_materials_fixed = Some(fix_orphan_materials(model, params.orphan_materials, host));
    }

    if params.merge_materials {
        let total = model.materials().len() + model_entities(model).len();
        stage(host, "Merging materials", total);
        report.materials_merged = Some(merge_similar_materials(
            model,
            params.merge_ignore_attributes,
            !params.purge_unused,
            host,
        ));
    }

    if params.merge_coplanar_faces {
        merge_faces(model, params, host, &mut report);
    }

    if params.erase_duplicate_faces {
        stage(host, "Removing duplicate faces", count_scope_entity(model, scope));
        let erased: usize = scope_containers(model, scope)
            .into_iter()
            .map(|(_, entities)| erase_duplicate_faces(model, &entities, &params.overlap, host))
            .sum();
        CleanupReport::add(&mut report.faces_reduced, erased);

        // Removing duplicates can leave new coplanar neighbours.
        if params.merge_coplanar_faces {
            merge_faces(model, params, host, &mut report);
        }
    }

    if params.erase_lonely_edges {
        stage(host, "Removing lonely edges", count_scope_entity(model, scope));
        let erased: usize = scope_containers(model, scope)
            .into_iter()
            .map(|(_, entities)| erase_lonely_edges(model, &entities, host))
            .sum();
        CleanupReport::add(&mut report.edges_reduced, erased);
    }

    if params.repair_split_edges {
        let containers = scope_containers(model, scope);
        stage(host, "Repairing split edges", containers.len());
        let mut repaired = 0;
        for (container, _) in containers {
            host.advance();
            if model.container_alive(container) {
                repaired += host.repair_split_edges(model, container);
            }
        }
        CleanupReport::add(&mut report.edges_reduced, repaired);
    }

    stage(host, "Post processing", count_scope_entity(model, scope));
    let entities = scope_entities(model, scope);
    post_process_entities(model, &entities, params, host);

    if params.purge_unused {
        stage(host, "Purging unused", 0);
        let purged = host.purge_definitions(model);
        CleanupReport::add(&mut report.purged_components, purged);
        report.purged_layers = Some(host.purge_layers(model));
        report.purged_materials = Some(host.purge_materials(model));
    }

    host.commit_operation();

    report.elapsed = started.elapsed();
    info!("{report}");
    if params.show_statistics {
        host.show_statistics(&report);
    }
    if params.validate_after {
        host.schedule_validity_check(model);
    }
    Ok(report)
}

/// Run [`cleanup`] with the reference [`ModelHost`].
///
/// # Errors
///
/// See [`cleanup`].
pub fn cleanup_model(model: &mut Model, params: &CleanupParams) -> CleanupResult<CleanupReport> {
    cleanup(model, params, &mut ModelHost::new())
}

fn stage<H: CleanupHost + ?Sized>(host: &mut H, label: &str, total: usize) {
    info!(stage = label, total, "cleanup stage");
    host.begin(label, total);
}

/// One coplanar merge pass over the scope, accumulated into `report`.
fn merge_faces<H: CleanupHost + ?Sized>(
    model: &mut Model,
    params: &CleanupParams,
    host: &mut H,
    report: &mut CleanupReport,
) {
    stage(host, "Merging faces", count_scope_entity(model, params.scope));
    let faces_before = model.face_count();
    let entities = scope_entities(model, params.scope);
    let merged = merge_coplanar_faces(model, &entities, params, host);
    CleanupReport::add(&mut report.edges_reduced, merged);
    CleanupReport::add(&mut report.faces_reduced, faces_before.saturating_sub(model.face_count()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanupError;
    use scene_types::{Color, ContainerId, Entity, Layer, Material, Point3, VertexId};

    fn grid(model: &mut Model, container: ContainerId) {
        // Two coplanar unit squares sharing an edge, lifted off the ground.
        let v: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| model.add_vertex(Point3::new(x, y, 1.0)))
            .collect();
        assert!(model.add_face(container, &[v[0], v[1], v[4], v[5]]).is_ok());
        assert!(model.add_face(container, &[v[1], v[2], v[3], v[4]]).is_ok());
    }

    #[test]
    fn invalid_params_abort_before_mutation() {
        let mut model = Model::new();
        grid(&mut model, ContainerId::Root);
        let mut host = ModelHost::new();
        let params = CleanupParams::default().with_smooth_angle(-5.0);
        assert!(matches!(
            cleanup(&mut model, &params, &mut host),
            Err(CleanupError::InvalidConfig { .. })
        ));
        assert!(host.operations.is_empty());
        assert_eq!(model.face_count(), 2);
    }

    #[test]
    fn default_run_merges_and_reports() {
        let mut model = Model::new();
        grid(&mut model, ContainerId::Root);
        let mut host = ModelHost::new();
        let report = cleanup(&mut model, &CleanupParams::default(), &mut host).unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(model.face_count(), 1);
        assert_eq!(report.faces_reduced, Some(1));
        // The shared edge, then the two split edges left along the long sides.
        assert_eq!(report.edges_reduced, Some(3));
        assert_eq!(model.edge_count(), 4);
        assert_eq!(host.operations, vec![OPERATION_NAME.to_string()]);
        assert_eq!(host.commits, 1);
        assert!(!host.in_operation());
        assert_eq!(host.shown.len(), 1);
        assert!(host.shown[0].starts_with("Cleanup Statistics:"));
        assert_eq!(host.validations.len(), 1);
        assert!(host.validations[0].is_valid());
    }

    #[test]
    fn quiet_run_skips_statistics_and_validation() {
        let mut model = Model::new();
        grid(&mut model, ContainerId::Root);
        let mut host = ModelHost::new();
        let params = CleanupParams::default()
            .with_show_statistics(false)
            .with_validate_after(false);
        assert!(cleanup(&mut model, &params, &mut host).is_ok());
        assert!(host.shown.is_empty());
        assert!(host.validations.is_empty());
    }

    #[test]
    fn duplicate_faces_then_merge_again() {
        let mut model = Model::new();
        let v: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| model.add_vertex(Point3::new(x, y, 1.0)))
            .collect();
        let red = model.add_material(Material::new("red", Color::rgb(255, 0, 0)));
        let left = model
            .add_face(ContainerId::Root, &[v[0], v[1], v[4], v[5]])
            .unwrap_or_else(|e| panic!("{e}"));
        let twin = model
            .add_face(ContainerId::Root, &[v[1], v[4], v[5], v[0]])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(model.add_face(ContainerId::Root, &[v[1], v[2], v[3], v[4]]).is_ok());
        // The twin blocks the first merge; only its removal lets the halves join.
        model.set_material(Entity::Face(left), Some(red));
        model.set_material(Entity::Face(twin), Some(red));

        let params = CleanupParams::default()
            .with_erase_duplicate_faces(true)
            .with_merge_ignore_materials(true);
        let report = cleanup_model(&mut model, &params).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(model.face_count(), 1);
        assert_eq!(report.faces_reduced, Some(2));
    }

    #[test]
    fn hidden_layer_geometry_and_unused_layers_go() {
        let mut model = Model::new();
        let scrap = model.add_layer(Layer::hidden("scrap"));
        let def = model.add_definition("crate");
        let instance = model.add_instance(ContainerId::Root, def).unwrap_or_else(|e| panic!("{e}"));
        model.set_layer(Entity::Instance(instance), Some(scrap));

        let params = CleanupParams::default().with_erase_hidden(true);
        let report = cleanup_model(&mut model, &params).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(report.hidden_entities_erased, Some(1));
        assert_eq!(report.purged_components, Some(1));
        assert_eq!(report.purged_layers, Some(1));
        assert_eq!(model.definition_count(), 0);
    }

    #[test]
    fn definition_names_fixed_only_for_whole_model() {
        let mut model = Model::new();
        for _ in 0..2 {
            let def = model.add_definition("Door");
            assert!(model.add_instance(ContainerId::Root, def).is_ok());
        }
        let params = CleanupParams::default().with_scope(Scope::CurrentEditContext);
        let report = cleanup_model(&mut model, &params).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(report.duplicate_component_names_fixed, None);

        let report = cleanup_model(&mut model, &CleanupParams::default()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(report.duplicate_component_names_fixed, Some(1));
        assert!(report.to_string().contains("> Duplicate Component Names Fixed: 1"));
    }
}
