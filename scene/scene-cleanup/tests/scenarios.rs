//! End-to-end scenarios for the cleanup passes.
//!
//! Run with: cargo test -p scene-cleanup --test scenarios

use std::fs;

use approx::assert_relative_eq;
use scene_cleanup::{
    CleanupParams, ModelHost, NoProgress, OrphanMaterialMode, OverlapParams, cleanup_model, erase_duplicate_faces,
    erase_hidden, erase_lonely_edges, fix_orphan_materials, merge_coplanar_faces, merge_similar_materials,
};
use scene_types::{
    AttributeValue, Color, ContainerId, Entity, FaceId, Material, Model, Point3, Texture, VertexId,
    polygon_area,
};

// =============================================================================
// Fixtures
// =============================================================================

fn vertices(model: &mut Model, points: &[(f64, f64, f64)]) -> Vec<VertexId> {
    points
        .iter()
        .map(|&(x, y, z)| model.add_vertex(Point3::new(x, y, z)))
        .collect()
}

fn face(model: &mut Model, loop_vertices: &[VertexId]) -> FaceId {
    model
        .add_face(ContainerId::Root, loop_vertices)
        .unwrap_or_else(|e| panic!("{e}"))
}

// =============================================================================
// Scenario A: coplanar squares
// =============================================================================

#[test]
fn scenario_a_coplanar_squares_merge() {
    let mut model = Model::new();
    let paint = model.add_material(Material::new("paint", Color::rgb(90, 90, 90)));
    let v = vertices(
        &mut model,
        &[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (2.0, 1.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
        ],
    );
    let left = face(&mut model, &[v[0], v[1], v[4], v[5]]);
    let right = face(&mut model, &[v[1], v[2], v[3], v[4]]);
    for f in [left, right] {
        model.set_material(Entity::Face(f), Some(paint));
    }
    let (faces, edges) = (model.face_count(), model.edge_count());

    let entities = model.entities(ContainerId::Root);
    let merged = merge_coplanar_faces(&mut model, &entities, &CleanupParams::default(), &mut NoProgress);

    assert_eq!(merged, 1);
    assert_eq!(model.face_count(), faces - 1);
    assert_eq!(model.edge_count(), edges - 1);
    assert_eq!(model.material_of(Entity::Face(left)), Some(paint));
}

// =============================================================================
// Scenario B: identical loops
// =============================================================================

#[test]
fn scenario_b_identical_loops_lose_exactly_one() {
    let mut model = Model::new();
    let v = vertices(
        &mut model,
        &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0)],
    );
    let a = face(&mut model, &v);
    let b = face(&mut model, &[v[1], v[2], v[3], v[0]]);

    let entities = model.entities(ContainerId::Root);
    let erased = erase_duplicate_faces(&mut model, &entities, &OverlapParams::default(), &mut NoProgress);

    assert_eq!(erased, 1);
    let alive = [a, b]
        .iter()
        .filter(|&&f| model.is_alive(Entity::Face(f)))
        .count();
    assert_eq!(alive, 1);
}

// =============================================================================
// Scenario C: lonely edges and cut openings
// =============================================================================

#[test]
fn scenario_c_lonely_edge_erased_unless_cutout_ground() {
    let mut model = Model::new();
    let v = vertices(&mut model, &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 0.0, 2.0), (1.0, 0.0, 2.0)]);

    let raised = model
        .add_edge(ContainerId::Root, v[2], v[3])
        .unwrap_or_else(|e| panic!("{e}"));
    let entities = model.entities(ContainerId::Root);
    assert_eq!(erase_lonely_edges(&mut model, &entities, &mut NoProgress), 1);
    assert!(!model.is_alive(Entity::Edge(raised)));

    let window = model.add_definition("window");
    if let Some(definition) = model.definition_mut(window) {
        definition.cuts_opening = true;
    }
    let container = ContainerId::Definition(window);
    let sill = model.add_edge(container, v[0], v[1]).unwrap_or_else(|e| panic!("{e}"));
    let entities = model.entities(container);
    assert_eq!(erase_lonely_edges(&mut model, &entities, &mut NoProgress), 0);
    assert!(model.is_alive(Entity::Edge(sill)));

    // Hidden does not make it erasable either.
    model.set_hidden(Entity::Edge(sill), true);
    assert_eq!(erase_hidden(&mut model, &entities, &mut NoProgress), 0);
    assert!(model.is_alive(Entity::Edge(sill)));
}

// =============================================================================
// Scenario D: attribute dictionaries
// =============================================================================

#[test]
fn scenario_d_attributes_gate_material_merge() {
    let build = || {
        let mut model = Model::new();
        model.add_material(
            Material::new("a", Color::rgb(10, 20, 30)).with_attribute("renderer", AttributeValue::Int(1)),
        );
        model.add_material(
            Material::new("b", Color::rgb(10, 20, 30)).with_attribute("renderer", AttributeValue::Int(2)),
        );
        model
    };

    let mut strict = build();
    assert_eq!(merge_similar_materials(&mut strict, false, true, &mut NoProgress), 0);
    assert_eq!(strict.materials().len(), 2);

    let mut relaxed = build();
    assert_eq!(merge_similar_materials(&mut relaxed, true, true, &mut NoProgress), 1);
    assert_eq!(relaxed.materials().len(), 1);
}

// =============================================================================
// Scenario E: orphan with texture file on disk
// =============================================================================

#[test]
fn scenario_e_orphan_texture_on_disk_is_reused() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("oak.jpg");
    fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap_or_else(|e| panic!("{e}"));

    let mut model = Model::new();
    let orphan = model.add_unlisted_material(
        Material::new("oak", Color::WHITE).with_texture(Texture::new(&path, 0.5, 0.5).with_image_size(64, 64)),
    );
    let v = vertices(&mut model, &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)]);
    let f = face(&mut model, &v);
    model.set_material(Entity::Face(f), Some(orphan));

    let mut host = ModelHost::new();
    assert_eq!(fix_orphan_materials(&mut model, OrphanMaterialMode::Repair, &mut host), 1);

    let clone = model
        .material_of(Entity::Face(f))
        .unwrap_or_else(|| panic!("face lost its material"));
    assert_ne!(clone, orphan);
    assert!(model.materials().contains(clone));
    let texture = model
        .material(clone)
        .and_then(|m| m.texture.clone())
        .unwrap_or_else(|| panic!("clone has no texture"));
    assert_eq!(texture.filename, path);
    assert_eq!((texture.image_width, texture.image_height), (64, 64));
    // No export happened, so the original file is untouched and no scratch
    // geometry was created.
    assert!(path.exists());
    assert_eq!(model.definition_count(), 0);
}

// =============================================================================
// Scenario F: a face overlapping its neighbour
// =============================================================================

fn quad_with_inner_triangle() -> (Model, FaceId) {
    let mut model = Model::new();
    let v = vertices(
        &mut model,
        &[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 1.0), (0.0, 1.0, 1.0)],
    );
    let quad = face(&mut model, &v);
    face(&mut model, &[v[0], v[1], v[2]]);
    (model, quad)
}

#[test]
fn scenario_f_overlap_is_erased_not_merged() {
    let (mut model, quad) = quad_with_inner_triangle();

    let report = cleanup_model(&mut model, &CleanupParams::thorough()).unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(model.face_ids(), vec![quad]);
    assert_eq!(model.face(quad).map(|f| f.outer_loop().len()), Some(4));
    assert_relative_eq!(polygon_area(&model.face_points(quad)), 1.0, epsilon = 1e-9);
    // The diagonal left behind by the triangle is lonely and goes too.
    assert_eq!(model.edge_count(), 4);
    assert_eq!(report.faces_reduced, Some(1));
}
