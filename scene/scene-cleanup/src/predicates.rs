//! Geometric predicates shared by the passes.

use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};
use scene_types::{ContainerId, EdgeId, FaceId, Model, Plane, Side, VertexId, classify_point};

use crate::params::OverlapParams;

/// Tolerance for direction and ground-plane tests.
const GEOMETRY_EPSILON: f64 = 1e-9;

/// Whether two normals point the same way. Anti-parallel normals fail.
#[must_use]
pub fn normals_same_direction(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    let (la, lb) = (a.norm(), b.norm());
    if la < f64::EPSILON || lb < f64::EPSILON {
        return false;
    }
    a.cross(b).norm() <= GEOMETRY_EPSILON * la * lb && a.dot(b) > 0.0
}

/// Whether two faces occupy the same space.
///
/// Faces with the same vertex set are always duplicates. With `overlap`,
/// `second` also counts when its vertices are a strict subset of `first`'s
/// and a probe just past one of `second`'s unshared edges lands inside
/// `first`.
#[must_use]
pub fn faces_duplicate(model: &Model, first: FaceId, second: FaceId, overlap: Option<&OverlapParams>) -> bool {
    if first == second {
        return false;
    }
    let (Some(f1), Some(f2)) = (model.face(first), model.face(second)) else {
        return false;
    };
    let v1: HashSet<VertexId> = f1.outer_loop().iter().copied().collect();
    let v2: HashSet<VertexId> = f2.outer_loop().iter().copied().collect();
    if v1 == v2 {
        return true;
    }
    let Some(overlap) = overlap else {
        return false;
    };
    if !v2.is_subset(&v1) {
        return false;
    }

    let Some(probe_edge) = f2.edges().iter().copied().find(|e| !f1.edges().contains(e)) else {
        return false;
    };
    let Some(probe) = probe_point(model, probe_edge, overlap.probe_offset) else {
        return false;
    };
    let class = classify_point(&model.face_points(first), &f1.normal(), &probe, overlap.classify_tolerance);
    overlap.contained.contains(&class)
}

/// A point `offset` along an edge from its start.
fn probe_point(model: &Model, edge: EdgeId, offset: f64) -> Option<Point3<f64>> {
    let edge = model.edge(edge)?;
    let start = model.position(edge.start())?;
    let end = model.position(edge.end())?;
    let direction = (end - start).try_normalize(f64::EPSILON)?;
    Some(start + direction * offset)
}

/// Whether every vertex of both faces lies on their common best-fit plane.
#[must_use]
pub fn faces_coplanar(model: &Model, first: FaceId, second: FaceId, tolerance: f64) -> bool {
    let (Some(f1), Some(f2)) = (model.face(first), model.face(second)) else {
        return false;
    };
    let mut seen = HashSet::new();
    let points: Vec<Point3<f64>> = f1
        .outer_loop()
        .iter()
        .chain(f2.outer_loop())
        .filter(|v| seen.insert(**v))
        .filter_map(|&v| model.position(v))
        .collect();
    let Some(plane) = Plane::fit(&points) else {
        return false;
    };
    points.iter().all(|p| plane.contains(p, tolerance))
}

/// Compare texture coordinates after reducing every component to `[0, 1)`.
///
/// Components closer than `tolerance` on the unit circle compare equal, so a
/// coordinate just below a tile boundary matches one just above it.
#[must_use]
pub fn uv_equal(a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> bool {
    a.iter().zip(b.iter()).all(|(&x, &y)| {
        let d = (fract(x) - fract(y)).abs();
        d.min(1.0 - d) <= tolerance
    })
}

fn fract(x: f64) -> f64 {
    let r = x.rem_euclid(1.0);
    if r >= 1.0 { 0.0 } else { r }
}

/// Whether two faces sharing `edge` map textures continuously across it.
///
/// Both sides are checked at both edge endpoints.
#[must_use]
pub fn continuous_uv(model: &Model, first: FaceId, second: FaceId, edge: EdgeId, tolerance: f64) -> bool {
    let Some(edge) = model.edge(edge) else {
        return false;
    };
    let (Some(p1), Some(p2)) = (model.position(edge.start()), model.position(edge.end())) else {
        return false;
    };
    [Side::Front, Side::Back].into_iter().all(|side| {
        [p1, p2].iter().all(|p| {
            match (model.uvq(first, side, p), model.uvq(second, side, p)) {
                (Some(a), Some(b)) => uv_equal(&a, &b, tolerance),
                _ => false,
            }
        })
    })
}

/// Whether an edge lies on the ground plane inside a definition that cuts
/// openings. Such edges outline the opening and are never erased.
#[must_use]
pub fn edge_on_cutout_ground(model: &Model, edge: EdgeId) -> bool {
    let Some(e) = model.edge(edge) else {
        return false;
    };
    let ContainerId::Definition(definition) = e.parent() else {
        return false;
    };
    if !model.definition(definition).is_some_and(|d| d.cuts_opening) {
        return false;
    }
    let ground = Plane::ground();
    e.vertices()
        .iter()
        .filter_map(|&v| model.position(v))
        .all(|p| ground.contains(&p, GEOMETRY_EPSILON))
}
