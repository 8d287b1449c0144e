//! Merging coplanar faces by dissolving the edge between them.

use scene_types::{EdgeId, Entity, Model};
use tracing::debug;

use crate::host::Progress;
use crate::params::CleanupParams;
use crate::predicates::{continuous_uv, faces_coplanar, faces_duplicate, normals_same_direction};

/// Try to merge the two faces bordering `edge`.
///
/// The checks run in order and stop at the first failure: the edge borders
/// exactly two faces, their normals agree (unless ignored), they are not
/// already duplicates of each other, their materials agree (unless ignored,
/// with UV continuity for textured fronts unless that is ignored too), and
/// every vertex of both lies on their common plane. On success the edge is
/// dissolved and the two faces become one.
pub fn merge_connected_faces(model: &mut Model, edge: EdgeId, params: &CleanupParams) -> bool {
    let Some(e) = model.edge(edge) else {
        return false;
    };
    let &[first, second] = e.faces() else {
        return false;
    };
    let (Some(f1), Some(f2)) = (model.face(first), model.face(second)) else {
        return false;
    };

    if !params.merge_ignore_normals && !normals_same_direction(&f1.normal(), &f2.normal()) {
        return false;
    }
    if faces_duplicate(model, first, second, None) {
        return false;
    }
    if !params.merge_ignore_materials {
        if f1.material != f2.material || f1.back_material != f2.back_material {
            return false;
        }
        let textured = f1
            .material
            .and_then(|m| model.material(m))
            .is_some_and(|m| m.texture.is_some());
        if textured && !params.merge_ignore_uv && !continuous_uv(model, first, second, edge, params.uv_tolerance) {
            return false;
        }
    }
    if !faces_coplanar(model, first, second, params.coplanar_tolerance) {
        return false;
    }
    model.dissolve_edge(edge)
}

/// Merge coplanar faces across every edge among `entities`.
///
/// Returns the number of edges dissolved. Each dissolve also removes one
/// face; callers measure that with [`Model::face_count`].
pub fn merge_coplanar_faces<P: Progress + ?Sized>(
    model: &mut Model,
    entities: &[Entity],
    params: &CleanupParams,
    progress: &mut P,
) -> usize {
    let mut merged = 0;
    for &entity in entities {
        progress.advance();
        let Some(edge) = entity.as_edge() else {
            continue;
        };
        if model.is_alive(entity) && merge_connected_faces(model, edge, params) {
            merged += 1;
        }
    }
    debug!(merged, "merged coplanar faces");
    merged
}
