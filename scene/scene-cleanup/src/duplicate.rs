//! Erasure of duplicate and overlapped faces.

use hashbrown::HashSet;
use scene_types::{Entity, FaceId, Model};
use tracing::debug;

use crate::host::Progress;
use crate::params::OverlapParams;
use crate::predicates::faces_duplicate;

/// Faces among `entities` that duplicate or are overlapped by an earlier
/// face sharing an edge with them.
///
/// Faces are visited in order; a face already marked is never a reference
/// for further marks. Of a pair with identical loops, the later one is
/// marked. The result is in marking order.
#[must_use]
pub fn find_duplicate_faces<P: Progress + ?Sized>(
    model: &Model,
    entities: &[Entity],
    overlap: &OverlapParams,
    progress: &mut P,
) -> Vec<FaceId> {
    let faces: Vec<FaceId> = entities
        .iter()
        .filter(|&&e| model.is_alive(e))
        .filter_map(|e| e.as_face())
        .collect();
    let in_container: HashSet<FaceId> = faces.iter().copied().collect();

    let mut confirmed: Vec<FaceId> = Vec::new();
    let mut marked: HashSet<FaceId> = HashSet::new();
    for &face in &faces {
        progress.advance();
        if marked.contains(&face) {
            continue;
        }
        let Some(f) = model.face(face) else {
            continue;
        };

        let mut connected: Vec<FaceId> = Vec::new();
        for &edge in f.edges() {
            let Some(e) = model.edge(edge) else {
                continue;
            };
            for &neighbour in e.faces() {
                if neighbour != face
                    && in_container.contains(&neighbour)
                    && !marked.contains(&neighbour)
                    && !connected.contains(&neighbour)
                {
                    connected.push(neighbour);
                }
            }
        }

        for neighbour in connected {
            if faces_duplicate(model, face, neighbour, Some(overlap)) && marked.insert(neighbour) {
                confirmed.push(neighbour);
            }
        }
    }
    confirmed
}

/// Erase duplicate faces among `entities`, which must share one container.
///
/// Duplicates are found with [`find_duplicate_faces`] and erased in a single
/// bulk call. Returns the number erased.
pub fn erase_duplicate_faces<P: Progress + ?Sized>(
    model: &mut Model,
    entities: &[Entity],
    overlap: &OverlapParams,
    progress: &mut P,
) -> usize {
    let duplicates: Vec<Entity> = find_duplicate_faces(model, entities, overlap, progress)
        .into_iter()
        .map(Entity::Face)
        .collect();
    if duplicates.is_empty() {
        return 0;
    }
    let erased = model.erase_entities(&duplicates);
    debug!(erased, "erased duplicate faces");
    erased
}
