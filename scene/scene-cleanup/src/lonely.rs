//! Erasure of edges that bound no face.

use scene_types::{EdgeId, Entity, Model};
use tracing::debug;

use crate::host::Progress;
use crate::predicates::edge_on_cutout_ground;

/// Whether an edge bounds nothing: no faces, or several references that all
/// point at the same face.
#[must_use]
pub fn is_lonely_edge(model: &Model, edge: EdgeId) -> bool {
    let Some(e) = model.edge(edge) else {
        return false;
    };
    match e.faces() {
        [] => true,
        [first, rest @ ..] => !rest.is_empty() && rest.iter().all(|f| f == first),
    }
}

/// Erase lonely edges among `entities`, which must share one container.
///
/// Candidates are collected first and erased in a single bulk call. Edges
/// outlining a cut opening on the ground plane are kept. Returns the number
/// erased.
pub fn erase_lonely_edges<P: Progress + ?Sized>(model: &mut Model, entities: &[Entity], progress: &mut P) -> usize {
    let mut lonely = Vec::new();
    for &entity in entities {
        progress.advance();
        let Some(edge) = entity.as_edge() else {
            continue;
        };
        if !model.is_alive(entity) || edge_on_cutout_ground(model, edge) {
            continue;
        }
        if is_lonely_edge(model, edge) {
            lonely.push(entity);
        }
    }
    let erased = model.erase_entities(&lonely);
    debug!(erased, "erased lonely edges");
    erased
}
