//! Erasure of hidden entities and entities on hidden layers.

use scene_types::{EdgeId, Entity, Model};
use tracing::debug;

use crate::host::Progress;
use crate::predicates::edge_on_cutout_ground;

/// Whether a hidden or soft edge must survive erasure.
///
/// An edge is protected when an adjacent face is visible or sits on a
/// visible layer, or when it outlines a cut opening on the ground plane.
#[must_use]
pub fn edge_protected(model: &Model, edge: EdgeId) -> bool {
    let Some(e) = model.edge(edge) else {
        return false;
    };
    let face_shows = e.faces().iter().any(|&f| {
        model
            .face(f)
            .is_some_and(|face| !face.hidden || model.layer_visible(face.layer))
    });
    face_shows || edge_on_cutout_ground(model, edge)
}

/// Whether the entity would be erased by [`erase_hidden`].
#[must_use]
pub fn is_erasable_hidden(model: &Model, entity: Entity) -> bool {
    if !model.is_alive(entity) {
        return false;
    }
    let invisible_layer = !model.layer_visible(model.layer_of(entity));
    match entity {
        Entity::Edge(id) => {
            let soft = model.edge(id).is_some_and(|e| e.soft);
            (model.is_hidden(entity) || soft || invisible_layer) && !edge_protected(model, id)
        }
        Entity::Face(_) | Entity::Instance(_) => model.is_hidden(entity) || invisible_layer,
    }
}

/// Erase hidden, soft or hidden-layer entities one by one.
///
/// Entities erased earlier in the run (including faces taken down with
/// their edges) are skipped. Returns the number erased by this pass.
pub fn erase_hidden<P: Progress + ?Sized>(model: &mut Model, entities: &[Entity], progress: &mut P) -> usize {
    let mut erased = 0;
    for &entity in entities {
        progress.advance();
        if is_erasable_hidden(model, entity) && model.erase_entity(entity) {
            erased += 1;
        }
    }
    debug!(erased, "erased hidden entities");
    erased
}
