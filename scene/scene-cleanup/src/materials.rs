//! Merging materials that look identical.
//!
//! Redirection walks the whole model, not just the configured scope: a
//! material is shared model-wide, so every reference to a merged material is
//! moved to its canonical representative.

use hashbrown::HashMap;
use scene_types::{Material, MaterialId, Model};
use tracing::debug;

use crate::host::Progress;
use crate::scope::model_entities;

/// Whether two materials render the same.
///
/// Color, material type and texture descriptor must match. Attribute
/// dictionaries are compared too unless `ignore_attributes` is set.
#[must_use]
pub fn materials_equivalent(a: &Material, b: &Material, ignore_attributes: bool) -> bool {
    if a.color != b.color || a.material_type != b.material_type {
        return false;
    }
    let textures_match = match (&a.texture, &b.texture) {
        (None, None) => true,
        (Some(ta), Some(tb)) => ta.same_image(tb),
        _ => false,
    };
    textures_match && (ignore_attributes || a.attributes == b.attributes)
}

/// Partition of the listed materials into equivalence classes.
///
/// Each class is represented by its first material in list order.
#[derive(Debug, Clone, Default)]
pub struct MaterialClusters {
    redirects: Vec<(MaterialId, MaterialId)>,
    lookup: HashMap<MaterialId, MaterialId>,
}

impl MaterialClusters {
    /// Canonical representative of `id`. Materials outside any merged class
    /// are their own representative.
    #[must_use]
    pub fn canonical(&self, id: MaterialId) -> MaterialId {
        self.lookup.get(&id).copied().unwrap_or(id)
    }

    /// Merged materials and their representatives, in discovery order.
    #[must_use]
    pub fn redirects(&self) -> &[(MaterialId, MaterialId)] {
        &self.redirects
    }

    /// Number of materials merged into another.
    #[must_use]
    pub fn merged_count(&self) -> usize {
        self.redirects.len()
    }

    /// Whether nothing is merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.redirects.is_empty()
    }

    fn insert(&mut self, from: MaterialId, to: MaterialId) {
        self.redirects.push((from, to));
        self.lookup.insert(from, to);
    }
}

/// Cluster the listed materials, first seen wins.
///
/// The worklist is the managed list in order. Its head becomes a
/// representative and every later material equivalent to it joins its class
/// and leaves the worklist. One pass; classes are not re-examined.
#[must_use]
pub fn cluster_materials<P: Progress + ?Sized>(
    model: &Model,
    ignore_attributes: bool,
    progress: &mut P,
) -> MaterialClusters {
    let mut stack: Vec<(MaterialId, &Material)> = model.materials().iter().collect();
    let mut clusters = MaterialClusters::default();
    let mut head = 0;
    while head < stack.len() {
        progress.advance();
        let (proto_id, proto) = stack[head];
        head += 1;
        let mut kept = Vec::with_capacity(stack.len() - head);
        for &(id, material) in &stack[head..] {
            if materials_equivalent(proto, material, ignore_attributes) {
                clusters.insert(id, proto_id);
            } else {
                kept.push((id, material));
            }
        }
        stack.truncate(head);
        stack.extend(kept);
    }
    clusters
}

/// Point every front and back material reference in the model at its
/// canonical representative. Returns the number of references rewritten.
pub fn redirect_materials<P: Progress + ?Sized>(
    model: &mut Model,
    clusters: &MaterialClusters,
    progress: &mut P,
) -> usize {
    if clusters.is_empty() {
        return 0;
    }
    let mut rewritten = 0;
    for entity in model_entities(model) {
        progress.advance();
        if let Some(old) = model.material_of(entity) {
            let new = clusters.canonical(old);
            if new != old && model.set_material(entity, Some(new)) {
                rewritten += 1;
            }
        }
        if let Some(old) = model.back_material_of(entity) {
            let new = clusters.canonical(old);
            if new != old && model.set_back_material(entity, Some(new)) {
                rewritten += 1;
            }
        }
    }
    rewritten
}

/// Merge identical materials across the model.
///
/// With `remove_merged`, merged materials are taken off the managed list
/// afterwards; leave it off when a purge follows. Returns the number of
/// materials merged.
pub fn merge_similar_materials<P: Progress + ?Sized>(
    model: &mut Model,
    ignore_attributes: bool,
    remove_merged: bool,
    progress: &mut P,
) -> usize {
    let clusters = cluster_materials(model, ignore_attributes, progress);
    let rewritten = redirect_materials(model, &clusters, progress);
    if remove_merged {
        for &(merged, _) in clusters.redirects() {
            model.materials_mut().remove(merged);
        }
    }
    debug!(merged = clusters.merged_count(), rewritten, "merged similar materials");
    clusters.merged_count()
}
