//! Detection and repair of orphan materials.
//!
//! An orphan is a material the model stores (it resolves by index) but the
//! managed list does not contain. Entities pick these up from embedded
//! images, or keep them after a material was taken off the list while still
//! in use. Like material merging, this pass walks the whole model.

use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use scene_types::{ContainerId, Entity, Material, MaterialId, Model, Texture};
use tracing::{debug, warn};

use crate::error::{CleanupError, CleanupResult};
use crate::host::{Progress, TextureWriter};
use crate::params::OrphanMaterialMode;
use crate::scope::model_entities;

/// Name given to the throwaway definition used to render a texture.
const SCRATCH_DEFINITION: &str = "Cleanup Texture Scratch";

/// Stored materials absent from the managed list, in index order.
#[must_use]
pub fn find_orphan_materials(model: &Model) -> Vec<MaterialId> {
    let materials = model.materials();
    materials
        .all_ids()
        .into_iter()
        .filter(|&id| !materials.contains(id))
        .collect()
}

/// Whether a material reference points outside the managed list.
#[must_use]
pub fn is_orphan_reference(model: &Model, material: MaterialId) -> bool {
    !model.materials().contains(material)
}

/// Add a listed copy of `orphan` to the model.
///
/// The copy takes a fresh unique name plus the orphan's color, alpha and
/// type. A texture whose file still exists is reused by path. Otherwise the
/// texture is rendered through `writer` into a temporary file and read back;
/// if that fails the copy keeps the orphan's texture descriptor. Returns
/// `None` when `orphan` no longer resolves.
pub fn create_replacement_material<W: TextureWriter + ?Sized>(
    model: &mut Model,
    orphan: MaterialId,
    writer: &mut W,
) -> Option<MaterialId> {
    let original = model.material(orphan)?.clone();
    let mut replacement = Material::new(model.unique_material_name(&original.name), original.color)
        .with_alpha(original.alpha);
    replacement.material_type = original.material_type;

    if let Some(texture) = &original.texture {
        let copied = if texture.filename.exists() {
            texture.clone()
        } else {
            match render_texture(model, orphan, texture, writer) {
                Ok(rendered) => rendered,
                Err(e) => {
                    warn!(material = %original.name, error = %e, "could not render texture; keeping its descriptor");
                    texture.clone()
                }
            }
        };
        replacement.texture = Some(copied);
    }

    let id = model.add_material(replacement);
    debug!(orphan = %original.name, "created replacement material");
    Some(id)
}

/// Render `orphan`'s texture through a scratch instance and read it back.
///
/// The scratch instance, its definition and the temporary file are gone
/// when this returns, whether or not rendering succeeded.
fn render_texture<W: TextureWriter + ?Sized>(
    model: &mut Model,
    orphan: MaterialId,
    texture: &Texture,
    writer: &mut W,
) -> CleanupResult<Texture> {
    let dir = tempfile::tempdir()?;
    let file_name = texture
        .filename
        .file_name()
        .map_or_else(|| Path::new("texture.png").to_path_buf(), |name| Path::new(name).to_path_buf());
    let path = dir.path().join(file_name);

    let definition = model.add_definition(SCRATCH_DEFINITION);
    let instance = match model.add_instance(ContainerId::Root, definition) {
        Ok(instance) => instance,
        Err(e) => {
            model.erase_definition(definition);
            return Err(e.into());
        }
    };
    let carrier = Entity::Instance(instance);
    model.set_material(carrier, Some(orphan));

    let written = writer
        .write_texture(model, carrier, &path)
        .and_then(|()| fs::read(&path).map_err(CleanupError::from));

    model.erase_entities(&[carrier]);
    model.erase_definition(definition);

    let bytes = written?;
    fs::remove_file(&path)?;
    Ok(Texture {
        filename: path,
        image_data: Some(bytes),
        ..texture.clone()
    })
}

/// Fix every entity reference to an orphan material.
///
/// In [`OrphanMaterialMode::Repair`] each distinct orphan is replaced by one
/// listed copy, created on first use. In [`OrphanMaterialMode::Strip`] the
/// references are cleared. References to materials that no longer resolve at
/// all are cleared in both modes. Returns the number of references changed.
pub fn fix_orphan_materials<H: Progress + TextureWriter + ?Sized>(
    model: &mut Model,
    mode: OrphanMaterialMode,
    host: &mut H,
) -> usize {
    if mode == OrphanMaterialMode::Ignore {
        return 0;
    }
    let mut repairs: HashMap<MaterialId, Option<MaterialId>> = HashMap::new();
    let mut fixed = 0;

    for entity in model_entities(model) {
        host.advance();
        for back in [false, true] {
            let current = if back {
                model.back_material_of(entity)
            } else {
                model.material_of(entity)
            };
            let Some(material) = current.filter(|&m| is_orphan_reference(model, m)) else {
                continue;
            };

            let replacement = match mode {
                OrphanMaterialMode::Repair if model.materials().is_alive(material) => {
                    match repairs.get(&material) {
                        Some(&done) => done,
                        None => {
                            let created = create_replacement_material(model, material, host);
                            repairs.insert(material, created);
                            created
                        }
                    }
                }
                _ => None,
            };

            let changed = if back {
                model.set_back_material(entity, replacement)
            } else {
                model.set_material(entity, replacement)
            };
            if changed {
                fixed += 1;
            }
        }
    }
    debug!(fixed, replacements = repairs.len(), "fixed orphan material references");
    fixed
}
