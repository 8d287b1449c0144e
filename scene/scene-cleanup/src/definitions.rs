//! Resolution of duplicate component definition names.

use scene_types::{DefinitionId, Model};
use tracing::{debug, info};

use crate::host::Progress;

/// Give every component definition a unique name.
///
/// Definitions are visited in storage order. The first holder of a name keeps
/// it; every later definition with the same name is renamed to a fresh name
/// unique across the model. Returns the number renamed.
pub fn fix_component_names<P: Progress + ?Sized>(model: &mut Model, progress: &mut P) -> usize {
    let ids: Vec<DefinitionId> = model.definitions().map(|(id, _)| id).collect();
    let mut renamed = 0;
    for &id in &ids {
        progress.advance();
        let Some(name) = model.definition(id).map(|d| d.name.clone()) else {
            continue;
        };
        let copies: Vec<DefinitionId> = model
            .definitions()
            .filter(|&(other, d)| other != id && d.name == name)
            .map(|(other, _)| other)
            .collect();
        if copies.is_empty() {
            continue;
        }
        info!(name = %name, copies = copies.len(), "multiple definitions share a name");
        for copy in copies {
            let fresh = model.unique_definition_name(&name);
            info!(from = %name, to = %fresh, "renaming definition");
            if let Some(definition) = model.definition_mut(copy) {
                definition.name = fresh;
                renamed += 1;
            }
        }
    }
    debug!(renamed, "fixed duplicate definition names");
    renamed
}
