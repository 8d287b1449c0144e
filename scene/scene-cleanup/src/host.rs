//! Collaborators the cleanup drives: progress, texture export and the host
//! application's operation, purge, split-edge and validation services.
//!
//! Every method has a working default, so [`ModelHost`] only records what
//! happened. An embedding application overrides what it does natively.

use std::fs;
use std::path::Path;

use scene_types::{ContainerId, Entity, Model};
use tracing::debug;

use crate::error::{CleanupError, CleanupResult};
use crate::report::CleanupReport;
use crate::validate::{ModelReport, validate_model};

/// Incremental progress for long stages.
pub trait Progress {
    /// A stage with `total` steps starts.
    fn begin(&mut self, _label: &str, _total: usize) {}

    /// One step of the current stage is done.
    fn advance(&mut self) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Renders the texture shown on an entity into an image file.
pub trait TextureWriter {
    /// Write the texture of `carrier`'s material to `path`.
    ///
    /// The default writes the embedded image bytes the model keeps for the
    /// material.
    ///
    /// # Errors
    ///
    /// [`CleanupError::Texture`] when the material has no image to write,
    /// [`CleanupError::Io`] when the file cannot be written.
    fn write_texture(&mut self, model: &Model, carrier: Entity, path: &Path) -> CleanupResult<()> {
        write_embedded_texture(model, carrier, path)
    }
}

/// Write the embedded image of `carrier`'s material to `path`.
///
/// # Errors
///
/// See [`TextureWriter::write_texture`].
pub fn write_embedded_texture(model: &Model, carrier: Entity, path: &Path) -> CleanupResult<()> {
    let material = model
        .material_of(carrier)
        .and_then(|id| model.material(id))
        .ok_or_else(|| CleanupError::Texture {
            material: String::new(),
            reason: format!("{carrier:?} carries no material"),
        })?;
    let data = material
        .texture
        .as_ref()
        .and_then(|t| t.image_data.as_deref())
        .ok_or_else(|| CleanupError::Texture {
            material: material.name.clone(),
            reason: "no embedded image data".to_string(),
        })?;
    fs::write(path, data)?;
    debug!(material = %material.name, path = %path.display(), bytes = data.len(), "wrote texture");
    Ok(())
}

/// Services the orchestrator needs from the application hosting the model.
pub trait CleanupHost: Progress + TextureWriter {
    /// Open the single undoable operation wrapping the run.
    fn start_operation(&mut self, _name: &str) {}

    /// Close the operation opened by [`CleanupHost::start_operation`].
    fn commit_operation(&mut self) {}

    /// Purge unused component definitions. Returns how many were removed.
    fn purge_definitions(&mut self, model: &mut Model) -> usize {
        model.purge_unused_definitions()
    }

    /// Purge unused layers. Returns how many were removed.
    fn purge_layers(&mut self, model: &mut Model) -> usize {
        model.purge_unused_layers()
    }

    /// Purge unused materials. Returns how many were removed.
    fn purge_materials(&mut self, model: &mut Model) -> usize {
        model.purge_unused_materials()
    }

    /// Join split edges in one container. Returns edges removed.
    fn repair_split_edges(&mut self, model: &mut Model, container: ContainerId) -> usize {
        model.repair_split_edges(container)
    }

    /// Present the statistics.
    fn show_statistics(&mut self, _report: &CleanupReport) {}

    /// Queue a validity check. Called only after the operation committed;
    /// the check runs its own operation and must not nest inside ours.
    fn schedule_validity_check(&mut self, _model: &Model) {}
}

/// Reference host: native model services plus a record of what the
/// orchestrator asked for.
#[derive(Debug, Clone, Default)]
pub struct ModelHost {
    /// Operations started, in order.
    pub operations: Vec<String>,
    /// Number of commits.
    pub commits: usize,
    /// Progress stages begun: label and total.
    pub stages: Vec<(String, usize)>,
    /// Progress steps taken across all stages.
    pub steps: usize,
    /// Reports handed over for display.
    pub shown: Vec<String>,
    /// Results of validity checks, run when scheduled.
    pub validations: Vec<ModelReport>,
    /// Whether an operation is open.
    open: bool,
}

impl ModelHost {
    /// Create a host with empty records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an operation is currently open.
    #[must_use]
    pub const fn in_operation(&self) -> bool {
        self.open
    }
}

impl Progress for ModelHost {
    fn begin(&mut self, label: &str, total: usize) {
        self.stages.push((label.to_string(), total));
    }

    fn advance(&mut self) {
        self.steps += 1;
    }
}

impl TextureWriter for ModelHost {}

impl CleanupHost for ModelHost {
    fn start_operation(&mut self, name: &str) {
        self.operations.push(name.to_string());
        self.open = true;
    }

    fn commit_operation(&mut self) {
        self.commits += 1;
        self.open = false;
    }

    fn show_statistics(&mut self, report: &CleanupReport) {
        self.shown.push(report.to_string());
    }

    fn schedule_validity_check(&mut self, model: &Model) {
        // No event loop here: the commit already happened, so run it now.
        self.validations.push(validate_model(model));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_types::{Color, Material, Point3, Texture};

    fn textured_instance(data: Option<Vec<u8>>) -> (Model, Entity) {
        let mut model = Model::new();
        let mut texture = Texture::new("lost.png", 1.0, 1.0);
        texture.image_data = data;
        let material = model.add_material(Material::new("wood", Color::WHITE).with_texture(texture));
        let def = model.add_definition("scratch");
        let a = model.add_vertex(Point3::origin());
        let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
        assert!(model.add_edge(ContainerId::Definition(def), a, b).is_ok());
        let instance = model
            .add_instance(ContainerId::Root, def)
            .unwrap_or_else(|e| panic!("{e}"));
        model.set_material(Entity::Instance(instance), Some(material));
        (model, Entity::Instance(instance))
    }

    #[test]
    fn embedded_texture_written() {
        let (model, carrier) = textured_instance(Some(vec![1, 2, 3, 4]));
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("wood.png");
        let mut host = ModelHost::new();
        assert!(host.write_texture(&model, carrier, &path).is_ok());
        assert_eq!(fs::read(&path).unwrap_or_default(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn missing_image_is_texture_error() {
        let (model, carrier) = textured_instance(None);
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let result = write_embedded_texture(&model, carrier, &dir.path().join("wood.png"));
        assert!(matches!(result, Err(CleanupError::Texture { .. })));
    }

    #[test]
    fn model_host_records_operation() {
        let mut host = ModelHost::new();
        host.start_operation("Cleanup Model");
        assert!(host.in_operation());
        host.begin("Merging Faces", 3);
        host.advance();
        host.commit_operation();
        assert!(!host.in_operation());
        assert_eq!(host.operations, vec!["Cleanup Model".to_string()]);
        assert_eq!(host.stages, vec![("Merging Faces".to_string(), 3)]);
        assert_eq!(host.steps, 1);
    }
}
