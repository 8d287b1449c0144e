//! Scoped entity enumeration.
//!
//! Two traversal contracts are kept apart: [`scope_entities`] visits what the
//! user asked to clean, while [`model_entities`] always visits the whole
//! model. Material redirection and orphan repair use the latter even when the
//! configured scope is narrower.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashSet;
use scene_types::{ContainerId, DefinitionId, Entity, Model};

use crate::error::CleanupError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Enumeration domain for a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum Scope {
    /// The root and every definition's contents, each visited once.
    #[default]
    WholeModel,
    /// The container currently open for editing.
    CurrentEditContext,
    /// The current selection, without descending into instances.
    Selection,
}

impl Scope {
    /// Canonical tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WholeModel => "WholeModel",
            Self::CurrentEditContext => "CurrentEditContext",
            Self::Selection => "Selection",
        }
    }

    /// Scope a user most likely means: the selection if anything is
    /// selected, else the open edit context, else the whole model.
    #[must_use]
    pub fn default_for(model: &Model) -> Self {
        if !model.selection().is_empty() {
            Self::Selection
        } else if model.active_context().is_some() {
            Self::CurrentEditContext
        } else {
            Self::WholeModel
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = CleanupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WholeModel" | "Model" => Ok(Self::WholeModel),
            "CurrentEditContext" | "Local" => Ok(Self::CurrentEditContext),
            "Selection" | "Selected" => Ok(Self::Selection),
            other => Err(CleanupError::InvalidScope {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Scope {
    type Error = CleanupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

/// Unique entities in scope, in a stable order.
#[must_use]
pub fn scope_entities(model: &Model, scope: Scope) -> Vec<Entity> {
    scope_containers(model, scope)
        .into_iter()
        .flat_map(|(_, entities)| entities)
        .collect()
}

/// Number of entities [`scope_entities`] would yield. Used to size progress.
#[must_use]
pub fn count_scope_entity(model: &Model, scope: Scope) -> usize {
    match scope {
        Scope::WholeModel => model_containers(model)
            .into_iter()
            .map(|c| model.entities(c).len())
            .sum(),
        Scope::CurrentEditContext => model.entities(model.active_entities()).len(),
        Scope::Selection => unique(model.selection()).len(),
    }
}

/// Scoped entities grouped by the container that owns them.
///
/// Bulk erasure targets one container at a time, so passes that erase in
/// bulk iterate these groups.
#[must_use]
pub fn scope_containers(model: &Model, scope: Scope) -> Vec<(ContainerId, Vec<Entity>)> {
    match scope {
        Scope::WholeModel => model_containers(model)
            .into_iter()
            .map(|c| (c, model.entities(c)))
            .collect(),
        Scope::CurrentEditContext => {
            let container = model.active_entities();
            vec![(container, model.entities(container))]
        }
        Scope::Selection => {
            let mut groups: Vec<(ContainerId, Vec<Entity>)> = Vec::new();
            for entity in unique(model.selection()) {
                let Some(parent) = model.parent_of(entity) else {
                    continue;
                };
                match groups.iter_mut().find(|(c, _)| *c == parent) {
                    Some((_, list)) => list.push(entity),
                    None => groups.push((parent, vec![entity])),
                }
            }
            groups
        }
    }
}

/// Every unique entity in the model, regardless of scope.
#[must_use]
pub fn model_entities(model: &Model) -> Vec<Entity> {
    scope_entities(model, Scope::WholeModel)
}

/// Root first, then definitions in the order instances reach them, then any
/// definition no instance reaches. Each container appears once no matter how
/// often its definition is placed.
fn model_containers(model: &Model) -> Vec<ContainerId> {
    let mut visited: HashSet<DefinitionId> = HashSet::new();
    let mut order = vec![ContainerId::Root];
    let mut cursor = 0;
    while cursor < order.len() {
        let container = order[cursor];
        cursor += 1;
        for entity in model.entities(container) {
            let Some(definition) = entity
                .as_instance()
                .and_then(|i| model.instance(i))
                .map(scene_types::Instance::definition)
            else {
                continue;
            };
            if visited.insert(definition) {
                order.push(ContainerId::Definition(definition));
            }
        }
    }
    for container in model.containers() {
        if let ContainerId::Definition(d) = container {
            if visited.insert(d) {
                order.push(container);
            }
        }
    }
    order
}

fn unique(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::with_capacity(entities.len());
    entities.into_iter().filter(|e| seen.insert(*e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_types::Point3;

    fn model_with_nested_instances() -> (Model, DefinitionId) {
        let mut model = Model::new();
        let def = model.add_definition("bolt");
        let a = model.add_vertex(Point3::origin());
        let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let inner = ContainerId::Definition(def);
        assert!(model.add_edge(inner, a, b).is_ok());
        for _ in 0..50 {
            assert!(model.add_instance(ContainerId::Root, def).is_ok());
        }
        (model, def)
    }

    #[test]
    fn scope_tags_parse() {
        assert_eq!("Model".parse::<Scope>().ok(), Some(Scope::WholeModel));
        assert_eq!("Local".parse::<Scope>().ok(), Some(Scope::CurrentEditContext));
        assert_eq!("Selected".parse::<Scope>().ok(), Some(Scope::Selection));
        assert_eq!("Selection".parse::<Scope>().ok(), Some(Scope::Selection));
        assert!(matches!(
            "everything".parse::<Scope>(),
            Err(CleanupError::InvalidScope { .. })
        ));
    }

    #[test]
    fn whole_model_visits_definition_once() {
        let (model, _) = model_with_nested_instances();
        let entities = scope_entities(&model, Scope::WholeModel);
        // 50 instances + 1 edge inside the definition.
        assert_eq!(entities.len(), 51);
        assert_eq!(count_scope_entity(&model, Scope::WholeModel), 51);
        assert_eq!(scope_containers(&model, Scope::WholeModel).len(), 2);
    }

    #[test]
    fn unreached_definitions_are_still_visited() {
        let mut model = Model::new();
        let def = model.add_definition("loose");
        let a = model.add_vertex(Point3::origin());
        let b = model.add_vertex(Point3::new(0.0, 1.0, 0.0));
        assert!(model.add_edge(ContainerId::Definition(def), a, b).is_ok());
        assert_eq!(model_entities(&model).len(), 1);
    }

    #[test]
    fn edit_context_is_flat() {
        let (mut model, def) = model_with_nested_instances();
        model.set_active_context(Some(def));
        assert_eq!(count_scope_entity(&model, Scope::CurrentEditContext), 1);
        let groups = scope_containers(&model, Scope::CurrentEditContext);
        assert_eq!(groups[0].0, ContainerId::Definition(def));
    }

    #[test]
    fn selection_is_deduplicated_and_grouped() {
        let (mut model, _) = model_with_nested_instances();
        let root = model.entities(ContainerId::Root);
        model.set_selection(vec![root[0], root[1], root[0]]);
        assert_eq!(count_scope_entity(&model, Scope::Selection), 2);
        let groups = scope_containers(&model, Scope::Selection);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn default_scope_follows_model_state() {
        let (mut model, def) = model_with_nested_instances();
        assert_eq!(Scope::default_for(&model), Scope::WholeModel);
        model.set_active_context(Some(def));
        assert_eq!(Scope::default_for(&model), Scope::CurrentEditContext);
        let first = model.entities(ContainerId::Root)[0];
        model.set_selection(vec![first]);
        assert_eq!(Scope::default_for(&model), Scope::Selection);
    }
}
