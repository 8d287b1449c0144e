//! The model's material collection.
//!
//! Two views exist over the same storage. Index enumeration ([`Materials::at`])
//! sees every stored material; membership ([`Materials::contains`],
//! [`Materials::iter`]) sees only materials listed in the managed collection.
//! A material visible by index but not listed is an orphan: it was assigned
//! from outside the list, or it was removed from the list while still in use.

use crate::handles::{Arena, Handle, MaterialId};
use crate::material::Material;

/// Managed material collection plus unlisted materials still in the model.
#[derive(Debug, Clone, Default)]
pub struct Materials {
    arena: Arena<MaterialId, Material>,
    listed: Vec<MaterialId>,
}

impl Materials {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material to the managed list.
    pub fn add(&mut self, material: Material) -> MaterialId {
        let id = self.arena.insert(material);
        self.listed.push(id);
        id
    }

    /// Store a material without listing it, as happens when a material is
    /// picked up from an embedded image.
    pub fn add_unlisted(&mut self, material: Material) -> MaterialId {
        self.arena.insert(material)
    }

    /// Borrow a stored material, listed or not.
    #[must_use]
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.arena.get(id)
    }

    /// Mutably borrow a stored material, listed or not.
    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.arena.get_mut(id)
    }

    /// Whether the material is stored at all.
    #[must_use]
    pub fn is_alive(&self, id: MaterialId) -> bool {
        self.arena.is_alive(id)
    }

    /// Membership test against the managed list.
    #[must_use]
    pub fn contains(&self, id: MaterialId) -> bool {
        self.arena.is_alive(id) && self.listed.contains(&id)
    }

    /// Listed materials in list order.
    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> + '_ {
        self.listed
            .iter()
            .filter_map(|&id| self.arena.get(id).map(|m| (id, m)))
    }

    /// Listed material handles in list order.
    #[must_use]
    pub fn ids(&self) -> Vec<MaterialId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Number of listed materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listed.iter().filter(|&&id| self.arena.is_alive(id)).count()
    }

    /// Whether no materials are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upper bound for index enumeration with [`Materials::at`].
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.arena.slot_count()
    }

    /// Index enumeration: the stored material at `index`, listed or not.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<MaterialId> {
        let id = MaterialId::from_index(index);
        self.arena.is_alive(id).then_some(id)
    }

    /// Every stored material reachable by index, in index order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<MaterialId> {
        (0..self.index_count()).filter_map(|i| self.at(i)).collect()
    }

    /// Take a material off the managed list.
    ///
    /// The material stays resolvable so existing references do not dangle;
    /// they become orphan references until redirected or purged.
    pub fn remove(&mut self, id: MaterialId) -> bool {
        let before = self.listed.len();
        self.listed.retain(|&listed| listed != id);
        self.listed.len() != before
    }

    /// Drop a material from storage entirely.
    pub(crate) fn delete(&mut self, id: MaterialId) -> Option<Material> {
        self.listed.retain(|&listed| listed != id);
        self.arena.remove(id)
    }

    /// Whether any material, listed or not, already uses `name`.
    #[must_use]
    pub fn name_taken(&self, name: &str) -> bool {
        self.arena.iter().any(|(_, m)| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Color;

    #[test]
    fn listed_and_unlisted_views() {
        let mut materials = Materials::new();
        let red = materials.add(Material::new("red", Color::rgb(255, 0, 0)));
        let image = materials.add_unlisted(Material::new("image", Color::WHITE));

        assert!(materials.contains(red));
        assert!(!materials.contains(image));
        assert_eq!(materials.len(), 1);
        assert_eq!(materials.all_ids(), vec![red, image]);
        assert_eq!(materials.at(1), Some(image));
    }

    #[test]
    fn remove_detaches_but_keeps_material() {
        let mut materials = Materials::new();
        let id = materials.add(Material::new("m", Color::WHITE));
        assert!(materials.remove(id));
        assert!(!materials.contains(id));
        assert!(materials.get(id).is_some());
        assert!(!materials.remove(id));
    }

    #[test]
    fn delete_drops_storage() {
        let mut materials = Materials::new();
        let id = materials.add(Material::new("m", Color::WHITE));
        assert!(materials.delete(id).is_some());
        assert!(materials.get(id).is_none());
        assert_eq!(materials.at(0), None);
        assert!(materials.is_empty());
    }

    #[test]
    fn name_lookup_covers_unlisted() {
        let mut materials = Materials::new();
        materials.add_unlisted(Material::new("ghost", Color::WHITE));
        assert!(materials.name_taken("ghost"));
        assert!(!materials.name_taken("other"));
    }
}
