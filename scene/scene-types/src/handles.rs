//! Typed handles and the arena table that backs every entity collection.
//!
//! Entities are addressed by stable integer handles. Erasing an entity clears
//! its slot but never reuses the index, so a handle taken before an erase can
//! always be checked for liveness instead of dangling.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A typed index into an [`Arena`].
pub trait Handle: Copy + Eq + Hash + fmt::Debug {
    /// Human-readable entity kind, used in error messages.
    const KIND: &'static str;

    /// Build a handle from a raw arena index.
    fn from_index(index: usize) -> Self;

    /// The raw arena index.
    fn index(self) -> usize;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(usize);

        impl Handle for $name {
            const KIND: &'static str = $kind;

            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index)
            }

            #[inline]
            fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

handle!(
    /// Handle to a [`Vertex`](crate::Vertex).
    VertexId,
    "vertex"
);
handle!(
    /// Handle to an [`Edge`](crate::Edge).
    EdgeId,
    "edge"
);
handle!(
    /// Handle to a [`Face`](crate::Face).
    FaceId,
    "face"
);
handle!(
    /// Handle to a component [`Instance`](crate::Instance).
    InstanceId,
    "instance"
);
handle!(
    /// Handle to a [`Material`](crate::Material).
    MaterialId,
    "material"
);
handle!(
    /// Handle to a [`Layer`](crate::Layer).
    LayerId,
    "layer"
);
handle!(
    /// Handle to a [`ComponentDefinition`](crate::ComponentDefinition).
    DefinitionId,
    "definition"
);

impl LayerId {
    /// The default layer every model starts with. It can never be purged.
    pub const DEFAULT: Self = Self(0);
}

/// Any entity that can live inside an entities container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Entity {
    /// An edge between two vertices.
    Edge(EdgeId),
    /// A planar face bounded by an outer loop.
    Face(FaceId),
    /// An instance of a component definition.
    Instance(InstanceId),
}

impl Entity {
    /// The edge handle, if this entity is an edge.
    #[must_use]
    pub const fn as_edge(self) -> Option<EdgeId> {
        match self {
            Self::Edge(id) => Some(id),
            _ => None,
        }
    }

    /// The face handle, if this entity is a face.
    #[must_use]
    pub const fn as_face(self) -> Option<FaceId> {
        match self {
            Self::Face(id) => Some(id),
            _ => None,
        }
    }

    /// The instance handle, if this entity is an instance.
    #[must_use]
    pub const fn as_instance(self) -> Option<InstanceId> {
        match self {
            Self::Instance(id) => Some(id),
            _ => None,
        }
    }
}

impl From<EdgeId> for Entity {
    fn from(id: EdgeId) -> Self {
        Self::Edge(id)
    }
}

impl From<FaceId> for Entity {
    fn from(id: FaceId) -> Self {
        Self::Face(id)
    }
}

impl From<InstanceId> for Entity {
    fn from(id: InstanceId) -> Self {
        Self::Instance(id)
    }
}

/// One mutable entities collection: the model root or a definition's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContainerId {
    /// The model's top-level entities.
    #[default]
    Root,
    /// The entities owned by a component definition.
    Definition(DefinitionId),
}

/// Slot table with liveness.
///
/// Slots are never reused: `remove` leaves a hole so that old handles keep
/// failing [`Arena::is_alive`] instead of silently pointing at a new entity.
#[derive(Debug, Clone)]
pub struct Arena<H, T> {
    slots: Vec<Option<T>>,
    live: usize,
    _handle: PhantomData<H>,
}

impl<H, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            _handle: PhantomData,
        }
    }
}

impl<H: Handle, T> Arena<H, T> {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value and return its handle.
    pub fn insert(&mut self, value: T) -> H {
        let handle = H::from_index(self.slots.len());
        self.slots.push(Some(value));
        self.live += 1;
        handle
    }

    /// Whether the handle still refers to a live value.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, handle: H) -> bool {
        matches!(self.slots.get(handle.index()), Some(Some(_)))
    }

    /// Borrow a live value.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: H) -> Option<&T> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Mutably borrow a live value.
    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Remove a value, leaving its slot empty.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let taken = self.slots.get_mut(handle.index()).and_then(Option::take);
        if taken.is_some() {
            self.live -= 1;
        }
        taken
    }

    /// Number of live values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Whether no live values remain.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total number of slots ever allocated, live or not.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterate live values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (H::from_index(i), v)))
    }

    /// Snapshot of live handles in insertion order.
    #[must_use]
    pub fn handles(&self) -> Vec<H> {
        self.iter().map(|(h, _)| h).collect()
    }
}
