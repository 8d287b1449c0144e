//! Core scene types for B-rep model cleanup.
//!
//! This crate provides the data model the cleanup passes operate on:
//!
//! - [`Model`] - Arena-backed scene with a root container and component definitions
//! - [`Edge`], [`Face`], [`Instance`] - Entities addressed by typed handles
//! - [`Material`], [`Texture`], [`UvMapping`] - Surface appearance
//! - [`Layer`], [`ComponentDefinition`] - Visibility groups and reusable geometry
//! - [`Plane`], [`classify_point`] - Geometric primitives
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with zero engine dependencies. It has no notion
//! of dialogs, menus or undo stacks; those belong to whatever hosts the model.
//!
//! # Handles
//!
//! Every entity is addressed by a copyable handle ([`EdgeId`], [`FaceId`], ...).
//! Erasing an entity leaves its slot empty and never reuses it, so a handle
//! taken before an erase can be checked with [`Model::is_alive`] instead of
//! pointing at the wrong entity.
//!
//! # Coordinate System
//!
//! Right-handed, Z up. Face loops wind counter-clockwise about the face
//! normal. The ground plane passes through the origin with normal +Z.
//!
//! # Example
//!
//! ```
//! use scene_types::{ContainerId, Entity, Model, Point3};
//!
//! let mut model = Model::new();
//! let a = model.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = model.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let edge = model.add_edge(ContainerId::Root, a, b).unwrap();
//!
//! assert!(model.erase_entity(Entity::Edge(edge)));
//! assert!(!model.is_alive(Entity::Edge(edge)));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod classify;
mod entities;
mod error;
mod handles;
mod library;
mod loops;
mod maintenance;
mod material;
mod model;
mod plane;

pub use classify::{PointClass, classify_point};
pub use entities::{ComponentDefinition, Edge, Face, Instance, Layer, Side, Vertex};
pub use error::{SceneError, SceneResult};
pub use handles::{
    Arena, ContainerId, DefinitionId, EdgeId, Entity, FaceId, Handle, InstanceId, LayerId,
    MaterialId, VertexId,
};
pub use library::Materials;
pub use maintenance::unique_name;
pub use material::{AttributeValue, Attributes, Color, Material, MaterialType, Texture, UvMapping};
pub use model::Model;
pub use plane::{Plane, polygon_area, polygon_normal};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
