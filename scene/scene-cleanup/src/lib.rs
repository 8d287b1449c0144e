//! Batch geometry cleanup for B-rep scenes.
//!
//! This crate provides tools for:
//! - Erasing hidden entities and entities on hidden layers
//! - Merging coplanar faces across the edge they share
//! - Erasing duplicate and overlapped faces
//! - Erasing lonely edges
//! - Merging identical materials and repairing orphan materials
//! - Renaming component definitions that share a name
//! - Moving geometry to the default layer and smoothing edges by angle
//! - Validating a model's reference invariants
//!
//! [`cleanup`] runs every enabled pass in a fixed order under one
//! [`CleanupParams`] snapshot and returns a [`CleanupReport`]. The passes are
//! also usable on their own.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero engine dependencies. Undo, progress
//! display, texture export and dialogs are reached through [`CleanupHost`];
//! [`ModelHost`] implements it on the bare [`scene_types::Model`].
//!
//! # Scope
//!
//! Most passes visit only the configured [`Scope`]. Material merging and
//! orphan repair always walk the whole model, since materials are shared.
//!
//! # Example
//!
//! ```
//! use scene_cleanup::{CleanupParams, cleanup_model};
//! use scene_types::{ContainerId, Model, Point3};
//!
//! // Two coplanar squares sharing an edge.
//! let mut model = Model::new();
//! let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (0.0, 1.0)]
//!     .iter()
//!     .map(|&(x, y)| model.add_vertex(Point3::new(x, y, 1.0)))
//!     .collect();
//! model.add_face(ContainerId::Root, &[v[0], v[1], v[4], v[5]]).unwrap();
//! model.add_face(ContainerId::Root, &[v[1], v[2], v[3], v[4]]).unwrap();
//!
//! let report = cleanup_model(&mut model, &CleanupParams::default()).unwrap();
//! assert_eq!(model.face_count(), 1);
//! println!("{report}");
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cleanup;
pub mod coplanar;
pub mod definitions;
pub mod duplicate;
mod error;
pub mod hidden;
mod host;
pub mod lonely;
pub mod materials;
pub mod orphan;
mod params;
pub mod postprocess;
pub mod predicates;
mod report;
mod scope;
mod validate;

pub use cleanup::{OPERATION_NAME, cleanup, cleanup_model};
pub use error::{CleanupError, CleanupResult};
pub use host::{CleanupHost, ModelHost, NoProgress, Progress, TextureWriter, write_embedded_texture};
pub use params::{CleanupParams, OrphanMaterialMode, OverlapParams};
pub use report::{CleanupReport, format_elapsed};
pub use scope::{Scope, count_scope_entity, model_entities, scope_containers, scope_entities};
pub use validate::{ModelReport, validate_model};

// Re-export commonly used items from submodules
pub use coplanar::{merge_connected_faces, merge_coplanar_faces};
pub use definitions::fix_component_names;
pub use duplicate::{erase_duplicate_faces, find_duplicate_faces};
pub use hidden::{edge_protected, erase_hidden};
pub use lonely::{erase_lonely_edges, is_lonely_edge};
pub use materials::{MaterialClusters, cluster_materials, materials_equivalent, merge_similar_materials, redirect_materials};
pub use orphan::{create_replacement_material, find_orphan_materials, fix_orphan_materials};
pub use postprocess::{post_process, post_process_entities};
pub use predicates::{continuous_uv, faces_coplanar, faces_duplicate, normals_same_direction, uv_equal};
