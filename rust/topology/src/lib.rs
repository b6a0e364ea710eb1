// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # beamheal topology
//!
//! Model store and read-only analysis for line-element finite-element
//! meshes.
//!
//! A structural model is a set of straight two-node elements (beams, angles,
//! channels, rods, tubes) with cross-section properties and materials, plus
//! rigid master/slave couplings. All entities are stored in ordered arenas
//! under monotonic integer IDs, which the solver deck references directly.
//!
//! ## Contents
//!
//! - [`FeModelContext`]: the aggregate store the repair pipeline mutates
//! - [`geometry`]: boxes, projections, ray/segment and segment/segment
//!   closest approach
//! - [`spatial`]: grid hashes over nodes and elements
//! - [`connectivity`]: union-find element groups and node degrees
//! - [`serialization`]: JSON snapshots with full round-trip

pub mod arena;
pub mod connectivity;
pub mod context;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod keys;
pub mod metadata;
pub mod nodes;
pub mod properties;
pub mod rigids;
pub mod serialization;
pub mod spatial;
pub mod transform;

pub use context::{FeModelContext, MergeOutcome, ModelSummary};
pub use elements::{Element, Elements};
pub use error::{Error, Result};
pub use keys::{
    ElementId, EntityId, EntityKey, EntityKind, MaterialId, NodeId, PropertyId, RigidId,
    RIGID_ID_BASE,
};
pub use metadata::ElementMeta;
pub use nodes::Nodes;
pub use properties::{CrossSection, Material, Materials, Properties, Property};
pub use rigids::{RigidInfo, Rigids, DEFAULT_RIGID_DOF};
pub use serialization::ContextSnapshot;
pub use spatial::{ElementSpatialHash, NodeSpatialHash};

pub use nalgebra::{Point3, Vector3};
