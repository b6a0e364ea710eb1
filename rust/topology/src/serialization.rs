// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON snapshots of a model.
//!
//! A [`ContextSnapshot`] lists every entity with its integer ID, so a model
//! written after any pipeline stage can be diffed against another stage or
//! loaded back into a [`FeModelContext`] with all IDs intact.

use serde::{Deserialize, Serialize};

use crate::context::FeModelContext;
use crate::elements::Element;
use crate::error::{Error, Result};
use crate::keys::{ElementId, MaterialId, NodeId, PropertyId, RigidId};
use crate::metadata::ElementMeta;
use crate::properties::{CrossSection, Material, Property};
use crate::rigids::RigidInfo;

/// Serializable representation of a whole model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub elements: Vec<ElementSnapshot>,
    pub properties: Vec<PropertySnapshot>,
    pub materials: Vec<MaterialSnapshot>,
    #[serde(default)]
    pub rigids: Vec<RigidSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub id: ElementId,
    pub nodes: [NodeId; 2],
    pub property: PropertyId,
    #[serde(default)]
    pub meta: ElementMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub id: PropertyId,
    pub shape: CrossSection,
    pub material: MaterialId,
    pub dims: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSnapshot {
    pub id: MaterialId,
    pub name: String,
    pub e: f64,
    pub nu: f64,
    pub rho: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidSnapshot {
    pub id: RigidId,
    pub master: NodeId,
    pub slaves: Vec<NodeId>,
    pub dof: String,
}

impl FeModelContext {
    /// Serializes the model to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Rebuilds a model from JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ContextSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn to_snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            nodes: self
                .nodes
                .iter()
                .map(|(id, p)| NodeSnapshot {
                    id,
                    x: p.x,
                    y: p.y,
                    z: p.z,
                })
                .collect(),
            elements: self
                .elements
                .iter()
                .map(|(id, e)| ElementSnapshot {
                    id,
                    nodes: e.nodes,
                    property: e.property,
                    meta: e.meta.clone(),
                })
                .collect(),
            properties: self
                .properties
                .iter()
                .map(|(id, p)| PropertySnapshot {
                    id,
                    shape: p.shape,
                    material: p.material,
                    dims: p.dims.clone(),
                })
                .collect(),
            materials: self
                .materials
                .iter()
                .map(|(id, m)| MaterialSnapshot {
                    id,
                    name: m.name.clone(),
                    e: m.e,
                    nu: m.nu,
                    rho: m.rho,
                })
                .collect(),
            rigids: self
                .rigids
                .iter()
                .map(|(id, r)| RigidSnapshot {
                    id,
                    master: r.master,
                    slaves: r.slaves.clone(),
                    dof: r.dof.clone(),
                })
                .collect(),
        }
    }

    /// Rebuilds a model, keeping every ID. ID counters continue after the
    /// largest ID of each kind.
    pub fn from_snapshot(snapshot: ContextSnapshot) -> Self {
        let mut ctx = Self::new();
        for n in snapshot.nodes {
            ctx.nodes.add_with_id(n.id, nalgebra::Point3::new(n.x, n.y, n.z));
        }
        for m in snapshot.materials {
            ctx.materials.add_with_id(
                m.id,
                Material {
                    name: m.name,
                    e: m.e,
                    nu: m.nu,
                    rho: m.rho,
                },
            );
        }
        for p in snapshot.properties {
            ctx.properties.add_with_id(
                p.id,
                Property {
                    shape: p.shape,
                    material: p.material,
                    dims: p.dims,
                },
            );
        }
        for e in snapshot.elements {
            ctx.elements.add_with_id(
                e.id,
                Element::new(e.nodes[0], e.nodes[1], e.property, e.meta),
            );
        }
        for r in snapshot.rigids {
            ctx.rigids
                .add_with_id(r.id, RigidInfo::new(r.master, r.slaves).with_dof(r.dof));
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn sample() -> FeModelContext {
        let mut ctx = FeModelContext::new();
        let m = ctx.materials.add_or_get("Steel", 206_000.0, 0.3, 7.85e-9);
        let p = ctx.properties.add_or_get(CrossSection::Tube, &[60.0, 4.0], m);
        let a = ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let b = ctx.nodes.add_or_get(Point3::new(1000.0, 0.0, 0.0));
        let c = ctx.nodes.add_or_get(Point3::new(1000.0, 0.5, 0.0));
        ctx.elements.add_with_id(
            ElementId::new(7),
            Element::new(a, b, p, ElementMeta::named("T1").with_orientation([0.0, 1.0, 0.0])),
        );
        ctx.rigids.add_new(b, [c]);
        ctx
    }

    #[test]
    fn json_round_trip_keeps_ids() {
        let ctx = sample();
        let json = ctx.to_json().unwrap();
        let mut back = FeModelContext::from_json(&json).unwrap();

        assert_eq!(back.to_snapshot(), ctx.to_snapshot());
        assert!(back.elements.contains(ElementId::new(7)));

        let next = back.elements.add_new(Element::new(
            NodeId::new(1),
            NodeId::new(2),
            PropertyId::new(1),
            ElementMeta::default(),
        ));
        assert_eq!(next, ElementId::new(8));
    }

    #[test]
    fn rigid_ids_survive() {
        let back = FeModelContext::from_snapshot(sample().to_snapshot());
        let ids: Vec<u32> = back.rigids.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![9_000_001]);
    }

    #[test]
    fn snapshot_json_shape() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(value["elements"][0]["id"], 7);
        assert_eq!(value["elements"][0]["meta"]["source_name"], "T1");
        assert_eq!(value["properties"][0]["shape"], "Tube");
        assert_eq!(value["rigids"][0]["dof"], "123456");
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            FeModelContext::from_json("{ not json"),
            Err(Error::Serialization(_))
        ));
    }
}
