// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity ID types for the model store.
//!
//! Every entity gets an integer ID wrapped in a type-safe newtype. The raw
//! integers are what the solver deck references, so an ID stays attached to
//! its entity for the entity's whole life and is never handed out again
//! after removal.

use serde::{Deserialize, Serialize};

/// Common behaviour of the entity ID newtypes, used by [`crate::arena::IdArena`].
pub trait EntityId:
    Copy + Ord + std::hash::Hash + std::fmt::Debug + std::fmt::Display + From<u32> + Into<u32>
{
    /// The entity kind this ID addresses.
    const KIND: EntityKind;

    /// Wraps the ID into the kind-erased [`EntityKey`].
    fn key(self) -> EntityKey;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Wraps a raw integer ID.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw integer ID.
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl EntityId for $name {
            const KIND: EntityKind = EntityKind::$variant;

            fn key(self) -> EntityKey {
                EntityKey::$variant(self)
            }
        }

        impl From<$name> for EntityKey {
            fn from(id: $name) -> Self {
                EntityKey::$variant(id)
            }
        }
    };
}

entity_id!(
    /// ID of a node (a point in 3D space).
    NodeId, Node, "N"
);
entity_id!(
    /// ID of a line element between two nodes.
    ElementId, Element, "E"
);
entity_id!(
    /// ID of a cross-section property.
    PropertyId, Property, "P"
);
entity_id!(
    /// ID of a material.
    MaterialId, Material, "M"
);
entity_id!(
    /// ID of a rigid (master/slave) coupling.
    RigidId, Rigid, "R"
);

/// First rigid ID. Rigids share the deck's element ID space, so they are
/// allocated far above any expected element ID.
pub const RIGID_ID_BASE: u32 = 9_000_001;

/// A key that can reference any entity in the model store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Node(NodeId),
    Element(ElementId),
    Property(PropertyId),
    Material(MaterialId),
    Rigid(RigidId),
}

impl EntityKey {
    /// Returns the entity kind of this key.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityKey::Node(_) => EntityKind::Node,
            EntityKey::Element(_) => EntityKind::Element,
            EntityKey::Property(_) => EntityKind::Property,
            EntityKey::Material(_) => EntityKind::Material,
            EntityKey::Rigid(_) => EntityKind::Rigid,
        }
    }

    /// Returns the raw integer ID.
    pub fn raw(&self) -> u32 {
        match *self {
            EntityKey::Node(id) => id.get(),
            EntityKey::Element(id) => id.get(),
            EntityKey::Property(id) => id.get(),
            EntityKey::Material(id) => id.get(),
            EntityKey::Rigid(id) => id.get(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.raw())
    }
}

/// Discriminant for entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Node = 0,
    Element = 1,
    Property = 2,
    Material = 3,
    Rigid = 4,
}

impl EntityKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Element => "element",
            EntityKind::Property => "property",
            EntityKind::Material => "material",
            EntityKind::Rigid => "rigid",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_kind_prefix() {
        assert_eq!(NodeId::new(12).to_string(), "N12");
        assert_eq!(ElementId::new(3).to_string(), "E3");
        assert_eq!(RigidId::new(RIGID_ID_BASE).to_string(), "R9000001");
    }

    #[test]
    fn entity_key_discrimination() {
        let key: EntityKey = PropertyId::new(7).into();
        assert_eq!(key.kind(), EntityKind::Property);
        assert_eq!(key.raw(), 7);
        assert_eq!(key.to_string(), "property 7");
        assert_eq!(NodeId::new(1).key(), EntityKey::Node(NodeId::new(1)));
    }

    #[test]
    fn ids_order_by_raw_value() {
        assert!(ElementId::new(2) < ElementId::new(10));
        assert_eq!(u32::from(MaterialId::from(5)), 5);
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&NodeId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
