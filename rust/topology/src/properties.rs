// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-section properties and materials.
//!
//! Both collections deduplicate on insert: [`Properties::add_or_get`] by
//! shape, dimensions and material, [`Materials::add_or_get`] by name. Many
//! members share one section, so the deck ends up with one property card per
//! distinct section rather than one per member.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::arena::IdArena;
use crate::error::Result;
use crate::keys::{MaterialId, PropertyId};

/// Cross-section shape of a line element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossSection {
    /// L-angle.
    Angle,
    /// H/I-beam.
    HBeam,
    /// Channel.
    Channel,
    /// Solid rectangular bar (bulb flats are modelled as bars).
    Bar,
    /// Solid round rod.
    Rod,
    /// Hollow circular tube.
    Tube,
}

impl CrossSection {
    /// Solver section code (`L`, `H`, `CHAN`, `BAR`, `ROD`, `TUBE`).
    pub fn code(&self) -> &'static str {
        match self {
            CrossSection::Angle => "L",
            CrossSection::HBeam => "H",
            CrossSection::Channel => "CHAN",
            CrossSection::Bar => "BAR",
            CrossSection::Rod => "ROD",
            CrossSection::Tube => "TUBE",
        }
    }
}

impl fmt::Display for CrossSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A cross-section property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub shape: CrossSection,
    pub material: MaterialId,
    /// Shape-specific dimensions, in solver order.
    pub dims: Vec<f64>,
}

impl Property {
    /// Largest dimension value, or 0 for a section without dimensions.
    ///
    /// Used as the search radius base when looking for nearby members.
    pub fn max_dimension(&self) -> f64 {
        self.dims.iter().copied().fold(0.0, f64::max)
    }
}

type PropertyKey = (CrossSection, Vec<u64>, MaterialId);

fn property_key(shape: CrossSection, dims: &[f64], material: MaterialId) -> PropertyKey {
    (
        shape,
        dims.iter().map(|d| (d + 0.0).to_bits()).collect(),
        material,
    )
}

/// All properties of a model.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    arena: IdArena<PropertyId, Property>,
    lookup: FxHashMap<PropertyKey, PropertyId>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID of an identical property, adding one if needed.
    pub fn add_or_get(&mut self, shape: CrossSection, dims: &[f64], material: MaterialId) -> PropertyId {
        let key = property_key(shape, dims, material);
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }
        let id = self.arena.insert_new(Property {
            shape,
            material,
            dims: dims.to_vec(),
        });
        self.lookup.insert(key, id);
        id
    }

    /// Stores a property under a specific ID.
    pub fn add_with_id(&mut self, id: PropertyId, property: Property) {
        let key = property_key(property.shape, &property.dims, property.material);
        if let Some(old) = self.arena.insert_with_id(id, property) {
            let old_key = property_key(old.shape, &old.dims, old.material);
            if self.lookup.get(&old_key) == Some(&id) {
                self.lookup.remove(&old_key);
            }
        }
        self.lookup.entry(key).or_insert(id);
    }

    pub fn remove(&mut self, id: PropertyId) -> Option<Property> {
        let old = self.arena.remove(id)?;
        let key = property_key(old.shape, &old.dims, old.material);
        if self.lookup.get(&key) == Some(&id) {
            self.lookup.remove(&key);
        }
        Some(old)
    }

    pub fn get(&self, id: PropertyId) -> Option<&Property> {
        self.arena.get(id)
    }

    pub fn try_get(&self, id: PropertyId) -> Result<&Property> {
        self.arena.try_get(id)
    }

    pub fn contains(&self, id: PropertyId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &Property)> + '_ {
        self.arena.iter()
    }

    /// Largest [`Property::max_dimension`] over all properties.
    pub fn max_dimension(&self) -> f64 {
        self.arena
            .values()
            .map(Property::max_dimension)
            .fold(0.0, f64::max)
    }
}

/// An isotropic linear-elastic material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Young's modulus.
    pub e: f64,
    /// Poisson ratio.
    pub nu: f64,
    /// Mass density.
    pub rho: f64,
}

/// All materials of a model.
#[derive(Debug, Clone, Default)]
pub struct Materials {
    arena: IdArena<MaterialId, Material>,
}

impl Materials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the material called `name`, adding it with the given
    /// constants if it does not exist yet. Constants of an existing material
    /// are left untouched.
    pub fn add_or_get(&mut self, name: &str, e: f64, nu: f64, rho: f64) -> MaterialId {
        if let Some((id, _)) = self.arena.iter().find(|(_, m)| m.name == name) {
            return id;
        }
        self.arena.insert_new(Material {
            name: name.to_string(),
            e,
            nu,
            rho,
        })
    }

    pub fn add_with_id(&mut self, id: MaterialId, material: Material) {
        self.arena.insert_with_id(id, material);
    }

    pub fn remove(&mut self, id: MaterialId) -> Option<Material> {
        self.arena.remove(id)
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.arena.get(id)
    }

    pub fn try_get(&self, id: MaterialId) -> Result<&Material> {
        self.arena.try_get(id)
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> + '_ {
        self.arena.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_codes_are_solver_codes() {
        assert_eq!(CrossSection::Angle.code(), "L");
        assert_eq!(CrossSection::Channel.to_string(), "CHAN");
    }

    #[test]
    fn properties_are_deduplicated() {
        let mut props = Properties::new();
        let m = MaterialId::new(1);
        let a = props.add_or_get(CrossSection::Angle, &[100.0, 75.0, 7.0, 7.0], m);
        let b = props.add_or_get(CrossSection::Angle, &[100.0, 75.0, 7.0, 7.0], m);
        let c = props.add_or_get(CrossSection::Angle, &[100.0, 75.0, 9.0, 9.0], m);
        let d = props.add_or_get(CrossSection::Bar, &[100.0, 75.0, 7.0, 7.0], m);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn max_dimension() {
        let mut props = Properties::new();
        let id = props.add_or_get(CrossSection::HBeam, &[180.0, 16.0, 400.0, 9.0], MaterialId::new(1));
        assert_eq!(props.get(id).map(Property::max_dimension), Some(400.0));
        assert_eq!(props.max_dimension(), 400.0);

        let empty = Property {
            shape: CrossSection::Rod,
            material: MaterialId::new(1),
            dims: vec![],
        };
        assert_eq!(empty.max_dimension(), 0.0);
    }

    #[test]
    fn removed_property_can_be_added_again() {
        let mut props = Properties::new();
        let m = MaterialId::new(1);
        let a = props.add_or_get(CrossSection::Rod, &[10.0], m);
        props.remove(a);
        let b = props.add_or_get(CrossSection::Rod, &[10.0], m);
        assert_ne!(a, b);
        assert!(props.contains(b));
    }

    #[test]
    fn materials_deduplicate_by_name() {
        let mut mats = Materials::new();
        let a = mats.add_or_get("Steel", 206_000.0, 0.3, 7.85e-9);
        let b = mats.add_or_get("Steel", 1.0, 0.1, 1.0);
        assert_eq!(a, b);
        assert_eq!(mats.get(a).map(|m| m.e), Some(206_000.0));
        assert_eq!(mats.len(), 1);
    }
}
