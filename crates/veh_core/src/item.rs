//! Items: cargo, fuel withdrawn from tanks, and the base item every part owns.
//!
//! The item model proper lives outside this crate; this is the narrow slice
//! the vehicle needs (weight, volume, damage, contained charges, faults).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{FaultId, ItemTypeId, VehicleContent};

/// Damage at which an item (and so a part) is destroyed.
pub const ITEM_MAX_DAMAGE: i32 = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub type_id: ItemTypeId,
    /// Stack size for count-by-charge items (fuel, ammo), 1 otherwise.
    pub charges: i64,
    #[serde(default)]
    pub damage: i32,
    /// Fuel, battery charge or ammunition held by this item.
    #[serde(default)]
    pub ammo: Option<ItemTypeId>,
    #[serde(default)]
    pub ammo_charges: i64,
    #[serde(default)]
    pub faults: BTreeSet<FaultId>,
}

impl Item {
    pub fn new(type_id: ItemTypeId) -> Self {
        Self::with_charges(type_id, 1)
    }

    pub fn with_charges(type_id: ItemTypeId, charges: i64) -> Self {
        Self {
            type_id,
            charges,
            damage: 0,
            ammo: None,
            ammo_charges: 0,
            faults: BTreeSet::new(),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.damage >= ITEM_MAX_DAMAGE
    }

    /// Weight of the item stack itself, excluding contents.
    pub fn own_weight(&self, content: &VehicleContent) -> f32 {
        match content.item(&self.type_id) {
            Some(def) => def.weight_kg * self.charges.max(0) as f32,
            None => 0.0,
        }
    }

    /// Weight of contained fuel, charge or ammunition.
    pub fn contained_weight(&self, content: &VehicleContent) -> f32 {
        match self.ammo.as_ref().and_then(|id| content.item(id)) {
            Some(def) => def.weight_kg * self.ammo_charges.max(0) as f32,
            None => 0.0,
        }
    }

    pub fn weight(&self, content: &VehicleContent) -> f32 {
        self.own_weight(content) + self.contained_weight(content)
    }

    pub fn volume(&self, content: &VehicleContent) -> f32 {
        content
            .item(&self.type_id)
            .map_or(0.0, |def| def.volume_l * self.charges.max(0) as f32)
    }

    /// Whether two stacks can merge into one by adding charges.
    pub fn stacks_with(&self, other: &Item) -> bool {
        self.type_id == other.type_id
            && self.damage == other.damage
            && self.ammo.is_none()
            && other.ammo.is_none()
            && self.faults == other.faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::base_content;

    #[test]
    fn weight_counts_stack_and_contents() {
        let content = base_content();
        let mut can = Item::with_charges(ItemTypeId::new("rock"), 3);
        assert!((can.weight(&content) - 6.0).abs() < 1e-5);

        can.ammo = Some(ItemTypeId::new("gasoline"));
        can.ammo_charges = 10;
        // rock 2 kg each, gasoline 0.75 kg per unit
        assert!((can.weight(&content) - 13.5).abs() < 1e-5);
    }

    #[test]
    fn unknown_item_weighs_nothing() {
        let content = base_content();
        let thing = Item::new(ItemTypeId::new("no_such_item"));
        assert!(thing.weight(&content).abs() < f32::EPSILON);
    }

    #[test]
    fn stacking_requires_same_type_and_no_contents() {
        let a = Item::with_charges(ItemTypeId::new("rock"), 1);
        let mut b = Item::with_charges(ItemTypeId::new("rock"), 4);
        assert!(a.stacks_with(&b));
        b.damage = 10;
        assert!(!a.stacks_with(&b));
    }
}
