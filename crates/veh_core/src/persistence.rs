//! Serializable vehicle state.
//!
//! Only authoritative state is stored. Indexes, precalculated offsets and
//! the mass caches are rebuilt on restore. The pivot anchor is stored: it
//! only moves with the vehicle, so wheel damage since the last move must not
//! shift the reloaded footprint.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::part::VehiclePart;
use crate::vehicle::Direction;
use crate::{
    ActorId, Counters, EngineState, Item, ItemTypeId, LoadError, Occupant, PartTypeId, Point,
    PrototypeId, Tripoint, TurretFireMode, TurretTargeting, Vehicle, VehicleContent, VehicleId,
};

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSnapshot {
    pub part_type: PartTypeId,
    pub mount: Point,
    pub base: Item,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub direction: i32,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub engine_state: EngineState,
    #[serde(default)]
    pub passenger: Option<Occupant>,
    #[serde(default)]
    pub crew: Option<ActorId>,
    #[serde(default)]
    pub ammo_pref: Option<ItemTypeId>,
    #[serde(default)]
    pub target: Option<(Tripoint, Tripoint)>,
    #[serde(default)]
    pub targeting: TurretTargeting,
    #[serde(default)]
    pub fire_mode: TurretFireMode,
    #[serde(default)]
    pub target_vehicle: Option<VehicleId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub version: u32,
    pub content_version: String,
    pub id: VehicleId,
    pub name: String,
    #[serde(default)]
    pub prototype: Option<PrototypeId>,
    pub parts: Vec<PartSnapshot>,
    /// Stored as pairs; JSON object keys must be strings.
    #[serde(default)]
    pub labels: Vec<(Point, String)>,
    pub face: i32,
    pub move_dir: i32,
    pub turn_dir: i32,
    /// Pivot the current footprint was laid out around, with its rotation.
    /// Older saves lack it and are re-anchored on the computed pivot.
    #[serde(default)]
    pub pivot_anchor: Option<(Point, i32)>,
    pub submap: Tripoint,
    pub pos: Point,
    pub velocity: f32,
    pub cruise_velocity: f32,
    #[serde(default)]
    pub vertical_velocity: f32,
    pub cruise_on: bool,
    #[serde(default)]
    pub skidding: bool,
    #[serde(default)]
    pub of_turn_carry: f32,
    #[serde(default)]
    pub alternator_load: f32,
    pub last_update_turn: u64,
    #[serde(default)]
    pub counters: Counters,
}

impl Vehicle {
    /// Capture the vehicle's authoritative state. Parts marked for removal
    /// are skipped, so indices in the snapshot are already compacted.
    pub fn snapshot(&self) -> VehicleSnapshot {
        let parts = self
            .parts
            .iter()
            .filter(|part| !part.removed)
            .map(|part| PartSnapshot {
                part_type: part.id().clone(),
                mount: part.mount,
                base: part.base.clone(),
                items: part.items.clone(),
                direction: part.direction,
                enabled: part.enabled,
                open: part.open,
                engine_state: part.engine_state,
                passenger: part.passenger.clone(),
                crew: part.crew_id.clone(),
                ammo_pref: part.ammo_pref.clone(),
                target: part.target,
                targeting: part.targeting,
                fire_mode: part.fire_mode,
                target_vehicle: part.target_vehicle.clone(),
            })
            .collect();
        VehicleSnapshot {
            version: SNAPSHOT_VERSION,
            content_version: self.content.content_version.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            prototype: self.prototype.clone(),
            parts,
            labels: self.labels.iter().map(|(at, text)| (*at, text.clone())).collect(),
            face: self.face.dir(),
            move_dir: self.move_dir.dir(),
            turn_dir: self.turn_dir,
            pivot_anchor: Some((self.pivot_anchor[0], self.pivot_rotation[0])),
            submap: self.submap,
            pos: self.pos,
            velocity: self.velocity,
            cruise_velocity: self.cruise_velocity,
            vertical_velocity: self.vertical_velocity,
            cruise_on: self.cruise_on,
            skidding: self.skidding,
            of_turn_carry: self.of_turn_carry,
            alternator_load: self.alternator_load,
            last_update_turn: self.last_update_turn,
            counters: self.counters.clone(),
        }
    }

    /// Rebuild a vehicle from a snapshot against `content`. Every part type
    /// must exist in the catalog.
    pub fn restore(
        snapshot: VehicleSnapshot,
        content: Arc<VehicleContent>,
    ) -> Result<Vehicle, LoadError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(LoadError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if snapshot.content_version != content.content_version {
            tracing::warn!(
                vehicle = %snapshot.id,
                saved = %snapshot.content_version,
                loaded = %content.content_version,
                "restoring vehicle against a different content version"
            );
        }
        let mut parts = Vec::with_capacity(snapshot.parts.len());
        for saved in snapshot.parts {
            let info = content
                .part(&saved.part_type)
                .ok_or_else(|| LoadError::UnknownPart(saved.part_type.clone()))?;
            let mut part = VehiclePart::new(Arc::clone(info), saved.mount, saved.base);
            part.items = saved.items;
            part.direction = saved.direction;
            part.enabled = saved.enabled;
            part.open = saved.open;
            part.engine_state = saved.engine_state;
            part.passenger = saved.passenger;
            part.crew_id = saved.crew;
            part.ammo_pref = saved.ammo_pref;
            part.target = saved.target;
            part.targeting = saved.targeting;
            part.fire_mode = saved.fire_mode;
            part.target_vehicle = saved.target_vehicle;
            parts.push(part);
        }

        let mut veh = Vehicle::new(content, snapshot.id, snapshot.name);
        veh.prototype = snapshot.prototype;
        veh.parts = parts;
        veh.labels = snapshot.labels.into_iter().collect();
        veh.face = Direction::new(snapshot.face);
        veh.move_dir = Direction::new(snapshot.move_dir);
        veh.turn_dir = snapshot.turn_dir;
        let stored_anchor = snapshot.pivot_anchor;
        if let Some((anchor, rotation)) = stored_anchor {
            veh.pivot_anchor[0] = anchor;
            veh.pivot_rotation[0] = rotation;
        }
        veh.submap = snapshot.submap;
        veh.pos = snapshot.pos;
        veh.velocity = snapshot.velocity;
        veh.cruise_velocity = snapshot.cruise_velocity;
        veh.vertical_velocity = snapshot.vertical_velocity;
        veh.cruise_on = snapshot.cruise_on;
        veh.skidding = snapshot.skidding;
        veh.of_turn_carry = snapshot.of_turn_carry;
        veh.alternator_load = snapshot.alternator_load;
        veh.last_update_turn = snapshot.last_update_turn;
        veh.counters = snapshot.counters;
        veh.engine_on = veh.parts.iter().any(|p| p.engine_state.is_on());

        veh.refresh();
        veh.refresh_insides();
        if stored_anchor.is_none() {
            veh.anchor_at_pivot();
        }
        Ok(veh)
    }
}
