//! The vehicle aggregate: an ordered part list plus the indexes and caches
//! derived from it.
//!
//! Part indices are stable until `part_removal_cleanup` compacts the list.
//! Every cache is dropped wholesale by `refresh`; the mass and pivot caches
//! are additionally invalidated by any part mutation.

mod boarding;
mod cargo;
mod collision;
mod damage;
mod engine;
mod geometry;
mod mass;
mod physics;
mod power;
mod structure;
mod turret;

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ahash::AHashMap;
use rand::Rng;
use smallvec::SmallVec;

use crate::part::VehiclePart;
use crate::{
    Counters, Event, EventEnvelope, InitialCondition, InstallError, LoadError, Point,
    PrototypeId, Tripoint, VehicleContent, VehicleId,
};

pub use collision::{CollisionTarget, VehCollision};
pub use geometry::{coord_translate, Direction};
pub use turret::{TurretData, TurretStatus};

/// Lazily recomputed value with an explicit dirty flag.
#[derive(Debug, Clone)]
pub(crate) struct Cached<T: Copy> {
    value: Cell<T>,
    dirty: Cell<bool>,
}

impl<T: Copy + Default> Cached<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: Cell::new(T::default()),
            dirty: Cell::new(true),
        }
    }

    pub(crate) fn invalidate(&self) {
        self.dirty.set(true);
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn get_or(&self, compute: impl FnOnce() -> T) -> T {
        if self.dirty.get() {
            self.value.set(compute());
            self.dirty.set(false);
        }
        self.value.get()
    }
}

/// Per-capability part lists, rebuilt by `refresh`. Removed parts never
/// appear; broken ones do, and callers filter as needed.
#[derive(Debug, Clone, Default)]
pub(crate) struct PartIndex {
    pub lights: Vec<usize>,
    pub alternators: Vec<usize>,
    pub engines: Vec<usize>,
    pub reactors: Vec<usize>,
    pub solar_panels: Vec<usize>,
    pub wheelcache: Vec<usize>,
    pub steering: Vec<usize>,
    pub floating: Vec<usize>,
    pub loose_parts: Vec<usize>,
    pub turrets: Vec<usize>,
    pub power_transfer: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub prototype: Option<PrototypeId>,
    pub(crate) content: Arc<VehicleContent>,
    pub(crate) parts: Vec<VehiclePart>,
    pub(crate) removed_part_count: usize,
    pub(crate) relative_parts: AHashMap<Point, SmallVec<[usize; 4]>>,
    pub(crate) labels: BTreeMap<Point, String>,
    pub(crate) index: PartIndex,
    pub(crate) insides_dirty: bool,

    pub(crate) face: Direction,
    pub(crate) move_dir: Direction,
    pub(crate) turn_dir: i32,
    pub(crate) pivot_anchor: [Point; 2],
    pub(crate) pivot_rotation: [i32; 2],
    pub(crate) pivot: Cached<Point>,
    /// Degrees turned during the last move, used for skid recovery.
    pub last_turn: i32,
    /// Moves available this turn.
    pub of_turn: f32,
    pub of_turn_carry: f32,
    /// m/s along `move_dir`, negative when reversing.
    pub velocity: f32,
    pub cruise_velocity: f32,
    pub vertical_velocity: f32,
    pub cruise_on: bool,
    pub skidding: bool,

    pub(crate) submap: Tripoint,
    pub(crate) pos: Point,
    pub(crate) occupied_points: BTreeSet<Tripoint>,
    pub(crate) occupied_dirty: bool,

    /// Fraction of engine output currently spent on alternators.
    pub alternator_load: f32,
    pub(crate) engine_on: bool,
    pub(crate) last_update_turn: u64,

    pub(crate) mass: Cached<f32>,
    pub(crate) mass_center_precalc: Cached<Point>,
    pub(crate) mass_center_mount: Cached<Point>,

    /// Remote vehicles whose cable ends must be unplugged by the fleet.
    pub(crate) pending_unplug: Vec<VehicleId>,
    pub(crate) counters: Counters,
    pub(crate) events: Vec<EventEnvelope>,
}

impl Vehicle {
    pub fn new(content: Arc<VehicleContent>, id: VehicleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            prototype: None,
            content,
            parts: Vec::new(),
            removed_part_count: 0,
            relative_parts: AHashMap::new(),
            labels: BTreeMap::new(),
            index: PartIndex::default(),
            insides_dirty: true,
            face: Direction::default(),
            move_dir: Direction::default(),
            turn_dir: 0,
            pivot_anchor: [Point::default(); 2],
            pivot_rotation: [0; 2],
            pivot: Cached::new(),
            last_turn: 0,
            of_turn: 0.0,
            of_turn_carry: 0.0,
            velocity: 0.0,
            cruise_velocity: 0.0,
            vertical_velocity: 0.0,
            cruise_on: true,
            skidding: false,
            submap: Tripoint::default(),
            pos: Point::default(),
            occupied_points: BTreeSet::new(),
            occupied_dirty: true,
            alternator_load: 0.0,
            engine_on: false,
            last_update_turn: 0,
            mass: Cached::new(),
            mass_center_precalc: Cached::new(),
            mass_center_mount: Cached::new(),
            pending_unplug: Vec::new(),
            counters: Counters::default(),
            events: Vec::new(),
        }
    }

    /// Build a vehicle from a catalog prototype. Unknown part ids are fatal;
    /// parts that do not fit are skipped with a warning.
    pub fn from_prototype(
        content: Arc<VehicleContent>,
        prototype: &PrototypeId,
        id: VehicleId,
    ) -> Result<Self, LoadError> {
        let def = content
            .prototype(prototype)
            .ok_or_else(|| LoadError::UnknownPrototype(prototype.clone()))?
            .clone();
        let mut veh = Vehicle::new(content, id, def.name.clone());
        veh.prototype = Some(prototype.clone());
        for entry in &def.parts {
            let mount = Point::new(entry.x, entry.y);
            match veh.install_part(mount, &entry.part) {
                Ok(_) => {}
                Err(InstallError::UnknownPart(part)) => return Err(LoadError::UnknownPart(part)),
                Err(err) => {
                    tracing::warn!(prototype = %prototype, %err, "skipping prototype part");
                }
            }
        }
        veh.anchor_at_pivot();
        veh.events.clear();
        Ok(veh)
    }

    /// Fill tanks and batteries and apply starting wear.
    ///
    /// `fuel_pct` of `None` picks a random level between the configured
    /// bounds; `Some(pct)` is clamped to `0..=100`.
    pub fn init_state(
        &mut self,
        fuel_pct: Option<i64>,
        condition: InitialCondition,
        rng: &mut impl Rng,
    ) {
        let c = &self.content.constants;
        let pct = match fuel_pct {
            Some(pct) => pct.clamp(0, 100),
            None => rng.gen_range(c.init_fuel_min_pct..=c.init_fuel_max_pct.max(c.init_fuel_min_pct)),
        };
        let content = Arc::clone(&self.content);
        for part in &mut self.parts {
            if part.removed {
                continue;
            }
            let ammo = if part.is_battery() {
                Some(crate::ItemTypeId::new(crate::FUEL_BATTERY))
            } else if part.is_turret() {
                part.info().turret.as_ref().and_then(|t| t.ammo_types.first().cloned())
            } else {
                part.info().fuel_type.clone()
            };
            let Some(ammo) = ammo else { continue };
            let cap = part.ammo_capacity();
            let qty = if part.is_turret() { cap } else { cap * pct / 100 };
            part.ammo_set(&ammo, Some(qty), &content);
        }
        match condition {
            InitialCondition::Pristine => {}
            InitialCondition::Worn => self.apply_wear(rng),
            InitialCondition::Wrecked => self.wreck(rng),
        }
        self.velocity = 0.0;
        self.cruise_velocity = 0.0;
        self.refresh();
        self.refresh_insides();
        self.events.clear();
    }

    fn apply_wear(&mut self, rng: &mut impl Rng) {
        let c = &self.content.constants;
        let (chance, min_frac) = (c.init_damage_chance, c.smash_min_fraction);
        for part in &mut self.parts {
            let durability = part.info().durability;
            if part.removed || durability <= 1 || !rng.gen_bool(chance.clamp(0.0, 1.0)) {
                continue;
            }
            let low = ((durability as f32 * min_frac) as i32).clamp(1, durability - 1);
            part.set_health(rng.gen_range(low..durability));
        }
        self.invalidate_mass();
    }

    fn wreck(&mut self, rng: &mut impl Rng) {
        self.smash(rng);
        for part in &mut self.parts {
            if !part.removed && !part.is_structure() && rng.gen_bool(0.5) {
                part.set_health(0);
                part.engine_state = crate::EngineState::Off;
            }
        }
        self.invalidate_mass();
    }

    pub fn content(&self) -> &VehicleContent {
        &self.content
    }

    /// Re-resolve every part against a reloaded catalog.
    pub fn reload_content(&mut self, content: Arc<VehicleContent>) -> Result<(), LoadError> {
        let mut infos = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let info = content
                .part(part.id())
                .ok_or_else(|| LoadError::UnknownPart(part.id().clone()))?;
            infos.push(Arc::clone(info));
        }
        for (part, info) in self.parts.iter_mut().zip(infos) {
            part.set_info(info);
        }
        self.content = content;
        self.refresh();
        Ok(())
    }

    // -- part access ---------------------------------------------------------

    /// All parts, including removed ones awaiting cleanup.
    pub fn parts(&self) -> &[VehiclePart] {
        &self.parts
    }

    pub fn part(&self, p: usize) -> Option<&VehiclePart> {
        self.parts.get(p)
    }

    /// Mutable access to one part. Drops the mass and pivot caches.
    pub fn part_mut(&mut self, p: usize) -> Option<&mut VehiclePart> {
        let part = self.parts.get_mut(p)?;
        self.mass.invalidate();
        self.mass_center_precalc.invalidate();
        self.mass_center_mount.invalidate();
        self.pivot.invalidate();
        Some(part)
    }

    pub(crate) fn live_part(&self, p: usize) -> Option<&VehiclePart> {
        self.parts.get(p).filter(|part| !part.removed)
    }

    /// Number of parts not marked for removal.
    pub fn part_count(&self) -> usize {
        self.parts.len() - self.removed_part_count
    }

    pub fn is_empty(&self) -> bool {
        self.part_count() == 0
    }

    pub fn last_update_turn(&self) -> u64 {
        self.last_update_turn
    }

    // -- events --------------------------------------------------------------

    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }

    /// Remote vehicles left holding a cable whose local end is gone.
    pub fn take_unplugged(&mut self) -> Vec<VehicleId> {
        std::mem::take(&mut self.pending_unplug)
    }

    pub(crate) fn emit(&mut self, event: Event) {
        let envelope = crate::emit(&mut self.counters, self.last_update_turn, event);
        self.events.push(envelope);
    }

    // -- caches --------------------------------------------------------------

    /// Rebuild every index and drop every cache. Call after any structural
    /// change.
    pub fn refresh(&mut self) {
        self.index = PartIndex::default();
        self.relative_parts.clear();
        for (i, part) in self.parts.iter().enumerate() {
            if part.removed {
                continue;
            }
            self.relative_parts.entry(part.mount).or_default().push(i);
            let index = &mut self.index;
            let lists: [(bool, &mut Vec<usize>); 11] = [
                (part.is_light(), &mut index.lights),
                (part.is_alternator(), &mut index.alternators),
                (part.is_engine(), &mut index.engines),
                (part.is_reactor(), &mut index.reactors),
                (part.is_solar_panel(), &mut index.solar_panels),
                (part.is_wheel(), &mut index.wheelcache),
                (part.has_flag(crate::PartFlag::Steerable), &mut index.steering),
                (part.has_flag(crate::PartFlag::Floats), &mut index.floating),
                (part.has_flag(crate::PartFlag::UnmountOnMove), &mut index.loose_parts),
                (part.is_turret(), &mut index.turrets),
                (part.has_flag(crate::PartFlag::PowerTransfer), &mut index.power_transfer),
            ];
            for (member, list) in lists {
                if member {
                    list.push(i);
                }
            }
        }
        let (rotation, anchor) = (self.pivot_rotation[0], self.pivot_anchor[0]);
        self.precalc_mounts(0, rotation, anchor);
        self.invalidate_mass();
        self.insides_dirty = true;
        self.occupied_dirty = true;
    }

    pub fn invalidate_mass(&self) {
        self.mass.invalidate();
        self.mass_center_precalc.invalidate();
        self.mass_center_mount.invalidate();
        self.pivot.invalidate();
    }

    pub fn mass_dirty(&self) -> bool {
        self.mass.is_dirty()
            || self.mass_center_precalc.is_dirty()
            || self.mass_center_mount.is_dirty()
    }
}
