//! A single installed part: catalog entry, condition, contents and run state.
//!
//! Parts never look at their siblings. Anything that needs the rest of the
//! vehicle (fuel from other tanks, pivot, mass) lives on `Vehicle`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crew::ActorRegistry;
use crate::{
    ActorId, Constants, EngineState, FaultId, Item, ItemTypeId, PartDef, PartFlag, PartTypeId,
    Point, Tripoint, TurretFireMode, TurretTargeting, VehicleContent, VehicleId, FUEL_BATTERY,
    ITEM_MAX_DAMAGE,
};

/// Actor seated on a part. The weight is sampled when boarding so mass
/// stays consistent without reaching back into the actor registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: ActorId,
    pub weight_kg: f32,
}

#[derive(Debug, Clone)]
pub struct VehiclePart {
    pub(crate) mount: Point,
    /// Rotated offsets from the pivot: `[0]` current, `[1]` pending turn.
    pub(crate) precalc: [Point; 2],
    pub(crate) removed: bool,
    pub(crate) passenger: Option<Occupant>,
    pub(crate) crew_id: Option<ActorId>,
    pub(crate) ammo_pref: Option<ItemTypeId>,
    pub(crate) base: Item,
    pub(crate) items: Vec<Item>,
    info: Arc<PartDef>,
    /// Installation direction in degrees, relative to the vehicle.
    pub direction: i32,
    pub inside: bool,
    pub enabled: bool,
    pub open: bool,
    pub engine_state: EngineState,
    /// Turret aim: (first target, last target).
    pub target: Option<(Tripoint, Tripoint)>,
    pub targeting: TurretTargeting,
    pub fire_mode: TurretFireMode,
    /// Remote vehicle a power cable is plugged into.
    pub target_vehicle: Option<VehicleId>,
}

impl VehiclePart {
    pub(crate) fn new(info: Arc<PartDef>, mount: Point, base: Item) -> Self {
        let enabled = info.enabled_by_default();
        Self {
            mount,
            precalc: [Point::default(); 2],
            removed: false,
            passenger: None,
            crew_id: None,
            ammo_pref: None,
            base,
            items: Vec::new(),
            info,
            direction: 0,
            inside: false,
            enabled,
            open: false,
            engine_state: EngineState::Off,
            target: None,
            targeting: TurretTargeting::default(),
            fire_mode: TurretFireMode::default(),
            target_vehicle: None,
        }
    }

    pub fn id(&self) -> &PartTypeId {
        &self.info.id
    }

    pub fn info(&self) -> &PartDef {
        &self.info
    }

    pub(crate) fn info_arc(&self) -> &Arc<PartDef> {
        &self.info
    }

    /// Swap in a fresh catalog entry after a content reload.
    pub(crate) fn set_info(&mut self, info: Arc<PartDef>) {
        self.info = info;
    }

    pub fn mount(&self) -> Point {
        self.mount
    }

    pub fn precalc(&self, slot: usize) -> Point {
        self.precalc[slot.min(1)]
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn base(&self) -> &Item {
        &self.base
    }

    /// Cargo stored in this part.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn passenger(&self) -> Option<&Occupant> {
        self.passenger.as_ref()
    }

    pub fn name(&self) -> String {
        if self.is_broken() {
            format!("broken {}", self.info.name)
        } else {
            self.info.name.clone()
        }
    }

    pub fn has_flag(&self, flag: PartFlag) -> bool {
        self.info.has_flag(flag)
    }

    // -- condition ---------------------------------------------------------

    /// Current hit points, derived from base item damage.
    pub fn hp(&self) -> i32 {
        let durability = i64::from(self.info.durability.max(0));
        let remaining = i64::from(ITEM_MAX_DAMAGE - self.base.damage.clamp(0, ITEM_MAX_DAMAGE));
        let max = i64::from(ITEM_MAX_DAMAGE);
        ((durability * remaining + max - 1) / max) as i32
    }

    pub fn is_broken(&self) -> bool {
        self.base.is_destroyed()
    }

    pub fn health_fraction(&self) -> f32 {
        if self.info.durability <= 0 {
            return 0.0;
        }
        self.hp() as f32 / self.info.durability as f32
    }

    /// Set hp directly. `hp()` reads back exactly `qty` after clamping.
    pub(crate) fn set_health(&mut self, qty: i32) {
        let durability = self.info.durability;
        if durability <= 0 {
            self.base.damage = ITEM_MAX_DAMAGE;
            return;
        }
        let qty = i64::from(qty.clamp(0, durability));
        let max = i64::from(ITEM_MAX_DAMAGE);
        self.base.damage = (max - qty * max / i64::from(durability)) as i32;
    }

    // -- capability predicates ----------------------------------------------

    pub fn is_engine(&self) -> bool {
        self.info.engine.is_some()
    }

    pub fn is_light(&self) -> bool {
        self.has_flag(PartFlag::Light)
    }

    pub fn is_tank(&self) -> bool {
        self.has_flag(PartFlag::FuelTank)
    }

    pub fn is_battery(&self) -> bool {
        self.has_flag(PartFlag::Battery)
    }

    pub fn is_reactor(&self) -> bool {
        self.has_flag(PartFlag::Reactor)
    }

    pub fn is_turret(&self) -> bool {
        self.info.turret.is_some()
    }

    pub fn is_seat(&self) -> bool {
        self.has_flag(PartFlag::Seat)
    }

    pub fn is_wheel(&self) -> bool {
        self.has_flag(PartFlag::Wheel)
    }

    pub fn is_alternator(&self) -> bool {
        self.has_flag(PartFlag::Alternator)
    }

    pub fn is_solar_panel(&self) -> bool {
        self.has_flag(PartFlag::SolarPanel)
    }

    pub fn is_armor(&self) -> bool {
        self.has_flag(PartFlag::Armor)
    }

    pub fn is_cargo(&self) -> bool {
        self.has_flag(PartFlag::Cargo)
    }

    pub fn is_power_transfer(&self) -> bool {
        self.has_flag(PartFlag::PowerTransfer)
    }

    pub fn is_structure(&self) -> bool {
        self.info.is_structure()
    }

    // -- wheels --------------------------------------------------------------

    pub fn wheel_diameter(&self) -> i32 {
        self.info.wheel.map_or(0, |w| w.diameter)
    }

    pub fn wheel_width(&self) -> i32 {
        self.info.wheel.map_or(0, |w| w.width)
    }

    /// Contact area in square inches. Floats use the same dimensions.
    pub fn wheel_area(&self) -> f32 {
        (self.wheel_diameter() * self.wheel_width()) as f32
    }

    // -- engines and electrics -----------------------------------------------

    /// Output in watts, degraded by wear and faults.
    pub fn power(&self, constants: &Constants) -> i32 {
        let Some(engine) = &self.info.engine else {
            return 0;
        };
        if self.is_broken() {
            return 0;
        }
        let mut watts = engine.power_w as f32;
        let health = self.health_fraction();
        if health < 0.5 {
            watts *= 0.5 + health;
        }
        let faults = i32::try_from(self.base.faults.len()).unwrap_or(i32::MAX);
        watts *= (1.0 - constants.fault_power_penalty).clamp(0.0, 1.0).powi(faults);
        watts.round() as i32
    }

    /// Electrical output in watts; negative for consumers, 0 when broken.
    pub fn epower(&self) -> i32 {
        if self.is_broken() {
            0
        } else {
            self.info.epower_w
        }
    }

    /// Fuel efficiency at the given rpm, peaking at the optimal rpm.
    pub fn efficiency(&self, rpm: i32) -> f32 {
        let Some(engine) = &self.info.engine else {
            return 0.0;
        };
        if rpm <= 0 || engine.redline_rpm <= 0 {
            return 0.0;
        }
        let off = (rpm - engine.optimal_rpm).abs() as f32 / engine.redline_rpm as f32;
        engine.efficiency * (1.0 - off).max(0.1)
    }

    /// Fuel drawn per tick at the given load in `[0, 1]`.
    pub fn fuel_cost(&self, load: f32) -> i64 {
        let Some(engine) = &self.info.engine else {
            return 0;
        };
        let load = load.clamp(0.0, 1.0);
        let extra = (engine.full_fuel_per_tick - engine.idle_fuel_per_tick).max(0) as f32;
        engine.idle_fuel_per_tick + (extra * load).round() as i64
    }

    // -- ammunition and fuel -------------------------------------------------

    /// Whether this part can hold `ammo` at all.
    pub fn accepts(&self, ammo: &ItemTypeId, content: &VehicleContent) -> bool {
        if self.is_battery() {
            return ammo.as_str() == FUEL_BATTERY;
        }
        if self.is_reactor() {
            return self.info.fuel_type.as_ref() == Some(ammo);
        }
        if self.is_tank() {
            return content.item(ammo).is_some_and(|def| def.liquid);
        }
        match &self.info.turret {
            Some(turret) if !turret.uses_tanks => turret.ammo_types.contains(ammo),
            _ => false,
        }
    }

    pub fn ammo_current(&self) -> Option<&ItemTypeId> {
        self.base.ammo.as_ref()
    }

    pub fn ammo_capacity(&self) -> i64 {
        let holds = self.is_tank()
            || self.is_battery()
            || self.is_reactor()
            || self.info.turret.as_ref().is_some_and(|t| !t.uses_tanks);
        if holds {
            self.info.capacity.max(0)
        } else {
            0
        }
    }

    pub fn ammo_remaining(&self) -> i64 {
        self.base.ammo_charges
    }

    /// Load `ammo`; `None` fills to capacity. Returns the quantity set, or
    /// `None` when the ammo is incompatible.
    pub fn ammo_set(
        &mut self,
        ammo: &ItemTypeId,
        qty: Option<i64>,
        content: &VehicleContent,
    ) -> Option<i64> {
        if !self.accepts(ammo, content) {
            return None;
        }
        let cap = self.ammo_capacity();
        let qty = qty.map_or(cap, |q| q.clamp(0, cap));
        self.base.ammo = Some(ammo.clone());
        self.base.ammo_charges = qty;
        if qty == 0 {
            self.ammo_unset();
        }
        Some(qty)
    }

    pub fn ammo_unset(&mut self) {
        self.base.ammo_charges = 0;
        self.base.ammo = if self.is_battery() {
            Some(ItemTypeId::new(FUEL_BATTERY))
        } else {
            None
        };
    }

    /// Remove up to `qty` charges; returns the amount actually removed.
    pub fn ammo_consume(&mut self, qty: i64) -> i64 {
        let taken = qty.clamp(0, self.base.ammo_charges);
        self.base.ammo_charges -= taken;
        if self.base.ammo_charges == 0 {
            self.ammo_unset();
        }
        taken
    }

    /// Whether `obj` (or anything, when `None`) could be loaded right now.
    pub fn can_reload(&self, obj: Option<&ItemTypeId>, content: &VehicleContent) -> bool {
        let cap = self.ammo_capacity();
        if cap <= 0 || self.ammo_remaining() >= cap {
            return false;
        }
        match obj {
            None => true,
            Some(id) => {
                self.accepts(id, content)
                    && (self.ammo_remaining() == 0 || self.ammo_current() == Some(id))
            }
        }
    }

    /// Move up to `qty` charges from `liquid` into this tank.
    pub fn fill_with(&mut self, liquid: &mut Item, qty: i64, content: &VehicleContent) -> bool {
        if !self.is_tank() || !self.accepts(&liquid.type_id, content) {
            return false;
        }
        if self.ammo_remaining() > 0 && self.ammo_current() != Some(&liquid.type_id) {
            return false;
        }
        let room = self.ammo_capacity() - self.ammo_remaining();
        let moved = qty.min(room).min(liquid.charges);
        if moved <= 0 {
            return false;
        }
        self.base.ammo = Some(liquid.type_id.clone());
        self.base.ammo_charges += moved;
        liquid.charges -= moved;
        true
    }

    /// Take up to `qty` charges out of a tank as a loose item. A negative
    /// `qty` empties the tank.
    pub fn drain(&mut self, qty: i64) -> Option<Item> {
        if !self.is_tank() {
            return None;
        }
        let fuel = self.ammo_current()?.clone();
        let qty = if qty < 0 { self.ammo_remaining() } else { qty };
        match self.ammo_consume(qty) {
            0 => None,
            taken => Some(Item::with_charges(fuel, taken)),
        }
    }

    /// Liquid held by a tank, as items.
    pub fn contents(&self) -> Vec<Item> {
        match (self.is_tank(), self.ammo_current()) {
            (true, Some(fuel)) if self.ammo_remaining() > 0 => {
                vec![Item::with_charges(fuel.clone(), self.ammo_remaining())]
            }
            _ => Vec::new(),
        }
    }

    // -- faults --------------------------------------------------------------

    pub fn faults(&self) -> &BTreeSet<FaultId> {
        &self.base.faults
    }

    /// Every fault this part type can suffer.
    pub fn faults_potential(&self) -> BTreeSet<FaultId> {
        self.info.faults.iter().cloned().collect()
    }

    /// Add a fault; false when the part type cannot suffer it.
    pub fn fault_set(&mut self, fault: &FaultId) -> bool {
        if !self.info.faults.contains(fault) {
            return false;
        }
        self.base.faults.insert(fault.clone());
        true
    }

    // -- crew ----------------------------------------------------------------

    /// Assigned crew member, if still alive, allied and the seat is intact.
    pub fn crew<'a>(&'a self, actors: &impl ActorRegistry) -> Option<&'a ActorId> {
        let id = self.crew_id.as_ref()?;
        if self.is_broken() || !actors.is_alive(id) || !actors.is_ally(id) {
            return None;
        }
        Some(id)
    }

    pub fn set_crew(&mut self, who: &ActorId, actors: &impl ActorRegistry) -> bool {
        let crewable = self.is_seat() || self.is_turret();
        if !crewable || self.is_broken() || !actors.is_alive(who) || !actors.is_ally(who) {
            return false;
        }
        self.crew_id = Some(who.clone());
        true
    }

    pub fn unset_crew(&mut self) {
        self.crew_id = None;
    }

    /// The loose item left behind when this part is removed.
    pub fn properties_to_item(&self) -> Item {
        let mut item = self.base.clone();
        item.type_id = ItemTypeId::new(self.info.id.as_str());
        item.charges = 1;
        if self.is_battery() && item.ammo_charges == 0 {
            item.ammo = None;
        }
        item
    }
}
