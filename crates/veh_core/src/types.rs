//! Type definitions for `veh_core`.
//!
//! ID newtypes, coordinates, catalog (content) records, tuning constants and
//! the event vocabulary shared by every vehicle subsystem.

use std::collections::BTreeMap;
use std::ops::{Add, Neg, Sub};
use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::Item;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(PartTypeId);
string_id!(ItemTypeId);
string_id!(PrototypeId);
string_id!(VehicleId);
string_id!(ActorId);
string_id!(FaultId);
string_id!(EventId);

/// Pseudo-fuel stored by battery parts. Charges are kJ.
pub const FUEL_BATTERY: &str = "battery";

/// Location slot every mount point must begin with.
pub const LOCATION_STRUCTURE: &str = "structure";

/// Map squares per submap edge.
pub const SUBMAP_SIZE: i32 = 12;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Vehicle-local or map-local 2D coordinate. `x` is forward, `y` is right.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, the tile metric used for ranges and scatter.
    pub fn square_dist(self, other: Point) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Global map coordinate including z-level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Tripoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Tripoint {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn offset(self, d: Point) -> Tripoint {
        Tripoint::new(self.x + d.x, self.y + d.y, self.z)
    }

    pub fn square_dist(self, other: Tripoint) -> i32 {
        self.xy()
            .square_dist(other.xy())
            .max((self.z - other.z).abs())
    }
}

impl Add for Tripoint {
    type Output = Tripoint;
    fn add(self, rhs: Tripoint) -> Tripoint {
        Tripoint::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Passed through to the part unmodified, no threshold.
    True,
    /// Raw hp adjustment with no side effects.
    Null,
    Bash,
    Cut,
    Stab,
    Heat,
    Electric,
    Acid,
}

/// Capabilities a catalog entry grants. Some are mutually exclusive by
/// catalog construction (a part is never both tank and battery).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartFlag {
    Engine,
    Alternator,
    Light,
    FuelTank,
    Battery,
    Reactor,
    Turret,
    Seat,
    Wheel,
    Steerable,
    Stable,
    Floats,
    Cargo,
    Obstacle,
    Openable,
    MultiSquare,
    Armor,
    Roof,
    Protrusion,
    UnmountOnMove,
    PowerTransfer,
    SolarPanel,
    Controls,
}

/// Run state of a single engine part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Off,
    /// Cranking; draws fuel but delivers no power until `ticks_left` reaches 0.
    Starting { ticks_left: u32 },
    Running,
    Overspeed,
    /// Stalled or broken while running. Cleared to `Off` on the next idle tick.
    Fault,
}

/// Who picks a turret's target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurretTargeting {
    /// Fires only when told to.
    #[default]
    Manual,
    /// Fires on its own at the aimed point or the nearest hostile in range.
    Automatic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurretFireMode {
    Single,
    #[default]
    Burst,
}

impl EngineState {
    /// Delivering power right now.
    pub fn is_on(self) -> bool {
        matches!(self, EngineState::Running | EngineState::Overspeed)
    }

    /// Consuming fuel right now.
    pub fn is_burning(self) -> bool {
        matches!(
            self,
            EngineState::Starting { .. } | EngineState::Running | EngineState::Overspeed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStopReason {
    OutOfFuel,
    Broken,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    Nothing,
    /// Creature, player or NPC.
    Body,
    Vehicle,
    Bashable,
    Other,
}

/// Starting condition for a vehicle spawned from a prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialCondition {
    Pristine,
    /// Some parts randomly damaged, none broken.
    Worn,
    /// Roughly half of the non-structural parts broken.
    Wrecked,
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDef {
    pub power_w: i32,
    pub fuel: ItemTypeId,
    pub idle_fuel_per_tick: i64,
    pub full_fuel_per_tick: i64,
    pub idle_rpm: i32,
    pub optimal_rpm: i32,
    /// Highest rpm sustainable without damage. Never above `redline_rpm`.
    pub safe_rpm: i32,
    pub redline_rpm: i32,
    /// Peak fuel efficiency, reached at `optimal_rpm`.
    pub efficiency: f32,
    #[serde(default)]
    pub gears: u32,
    #[serde(default)]
    pub start_ticks: u32,
    /// Noise volume at full load.
    #[serde(default)]
    pub noise: f32,
    /// Health fraction below which starting can backfire.
    #[serde(default)]
    pub backfire_threshold: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WheelDef {
    /// Inches.
    pub diameter: i32,
    /// Inches.
    pub width: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurretDef {
    pub ammo_types: Vec<ItemTypeId>,
    pub range: i32,
    pub burst: u32,
    #[serde(default)]
    pub ammo_per_shot: i64,
    /// Battery kJ per shot.
    #[serde(default)]
    pub energy_per_shot: i64,
    /// Feeds from compatible tanks elsewhere on the vehicle.
    #[serde(default)]
    pub uses_tanks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDef {
    pub id: PartTypeId,
    pub name: String,
    /// Mount slot; two parts at one mount must differ in slot. Empty means the
    /// part is small enough to share with anything but itself.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub flags: Vec<PartFlag>,
    pub durability: i32,
    pub weight_kg: f32,
    /// Tank (charges), battery (kJ), reactor or turret magazine capacity.
    #[serde(default)]
    pub capacity: i64,
    /// Default contents for tanks and reactors.
    #[serde(default)]
    pub fuel_type: Option<ItemTypeId>,
    /// Electrical power in watts. Negative for consumers.
    #[serde(default)]
    pub epower_w: i32,
    #[serde(default)]
    pub damage_reduction: BTreeMap<DamageType, i32>,
    #[serde(default)]
    pub drag: f32,
    #[serde(default)]
    pub cargo_volume_l: f32,
    /// Percent lost per hop when power crosses this cable.
    #[serde(default)]
    pub transfer_loss_pct: i32,
    #[serde(default)]
    pub engine: Option<EngineDef>,
    #[serde(default)]
    pub wheel: Option<WheelDef>,
    #[serde(default)]
    pub turret: Option<TurretDef>,
    #[serde(default)]
    pub faults: Vec<FaultId>,
}

impl PartDef {
    pub fn has_flag(&self, flag: PartFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_structure(&self) -> bool {
        self.location == LOCATION_STRUCTURE
    }

    pub fn damage_reduction(&self, kind: DamageType) -> i32 {
        self.damage_reduction.get(&kind).copied().unwrap_or(0)
    }

    /// Parts that start out selected for use when installed.
    pub fn enabled_by_default(&self) -> bool {
        [
            PartFlag::Engine,
            PartFlag::Alternator,
            PartFlag::SolarPanel,
            PartFlag::Turret,
        ]
        .iter()
        .any(|f| self.has_flag(*f))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemTypeId,
    pub name: String,
    /// Per unit (or per charge for fuels and ammo).
    pub weight_kg: f32,
    #[serde(default)]
    pub volume_l: f32,
    #[serde(default)]
    pub liquid: bool,
    /// Energy released per unit when burned or fissioned.
    #[serde(default)]
    pub energy_kj: i64,
    #[serde(default)]
    pub explosive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrototypePart {
    pub x: i32,
    pub y: i32,
    pub part: PartTypeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePrototype {
    pub id: PrototypeId,
    pub name: String,
    pub parts: Vec<PrototypePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    /// Real seconds simulated by one tick.
    pub seconds_per_tick: f32,
    // -- pivot weights (wheel contact area multipliers)
    pub pivot_weight_broken: f32,
    pub pivot_weight_steerable_inline: f32,
    pub pivot_weight_steerable_perpendicular: f32,
    pub pivot_weight_fixed_inline: f32,
    pub pivot_weight_fixed_perpendicular: f32,
    // -- physics coefficients
    pub friction_base: f32,
    pub aero_base: f32,
    pub aero_obstacle_penalty: f32,
    pub aero_passable_penalty: f32,
    pub aero_max_rows: i32,
    pub mass_base: f32,
    pub mass_wheel_scale: f32,
    pub traction_floor: f32,
    /// Top speed (m/s) per kW of engine power at `k_dynamics == 1`.
    pub velocity_per_kw: f32,
    pub max_reverse_fraction: f32,
    pub rolling_resistance: f32,
    pub air_density_factor: f32,
    pub min_accel_velocity: f32,
    /// Velocity lost per tick while coasting (m/s).
    pub coast_decel: f32,
    pub brake_decel: f32,
    /// Velocity (m/s) at which a fully unfavourable setup is one skill level hard.
    pub handling_velocity_scale: f32,
    pub skid_turn_velocity: f32,
    // -- engines and power
    pub engine_start_fault_threshold: f32,
    pub engine_overspeed_damage: i32,
    pub smoke_health_threshold: f32,
    pub fault_power_penalty: f32,
    pub tank_leak_fraction: f32,
    // -- damage
    pub damage_threshold_cap: i32,
    pub damage_threshold_divisor: i32,
    pub scatter_distance: i32,
    pub debris_pieces_max: u32,
    // -- collision
    pub collision_damage_scale: f32,
    pub bash_mass_kg: f32,
    // -- spawning
    pub init_fuel_min_pct: i64,
    pub init_fuel_max_pct: i64,
    pub init_damage_chance: f64,
    pub smash_min_fraction: f32,
}

/// Load-time populated, read-only catalog shared by every vehicle.
#[derive(Debug, Clone)]
pub struct VehicleContent {
    pub content_version: String,
    pub parts: AHashMap<PartTypeId, Arc<PartDef>>,
    pub items: AHashMap<ItemTypeId, ItemDef>,
    pub prototypes: Vec<VehiclePrototype>,
    pub constants: Constants,
}

impl VehicleContent {
    pub fn new(
        content_version: impl Into<String>,
        parts: Vec<PartDef>,
        items: Vec<ItemDef>,
        prototypes: Vec<VehiclePrototype>,
        constants: Constants,
    ) -> Self {
        Self {
            content_version: content_version.into(),
            parts: parts
                .into_iter()
                .map(|def| (def.id.clone(), Arc::new(def)))
                .collect(),
            items: items.into_iter().map(|def| (def.id.clone(), def)).collect(),
            prototypes,
            constants,
        }
    }

    pub fn part(&self, id: &PartTypeId) -> Option<&Arc<PartDef>> {
        self.parts.get(id)
    }

    pub fn item(&self, id: &ItemTypeId) -> Option<&ItemDef> {
        self.items.get(id)
    }

    pub fn prototype(&self, id: &PrototypeId) -> Option<&VehiclePrototype> {
        self.prototypes.iter().find(|p| &p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PartInstalled {
        part: usize,
        part_type: PartTypeId,
        mount: Point,
    },
    PartRemoved {
        part: usize,
        part_type: PartTypeId,
        mount: Point,
    },
    PartDestroyed {
        part: usize,
        part_type: PartTypeId,
        mount: Point,
    },
    /// Intact part ripped off its frame, left as a loose item.
    PartTornOff {
        item: Item,
        pos: Tripoint,
    },
    /// Scattered pieces of a part that broke apart.
    Debris {
        part_type: PartTypeId,
        pos: Tripoint,
    },
    PartShed {
        item: Item,
        pos: Tripoint,
    },
    FuelLeaked {
        part: usize,
        fuel: ItemTypeId,
        amount: i64,
        pos: Tripoint,
    },
    CargoSpilled {
        part: usize,
        items: Vec<Item>,
        pos: Tripoint,
    },
    FuelExploded {
        part: usize,
        fuel: ItemTypeId,
        amount: i64,
        pos: Tripoint,
    },
    EngineStarted {
        part: usize,
    },
    EngineStartFailed {
        part: usize,
        backfire: bool,
    },
    EngineStopped {
        part: usize,
        reason: EngineStopReason,
    },
    EngineOverspeed {
        part: usize,
    },
    Noise {
        pos: Tripoint,
        volume: f32,
    },
    Smoke {
        pos: Tripoint,
        density: u32,
    },
    Collision {
        part: usize,
        kind: CollisionKind,
        impulse: f32,
        target: Option<String>,
    },
    TurretFired {
        part: usize,
        target: Tripoint,
        shots: u32,
        ammo: Option<ItemTypeId>,
    },
}
