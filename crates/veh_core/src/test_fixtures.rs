//! Shared test fixtures for veh_core and downstream crates.
//!
//! `base_content()` provides a catalog covering every part capability plus a
//! small car prototype. Numbers are chosen so hand-computed expectations stay
//! simple: one second per tick, round capacities, integer fuel costs.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    Constants, DamageType, EngineDef, FaultId, ItemDef, ItemTypeId, PartDef, PartFlag, PartTypeId,
    PrototypeId, PrototypePart, TurretDef, Vehicle, VehicleContent, VehicleId, VehiclePrototype,
    WheelDef,
};

pub const PROTO_CAR: &str = "proto_car";
pub const PROTO_BOAT: &str = "proto_boat";

fn part(id: &str, location: &str, flags: &[PartFlag], durability: i32, weight_kg: f32) -> PartDef {
    PartDef {
        id: PartTypeId::new(id),
        name: id.replace('_', " "),
        location: location.to_string(),
        flags: flags.to_vec(),
        durability,
        weight_kg,
        capacity: 0,
        fuel_type: None,
        epower_w: 0,
        damage_reduction: BTreeMap::new(),
        drag: 0.0,
        cargo_volume_l: 0.0,
        transfer_loss_pct: 0,
        engine: None,
        wheel: None,
        turret: None,
        faults: vec![],
    }
}

fn item(id: &str, weight_kg: f32, volume_l: f32) -> ItemDef {
    ItemDef {
        id: ItemTypeId::new(id),
        name: id.to_string(),
        weight_kg,
        volume_l,
        liquid: false,
        energy_kj: 0,
        explosive: false,
    }
}

fn engine(power_w: i32, fuel: &str, idle: i64, full: i64) -> EngineDef {
    EngineDef {
        power_w,
        fuel: ItemTypeId::new(fuel),
        idle_fuel_per_tick: idle,
        full_fuel_per_tick: full,
        idle_rpm: 800,
        optimal_rpm: 2500,
        safe_rpm: 5000,
        redline_rpm: 6000,
        efficiency: 0.3,
        gears: 5,
        start_ticks: 0,
        noise: 20.0,
        backfire_threshold: 0.25,
    }
}

fn wheel(id: &str, flags: &[PartFlag], diameter: i32, width: i32) -> PartDef {
    let mut def = part(id, "wheel", flags, 70, 20.0);
    def.wheel = Some(WheelDef { diameter, width });
    def
}

fn tank(id: &str, capacity: i64) -> PartDef {
    let mut def = part(id, "fuel_source", &[PartFlag::FuelTank], 50, 10.0);
    def.capacity = capacity;
    def.fuel_type = Some(ItemTypeId::new("gasoline"));
    def
}

fn turret(id: &str, def: TurretDef, capacity: i64) -> PartDef {
    let mut entry = part(id, "on_roof", &[PartFlag::Turret], 40, 15.0);
    entry.capacity = capacity;
    entry.turret = Some(def);
    entry
}

fn cable(id: &str, loss_pct: i32) -> PartDef {
    let mut def = part(
        id,
        "",
        &[PartFlag::PowerTransfer, PartFlag::UnmountOnMove],
        10,
        2.0,
    );
    def.transfer_loss_pct = loss_pct;
    def
}

fn test_parts() -> Vec<PartDef> {
    let mut engine_gas = part("engine_gas", "engine_block", &[PartFlag::Engine], 100, 150.0);
    engine_gas.engine = Some(engine(40_000, "gasoline", 2, 10));
    engine_gas.faults = vec![FaultId::new("fault_engine_belt")];

    let mut engine_electric = part("engine_electric", "engine_block", &[PartFlag::Engine], 80, 60.0);
    engine_electric.engine = Some(engine(20_000, "battery", 1, 20));

    let mut battery = part("battery", "battery", &[PartFlag::Battery], 40, 30.0);
    battery.capacity = 1000;

    let mut reactor = part("reactor", "reactor", &[PartFlag::Reactor], 60, 200.0);
    reactor.capacity = 10;
    reactor.fuel_type = Some(ItemTypeId::new("plutonium"));

    let mut alternator = part("alternator", "alternator", &[PartFlag::Alternator], 30, 5.0);
    alternator.epower_w = 2000;

    let mut solar_panel = part("solar_panel", "on_roof", &[PartFlag::SolarPanel], 20, 10.0);
    solar_panel.epower_w = 500;

    let mut headlight = part("headlight", "front", &[PartFlag::Light], 20, 3.0);
    headlight.epower_w = -1000;

    let mut boat_hull = part("boat_hull", "hull", &[PartFlag::Floats], 60, 40.0);
    boat_hull.wheel = Some(WheelDef {
        diameter: 30,
        width: 30,
    });

    let mut cargo_box = part("cargo_box", "cargo", &[PartFlag::Cargo], 40, 10.0);
    cargo_box.cargo_volume_l = 100.0;

    let mut armor_plate = part("armor_plate", "armor", &[PartFlag::Armor], 200, 60.0);
    armor_plate.damage_reduction = BTreeMap::from([
        (DamageType::Bash, 10),
        (DamageType::Cut, 10),
        (DamageType::Stab, 10),
    ]);

    let mut board = part("board", "center", &[PartFlag::Obstacle], 80, 20.0);
    board.drag = 0.5;

    vec![
        part("frame", "structure", &[], 100, 50.0),
        board,
        part(
            "door",
            "center",
            &[PartFlag::Obstacle, PartFlag::Openable, PartFlag::MultiSquare],
            60,
            25.0,
        ),
        part("roof", "roof", &[PartFlag::Roof], 60, 20.0),
        part("seat", "seat", &[PartFlag::Seat], 30, 10.0),
        part("controls", "controls", &[PartFlag::Controls], 30, 5.0),
        engine_gas,
        engine_electric,
        tank("tank", 60),
        tank("tank_small", 10),
        battery,
        reactor,
        alternator,
        solar_panel,
        headlight,
        wheel("wheel", &[PartFlag::Wheel], 20, 8),
        wheel("wheel_steerable", &[PartFlag::Wheel, PartFlag::Steerable], 20, 8),
        wheel("wheel_stable", &[PartFlag::Wheel, PartFlag::Stable], 24, 12),
        boat_hull,
        cargo_box,
        armor_plate,
        cable("jumper_cable", 0),
        cable("lossy_cable", 20),
    ]
    .into_iter()
    .chain(turret_parts())
    .collect()
}

fn turret_parts() -> Vec<PartDef> {
    vec![
        turret(
            "turret_mg",
            TurretDef {
                ammo_types: vec![ItemTypeId::new("9mm")],
                range: 12,
                burst: 5,
                ammo_per_shot: 1,
                energy_per_shot: 0,
                uses_tanks: false,
            },
            100,
        ),
        turret(
            "turret_laser",
            TurretDef {
                ammo_types: vec![],
                range: 15,
                burst: 1,
                ammo_per_shot: 0,
                energy_per_shot: 50,
                uses_tanks: false,
            },
            0,
        ),
        turret(
            "turret_flamer",
            TurretDef {
                ammo_types: vec![ItemTypeId::new("gasoline"), ItemTypeId::new("diesel")],
                range: 5,
                burst: 2,
                ammo_per_shot: 2,
                energy_per_shot: 0,
                uses_tanks: true,
            },
            0,
        ),
    ]
}

fn test_items() -> Vec<ItemDef> {
    let mut gasoline = item("gasoline", 0.75, 0.001);
    gasoline.liquid = true;
    gasoline.explosive = true;
    gasoline.energy_kj = 34;
    let mut diesel = item("diesel", 0.85, 0.001);
    diesel.liquid = true;
    diesel.energy_kj = 38;
    let mut water = item("water", 1.0, 0.001);
    water.liquid = true;
    let mut plutonium = item("plutonium", 0.1, 0.01);
    plutonium.energy_kj = 1000;

    vec![
        gasoline,
        diesel,
        water,
        item("battery", 0.0, 0.0),
        plutonium,
        item("9mm", 0.01, 0.01),
        item("rock", 2.0, 0.5),
    ]
}

fn proto_part(x: i32, y: i32, part: &str) -> PrototypePart {
    PrototypePart {
        x,
        y,
        part: PartTypeId::new(part),
    }
}

/// A 3x2 car: steerable wheels in front, fixed wheels at the back, an engine
/// over the front axle, tank and battery at the rear, two seats and cargo.
fn test_prototypes() -> Vec<VehiclePrototype> {
    let mut car = Vec::new();
    for x in [0, 1, -1] {
        for y in [0, 1] {
            car.push(proto_part(x, y, "frame"));
        }
    }
    car.extend([
        proto_part(0, 0, "seat"),
        proto_part(0, 0, "controls"),
        proto_part(0, 1, "seat"),
        proto_part(0, 1, "cargo_box"),
        proto_part(1, 0, "engine_gas"),
        proto_part(1, 0, "wheel_steerable"),
        proto_part(1, 1, "wheel_steerable"),
        proto_part(1, 1, "headlight"),
        proto_part(-1, 0, "wheel"),
        proto_part(-1, 0, "tank"),
        proto_part(-1, 1, "wheel"),
        proto_part(-1, 1, "battery"),
    ]);

    let mut boat = Vec::new();
    for x in [0, 1, -1] {
        boat.push(proto_part(x, 0, "frame"));
        boat.push(proto_part(x, 0, "boat_hull"));
    }
    boat.push(proto_part(0, 0, "seat"));

    vec![
        VehiclePrototype {
            id: PrototypeId::new(PROTO_CAR),
            name: "Test Car".to_string(),
            parts: car,
        },
        VehiclePrototype {
            id: PrototypeId::new(PROTO_BOAT),
            name: "Test Boat".to_string(),
            parts: boat,
        },
    ]
}

pub fn test_constants() -> Constants {
    Constants {
        seconds_per_tick: 1.0,
        pivot_weight_broken: 0.1,
        pivot_weight_steerable_inline: 1.0,
        pivot_weight_steerable_perpendicular: 0.1,
        pivot_weight_fixed_inline: 1.0,
        pivot_weight_fixed_perpendicular: 1.0,
        friction_base: 1000.0,
        aero_base: 200.0,
        aero_obstacle_penalty: 30.0,
        aero_passable_penalty: 10.0,
        aero_max_rows: 13,
        mass_base: 50.0,
        mass_wheel_scale: 1.0,
        traction_floor: 0.1,
        velocity_per_kw: 1.0,
        max_reverse_fraction: 0.3,
        rolling_resistance: 0.01,
        air_density_factor: 0.5,
        min_accel_velocity: 10.0,
        coast_decel: 0.2,
        brake_decel: 5.0,
        handling_velocity_scale: 10.0,
        skid_turn_velocity: 10.0,
        engine_start_fault_threshold: 0.5,
        engine_overspeed_damage: 5,
        smoke_health_threshold: 0.5,
        fault_power_penalty: 0.1,
        tank_leak_fraction: 0.05,
        damage_threshold_cap: 10,
        damage_threshold_divisor: 10,
        scatter_distance: 2,
        debris_pieces_max: 3,
        collision_damage_scale: 1000.0,
        bash_mass_kg: 100.0,
        init_fuel_min_pct: 20,
        init_fuel_max_pct: 80,
        init_damage_chance: 0.5,
        smash_min_fraction: 0.1,
    }
}

/// Full catalog: every part capability, fuels, ammo and two prototypes.
pub fn base_content() -> Arc<VehicleContent> {
    Arc::new(VehicleContent::new(
        "test",
        test_parts(),
        test_items(),
        test_prototypes(),
        test_constants(),
    ))
}

/// The car prototype with empty tanks, flat battery and no one aboard.
pub fn test_car(content: &Arc<VehicleContent>) -> Vehicle {
    Vehicle::from_prototype(
        Arc::clone(content),
        &PrototypeId::new(PROTO_CAR),
        VehicleId::new("veh_test_car"),
    )
    .expect("car prototype builds from the base catalog")
}

/// A bare vehicle with a single frame at the origin.
pub fn single_frame(content: &Arc<VehicleContent>, id: &str) -> Vehicle {
    let mut veh = Vehicle::new(Arc::clone(content), VehicleId::new(id), id);
    veh.install_part(crate::Point::new(0, 0), &PartTypeId::new("frame"))
        .expect("frame installs on an empty vehicle");
    veh
}

/// Deterministic RNG seeded with 42.
pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
