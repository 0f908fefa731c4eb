//! Content/schema validation tests for the shipped vehicle catalog.
//!
//! These tests load the actual `content/*.json` files and validate:
//! 1. Schema validity — all files deserialize without error
//! 2. Range constraints — no zero durabilities, no empty ids, sane engines
//! 3. Prototype integrity — every prototype builds with all of its parts
//! 4. Drivability — land vehicles roll, boats float, engines start
//! 5. Save files — every prototype survives a save/load round trip

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, OnceLock};
use veh_core::{
    InitialCondition, ItemTypeId, PartFlag, Tripoint, Vehicle, VehicleContent, FUEL_BATTERY,
};
use veh_world::{advance, load_content, load_vehicle, save_vehicle, spawn_vehicle, TileGrid};

/// Helper: resolve the content directory relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn content_dir() -> String {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    format!("{manifest}/../../content")
}

/// Shared content loaded once across all tests in this module.
fn load_test_content() -> &'static Arc<VehicleContent> {
    static CONTENT: OnceLock<Arc<VehicleContent>> = OnceLock::new();
    CONTENT.get_or_init(|| {
        Arc::new(
            load_content(&content_dir()).expect("load_content should succeed for shipped content"),
        )
    })
}

fn spawn(prototype: &str) -> Vehicle {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    spawn_vehicle(
        load_test_content(),
        prototype,
        InitialCondition::Pristine,
        &mut rng,
    )
    .expect("shipped prototype spawns")
}

// =========================================================================
// 1. Schema validation — deserialization succeeds
// =========================================================================

#[test]
fn content_loads_successfully() {
    let content = load_test_content();
    assert!(!content.content_version.is_empty());
    assert!(!content.prototypes.is_empty());
}

// =========================================================================
// 2. Range constraints
// =========================================================================

#[test]
fn part_ids_and_names_are_non_empty() {
    for part in load_test_content().parts.values() {
        assert!(!part.id.as_str().is_empty(), "part has empty id");
        assert!(!part.name.is_empty(), "part '{}' has empty name", part.id);
    }
}

#[test]
fn part_weights_are_positive() {
    for part in load_test_content().parts.values() {
        assert!(
            part.weight_kg > 0.0,
            "part '{}' has non-positive weight: {}",
            part.id,
            part.weight_kg
        );
    }
}

#[test]
fn item_weights_are_non_negative() {
    for item in load_test_content().items.values() {
        assert!(
            item.weight_kg >= 0.0,
            "item '{}' has negative weight: {}",
            item.id,
            item.weight_kg
        );
        if item.liquid {
            assert!(item.volume_l > 0.0, "liquid '{}' has no volume", item.id);
        }
    }
}

#[test]
fn battery_charge_item_exists() {
    let content = load_test_content();
    assert!(content.item(&ItemTypeId::new(FUEL_BATTERY)).is_some());
}

#[test]
fn engines_are_sane() {
    for part in load_test_content().parts.values() {
        let Some(engine) = &part.engine else {
            continue;
        };
        assert!(engine.power_w > 0, "engine '{}' has no power", part.id);
        assert!(
            engine.efficiency > 0.0 && engine.efficiency <= 1.0,
            "engine '{}' efficiency {} outside (0, 1]",
            part.id,
            engine.efficiency
        );
        assert!(
            engine.full_fuel_per_tick >= engine.idle_fuel_per_tick,
            "engine '{}' burns less at full load than idling",
            part.id
        );
    }
}

#[test]
fn wheels_have_contact_area() {
    for part in load_test_content().parts.values() {
        if let Some(wheel) = &part.wheel {
            assert!(
                wheel.diameter > 0 && wheel.width > 0,
                "part '{}' has a zero-sized wheel",
                part.id
            );
        }
    }
}

#[test]
fn turrets_spend_something_per_shot() {
    for part in load_test_content().parts.values() {
        let Some(turret) = &part.turret else {
            continue;
        };
        assert!(turret.range > 0 && turret.burst > 0, "turret '{}' cannot fire", part.id);
        assert!(
            turret.ammo_per_shot > 0 || turret.energy_per_shot > 0,
            "turret '{}' fires for free",
            part.id
        );
    }
}

#[test]
fn cable_losses_are_percentages() {
    for part in load_test_content().parts.values() {
        if part.flags.contains(&PartFlag::PowerTransfer) {
            assert!(
                (0..=100).contains(&part.transfer_loss_pct),
                "cable '{}' loses {}%",
                part.id,
                part.transfer_loss_pct
            );
        }
    }
}

// =========================================================================
// 3. Prototype integrity
// =========================================================================

#[test]
fn every_prototype_installs_all_parts() {
    for prototype in &load_test_content().prototypes {
        let veh = spawn(prototype.id.as_str());
        assert_eq!(
            veh.part_count(),
            prototype.parts.len(),
            "prototype '{}' skipped parts on install",
            prototype.id
        );
    }
}

#[test]
fn every_prototype_is_drivable_by_someone() {
    for prototype in &load_test_content().prototypes {
        let veh = spawn(prototype.id.as_str());
        assert!(
            !veh.all_parts_with_feature(PartFlag::Controls, true).is_empty(),
            "prototype '{}' has no controls",
            prototype.id
        );
        assert!(
            !veh.all_parts_with_feature(PartFlag::Seat, true).is_empty(),
            "prototype '{}' has no seat",
            prototype.id
        );
        assert!(!veh.engines().is_empty(), "prototype '{}' has no engine", prototype.id);
    }
}

// =========================================================================
// 4. Drivability
// =========================================================================

#[test]
fn every_prototype_has_a_valid_wheel_config() {
    for prototype in &load_test_content().prototypes {
        let veh = spawn(prototype.id.as_str());
        assert!(
            veh.valid_wheel_config(veh.is_boat()),
            "prototype '{}' cannot move",
            prototype.id
        );
        assert!(veh.max_velocity() > 0.0, "prototype '{}' has no top speed", prototype.id);
    }
}

#[test]
fn electric_boat_floats() {
    let veh = spawn("electric_boat");
    assert!(veh.is_boat());
    assert_eq!(veh.engine_fuel(veh.engines()[0]), Some(&ItemTypeId::new(FUEL_BATTERY)));
}

#[test]
fn sedan_drives_down_an_open_road() {
    let mut veh = spawn("sedan");
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let grid = TileGrid::new();
    let start = veh.global_pos3();
    let fuel = ItemTypeId::new("gasoline");
    let fuel_before = veh.fuel_left(&fuel, false);

    assert_eq!(veh.start_engines(&mut rng), 1);
    veh.cruise_thrust(10.0);
    for _ in 0..20 {
        assert!(advance(&mut veh, &grid, &mut rng).is_empty());
    }

    assert!(veh.engine_on());
    assert!(veh.velocity > 0.0);
    assert!(veh.global_pos3().x > start.x, "moved to {:?}", veh.global_pos3());
    assert!(veh.fuel_left(&fuel, false) < fuel_before);
}

#[test]
fn sedan_stops_at_a_wall() {
    let mut veh = spawn("sedan");
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut grid = TileGrid::new();
    let origin = veh.global_pos3();
    grid.add_wall(Tripoint::new(origin.x + 12, origin.y - 3, origin.z), origin.y + 3);

    veh.start_engines(&mut rng);
    veh.cruise_thrust(15.0);
    let mut hits = 0;
    for _ in 0..15 {
        hits += advance(&mut veh, &grid, &mut rng).len();
    }

    assert!(hits > 0);
    assert!(veh.global_pos3().x < origin.x + 12);
}

// =========================================================================
// 5. Save files
// =========================================================================

#[test]
fn every_prototype_survives_a_save_file() {
    let content = load_test_content();
    let dir = tempfile::tempdir().unwrap();
    for prototype in &content.prototypes {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let veh = spawn_vehicle(
            content,
            prototype.id.as_str(),
            InitialCondition::Worn,
            &mut rng,
        )
        .unwrap();
        let path = dir.path().join(format!("{}.json", prototype.id));

        save_vehicle(&veh, &path).unwrap();
        let loaded = load_vehicle(&path, Arc::clone(content)).unwrap();

        assert_eq!(loaded.part_count(), veh.part_count(), "{}", prototype.id);
        assert_eq!(loaded.fuels_left(), veh.fuels_left(), "{}", prototype.id);
        assert!(
            (loaded.total_mass() - veh.total_mass()).abs() < 1e-2,
            "{} mass {} != {}",
            prototype.id,
            loaded.total_mass(),
            veh.total_mass()
        );
    }
}
