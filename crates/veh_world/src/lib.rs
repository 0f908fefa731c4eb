//! Content loading, spawning and save files shared between veh_cli and tests.

mod grid;

pub use grid::{advance, TileGrid, TILE_METERS};

use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use veh_core::{
    new_vehicle_id, Constants, InitialCondition, ItemDef, ItemTypeId, PartDef, PartFlag,
    PrototypeId, Vehicle, VehicleContent, VehiclePrototype, VehicleSnapshot, LOCATION_STRUCTURE,
};

#[derive(Deserialize)]
struct PartsFile {
    content_version: String,
    parts: Vec<PartDef>,
}

#[derive(Deserialize)]
struct ItemsFile {
    items: Vec<ItemDef>,
}

#[derive(Deserialize)]
struct PrototypesFile {
    prototypes: Vec<VehiclePrototype>,
}

/// Validates cross-references in loaded content, panicking on any authoring error.
///
/// Catches mistakes like: a tank holding an unknown fuel, a prototype naming a
/// part that doesn't exist, or a wheel flag on a part with no wheel dimensions.
pub fn validate_content(content: &VehicleContent) {
    let item_ids: HashSet<&ItemTypeId> = content.items.keys().collect();

    for part in content.parts.values() {
        validate_part(part, &item_ids);
    }

    let mut prototype_ids = HashSet::new();
    for prototype in &content.prototypes {
        assert!(
            prototype_ids.insert(&prototype.id),
            "prototype '{}' is defined twice",
            prototype.id,
        );
        let first = prototype.parts.first().unwrap_or_else(|| {
            panic!("prototype '{}' has no parts", prototype.id);
        });
        for entry in &prototype.parts {
            assert!(
                content.parts.contains_key(&entry.part),
                "prototype '{}' part '{}' at ({}, {}) is not a known part",
                prototype.id,
                entry.part,
                entry.x,
                entry.y,
            );
        }
        assert!(
            content
                .part(&first.part)
                .is_some_and(|def| def.location == LOCATION_STRUCTURE),
            "prototype '{}' must start with a structural part, found '{}'",
            prototype.id,
            first.part,
        );
    }

    validate_constants(&content.constants);
}

fn validate_part(part: &PartDef, item_ids: &HashSet<&ItemTypeId>) {
    assert!(part.durability > 0, "part '{}' durability must be positive", part.id);
    if let Some(fuel) = &part.fuel_type {
        assert!(
            item_ids.contains(fuel),
            "part '{}' fuel_type '{}' is not a known item",
            part.id,
            fuel,
        );
    }
    let stores = [PartFlag::FuelTank, PartFlag::Reactor, PartFlag::Battery];
    if stores.iter().any(|f| part.flags.contains(f)) {
        assert!(part.capacity > 0, "part '{}' stores fuel but has no capacity", part.id);
    }
    if part.flags.contains(&PartFlag::FuelTank) || part.flags.contains(&PartFlag::Reactor) {
        assert!(part.fuel_type.is_some(), "part '{}' has no fuel_type", part.id);
    }
    if part.flags.contains(&PartFlag::Wheel) || part.flags.contains(&PartFlag::Floats) {
        assert!(
            part.wheel.is_some(),
            "part '{}' is a wheel or float without wheel dimensions",
            part.id,
        );
    }

    assert_eq!(
        part.flags.contains(&PartFlag::Engine),
        part.engine.is_some(),
        "part '{}' engine flag and engine block disagree",
        part.id,
    );
    if let Some(engine) = &part.engine {
        assert!(
            item_ids.contains(&engine.fuel),
            "engine '{}' fuel '{}' is not a known item",
            part.id,
            engine.fuel,
        );
        assert!(
            engine.idle_rpm <= engine.optimal_rpm && engine.safe_rpm <= engine.redline_rpm,
            "engine '{}' rpm bands are out of order",
            part.id,
        );
    }

    assert_eq!(
        part.flags.contains(&PartFlag::Turret),
        part.turret.is_some(),
        "part '{}' turret flag and turret block disagree",
        part.id,
    );
    if let Some(turret) = &part.turret {
        for ammo in &turret.ammo_types {
            assert!(
                item_ids.contains(ammo),
                "turret '{}' ammo '{}' is not a known item",
                part.id,
                ammo,
            );
        }
    }
}

fn validate_constants(c: &Constants) {
    assert!(c.seconds_per_tick > 0.0, "seconds_per_tick must be positive");
    assert!(
        c.init_fuel_min_pct <= c.init_fuel_max_pct,
        "init_fuel_min_pct must not exceed init_fuel_max_pct",
    );
    assert!(
        (0.0..=1.0).contains(&c.init_damage_chance),
        "init_damage_chance must be a probability",
    );
    assert!(c.damage_threshold_divisor > 0, "damage_threshold_divisor must be positive");
}

pub fn load_content(content_dir: &str) -> Result<VehicleContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = serde_json::from_str(
        &std::fs::read_to_string(dir.join("constants.json")).context("reading constants.json")?,
    )
    .context("parsing constants.json")?;
    let parts_file: PartsFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("parts.json")).context("reading parts.json")?,
    )
    .context("parsing parts.json")?;
    let items_file: ItemsFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("items.json")).context("reading items.json")?,
    )
    .context("parsing items.json")?;
    let prototypes_file: PrototypesFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("prototypes.json"))
            .context("reading prototypes.json")?,
    )
    .context("parsing prototypes.json")?;
    let content = VehicleContent::new(
        parts_file.content_version,
        parts_file.parts,
        items_file.items,
        prototypes_file.prototypes,
        constants,
    );
    validate_content(&content);
    tracing::debug!(
        version = %content.content_version,
        parts = content.parts.len(),
        items = content.items.len(),
        prototypes = content.prototypes.len(),
        "loaded vehicle content"
    );
    Ok(content)
}

/// Build a prototype with a fresh id, random fuel levels and the given wear.
pub fn spawn_vehicle(
    content: &Arc<VehicleContent>,
    prototype: &str,
    condition: InitialCondition,
    rng: &mut impl Rng,
) -> Result<Vehicle> {
    let id = new_vehicle_id(rng);
    let mut veh = Vehicle::from_prototype(Arc::clone(content), &PrototypeId::new(prototype), id)
        .with_context(|| format!("spawning prototype '{prototype}'"))?;
    veh.init_state(None, condition, rng);
    Ok(veh)
}

pub fn save_vehicle(veh: &Vehicle, path: &Path) -> Result<()> {
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &veh.snapshot())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load_vehicle(path: &Path, content: Arc<VehicleContent>) -> Result<Vehicle> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading vehicle file: {}", path.display()))?;
    let snapshot: VehicleSnapshot = serde_json::from_str(&json)
        .with_context(|| format!("parsing vehicle file: {}", path.display()))?;
    Vehicle::restore(snapshot, content)
        .with_context(|| format!("restoring vehicle from {}", path.display()))
}
