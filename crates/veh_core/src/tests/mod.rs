use super::*;
use crate::test_fixtures::{base_content, make_rng, single_frame, test_car};
use std::sync::Arc;

mod boarding;
mod cargo;
mod mass;
mod power;
mod structure;
mod turret;

// --- Shared test helpers ------------------------------------------------

fn pid(id: &str) -> PartTypeId {
    PartTypeId::new(id)
}

fn gasoline() -> ItemTypeId {
    ItemTypeId::new("gasoline")
}

fn battery_charge() -> ItemTypeId {
    ItemTypeId::new(FUEL_BATTERY)
}

/// First live part of type `id`.
fn find_part(veh: &Vehicle, id: &str) -> usize {
    veh.parts()
        .iter()
        .position(|p| !p.is_removed() && p.id().as_str() == id)
        .unwrap_or_else(|| panic!("vehicle has no part '{id}'"))
}

fn hp(veh: &Vehicle, p: usize) -> i32 {
    veh.part(p).unwrap().hp()
}

/// The test car with `qty` gasoline in its tank.
fn fueled_car(content: &Arc<VehicleContent>, qty: i64) -> Vehicle {
    let mut veh = test_car(content);
    let tank = find_part(&veh, "tank");
    assert_eq!(veh.refill(tank, &gasoline(), qty), qty);
    veh
}

/// The fueled test car with its engine running.
fn running_car(content: &Arc<VehicleContent>, qty: i64) -> Vehicle {
    let mut veh = fueled_car(content, qty);
    let mut rng = make_rng();
    let engine = find_part(&veh, "engine_gas");
    assert!(veh.start_engine(engine, &mut rng));
    veh
}

fn has_event(veh: &Vehicle, pred: impl Fn(&Event) -> bool) -> bool {
    veh.events().iter().any(|e| pred(&e.event))
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
