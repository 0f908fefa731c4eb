use super::*;

fn battery_level(veh: &Vehicle) -> i64 {
    veh.fuel_left(&battery_charge(), false)
}

#[test]
fn test_charge_battery_returns_overflow() {
    let content = base_content();
    let mut veh = test_car(&content);

    assert_eq!(veh.charge_battery(1500), 500);
    assert_eq!(battery_level(&veh), 1000);
    assert_eq!(veh.charge_battery(10), 10, "full battery takes nothing");
    assert_eq!(veh.charge_battery(-5), 0);
}

#[test]
fn test_discharge_battery_returns_shortfall() {
    let content = base_content();
    let mut veh = test_car(&content);
    veh.charge_battery(300);

    assert_eq!(veh.discharge_battery(500, true), 200);
    assert_eq!(battery_level(&veh), 0);
}

#[test]
fn test_reactor_covers_shortfall_when_enabled() {
    let content = base_content();
    let mut veh = test_car(&content);
    let reactor = veh.install_part(Point::new(0, 0), &pid("reactor")).unwrap();
    assert_eq!(veh.refill(reactor, &ItemTypeId::new("plutonium"), 2), 2);

    assert_eq!(veh.discharge_battery(500, true), 500, "reactors start switched off");
    assert_eq!(veh.fuel_left(&battery_charge(), true), 0);

    veh.part_mut(reactor).unwrap().enabled = true;
    assert_eq!(veh.fuel_left(&battery_charge(), true), 2000);

    assert_eq!(veh.discharge_battery(500, true), 0);
    assert_eq!(battery_level(&veh), 500, "surplus goes into the battery");
    assert_eq!(veh.part(reactor).unwrap().ammo_remaining(), 1);
    assert_eq!(veh.discharge_battery(100, false), 0);
}

#[test]
fn test_drain_spans_tanks_in_order() {
    let content = base_content();
    let mut veh = fueled_car(&content, 5);
    let small = veh.install_part(Point::new(1, 1), &pid("tank_small")).unwrap();
    veh.refill(small, &gasoline(), 5);

    assert_eq!(veh.fuel_left(&gasoline(), false), 10);
    assert_eq!(veh.drain(&gasoline(), 8), 8);
    assert_eq!(veh.fuel_left(&gasoline(), false), 2);
    assert_eq!(veh.drain(&gasoline(), 8), 2);
}

#[test]
fn test_broken_tank_is_not_a_source() {
    let content = base_content();
    let mut veh = fueled_car(&content, 20);
    let tank = find_part(&veh, "tank");

    veh.set_hp(tank, 0);

    assert_eq!(veh.fuel_left(&gasoline(), false), 0);
    assert_eq!(veh.drain(&gasoline(), 5), 0);
}

#[test]
fn test_refill_rejects_mismatch() {
    let content = base_content();
    let mut veh = fueled_car(&content, 20);
    let tank = find_part(&veh, "tank");

    assert_eq!(veh.refill(tank, &ItemTypeId::new("rock"), 5), 0);
    assert_eq!(veh.refill(tank, &ItemTypeId::new("diesel"), 5), 0);
    assert_eq!(veh.refill(tank, &gasoline(), 100), 40, "capped at capacity");
}

#[test]
fn test_fuels_and_capacity() {
    let content = base_content();
    let mut veh = fueled_car(&content, 20);
    veh.charge_battery(250);

    let fuels = veh.fuels_left();
    assert_eq!(fuels.get(&gasoline()), Some(&20));
    assert_eq!(fuels.get(&battery_charge()), Some(&250));
    assert_eq!(veh.fuel_capacity(&gasoline()), 60);
    assert_eq!(veh.fuel_capacity(&battery_charge()), 1000);
}

#[test]
fn test_solar_charges_over_elapsed_time() {
    let content = base_content();
    let mut veh = single_frame(&content, "veh_solar");
    veh.install_part(Point::new(0, 0), &pid("battery")).unwrap();
    veh.install_part(Point::new(0, 0), &pid("solar_panel")).unwrap();

    veh.update_time(10, 1.0);
    assert_eq!(battery_level(&veh), 5);
    assert_eq!(veh.last_update_turn(), 10);

    veh.update_time(5, 1.0);
    assert_eq!(battery_level(&veh), 5, "time never runs backwards");

    veh.update_time(30, 0.5);
    assert_eq!(battery_level(&veh), 10);
}

#[test]
fn test_consumers_switch_off_when_battery_flat() {
    let content = base_content();
    let mut veh = test_car(&content);
    let light = find_part(&veh, "headlight");
    veh.part_mut(light).unwrap().enabled = true;

    assert_eq!(veh.lights(true), vec![light]);
    assert_eq!(veh.power_usage(), 1000);

    veh.idle(false);

    assert!(!veh.part(light).unwrap().enabled);
    assert!(veh.lights(true).is_empty());
}

#[test]
fn test_consumers_draw_from_battery() {
    let content = base_content();
    let mut veh = test_car(&content);
    let light = find_part(&veh, "headlight");
    veh.part_mut(light).unwrap().enabled = true;
    veh.charge_battery(10);

    veh.idle(false);

    assert!(veh.part(light).unwrap().enabled);
    assert_eq!(battery_level(&veh), 9);
}

#[test]
fn test_alternator_charges_while_engine_runs() {
    let content = base_content();
    let mut veh = fueled_car(&content, 20);
    veh.install_part(Point::new(1, 0), &pid("alternator")).unwrap();
    let engine = find_part(&veh, "engine_gas");
    let mut rng = make_rng();
    assert!(veh.start_engine(engine, &mut rng));

    veh.idle(false);

    assert_eq!(battery_level(&veh), 2);
    assert!(approx(veh.alternator_load, 0.05));
    assert_eq!(veh.alternator_power(), 2000);
}

#[test]
fn test_power_links_list_plugged_cables() {
    let content = base_content();
    let mut veh = single_frame(&content, "veh_a");
    let cable = veh.install_part(Point::new(0, 0), &pid("lossy_cable")).unwrap();
    assert!(veh.power_links().is_empty());

    veh.part_mut(cable).unwrap().target_vehicle = Some(VehicleId::new("veh_b"));

    assert_eq!(veh.power_links(), vec![(cable, VehicleId::new("veh_b"), 20)]);
}
