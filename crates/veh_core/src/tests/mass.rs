use super::*;

fn roster_with(id: &ActorId, weight_kg: f32) -> ActorRoster {
    let mut roster = ActorRoster::default();
    roster.insert(
        id.clone(),
        ActorInfo {
            name: "Driver".to_string(),
            pos: Tripoint::default(),
            ally: true,
            alive: true,
            weight_kg,
        },
    );
    roster
}

#[test]
fn test_empty_car_mass() {
    let content = base_content();
    let veh = test_car(&content);

    assert!(approx(veh.total_mass(), 608.0));
}

#[test]
fn test_fuel_adds_mass() {
    let content = base_content();
    let mut veh = test_car(&content);
    let before = veh.total_mass();
    let tank = find_part(&veh, "tank");

    veh.refill(tank, &gasoline(), 10);

    assert!(approx(veh.total_mass() - before, 7.5));
}

#[test]
fn test_passenger_and_cargo_add_mass() {
    let content = base_content();
    let mut veh = test_car(&content);
    let driver = ActorId::new("npc_driver");
    let roster = roster_with(&driver, 80.0);
    let seat = find_part(&veh, "seat");
    let cargo = find_part(&veh, "cargo_box");

    assert!(veh.board(seat, &driver, &roster));
    assert!(veh.add_item(cargo, Item::with_charges(ItemTypeId::new("rock"), 3)));

    assert!(approx(veh.total_mass(), 608.0 + 80.0 + 6.0));
}

#[test]
fn test_cache_matches_recompute_after_mutation() {
    let content = base_content();
    let mut veh = fueled_car(&content, 30);
    let _ = veh.total_mass();

    let tank = find_part(&veh, "tank");
    veh.part_mut(tank).unwrap().ammo_consume(20);

    assert!(veh.mass_dirty());
    assert!(approx(veh.total_mass(), veh.recompute_mass()));
}

#[test]
fn test_cache_tracks_every_kind_of_mutation() {
    let content = base_content();
    let mut veh = fueled_car(&content, 30);
    let mut rng = make_rng();
    let driver = ActorId::new("npc_driver");
    let roster = roster_with(&driver, 70.0);
    let consistent = |veh: &Vehicle, step: &str| {
        assert!(
            approx(veh.total_mass(), veh.recompute_mass()),
            "after {step}: cached {} vs {}",
            veh.total_mass(),
            veh.recompute_mass()
        );
    };
    consistent(&veh, "start");

    veh.install_part(Point::new(2, 1), &pid("frame")).unwrap();
    consistent(&veh, "install");

    let seat = find_part(&veh, "seat");
    assert!(veh.board(seat, &driver, &roster));
    consistent(&veh, "board");

    let cargo = find_part(&veh, "cargo_box");
    assert!(veh.add_item(cargo, Item::with_charges(ItemTypeId::new("rock"), 5)));
    consistent(&veh, "add_item");

    assert_eq!(veh.drain(&gasoline(), 12), 12);
    consistent(&veh, "drain");

    let light = find_part(&veh, "headlight");
    veh.damage_direct(light, 10_000, DamageType::Bash, &mut rng);
    assert!(veh.part(light).unwrap().is_broken() || veh.part(light).unwrap().is_removed());
    consistent(&veh, "destroy");

    let engine = find_part(&veh, "engine_gas");
    assert!(veh.remove_part(engine));
    consistent(&veh, "remove");

    veh.part_removal_cleanup();
    consistent(&veh, "cleanup");
}

#[test]
fn test_removed_parts_do_not_weigh() {
    let content = base_content();
    let mut veh = test_car(&content);
    let engine = find_part(&veh, "engine_gas");

    veh.remove_part(engine);

    assert!(approx(veh.total_mass(), 608.0 - 150.0));
}

#[test]
fn test_center_of_mass_moves_toward_heavy_parts() {
    let content = base_content();
    let mut veh = test_car(&content);

    assert_eq!(veh.local_center_of_mass(), Point::new(0, 0));

    veh.install_part(Point::new(2, 1), &pid("frame")).unwrap();
    let boxed = veh.install_part(Point::new(2, 1), &pid("cargo_box")).unwrap();
    assert!(veh.add_item(boxed, Item::with_charges(ItemTypeId::new("rock"), 190)));

    assert_eq!(veh.local_center_of_mass(), Point::new(1, 1));
}
