use std::collections::BTreeSet;

use super::*;

fn nine_mm() -> ItemTypeId {
    ItemTypeId::new("9mm")
}

fn armed_frame(content: &Arc<VehicleContent>, turret: &str) -> (Vehicle, usize) {
    let mut veh = single_frame(content, "veh_turret");
    let t = veh.install_part(Point::new(0, 0), &pid(turret)).unwrap();
    (veh, t)
}

fn target_at(veh: &Vehicle, t: usize, dx: i32) -> Tripoint {
    veh.global_part_pos3(t).offset(Point::new(dx, 0))
}

#[test]
fn test_magazine_turret_fires_a_burst() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    assert_eq!(veh.turret_status(t), TurretStatus::NoAmmo);
    assert_eq!(veh.refill(t, &nine_mm(), 100), 100);
    let target = target_at(&veh, t, 5);

    let shots = veh.turret_query(t).fire(target);

    assert_eq!(shots, 5);
    assert_eq!(veh.turret_ammo_remaining(t), 95);
    assert_eq!(veh.part(t).unwrap().target, Some((target, target)));
    assert!(has_event(&veh, |e| matches!(
        e,
        Event::TurretFired { shots: 5, ammo: Some(ammo), .. } if *ammo == nine_mm()
    )));
}

#[test]
fn test_out_of_range_does_not_fire() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    veh.refill(t, &nine_mm(), 100);
    let far = target_at(&veh, t, 13);

    assert_eq!(veh.turret_query(t).fire(far), 0);
    assert_eq!(veh.turret_ammo_remaining(t), 100);
    assert!(veh.turrets_at(far).is_empty());
    assert_eq!(veh.turrets_at(target_at(&veh, t, 12)), vec![t]);
}

#[test]
fn test_burst_stops_when_magazine_empties() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    veh.refill(t, &nine_mm(), 7);
    let target = target_at(&veh, t, 3);

    assert_eq!(veh.turret_query(t).fire(target), 5);
    assert_eq!(veh.turret_query(t).fire(target), 2);
    assert_eq!(veh.turret_status(t), TurretStatus::NoAmmo);
    assert_eq!(veh.turret_query(t).fire(target), 0);
}

#[test]
fn test_magazine_reload_and_unload() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");

    {
        let turret = veh.turret_query(t);
        assert_eq!(turret.ammo_capacity(), 100);
        assert!(turret.can_reload());
        assert!(!turret.can_unload());
        assert_eq!(turret.range(), 12);
        assert_eq!(turret.name(), "turret mg");
    }

    veh.refill(t, &nine_mm(), 100);
    let turret = veh.turret_query(t);
    assert!(!turret.can_reload(), "magazine is full");
    assert!(turret.can_unload());
    assert_eq!(turret.ammo_current(), Some(nine_mm()));
}

#[test]
fn test_energy_weapon_needs_battery() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_laser");
    let target = target_at(&veh, t, 10);
    assert_eq!(veh.turret_status(t), TurretStatus::NoPower);
    assert_eq!(veh.turret_query(t).fire(target), 0);

    veh.install_part(Point::new(0, 0), &pid("battery")).unwrap();
    veh.charge_battery(120);

    assert_eq!(veh.turret_query(t).fire(target), 1);
    assert_eq!(veh.fuel_left(&battery_charge(), false), 70);
}

#[test]
fn test_tank_fed_turret_draws_vehicle_fuel() {
    let content = base_content();
    let mut veh = fueled_car(&content, 10);
    let t = veh
        .install_part(Point::new(0, 0), &pid("turret_flamer"))
        .unwrap();
    let target = target_at(&veh, t, 3);

    let mut turret = veh.turret_query(t);
    assert_eq!(turret.ammo_capacity(), 0);
    assert!(!turret.can_reload());
    assert_eq!(turret.ammo_options(), BTreeSet::from([gasoline()]));
    assert!(!turret.ammo_select(&ItemTypeId::new("diesel")));
    assert!(turret.ammo_select(&gasoline()));
    assert_eq!(turret.fire(target), 2);

    assert_eq!(veh.fuel_left(&gasoline(), false), 6);
}

#[test]
fn test_broken_turret_is_invalid() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    veh.refill(t, &nine_mm(), 100);
    let target = target_at(&veh, t, 1);
    assert_eq!(veh.turrets(), vec![t]);

    veh.set_hp(t, 0);

    assert_eq!(veh.turret_status(t), TurretStatus::Invalid);
    assert!(veh.turrets().is_empty());
    assert_eq!(veh.turret_query(t).fire(target), 0);
}

#[test]
fn test_non_turret_part_is_invalid() {
    let content = base_content();
    let veh = single_frame(&content, "veh_plain");

    assert_eq!(veh.turret_status(0), TurretStatus::Invalid);
    assert!(veh.turret_ammo_options(0).is_empty());
}

#[test]
fn test_single_fire_mode_shoots_once() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    veh.refill(t, &nine_mm(), 100);
    let target = target_at(&veh, t, 4);

    assert_eq!(veh.turrets_set_mode(&[t, 0], TurretFireMode::Single), 1);
    assert_eq!(veh.turrets_set_mode(&[t], TurretFireMode::Single), 0, "already single");

    assert_eq!(veh.turret_query(t).fire(target), 1);
    assert_eq!(veh.turret_ammo_remaining(t), 99);
}

#[test]
fn test_manual_turret_holds_fire() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    veh.refill(t, &nine_mm(), 100);
    let hostile = target_at(&veh, t, 3);

    assert_eq!(veh.part(t).unwrap().targeting, TurretTargeting::Manual);
    assert_eq!(veh.automatic_fire_turrets(&[hostile]), 0);
    assert!(!veh.turrets_aim(hostile), "manual turrets take no aim");
    assert_eq!(veh.turret_ammo_remaining(t), 100);
}

#[test]
fn test_automatic_turret_engages_nearest_hostile() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    veh.refill(t, &nine_mm(), 100);
    assert_eq!(veh.turrets_set_targeting(&[t], TurretTargeting::Automatic), 1);
    let far = target_at(&veh, t, 9);
    let near = target_at(&veh, t, 2);
    let out_of_range = target_at(&veh, t, 20);

    assert_eq!(veh.automatic_fire_turret(t, &[out_of_range]), 0);
    assert_eq!(veh.automatic_fire_turret(t, &[far, near]), 5);

    assert!(has_event(&veh, |e| matches!(
        e,
        Event::TurretFired { target, .. } if *target == near
    )));
    assert_eq!(veh.part(t).unwrap().target, None);
}

#[test]
fn test_aimed_point_is_used_once() {
    let content = base_content();
    let (mut veh, t) = armed_frame(&content, "turret_mg");
    veh.refill(t, &nine_mm(), 100);
    veh.turrets_set_targeting(&[t], TurretTargeting::Automatic);
    let aimed = target_at(&veh, t, 10);
    let hostile = target_at(&veh, t, 1);

    assert!(veh.turrets_aim(aimed));
    assert_eq!(veh.part(t).unwrap().target, Some((aimed, aimed)));
    assert_eq!(veh.automatic_fire_turret(t, &[hostile]), 5);
    assert_eq!(veh.part(t).unwrap().target, None);
    assert!(has_event(&veh, |e| matches!(
        e,
        Event::TurretFired { target, .. } if *target == aimed
    )));
}
