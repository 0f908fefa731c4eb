use super::*;

fn roster() -> ActorRoster {
    let mut roster = ActorRoster::default();
    for (id, ally) in [("npc_driver", true), ("npc_raider", false)] {
        roster.insert(
            ActorId::new(id),
            ActorInfo {
                name: id.to_string(),
                pos: Tripoint::default(),
                ally,
                alive: true,
                weight_kg: 75.0,
            },
        );
    }
    roster
}

fn driver() -> ActorId {
    ActorId::new("npc_driver")
}

#[test]
fn test_boarding_adds_weight() {
    let content = base_content();
    let mut veh = test_car(&content);
    let seat = find_part(&veh, "seat");

    assert!(veh.board(seat, &driver(), &roster()));

    assert_eq!(veh.get_passenger(seat), Some(&driver()));
    assert_eq!(veh.boarded_parts(), vec![seat]);
    assert!(approx(veh.total_mass(), 608.0 + 75.0));
}

#[test]
fn test_actor_boards_only_once() {
    let content = base_content();
    let mut veh = test_car(&content);
    let actors = roster();
    let first = veh.free_seat().unwrap();
    assert!(veh.board(first, &driver(), &actors));

    let second = veh.free_seat().unwrap();
    assert_ne!(first, second);
    assert!(!veh.board(second, &driver(), &actors));
    assert!(!veh.board(first, &ActorId::new("npc_raider"), &actors), "seat taken");
}

#[test]
fn test_dead_or_unknown_actors_cannot_board() {
    let content = base_content();
    let mut veh = test_car(&content);
    let seat = find_part(&veh, "seat");
    let mut actors = roster();
    actors.kill(&driver());

    assert!(!veh.board(seat, &driver(), &actors));
    assert!(!veh.board(seat, &ActorId::new("npc_ghost"), &actors));
    assert!(veh.boarded_parts().is_empty());
}

#[test]
fn test_only_intact_seats_take_passengers() {
    let content = base_content();
    let mut veh = test_car(&content);
    let seat = find_part(&veh, "seat");
    let controls = find_part(&veh, "controls");

    assert!(!veh.board(controls, &driver(), &roster()));
    veh.set_hp(seat, 0);
    assert!(!veh.board(seat, &driver(), &roster()));
    assert_ne!(veh.free_seat(), Some(seat));
}

#[test]
fn test_unboard_frees_seat() {
    let content = base_content();
    let mut veh = test_car(&content);
    let seat = find_part(&veh, "seat");
    veh.board(seat, &driver(), &roster());

    assert!(!veh.can_unmount(seat), "occupied seats stay put");
    assert_eq!(veh.unboard(seat), Some(driver()));
    assert_eq!(veh.unboard(seat), None);
    assert!(veh.can_unmount(seat));
    assert!(approx(veh.total_mass(), 608.0));
}

#[test]
fn test_unboard_all() {
    let content = base_content();
    let mut veh = test_car(&content);
    let actors = roster();
    let seats = veh.all_parts_with_feature(PartFlag::Seat, true);
    veh.board(seats[0], &driver(), &actors);
    veh.board(seats[1], &ActorId::new("npc_raider"), &actors);

    let left = veh.unboard_all();

    assert_eq!(left.len(), 2);
    assert!(veh.boarded_parts().is_empty());
}

#[test]
fn test_crew_requires_living_ally() {
    let content = base_content();
    let mut veh = test_car(&content);
    let seat = find_part(&veh, "seat");
    let mut actors = roster();

    assert!(!veh.assign_seat(seat, &ActorId::new("npc_raider"), &actors));
    assert!(veh.assign_seat(seat, &driver(), &actors));
    assert_eq!(veh.crew_at(seat, &actors), Some(&driver()));

    actors.kill(&driver());
    assert_eq!(veh.crew_at(seat, &actors), None);
}

#[test]
fn test_actor_crews_one_seat_per_vehicle() {
    let content = base_content();
    let mut veh = test_car(&content);
    let actors = roster();
    let seats = veh.all_parts_with_feature(PartFlag::Seat, true);
    assert_eq!(seats.len(), 2);

    assert!(veh.assign_seat(seats[0], &driver(), &actors));
    assert!(!veh.assign_seat(seats[1], &driver(), &actors));
    assert!(veh.assign_seat(seats[0], &driver(), &actors), "same seat again");

    assert_eq!(veh.crew_at(seats[0], &actors), Some(&driver()));
    assert_eq!(veh.crew_at(seats[1], &actors), None);
}

#[test]
fn test_turrets_take_crew() {
    let content = base_content();
    let mut veh = single_frame(&content, "veh_gunner");
    let turret = veh.install_part(Point::new(0, 0), &pid("turret_mg")).unwrap();
    let actors = roster();

    assert!(!veh.assign_seat(0, &driver(), &actors), "frames take no crew");
    assert!(veh.assign_seat(turret, &driver(), &actors));
    assert_eq!(veh.crew_at(turret, &actors), Some(&driver()));
}
