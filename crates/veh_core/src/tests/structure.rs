use super::*;

fn frame_line(content: &Arc<VehicleContent>, len: i32) -> Vehicle {
    let mut veh = Vehicle::new(Arc::clone(content), VehicleId::new("veh_line"), "line");
    for x in 0..len {
        veh.install_part(Point::new(x, 0), &pid("frame")).unwrap();
    }
    veh
}

// --- Installation -------------------------------------------------------

#[test]
fn test_install_requires_structure() {
    let content = base_content();
    let mut veh = test_car(&content);
    let before = veh.part_count();

    let err = veh.install_part(Point::new(5, 5), &pid("seat")).unwrap_err();

    assert_eq!(err, InstallError::NoStructure(Point::new(5, 5)));
    assert_eq!(veh.part_count(), before, "failed install must not change the vehicle");
}

#[test]
fn test_frame_must_touch_existing_frame() {
    let content = base_content();
    let mut veh = test_car(&content);

    let err = veh.install_part(Point::new(5, 5), &pid("frame")).unwrap_err();
    assert_eq!(err, InstallError::NotAdjacent(Point::new(5, 5)));

    assert!(veh.install_part(Point::new(2, 0), &pid("frame")).is_ok());
}

#[test]
fn test_install_rejects_duplicates_and_taken_slots() {
    let content = base_content();
    let mut veh = test_car(&content);

    assert!(matches!(
        veh.install_part(Point::new(0, 0), &pid("seat")),
        Err(InstallError::Duplicate { .. })
    ));
    assert!(matches!(
        veh.install_part(Point::new(1, 0), &pid("wheel")),
        Err(InstallError::SlotOccupied { .. })
    ));
    assert!(matches!(
        veh.install_part(Point::new(0, 0), &pid("frame")),
        Err(InstallError::SlotOccupied { .. })
    ));
    assert_eq!(
        veh.install_part(Point::new(0, 0), &pid("warp_drive")),
        Err(InstallError::UnknownPart(pid("warp_drive")))
    );
}

#[test]
fn test_install_emits_event_and_indexes_part() {
    let content = base_content();
    let mut veh = test_car(&content);

    let p = veh.install_part(Point::new(0, 1), &pid("jumper_cable")).unwrap();

    assert!(veh.parts_at_relative(Point::new(0, 1)).contains(&p));
    assert!(has_event(&veh, |e| matches!(
        e,
        Event::PartInstalled { part, .. } if *part == p
    )));
}

#[test]
fn test_prototype_builds_every_part() {
    let content = base_content();
    let veh = test_car(&content);

    assert_eq!(veh.part_count(), 18);
    assert_eq!(veh.prototype, Some(PrototypeId::new("proto_car")));
    assert!(veh.events().is_empty(), "construction events are discarded");
}

#[test]
fn test_unknown_prototype_is_an_error() {
    let content = base_content();
    let result = Vehicle::from_prototype(
        content,
        &PrototypeId::new("proto_missing"),
        VehicleId::new("veh_x"),
    );
    assert!(matches!(result, Err(LoadError::UnknownPrototype(_))));
}

// --- Removal ------------------------------------------------------------

#[test]
fn test_frame_with_parts_cannot_be_unmounted() {
    let content = base_content();
    let veh = test_car(&content);
    let frame = veh.parts_at_relative(Point::new(1, 0))[0];

    assert!(veh.part(frame).unwrap().is_structure());
    assert!(!veh.can_unmount(frame));
}

#[test]
fn test_removing_middle_frame_would_split_vehicle() {
    let content = base_content();
    let veh = frame_line(&content, 3);

    assert!(!veh.can_unmount(1));
    assert!(veh.can_unmount(0));
    assert!(veh.can_unmount(2));
}

#[test]
fn test_frame_is_not_removed_from_under_parts() {
    let content = base_content();
    let mut veh = test_car(&content);
    let frame = 0;
    assert_eq!(veh.part(frame).unwrap().mount(), Point::new(0, 0));

    assert!(!veh.remove_part(frame));
    assert!(!veh.part(frame).unwrap().is_removed());

    let controls = find_part(&veh, "controls");
    let seat = find_part(&veh, "seat");
    assert!(veh.remove_part(controls));
    assert!(veh.remove_part(seat));
    assert!(veh.remove_part(frame));
    assert!(veh.parts_at_relative(Point::new(0, 0)).is_empty());
}

#[test]
fn test_removal_is_deferred_until_cleanup() {
    let content = base_content();
    let mut veh = test_car(&content);
    let seat = find_part(&veh, "seat");
    let total = veh.parts().len();

    assert!(veh.remove_part(seat));
    assert!(!veh.remove_part(seat), "already removed");

    assert_eq!(veh.parts().len(), total);
    assert_eq!(veh.part_count(), total - 1);
    assert!(veh.part(seat).unwrap().is_removed());

    assert!(veh.part_removal_cleanup());
    assert_eq!(veh.parts().len(), total - 1);
    assert!(!veh.part_removal_cleanup(), "nothing left to compact");
}

#[test]
fn test_cleanup_reorigins_when_origin_removed() {
    let content = base_content();
    let mut veh = frame_line(&content, 2);
    veh.set_label(Point::new(1, 0), "tail");

    assert!(veh.remove_part(0));
    veh.part_removal_cleanup();

    assert_eq!(veh.part_count(), 1);
    assert_eq!(veh.parts()[0].mount(), Point::new(0, 0));
    assert_eq!(veh.get_label(Point::new(0, 0)), Some("tail"));
}

#[test]
fn test_label_dropped_with_last_part() {
    let content = base_content();
    let mut veh = frame_line(&content, 2);
    veh.set_label(Point::new(1, 0), "tail");

    veh.remove_part(1);

    assert_eq!(veh.get_label(Point::new(1, 0)), None);
}

#[test]
fn test_empty_label_clears() {
    let content = base_content();
    let mut veh = frame_line(&content, 1);

    veh.set_label(Point::new(0, 0), "front");
    assert_eq!(veh.labels().count(), 1);
    veh.set_label(Point::new(0, 0), "");
    assert_eq!(veh.labels().count(), 0);
}

// --- Lookups ------------------------------------------------------------

#[test]
fn test_feature_lookups() {
    let content = base_content();
    let mut veh = test_car(&content);
    let wheel = find_part(&veh, "wheel_steerable");

    assert_eq!(veh.all_parts_with_feature(PartFlag::Wheel, false).len(), 4);
    assert_eq!(veh.all_parts_at_location(LOCATION_STRUCTURE).len(), 6);
    assert_eq!(
        veh.part_with_feature(wheel, PartFlag::Engine, true),
        Some(find_part(&veh, "engine_gas"))
    );

    veh.set_hp(wheel, 0);
    assert_eq!(veh.all_parts_with_feature(PartFlag::Steerable, true).len(), 1);
    assert!(veh.has_part(PartFlag::Seat, false));
    assert!(!veh.has_part(PartFlag::Light, true), "lights start switched off");
}

#[test]
fn test_part_at_prefers_frame() {
    let content = base_content();
    let veh = test_car(&content);
    let engine = find_part(&veh, "engine_gas");
    let local = veh.part(engine).unwrap().precalc(0);

    let found = veh.part_at(local).unwrap();

    assert!(veh.part(found).unwrap().is_structure());
    assert_eq!(veh.global_part_at(veh.global_part_pos3(engine)), Some(found));
}

// --- Doors and insides ----------------------------------------------------

#[test]
fn test_multisquare_doors_open_together() {
    let content = base_content();
    let mut veh = frame_line(&content, 3);
    let d0 = veh.install_part(Point::new(0, 0), &pid("door")).unwrap();
    let d1 = veh.install_part(Point::new(1, 0), &pid("door")).unwrap();
    let board = veh.install_part(Point::new(2, 0), &pid("board")).unwrap();

    assert_eq!(veh.obstacle_at_part(d0), Some(d0));
    veh.open(d0);

    assert!(veh.part(d0).unwrap().open);
    assert!(veh.part(d1).unwrap().open);
    assert_eq!(veh.obstacle_at_part(d1), None);
    assert_eq!(veh.obstacle_at_part(board), Some(board));
    assert_eq!(veh.next_part_to_close(d1), Some(d1));

    veh.close(d1);
    assert!(!veh.part(d0).unwrap().open);
}

#[test]
fn test_inside_needs_roof_and_covered_sides() {
    let content = base_content();
    let mut veh = Vehicle::new(Arc::clone(&content), VehicleId::new("veh_box"), "box");
    let mut frames = Vec::new();
    for x in 0..3 {
        for y in 0..3 {
            frames.push(veh.install_part(Point::new(x, y), &pid("frame")).unwrap());
            veh.install_part(Point::new(x, y), &pid("roof")).unwrap();
        }
    }
    let centre = veh.parts_at_relative(Point::new(1, 1))[0];
    let corner = veh.parts_at_relative(Point::new(0, 0))[0];

    assert!(veh.is_inside(centre));
    assert!(!veh.is_inside(corner));

    let roof = veh
        .part_with_feature_at_relative(Point::new(1, 1), PartFlag::Roof, true)
        .unwrap();
    veh.set_hp(roof, 0);
    assert!(!veh.is_inside(centre), "a broken roof lets the sky in");
}

#[test]
fn test_loose_parts_are_shed() {
    let content = base_content();
    let mut veh = single_frame(&content, "veh_cable");
    let cable = veh.install_part(Point::new(0, 0), &pid("jumper_cable")).unwrap();

    veh.shed_loose_parts();

    assert!(veh.part(cable).unwrap().is_removed());
    assert!(has_event(&veh, |e| matches!(e, Event::PartShed { .. })));
}
