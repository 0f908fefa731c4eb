use super::*;

fn rocks(n: i64) -> Item {
    Item::with_charges(ItemTypeId::new("rock"), n)
}

#[test]
fn test_items_stack_within_volume() {
    let content = base_content();
    let mut veh = test_car(&content);
    let cargo = find_part(&veh, "cargo_box");

    assert!(veh.add_item(cargo, rocks(10)));
    assert!(veh.add_item(cargo, rocks(10)));

    assert_eq!(veh.part(cargo).unwrap().items().len(), 1);
    assert_eq!(veh.part(cargo).unwrap().items()[0].charges, 20);
    assert!(approx(veh.stored_volume(cargo), 10.0));
    assert!(approx(veh.free_volume(cargo), 90.0));
}

#[test]
fn test_oversized_item_is_rejected_whole() {
    let content = base_content();
    let mut veh = test_car(&content);
    let cargo = find_part(&veh, "cargo_box");

    assert!(!veh.add_item(cargo, rocks(300)));
    assert!(veh.part(cargo).unwrap().items().is_empty());
    assert!(!veh.add_item(cargo, rocks(0)));
}

#[test]
fn test_add_charges_stores_what_fits() {
    let content = base_content();
    let mut veh = test_car(&content);
    let cargo = find_part(&veh, "cargo_box");
    veh.add_item(cargo, rocks(10));

    assert_eq!(veh.add_charges(cargo, &rocks(300)), 190);
    assert!(approx(veh.free_volume(cargo), 0.0));
    assert_eq!(veh.add_charges(cargo, &rocks(1)), 0);
}

#[test]
fn test_remove_item_by_index() {
    let content = base_content();
    let mut veh = test_car(&content);
    let cargo = find_part(&veh, "cargo_box");
    veh.add_item(cargo, rocks(3));
    veh.add_item(cargo, Item::with_charges(ItemTypeId::new("9mm"), 50));

    let taken = veh.remove_item(cargo, 1).unwrap();

    assert_eq!(taken.type_id, ItemTypeId::new("9mm"));
    assert_eq!(veh.part(cargo).unwrap().items().len(), 1);
    assert!(veh.remove_item(cargo, 5).is_none());
}

#[test]
fn test_non_cargo_and_broken_parts_hold_nothing() {
    let content = base_content();
    let mut veh = test_car(&content);
    let cargo = find_part(&veh, "cargo_box");
    let seat = find_part(&veh, "seat");

    assert!(approx(veh.max_volume(seat), 0.0));
    assert!(!veh.add_item(seat, rocks(1)));

    veh.set_hp(cargo, 0);
    assert!(approx(veh.max_volume(cargo), 0.0));
    assert!(!veh.add_item(cargo, rocks(1)));
}
