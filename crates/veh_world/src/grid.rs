//! A flat tile map and the per-tick driving step built on it.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use veh_core::{Obstacle, PartFlag, Point, Terrain, Tripoint, VehCollision, Vehicle};

/// Metres covered by one map square.
pub const TILE_METERS: f32 = 4.0;

/// Open ground with explicit obstacles and water tiles. Wheels grip anywhere
/// but water; floats only on water.
#[derive(Debug, Clone, Default)]
pub struct TileGrid {
    obstacles: HashMap<Tripoint, Obstacle>,
    water: HashSet<Tripoint>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_obstacle(&mut self, pos: Tripoint, obstacle: Obstacle) {
        self.obstacles.insert(pos, obstacle);
    }

    pub fn clear_obstacle(&mut self, pos: Tripoint) -> Option<Obstacle> {
        self.obstacles.remove(&pos)
    }

    /// A solid wall from `from.y` to `to_y` along column `from.x`.
    pub fn add_wall(&mut self, from: Tripoint, to_y: i32) {
        let (lo, hi) = (from.y.min(to_y), from.y.max(to_y));
        for y in lo..=hi {
            self.set_obstacle(
                Tripoint::new(from.x, y, from.z),
                Obstacle::Impassable {
                    name: "wall".to_string(),
                },
            );
        }
    }

    pub fn set_water(&mut self, pos: Tripoint) {
        self.water.insert(pos);
    }

    pub fn is_water(&self, pos: Tripoint) -> bool {
        self.water.contains(&pos)
    }
}

impl Terrain for TileGrid {
    fn obstacle_at(&self, pos: Tripoint) -> Option<Obstacle> {
        self.obstacles.get(&pos).cloned()
    }

    fn wheel_traction_area(&self, vehicle: &Vehicle) -> f32 {
        let boat = vehicle.is_boat();
        let flag = if boat { PartFlag::Floats } else { PartFlag::Wheel };
        vehicle
            .all_parts_with_feature(flag, true)
            .into_iter()
            .filter(|&p| self.is_water(vehicle.global_part_pos3(p)) == boat)
            .filter_map(|p| vehicle.part(p))
            .map(veh_core::VehiclePart::wheel_area)
            .sum()
    }
}

/// Unit step along the direction of travel, rounded to whole tiles.
fn step_vector(veh: &Vehicle) -> Point {
    let (x, y) = veh.move_dir().unit();
    let sign = if veh.velocity < 0.0 { -1.0 } else { 1.0 };
    Point::new((x * sign).round() as i32, (y * sign).round() as i32)
}

/// One world tick for a single vehicle: friction and cruise control, engine
/// upkeep, then as many one-tile moves as the speed covers. Movement stops
/// at the first collision that brings the vehicle to rest. Parts removed
/// during the tick are compacted out at the end, so part indices in the
/// returned collisions refer to the list before compaction.
pub fn advance(veh: &mut Vehicle, grid: &TileGrid, rng: &mut impl Rng) -> Vec<VehCollision> {
    veh.gain_moves(grid.wheel_traction_area(veh), rng);
    veh.idle(true);

    let mut colls = Vec::new();
    let spt = veh.content().constants.seconds_per_tick;
    let steps = (veh.velocity.abs() * spt / TILE_METERS).round() as i32;
    for _ in 0..steps {
        let dp = step_vector(veh);
        veh.prepare_turn();
        veh.collision(&mut colls, dp, false, grid, rng);
        if veh.velocity.abs() < f32::EPSILON {
            tracing::debug!(vehicle = %veh.id, "stopped by a collision");
            break;
        }
        veh.translate(dp);
        veh.complete_move();
    }
    if veh.part_removal_cleanup() {
        tracing::debug!(vehicle = %veh.id, parts = veh.parts().len(), "compacted removed parts");
    }
    colls
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veh_core::test_fixtures::{base_content, make_rng, test_car, PROTO_BOAT};
    use veh_core::{CollisionKind, PartTypeId, PrototypeId, VehicleId};

    const FRONT_LEFT_FRAME: usize = 2;

    #[test]
    fn test_car_grips_on_dry_land() {
        let content = base_content();
        let veh = test_car(&content);
        let mut grid = TileGrid::new();
        assert!((grid.wheel_traction_area(&veh) - 640.0).abs() < 1e-3);

        let wheel = veh.all_parts_with_feature(PartFlag::Wheel, true)[0];
        grid.set_water(veh.global_part_pos3(wheel));

        assert!((grid.wheel_traction_area(&veh) - 480.0).abs() < 1e-3);
    }

    #[test]
    fn test_boat_needs_water() {
        let content = base_content();
        let veh = veh_core::Vehicle::from_prototype(
            Arc::clone(&content),
            &PrototypeId::new(PROTO_BOAT),
            VehicleId::new("veh_boat"),
        )
        .unwrap();
        let mut grid = TileGrid::new();
        assert!(grid.wheel_traction_area(&veh).abs() < 1e-3);

        for p in veh.all_parts_with_feature(PartFlag::Floats, true) {
            grid.set_water(veh.global_part_pos3(p));
        }

        assert!((grid.wheel_traction_area(&veh) - 2700.0).abs() < 1e-3);
    }

    #[test]
    fn test_parked_car_stays_put() {
        let content = base_content();
        let mut veh = test_car(&content);
        let start = veh.global_pos3();

        let colls = advance(&mut veh, &TileGrid::new(), &mut make_rng());

        assert!(colls.is_empty());
        assert_eq!(veh.global_pos3(), start);
    }

    #[test]
    fn test_coasting_car_runs_into_wall() {
        let content = base_content();
        let mut veh = test_car(&content);
        veh.cruise_on = false;
        veh.velocity = 8.0;
        let start = veh.global_pos3();
        let mut grid = TileGrid::new();
        let wall = veh.global_part_pos3(FRONT_LEFT_FRAME).offset(Point::new(2, 0));
        grid.add_wall(wall, wall.y);

        let colls = advance(&mut veh, &grid, &mut make_rng());

        assert_eq!(colls.len(), 1);
        assert_eq!(colls[0].kind, CollisionKind::Other);
        assert!(veh.velocity.abs() < f32::EPSILON);
        assert_eq!(veh.global_pos3(), start.offset(Point::new(1, 0)));
    }

    #[test]
    fn test_loose_parts_are_compacted_after_the_tick() {
        let content = base_content();
        let mut veh = test_car(&content);
        veh.install_part(Point::new(0, 0), &PartTypeId::new("jumper_cable")).unwrap();
        let with_cable = veh.parts().len();
        veh.cruise_on = false;
        veh.velocity = 4.0;

        advance(&mut veh, &TileGrid::new(), &mut make_rng());

        assert_eq!(veh.parts().len(), with_cable - 1);
        assert!(veh.parts().iter().all(|p| !p.is_removed()));
        assert!(veh.all_parts_with_feature(PartFlag::PowerTransfer, false).is_empty());
    }

    #[test]
    fn test_wall_spans_rows() {
        let mut grid = TileGrid::new();
        grid.add_wall(Tripoint::new(5, 2, 0), -1);

        for y in -1..=2 {
            assert!(grid.obstacle_at(Tripoint::new(5, y, 0)).is_some());
        }
        assert!(grid.obstacle_at(Tripoint::new(5, 3, 0)).is_none());
        assert!(grid.clear_obstacle(Tripoint::new(5, 0, 0)).is_some());
        assert!(grid.obstacle_at(Tripoint::new(5, 0, 0)).is_none());
    }
}
