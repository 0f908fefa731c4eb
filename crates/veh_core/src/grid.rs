//! The narrow view of the world map a vehicle needs while moving.

use serde::{Deserialize, Serialize};

use crate::{ActorId, Tripoint, Vehicle, VehicleId};

/// Whatever occupies a map square a vehicle part is about to enter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Creature {
        id: ActorId,
        name: String,
        mass_kg: f32,
    },
    Vehicle {
        id: VehicleId,
        name: String,
        part: usize,
        mass_kg: f32,
        /// Velocity along our direction of travel, m/s.
        velocity: f32,
    },
    /// Terrain or furniture that breaks once hit hard enough.
    Bashable { name: String, strength: i32 },
    Impassable { name: String },
}

pub trait Terrain {
    fn obstacle_at(&self, pos: Tripoint) -> Option<Obstacle>;

    /// Total wheel contact area (square inches) resting on supportive ground.
    fn wheel_traction_area(&self, vehicle: &Vehicle) -> f32;
}
