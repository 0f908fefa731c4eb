//! `veh_core` — multi-tile vehicles built from catalog parts.
//!
//! No IO, no network. All randomness via the passed-in Rng. A vehicle is
//! driven by an external world tick through `idle`, `gain_moves` and
//! `update_time`, and mutated through the install/remove, thrust/turn and
//! collision entry points.

mod crew;
mod error;
mod grid;
mod id;
mod item;
mod network;
mod part;
mod persistence;
mod types;
mod vehicle;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use crew::{ActorInfo, ActorRegistry, ActorRoster};
pub use error::{InstallError, LoadError};
pub use grid::{Obstacle, Terrain};
pub use id::{generate_uuid, new_vehicle_id};
pub use item::{Item, ITEM_MAX_DAMAGE};
pub use network::Fleet;
pub use part::{Occupant, VehiclePart};
pub use persistence::{PartSnapshot, VehicleSnapshot, SNAPSHOT_VERSION};
pub use types::*;
pub use vehicle::{
    coord_translate, CollisionTarget, Direction, TurretData, TurretStatus, VehCollision, Vehicle,
};

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

#[cfg(test)]
mod tests;
